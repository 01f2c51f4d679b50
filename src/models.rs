pub mod ativos;
pub mod execucao;
pub mod ordens;
pub mod plano;
pub mod usuarios;

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// O backend devolve NUMERIC às vezes como número, às vezes como string ("12.50" / "12,50").
pub(crate) fn decimal_flexivel<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let valor = Option::<Value>::deserialize(deserializer)?;
    match valor {
        None | Some(Value::Null) => Ok(Decimal::ZERO),
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map_err(serde::de::Error::custom),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Decimal::ZERO),
        Some(Value::String(s)) => {
            Decimal::from_str(&s.trim().replace(',', ".")).map_err(serde::de::Error::custom)
        }
        Some(outro) => Err(serde::de::Error::custom(format!(
            "valor decimal inesperado: {}",
            outro
        ))),
    }
}

// Flags vindas do banco chegam como true/false, 1/0 ou "1"/"0".
pub(crate) fn bool_flexivel<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let valor = Option::<Value>::deserialize(deserializer)?;
    Ok(match valor {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_i64().map(|v| v != 0).unwrap_or(true),
        Some(Value::String(s)) => !matches!(s.trim(), "0" | "false" | "inativo" | ""),
        Some(_) => true,
    })
}

pub(crate) fn verdadeiro() -> bool {
    true
}
