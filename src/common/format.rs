// src/common/format.rs

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::common::error::AppError;

/// Arredonda para centavos (meio para longe do zero, como o `toFixed` do navegador).
pub fn arredondar_centavos(valor: Decimal) -> Decimal {
    valor.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// quantidade × valor unitário, em centavos. Produto que não cabe num `Decimal` é recusado.
pub fn valor_em_centavos(quantidade: Decimal, valor_unitario: Decimal) -> Result<Decimal, AppError> {
    quantidade
        .checked_mul(valor_unitario)
        .map(arredondar_centavos)
        .ok_or_else(|| AppError::RegraNegocio("Valor muito alto".into()))
}

/// `R$ 12,50` (separador decimal vírgula, sem separador de milhar).
pub fn formatar_moeda(valor: Decimal) -> String {
    let texto = format!("{:.2}", arredondar_centavos(valor));
    format!("R$ {}", texto.replace('.', ","))
}

pub fn formatar_data_br(data: NaiveDate) -> String {
    data.format("%d/%m/%Y").to_string()
}

pub fn formatar_data_hora_br(data: NaiveDateTime) -> String {
    data.format("%d/%m/%Y %H:%M").to_string()
}

/// Valor para `<input type="datetime-local">`.
pub fn formatar_datetime_local(data: NaiveDateTime) -> String {
    data.format("%Y-%m-%dT%H:%M").to_string()
}

/// Aceita `AAAA-MM-DD`, `DD/MM/AAAA` ou um datetime ISO (`2025-03-10T08:00...`).
/// Qualquer outra coisa é rejeitada: nunca repassamos uma data fora do padrão ISO.
pub fn normalizar_data(entrada: &str) -> Result<NaiveDate, AppError> {
    let texto = entrada.trim();

    if let Ok(data) = NaiveDate::parse_from_str(texto, "%Y-%m-%d") {
        return Ok(data);
    }
    if let Ok(data) = NaiveDate::parse_from_str(texto, "%d/%m/%Y") {
        return Ok(data);
    }
    if let Some((dia, _hora)) = texto.split_once('T') {
        if let Ok(data) = NaiveDate::parse_from_str(dia, "%Y-%m-%d") {
            return Ok(data);
        }
    }

    Err(AppError::DataInvalida(entrada.to_string()))
}

/// Aceita `AAAA-MM-DDTHH:MM[:SS]` ou `AAAA-MM-DD HH:MM[:SS]`.
pub fn normalizar_data_hora(entrada: &str) -> Result<NaiveDateTime, AppError> {
    let texto = entrada.trim().trim_end_matches('Z');
    const FORMATOS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    FORMATOS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(texto, f).ok())
        .ok_or_else(|| AppError::DataInvalida(entrada.to_string()))
}

pub fn escapar_html(texto: &str) -> String {
    let mut saida = String::with_capacity(texto.len());
    for c in texto.chars() {
        match c {
            '&' => saida.push_str("&amp;"),
            '<' => saida.push_str("&lt;"),
            '>' => saida.push_str("&gt;"),
            '"' => saida.push_str("&quot;"),
            '\'' => saida.push_str("&#39;"),
            _ => saida.push(c),
        }
    }
    saida
}
