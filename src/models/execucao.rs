// src/models/execucao.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::common::{error::AppError, format::valor_em_centavos};
use crate::models::decimal_flexivel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StatusExecucao {
    #[default]
    #[serde(rename = "conforme")]
    Conforme,
    #[serde(rename = "nao_conforme", alias = "não_conforme", alias = "nao-conforme")]
    NaoConforme,
}

impl StatusExecucao {
    pub fn rotulo(&self) -> &'static str {
        match self {
            StatusExecucao::Conforme => "Conforme",
            StatusExecucao::NaoConforme => "Não conforme",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecucaoOs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub os_id: i64,
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
    #[serde(default)]
    pub lista_execucao_status: StatusExecucao,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TipoMaterial {
    #[default]
    Estoque,
    Avulso,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MaterialUtilizado {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub execucao_id: Option<i64>,
    #[serde(default)]
    pub tipo_material: TipoMaterial,
    pub material_estoque_id: Option<i64>,
    pub descricao: Option<String>,
    #[serde(default, deserialize_with = "decimal_flexivel")]
    pub quantidade: Decimal,
    #[serde(default, deserialize_with = "decimal_flexivel")]
    pub valor_unitario: Decimal,
    #[serde(default, deserialize_with = "decimal_flexivel")]
    pub valor_total: Decimal,
}

impl MaterialUtilizado {
    /// total = quantidade × valor unitário, em centavos.
    pub fn recalcular_total(&mut self) -> Result<(), AppError> {
        self.valor_total = valor_em_centavos(self.quantidade, self.valor_unitario)?;
        Ok(())
    }
}

/// Item do catálogo de estoque (`/api/materiais-estoque`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MaterialEstoque {
    pub id: i64,
    pub codigo: Option<String>,
    #[serde(default)]
    pub descricao: String,
    pub unidade: Option<String>,
    #[serde(default, deserialize_with = "decimal_flexivel")]
    pub valor_unitario: Decimal,
    #[serde(default, deserialize_with = "decimal_flexivel")]
    pub quantidade_disponivel: Decimal,
}

// --- Formulário vindo do navegador ---

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MaterialForm {
    pub id: Option<i64>,
    pub tipo_material: TipoMaterial,
    pub material_estoque_id: Option<i64>,
    #[validate(length(max = 255, message = "Descrição muito longa."))]
    pub descricao: Option<String>,
    #[serde(deserialize_with = "decimal_flexivel")]
    pub quantidade: Decimal,
    // Só é lido para material avulso; no estoque o preço vem do catálogo.
    #[serde(default, deserialize_with = "decimal_flexivel")]
    pub valor_unitario: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExecucaoForm {
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
    #[serde(default)]
    pub lista_execucao_status: StatusExecucao,
    #[validate(length(max = 4000, message = "Observações muito longas."))]
    pub observacoes: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub materiais: Vec<MaterialForm>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn total_is_rounded_to_cents() {
        let mut m = MaterialUtilizado {
            quantidade: Decimal::from_str("3").unwrap(),
            valor_unitario: Decimal::from_str("3.335").unwrap(),
            ..Default::default()
        };
        m.recalcular_total().unwrap();
        assert_eq!(m.valor_total, Decimal::from_str("10.01").unwrap());
    }

    #[test]
    fn overflowing_total_keeps_previous_value() {
        let mut m = MaterialUtilizado {
            quantidade: Decimal::MAX,
            valor_unitario: Decimal::from_str("2").unwrap(),
            valor_total: Decimal::ONE,
            ..Default::default()
        };
        assert!(matches!(m.recalcular_total(), Err(AppError::RegraNegocio(_))));
        assert_eq!(m.valor_total, Decimal::ONE);
    }

    #[test]
    fn execution_status_accepts_accented_variant() {
        let e: ExecucaoOs =
            serde_json::from_str(r#"{"os_id": 3, "lista_execucao_status": "não_conforme"}"#)
                .unwrap();
        assert_eq!(e.lista_execucao_status, StatusExecucao::NaoConforme);
    }
}
