// src/models/plano.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::models::{bool_flexivel, verdadeiro};

/// Atividade do plano mestre de um equipamento.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate)]
pub struct AtividadePlano {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub equipamento_id: Option<i64>,
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    #[serde(default)]
    pub descricao: String,
    #[validate(length(min = 1, message = "Informe a oficina."))]
    #[serde(default)]
    pub oficina: String,
    #[validate(length(min = 1, message = "Informe o tipo de manutenção."))]
    #[serde(default)]
    pub tipo_manutencao: String,
    #[validate(length(min = 1, message = "Informe a frequência."))]
    #[serde(default)]
    pub frequencia: String,
    pub conjunto: Option<String>,
    pub ponto_controle: Option<String>,
    #[validate(range(min = 1, message = "O valor da frequência deve ser positivo."))]
    pub valor_frequencia: Option<i32>,
    pub condicao: Option<String>,
    #[serde(default = "verdadeiro", deserialize_with = "bool_flexivel")]
    pub status_ativo: bool,
}

/// Chave de agrupamento: uma PMP por combinação.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChavePmp {
    pub oficina: String,
    pub frequencia: String,
    pub tipo_manutencao: String,
    pub status_ativo: bool,
}

impl AtividadePlano {
    pub fn chave_pmp(&self) -> ChavePmp {
        ChavePmp {
            oficina: self.oficina.trim().to_uppercase(),
            frequencia: self.frequencia.trim().to_uppercase(),
            tipo_manutencao: self.tipo_manutencao.trim().to_uppercase(),
            status_ativo: self.status_ativo,
        }
    }
}

/// Plano Mestre de Manutenção Preventiva.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate)]
pub struct Pmp {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[validate(length(min = 1, message = "O código é obrigatório."))]
    #[serde(default)]
    pub codigo: String,
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    #[serde(default)]
    pub descricao: String,
    pub equipamento_id: Option<i64>,
    #[serde(default)]
    pub oficina: String,
    #[serde(default)]
    pub tipo_manutencao: String,
    #[serde(default)]
    pub frequencia: String,
    #[serde(default = "verdadeiro", deserialize_with = "bool_flexivel")]
    pub status_ativo: bool,
    #[serde(default)]
    pub atividades_ids: Vec<i64>,
}

/// Edição de metadados/membros de uma PMP vinda do navegador.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PmpForm {
    #[validate(length(min = 1, message = "O código é obrigatório."))]
    pub codigo: String,
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub descricao: String,
    pub atividades_ids: Vec<i64>,
}

/// Painel analítico da PMP: o backend define os campos, nós só exibimos.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PainelPmp {
    #[serde(default)]
    pub total_pmps: i64,
    #[serde(default)]
    pub os_geradas: i64,
    #[serde(default)]
    pub os_pendentes: i64,
    #[serde(default)]
    pub os_concluidas: i64,
    #[serde(flatten)]
    pub extras: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultadoGeracao {
    #[serde(default)]
    pub os_geradas: i64,
    pub message: Option<String>,
}
