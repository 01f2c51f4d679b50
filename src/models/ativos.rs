// src/models/ativos.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

// --- Hierarquia física: Filial -> Setor -> Equipamento ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Filial {
    pub id: i64,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub descricao: String,
    pub endereco: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub cnpj: Option<String>,
    pub empresa: Option<String>,
    pub usuario_criacao: Option<String>,
    pub data_criacao: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Setor {
    pub id: i64,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub descricao: String,
    pub filial_id: Option<i64>,
    pub empresa: Option<String>,
    pub usuario_criacao: Option<String>,
    pub data_criacao: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Equipamento {
    pub id: i64,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub descricao: String,
    pub setor_id: Option<i64>,
    pub empresa: Option<String>,
    pub usuario_criacao: Option<String>,
    pub data_criacao: Option<String>,
}

/// Os três níveis que a árvore conhece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoNo {
    Filial,
    Setor,
    Equipamento,
}

impl TipoNo {
    pub fn recurso(&self) -> &'static str {
        match self {
            TipoNo::Filial => "filiais",
            TipoNo::Setor => "setores",
            TipoNo::Equipamento => "equipamentos",
        }
    }

    pub fn rotulo(&self) -> &'static str {
        match self {
            TipoNo::Filial => "Filial",
            TipoNo::Setor => "Setor",
            TipoNo::Equipamento => "Equipamento",
        }
    }

    /// A exclusão de filial/setor apaga os filhos no servidor.
    pub fn exclusao_em_cascata(&self) -> bool {
        !matches!(self, TipoNo::Equipamento)
    }
}

// --- Formulários de edição ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FilialForm {
    #[validate(length(min = 1, message = "A TAG é obrigatória."))]
    pub tag: String,
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub descricao: String,
    pub endereco: Option<String>,
    pub cidade: Option<String>,
    #[validate(length(max = 2, message = "Use a sigla do estado (UF)."))]
    pub estado: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub cnpj: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetorForm {
    #[validate(length(min = 1, message = "A TAG é obrigatória."))]
    pub tag: String,
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub descricao: String,
    pub filial_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EquipamentoForm {
    #[validate(length(min = 1, message = "A TAG é obrigatória."))]
    pub tag: String,
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub descricao: String,
    pub setor_id: i64,
}

/// Edição recebida do navegador: o tipo do nó decide o formulário.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "tipo", rename_all = "lowercase")]
pub enum EdicaoNo {
    Filial(FilialForm),
    Setor(SetorForm),
    Equipamento(EquipamentoForm),
}

impl EdicaoNo {
    pub fn tipo(&self) -> TipoNo {
        match self {
            EdicaoNo::Filial(_) => TipoNo::Filial,
            EdicaoNo::Setor(_) => TipoNo::Setor,
            EdicaoNo::Equipamento(_) => TipoNo::Equipamento,
        }
    }
}
