// src/models/usuarios.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Perfil {
    #[default]
    User,
    Admin,
    Master,
}

impl Perfil {
    pub fn rotulo(&self) -> &'static str {
        match self {
            Perfil::User => "Técnico",
            Perfil::Admin => "Administrador",
            Perfil::Master => "Master",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusUsuario {
    #[default]
    Active,
    Inactive,
}

// Representa um usuário vindo do backend
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub company: Option<String>,
    #[serde(default)]
    pub profile: Perfil,
    #[serde(default)]
    pub status: StatusUsuario,
    pub cargo: Option<String>,
}

// Dados para criar/editar um usuário
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    // Obrigatória na criação, opcional na edição (regra aplicada no serviço)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,
    pub company: Option<String>,
    #[serde(default)]
    pub profile: Perfil,
    #[serde(default)]
    pub status: StatusUsuario,
    pub cargo: Option<String>,
}
