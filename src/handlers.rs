// src/handlers.rs

use axum::{
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::{
    api::BackendClient,
    common::error::AppError,
    config::AppState,
    views,
};

pub mod ativos;
pub mod eventos;
pub mod execucao;
pub mod pmp;
pub mod programacao;
pub mod qrcodes;
pub mod usuarios;

/// Resposta das ações disparadas pelas páginas.
#[derive(Debug, Serialize)]
pub struct RespostaAcao {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dados: Option<Value>,
}

impl RespostaAcao {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), html: None, dados: None }
    }

    pub fn com_html(mut self, html: String) -> Self {
        self.html = Some(html);
        self
    }

    pub fn com_dados<T: Serialize>(mut self, dados: &T) -> Result<Self, AppError> {
        self.dados = Some(serde_json::to_value(dados)?);
        Ok(self)
    }
}

pub type AcaoResult = Result<Json<RespostaAcao>, AppError>;

/// Falha ao montar uma página inteira: tela de erro com "Tentar novamente".
#[derive(Debug)]
pub struct PaginaErro {
    erro: AppError,
    tentar_novamente: String,
}

impl IntoResponse for PaginaErro {
    fn into_response(self) -> Response {
        let api = self.erro.to_api_error();
        tracing::warn!("Falha ao carregar {}: {}", self.tentar_novamente, self.erro);
        (api.status, views::layout::pagina_erro(&api.error, &self.tentar_novamente)).into_response()
    }
}

pub type PaginaResult = Result<Html<String>, PaginaErro>;

// Sessão expirada no backend: esquece o usuário e o quadro em cache antes de responder.
async fn esquecer_se_expirou(state: &AppState, client: &BackendClient, erro: &AppError) {
    if matches!(erro, AppError::NaoAutenticado) {
        state.sessoes.esquecer(client).await;
        state.programacao_service.esquecer(client).await;
    }
}

pub(crate) async fn finalizar_pagina<T>(
    state: &AppState,
    client: &BackendClient,
    resultado: Result<T, AppError>,
    tentar_novamente: String,
) -> Result<T, PaginaErro> {
    match resultado {
        Ok(pagina) => Ok(pagina),
        Err(erro) => {
            esquecer_se_expirou(state, client, &erro).await;
            Err(PaginaErro { erro, tentar_novamente })
        }
    }
}

pub(crate) async fn finalizar_acao(
    state: &AppState,
    client: &BackendClient,
    resultado: Result<RespostaAcao, AppError>,
) -> AcaoResult {
    match resultado {
        Ok(resposta) => Ok(Json(resposta)),
        Err(erro) => {
            esquecer_se_expirou(state, client, &erro).await;
            Err(erro)
        }
    }
}
