use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // O backend respondeu, mas recusou a operação (HTTP != 2xx ou success:false)
    #[error("Backend recusou a requisição ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Sessão expirada ou não autenticada")]
    NaoAutenticado,

    #[error("Data inválida: '{0}'")]
    DataInvalida(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    ConfirmacaoNecessaria(String),

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("{0}")]
    RegraNegocio(String),

    #[error("Recurso indisponível: {0}")]
    CapacidadeIndisponivel(&'static str),

    #[error("Falha ao gerar QR code: {0}")]
    QrCode(String),

    #[error("Falha ao gerar PDF: {0}")]
    Pdf(String),

    #[error("Falha de comunicação com o backend: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Resposta inválida do backend: {0}")]
    JsonError(#[from] serde_json::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

/// Corpo de erro devolvido ao navegador.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl AppError {
    /// Verdadeiro quando a falha é do transporte/backend (e não do usuário).
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            AppError::Backend { .. } | AppError::HttpError(_) | AppError::JsonError(_)
        )
    }

    pub fn to_api_error(&self) -> ApiError {
        let (status, error) = match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                return ApiError {
                    status: StatusCode::BAD_REQUEST,
                    error: "Um ou mais campos são inválidos.".into(),
                    details: Some(json!(details)),
                };
            }
            AppError::Backend { status, message } => {
                let code = StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (code, message.clone())
            }
            AppError::NaoAutenticado => (
                StatusCode::UNAUTHORIZED,
                "Sessão expirada. Faça login novamente.".into(),
            ),
            AppError::DataInvalida(raw) => (
                StatusCode::BAD_REQUEST,
                format!("Data inválida: '{}'. Use o formato AAAA-MM-DD.", raw),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::ConfirmacaoNecessaria(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::ResourceNotFound(what) => {
                (StatusCode::NOT_FOUND, format!("{} não encontrado(a).", what))
            }
            AppError::RegraNegocio(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::CapacidadeIndisponivel(what) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Recurso indisponível neste servidor: {}.", what),
            ),
            AppError::HttpError(_) | AppError::JsonError(_) => {
                tracing::error!("Falha ao falar com o backend: {}", self);
                (
                    StatusCode::BAD_GATEWAY,
                    "Não foi possível comunicar com o servidor. Tente novamente.".into(),
                )
            }
            // Todos os outros erros viram 500.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".into(),
                )
            }
        };

        ApiError { status, error, details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let mut body = json!({ "success": false, "error": self.error, "message": self.error });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error().into_response()
    }
}
