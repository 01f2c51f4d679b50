// src/api/ordens_repo.rs

use serde_json::json;

use crate::{
    api::client::{BackendClient, Metodo},
    common::error::AppError,
    models::ordens::{OrdemServico, Prioridade, PrioridadePayload, ProgramarPayload},
};

#[derive(Clone, Default)]
pub struct OrdemRepository;

impl OrdemRepository {
    pub fn new() -> Self {
        Self
    }

    /// Lista por status; se a rota filtrada falhar, tenta a rota dedicada do quadro.
    pub async fn list_para_programacao(
        &self,
        client: &BackendClient,
        status: &str,
    ) -> Result<Vec<OrdemServico>, AppError> {
        match client
            .get_com_query("/api/ordens-servico", &[("status", status)], "ordens")
            .await
        {
            Ok(ordens) => Ok(ordens),
            Err(AppError::NaoAutenticado) => Err(AppError::NaoAutenticado),
            Err(e) => {
                tracing::warn!(
                    "Falha em /api/ordens-servico ({}); usando /api/ordens-servico-programacao",
                    e
                );
                client
                    .get("/api/ordens-servico-programacao", "ordens")
                    .await
            }
        }
    }

    pub async fn get(&self, client: &BackendClient, id: i64) -> Result<OrdemServico, AppError> {
        let ordem: Option<OrdemServico> = client
            .get(&format!("/api/ordens-servico/{}", id), "ordem")
            .await?;
        ordem.ok_or_else(|| AppError::ResourceNotFound(format!("OS #{}", id)))
    }

    pub async fn programar(
        &self,
        client: &BackendClient,
        payload: &ProgramarPayload,
    ) -> Result<Option<String>, AppError> {
        let caminho = format!("/api/ordens-servico/{}/programar", payload.id);
        client
            .executar(Metodo::Put, &caminho, Some(serde_json::to_value(payload)?))
            .await
    }

    pub async fn desprogramar(
        &self,
        client: &BackendClient,
        id: i64,
    ) -> Result<Option<String>, AppError> {
        let caminho = format!("/api/ordens-servico/{}/desprogramar", id);
        client.executar(Metodo::Post, &caminho, Some(json!({ "id": id }))).await
    }

    pub async fn encerrar(
        &self,
        client: &BackendClient,
        id: i64,
    ) -> Result<Option<String>, AppError> {
        let caminho = format!("/api/ordens-servico/{}/encerrar", id);
        client.executar(Metodo::Post, &caminho, None).await
    }

    pub async fn alterar_prioridade(
        &self,
        client: &BackendClient,
        id: i64,
        prioridade: Prioridade,
    ) -> Result<Option<String>, AppError> {
        let caminho = format!("/api/ordens-servico/{}/prioridade", id);
        let corpo = serde_json::to_value(PrioridadePayload { prioridade })?;
        client.executar(Metodo::Put, &caminho, Some(corpo)).await
    }
}
