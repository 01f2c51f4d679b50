// src/api/plano_repo.rs

use crate::{
    api::client::{BackendClient, Metodo},
    common::error::AppError,
    models::plano::{AtividadePlano, PainelPmp, Pmp, ResultadoGeracao},
};

// Plano mestre (atividades) e PMPs materializadas.
#[derive(Clone, Default)]
pub struct PlanoRepository;

impl PlanoRepository {
    pub fn new() -> Self {
        Self
    }

    // --- ATIVIDADES ---

    pub async fn list_atividades(
        &self,
        client: &BackendClient,
        equipamento_id: i64,
    ) -> Result<Vec<AtividadePlano>, AppError> {
        client
            .get(
                &format!("/api/plano-mestre/equipamento/{}/atividades", equipamento_id),
                "atividades",
            )
            .await
    }

    pub async fn create_atividade(
        &self,
        client: &BackendClient,
        atividade: &AtividadePlano,
    ) -> Result<AtividadePlano, AppError> {
        client
            .post("/api/plano-mestre/atividades", atividade, "atividade")
            .await
    }

    pub async fn update_atividade(
        &self,
        client: &BackendClient,
        id: i64,
        atividade: &AtividadePlano,
    ) -> Result<AtividadePlano, AppError> {
        client
            .put(&format!("/api/plano-mestre/atividades/{}", id), atividade, "atividade")
            .await
    }

    pub async fn delete_atividade(
        &self,
        client: &BackendClient,
        id: i64,
    ) -> Result<Option<String>, AppError> {
        client
            .executar(Metodo::Delete, &format!("/api/plano-mestre/atividades/{}", id), None)
            .await
    }

    // --- PMPs ---

    pub async fn list_pmps(
        &self,
        client: &BackendClient,
        equipamento_id: i64,
    ) -> Result<Vec<Pmp>, AppError> {
        let id = equipamento_id.to_string();
        client
            .get_com_query("/api/pmps", &[("equipamento_id", id.as_str())], "pmps")
            .await
    }

    pub async fn create_pmp(&self, client: &BackendClient, pmp: &Pmp) -> Result<Pmp, AppError> {
        client.post("/api/pmps", pmp, "pmp").await
    }

    pub async fn update_pmp(
        &self,
        client: &BackendClient,
        id: i64,
        pmp: &Pmp,
    ) -> Result<Pmp, AppError> {
        client.put(&format!("/api/pmps/{}", id), pmp, "pmp").await
    }

    // --- Analytics / geração ---

    pub async fn painel(&self, client: &BackendClient) -> Result<PainelPmp, AppError> {
        let painel: Option<PainelPmp> = client.get("/api/pmp/dashboard", "dashboard").await?;
        Ok(painel.unwrap_or_default())
    }

    pub async fn gerar_os_pendentes(
        &self,
        client: &BackendClient,
    ) -> Result<ResultadoGeracao, AppError> {
        let corpo = client
            .requisitar(Metodo::Post, "/api/pmp/gerar-os-pendentes", &[], None)
            .await?;
        Ok(serde_json::from_value(corpo)?)
    }
}
