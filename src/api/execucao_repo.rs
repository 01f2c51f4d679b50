// src/api/execucao_repo.rs

use crate::{
    api::client::{BackendClient, Metodo},
    common::error::AppError,
    models::execucao::{ExecucaoOs, MaterialEstoque, MaterialUtilizado},
};

#[derive(Clone, Default)]
pub struct ExecucaoRepository;

impl ExecucaoRepository {
    pub fn new() -> Self {
        Self
    }

    // Uma OS ainda não executada simplesmente não tem registro (404 ou null).
    pub async fn get_por_os(
        &self,
        client: &BackendClient,
        os_id: i64,
    ) -> Result<Option<ExecucaoOs>, AppError> {
        match client
            .get(&format!("/api/execucoes-os/os/{}", os_id), "execucao")
            .await
        {
            Ok(execucao) => Ok(execucao),
            Err(AppError::Backend { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create(
        &self,
        client: &BackendClient,
        execucao: &ExecucaoOs,
    ) -> Result<ExecucaoOs, AppError> {
        client.post("/api/execucoes-os", execucao, "execucao").await
    }

    pub async fn update(
        &self,
        client: &BackendClient,
        id: i64,
        execucao: &ExecucaoOs,
    ) -> Result<ExecucaoOs, AppError> {
        client
            .put(&format!("/api/execucoes-os/{}", id), execucao, "execucao")
            .await
    }

    pub async fn list_materiais(
        &self,
        client: &BackendClient,
        execucao_id: i64,
    ) -> Result<Vec<MaterialUtilizado>, AppError> {
        let id = execucao_id.to_string();
        client
            .get_com_query(
                "/api/materiais-utilizados",
                &[("execucao_id", id.as_str())],
                "materiais",
            )
            .await
    }

    pub async fn create_material(
        &self,
        client: &BackendClient,
        material: &MaterialUtilizado,
    ) -> Result<MaterialUtilizado, AppError> {
        client
            .post("/api/materiais-utilizados", material, "material")
            .await
    }

    pub async fn update_material(
        &self,
        client: &BackendClient,
        id: i64,
        material: &MaterialUtilizado,
    ) -> Result<MaterialUtilizado, AppError> {
        client
            .put(&format!("/api/materiais-utilizados/{}", id), material, "material")
            .await
    }

    pub async fn delete_material(
        &self,
        client: &BackendClient,
        id: i64,
    ) -> Result<Option<String>, AppError> {
        client
            .executar(Metodo::Delete, &format!("/api/materiais-utilizados/{}", id), None)
            .await
    }

    pub async fn list_estoque(
        &self,
        client: &BackendClient,
    ) -> Result<Vec<MaterialEstoque>, AppError> {
        client.get("/api/materiais-estoque", "materiais").await
    }
}
