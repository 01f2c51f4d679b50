// src/api/ativos_repo.rs

use crate::{
    api::client::{BackendClient, Metodo},
    common::error::AppError,
    models::ativos::{EdicaoNo, Equipamento, Filial, Setor, TipoNo},
};

// Filiais, setores e equipamentos. Cada método recebe o cliente já com a sessão.
#[derive(Clone, Default)]
pub struct AssetRepository;

impl AssetRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list_filiais(&self, client: &BackendClient) -> Result<Vec<Filial>, AppError> {
        client.get("/api/filiais", "filiais").await
    }

    pub async fn list_setores(&self, client: &BackendClient) -> Result<Vec<Setor>, AppError> {
        client.get("/api/setores", "setores").await
    }

    pub async fn list_equipamentos(
        &self,
        client: &BackendClient,
    ) -> Result<Vec<Equipamento>, AppError> {
        client.get("/api/equipamentos", "equipamentos").await
    }

    pub async fn get_equipamento(
        &self,
        client: &BackendClient,
        id: i64,
    ) -> Result<Option<Equipamento>, AppError> {
        match client
            .get(&format!("/api/equipamentos/{}", id), "equipamento")
            .await
        {
            Ok(e) => Ok(e),
            Err(AppError::Backend { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn update(
        &self,
        client: &BackendClient,
        id: i64,
        edicao: &EdicaoNo,
    ) -> Result<Option<String>, AppError> {
        let caminho = format!("/api/{}/{}", edicao.tipo().recurso(), id);
        let corpo = match edicao {
            EdicaoNo::Filial(f) => serde_json::to_value(f)?,
            EdicaoNo::Setor(s) => serde_json::to_value(s)?,
            EdicaoNo::Equipamento(e) => serde_json::to_value(e)?,
        };
        client.executar(Metodo::Put, &caminho, Some(corpo)).await
    }

    pub async fn delete(
        &self,
        client: &BackendClient,
        tipo: TipoNo,
        id: i64,
    ) -> Result<Option<String>, AppError> {
        let caminho = format!("/api/{}/{}", tipo.recurso(), id);
        client.executar(Metodo::Delete, &caminho, None).await
    }
}
