// src/api/user_repo.rs

use crate::{
    api::client::{BackendClient, Metodo},
    common::error::AppError,
    models::usuarios::{User, UserPayload},
};

// O repositório de usuários, responsável por todas as interações com /api/users
#[derive(Clone, Default)]
pub struct UserRepository;

impl UserRepository {
    pub fn new() -> Self {
        Self
    }

    /// Usuário dono da sessão (`/api/user`).
    pub async fn current(&self, client: &BackendClient) -> Result<User, AppError> {
        let user: Option<User> = client.get("/api/user", "user").await?;
        user.ok_or(AppError::NaoAutenticado)
    }

    pub async fn list(&self, client: &BackendClient) -> Result<Vec<User>, AppError> {
        client.get("/api/users", "users").await
    }

    /// Técnicos disponíveis para programação.
    pub async fn list_tecnicos(&self, client: &BackendClient) -> Result<Vec<User>, AppError> {
        client
            .get_com_query("/api/users", &[("profile", "user")], "users")
            .await
    }

    pub async fn create(
        &self,
        client: &BackendClient,
        payload: &UserPayload,
    ) -> Result<User, AppError> {
        client.post("/api/users", payload, "user").await
    }

    pub async fn update(
        &self,
        client: &BackendClient,
        id: i64,
        payload: &UserPayload,
    ) -> Result<User, AppError> {
        client.put(&format!("/api/users/{}", id), payload, "user").await
    }

    pub async fn delete(
        &self,
        client: &BackendClient,
        id: i64,
    ) -> Result<Option<String>, AppError> {
        client
            .executar(Metodo::Delete, &format!("/api/users/{}", id), None)
            .await
    }
}
