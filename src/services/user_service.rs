// src/services/user_service.rs

use validator::Validate;

use crate::{
    api::{BackendClient, UserRepository},
    common::error::AppError,
    middleware::rbac::{exigir, GerenciarUsuarios},
    models::usuarios::{User, UserPayload},
};

// Senha em branco na edição significa "manter a atual".
fn normalizar(mut payload: UserPayload) -> UserPayload {
    payload.name = payload.name.trim().to_string();
    payload.email = payload.email.trim().to_string();
    payload.password = payload.password.filter(|s| !s.trim().is_empty());
    payload.cargo = payload.cargo.filter(|s| !s.trim().is_empty());
    payload.company = payload.company.filter(|s| !s.trim().is_empty());
    payload
}

#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    pub async fn listar(&self, client: &BackendClient) -> Result<Vec<User>, AppError> {
        self.repo.list(client).await
    }

    pub async fn criar(
        &self,
        client: &BackendClient,
        autor: &User,
        payload: UserPayload,
    ) -> Result<User, AppError> {
        exigir::<GerenciarUsuarios>(autor)?;
        let payload = normalizar(payload);
        if payload.password.is_none() {
            return Err(AppError::RegraNegocio("A senha é obrigatória para novos usuários.".into()));
        }
        payload.validate()?;

        let user = self.repo.create(client, &payload).await?;
        tracing::info!("Usuário {} criado por {}", user.email, autor.email);
        Ok(user)
    }

    pub async fn atualizar(
        &self,
        client: &BackendClient,
        autor: &User,
        id: i64,
        payload: UserPayload,
    ) -> Result<User, AppError> {
        exigir::<GerenciarUsuarios>(autor)?;
        let payload = normalizar(payload);
        payload.validate()?;

        let user = self.repo.update(client, id, &payload).await?;
        tracing::info!("Usuário #{} atualizado por {}", id, autor.email);
        Ok(user)
    }

    pub async fn excluir(&self, client: &BackendClient, autor: &User, id: i64) -> Result<String, AppError> {
        exigir::<GerenciarUsuarios>(autor)?;
        if autor.id == id {
            return Err(AppError::RegraNegocio("Você não pode excluir o próprio usuário.".into()));
        }
        let msg = self.repo.delete(client, id).await?;
        tracing::info!("Usuário #{} excluído por {}", id, autor.email);
        Ok(msg.unwrap_or_else(|| "Usuário excluído com sucesso.".to_string()))
    }
}
