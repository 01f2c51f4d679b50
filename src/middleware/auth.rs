// src/middleware/auth.rs

use std::time::Duration;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;
use moka::future::Cache;

use crate::{
    api::{BackendClient, UserRepository},
    common::error::AppError,
    config::AppState,
    models::usuarios::User,
};

/// Cliente do backend já carregando o cookie de sessão do navegador.
pub struct Sessao(pub BackendClient);

impl<S> FromRequestParts<S> for Sessao
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let cookie = cabecalho_cookie(&CookieJar::from_headers(&parts.headers));
        Ok(Sessao(app_state.backend.com_sessao(cookie)))
    }
}

fn cabecalho_cookie(jar: &CookieJar) -> Option<String> {
    let pares: Vec<String> = jar
        .iter()
        .map(|c| format!("{}={}", c.name(), c.value()))
        .collect();
    if pares.is_empty() {
        None
    } else {
        Some(pares.join("; "))
    }
}

/// O usuário da sessão, resolvido via `/api/user` uma vez e guardado em cache.
pub struct AuthenticatedUser {
    pub user: User,
    pub client: BackendClient,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let Sessao(client) = Sessao::from_request_parts(parts, state).await?;

        let user = app_state.sessoes.resolver(&client).await?;
        Ok(AuthenticatedUser { user, client })
    }
}

/// Cache de "quem é o usuário desta sessão", chaveado pelo cookie de sessão.
/// Entradas expiram após `ttl` e o total fica limitado a `capacidade`.
pub struct SessaoCache {
    usuarios: Cache<String, User>,
    repo: UserRepository,
}

impl SessaoCache {
    pub fn new(repo: UserRepository, capacidade: u64, ttl: Duration) -> Self {
        let usuarios = Cache::builder()
            .max_capacity(capacidade)
            .time_to_live(ttl)
            .build();
        Self { usuarios, repo }
    }

    pub async fn resolver(&self, client: &BackendClient) -> Result<User, AppError> {
        let chave = client.chave_sessao().ok_or(AppError::NaoAutenticado)?.to_string();

        if let Some(user) = self.usuarios.get(&chave).await {
            return Ok(user);
        }

        let user = self.repo.current(client).await?;
        tracing::info!("Sessão resolvida para {} ({:?})", user.email, user.profile);
        self.usuarios.insert(chave, user.clone()).await;
        Ok(user)
    }

    /// Esquece a sessão (ex.: o backend respondeu 401).
    pub async fn esquecer(&self, client: &BackendClient) {
        if let Some(chave) = client.chave_sessao() {
            self.usuarios.invalidate(chave).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::testing::{cliente, MockTransport};
    use crate::api::Metodo;
    use serde_json::json;

    fn cache() -> SessaoCache {
        SessaoCache::new(UserRepository::new(), 100, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn current_user_is_fetched_once_per_session() {
        let mock = MockTransport::new();
        mock.ok(
            Metodo::Get,
            "/api/user",
            json!({"success": true, "user": {"id": 1, "name": "Ana", "email": "ana@x.com", "profile": "admin"}}),
        );
        let cache = cache();
        let client = cliente(&mock).com_sessao(Some("laravel_session=1".into()));

        let a = cache.resolver(&client).await.unwrap();
        let b = cache.resolver(&client).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(mock.chamadas_para(Metodo::Get, "/api/user").len(), 1);
    }

    #[tokio::test]
    async fn unrelated_cookie_changes_reuse_the_same_entry() {
        let mock = MockTransport::new();
        mock.ok(Metodo::Get, "/api/user", json!({"success": true, "user": {"id": 1, "name": "Ana"}}));
        let cache = cache();
        let base = cliente(&mock);

        for ga in 0..5 {
            let client = base.com_sessao(Some(format!("_ga={ga}; laravel_session=1; XSRF-TOKEN=t{ga}")));
            cache.resolver(&client).await.unwrap();
        }

        assert_eq!(mock.chamadas_para(Metodo::Get, "/api/user").len(), 1);
        cache.usuarios.run_pending_tasks().await;
        assert_eq!(cache.usuarios.entry_count(), 1);
    }

    #[tokio::test]
    async fn cache_stays_within_capacity() {
        let mock = MockTransport::new();
        mock.ok(Metodo::Get, "/api/user", json!({"success": true, "user": {"id": 1, "name": "Ana"}}));
        let cache = SessaoCache::new(UserRepository::new(), 2, Duration::from_secs(60));
        let base = cliente(&mock);

        for sid in 0..20 {
            let client = base.com_sessao(Some(format!("laravel_session={sid}")));
            cache.resolver(&client).await.unwrap();
        }

        cache.usuarios.run_pending_tasks().await;
        assert!(cache.usuarios.entry_count() <= 2);
    }

    #[tokio::test]
    async fn expired_entry_is_fetched_again() {
        let mock = MockTransport::new();
        mock.ok(Metodo::Get, "/api/user", json!({"success": true, "user": {"id": 1, "name": "Ana"}}));
        let cache = SessaoCache::new(UserRepository::new(), 10, Duration::from_millis(50));
        let client = cliente(&mock).com_sessao(Some("laravel_session=1".into()));

        cache.resolver(&client).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        cache.resolver(&client).await.unwrap();

        assert_eq!(mock.chamadas_para(Metodo::Get, "/api/user").len(), 2);
    }

    #[tokio::test]
    async fn no_cookie_means_not_authenticated() {
        let mock = MockTransport::new();
        let err = cache().resolver(&cliente(&mock)).await.unwrap_err();
        assert!(matches!(err, AppError::NaoAutenticado));
        assert!(mock.chamadas().is_empty());
    }
}
