// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::usuarios::{Perfil, User},
};

/// 1. O Trait que define uma capacidade de perfil
pub trait PerfilDef: Send + Sync + 'static {
    fn permitidos() -> &'static [Perfil];
    fn acao() -> &'static str;
}

/// Checagem usada tanto pelo extractor quanto pelos serviços.
/// Só esconde/recusa no frontend; quem decide de verdade é o backend.
pub fn exigir<T: PerfilDef>(user: &User) -> Result<(), AppError> {
    if T::permitidos().contains(&user.profile) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Seu perfil ({}) não permite {}.",
            user.profile.rotulo(),
            T::acao()
        )))
    }
}

pub fn pode<T: PerfilDef>(user: &User) -> bool {
    T::permitidos().contains(&user.profile)
}

/// 2. O Extractor (Guardião)
pub struct RequirePerfil<T> {
    pub sessao: AuthenticatedUser,
    _marker: PhantomData<T>,
}

impl<T, S> FromRequestParts<S> for RequirePerfil<T>
where
    T: PerfilDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessao = AuthenticatedUser::from_request_parts(parts, state).await?;
        Self::verificar(sessao)
    }
}

impl<T: PerfilDef> RequirePerfil<T> {
    pub fn verificar(sessao: AuthenticatedUser) -> Result<Self, AppError> {
        exigir::<T>(&sessao.user)?;
        Ok(RequirePerfil { sessao, _marker: PhantomData })
    }
}

// ---
// DEFINIÇÃO DAS CAPACIDADES (TIPOS)
// ---

pub struct ExcluirAtivos;
impl PerfilDef for ExcluirAtivos {
    fn permitidos() -> &'static [Perfil] { &[Perfil::Admin, Perfil::Master] }
    fn acao() -> &'static str { "excluir filiais, setores ou equipamentos" }
}

pub struct GerenciarUsuarios;
impl PerfilDef for GerenciarUsuarios {
    fn permitidos() -> &'static [Perfil] { &[Perfil::Master] }
    fn acao() -> &'static str { "gerenciar usuários" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(profile: Perfil) -> User {
        User { id: 1, profile, ..Default::default() }
    }

    #[test]
    fn only_admin_and_master_delete_assets() {
        assert!(exigir::<ExcluirAtivos>(&user(Perfil::User)).is_err());
        assert!(exigir::<ExcluirAtivos>(&user(Perfil::Admin)).is_ok());
        assert!(exigir::<ExcluirAtivos>(&user(Perfil::Master)).is_ok());
    }

    #[test]
    fn only_master_manages_users() {
        assert!(!pode::<GerenciarUsuarios>(&user(Perfil::Admin)));
        assert!(pode::<GerenciarUsuarios>(&user(Perfil::Master)));
    }
}
