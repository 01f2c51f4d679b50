// src/handlers/usuarios.rs

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{finalizar_acao, finalizar_pagina, AcaoResult, PaginaResult, RespostaAcao},
    middleware::{
        auth::{AuthenticatedUser, Sessao},
        rbac::{pode, GerenciarUsuarios, RequirePerfil},
    },
    models::usuarios::UserPayload,
    views::usuarios as view,
};

/// GET /usuarios: todos os perfis veem a lista, só `master` altera.
pub async fn usuarios_page(State(state): State<AppState>, Sessao(client): Sessao) -> PaginaResult {
    let resultado = async {
        let (user, usuarios) = tokio::try_join!(
            state.sessoes.resolver(&client),
            state.user_service.listar(&client),
        )?;
        Ok::<_, AppError>(view::usuarios_page(&user, &usuarios, pode::<GerenciarUsuarios>(&user)))
    }
    .await;
    finalizar_pagina(&state, &client, resultado, "/usuarios".into()).await
}

pub async fn criar(
    State(state): State<AppState>,
    guard: RequirePerfil<GerenciarUsuarios>,
    Json(payload): Json<UserPayload>,
) -> AcaoResult {
    let AuthenticatedUser { user, client } = guard.sessao;
    let resultado = async {
        let criado = state.user_service.criar(&client, &user, payload).await?;
        RespostaAcao::ok(format!("Usuário {} criado com sucesso.", criado.name)).com_dados(&criado)
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

pub async fn atualizar(
    State(state): State<AppState>,
    guard: RequirePerfil<GerenciarUsuarios>,
    Path(id): Path<i64>,
    Json(payload): Json<UserPayload>,
) -> AcaoResult {
    let AuthenticatedUser { user, client } = guard.sessao;
    let resultado = async {
        let salvo = state.user_service.atualizar(&client, &user, id, payload).await?;
        if salvo.id == user.id {
            // Perfil ou nome próprios mudaram: o cache tem de refletir.
            state.sessoes.esquecer(&client).await;
        }
        RespostaAcao::ok("Usuário atualizado com sucesso.").com_dados(&salvo)
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

pub async fn excluir(
    State(state): State<AppState>,
    guard: RequirePerfil<GerenciarUsuarios>,
    Path(id): Path<i64>,
) -> AcaoResult {
    let AuthenticatedUser { user, client } = guard.sessao;
    let resultado = async {
        let msg = state.user_service.excluir(&client, &user, id).await?;
        Ok::<_, AppError>(RespostaAcao::ok(msg))
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}
