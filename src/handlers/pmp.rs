// src/handlers/pmp.rs

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{finalizar_acao, finalizar_pagina, AcaoResult, PaginaResult, RespostaAcao},
    middleware::auth::Sessao,
    models::plano::{AtividadePlano, PmpForm},
    views::pmp as view,
};

/// GET /pmp
pub async fn painel_page(State(state): State<AppState>, Sessao(client): Sessao) -> PaginaResult {
    let resultado = async {
        let (user, (painel, equipamentos)) = tokio::try_join!(
            state.sessoes.resolver(&client),
            state.pmp_service.painel(&client),
        )?;
        Ok::<_, AppError>(view::painel_page(&user, painel.as_ref(), &equipamentos))
    }
    .await;
    finalizar_pagina(&state, &client, resultado, "/pmp".into()).await
}

/// GET /pmp/equipamento/{id}
pub async fn pmp_page(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path(equipamento_id): Path<i64>,
) -> PaginaResult {
    let resultado = async {
        let (user, (equipamento, grupos)) = tokio::try_join!(
            state.sessoes.resolver(&client),
            state.pmp_service.carregar(&client, equipamento_id),
        )?;
        Ok::<_, AppError>(view::pmp_page(&user, &equipamento, &grupos))
    }
    .await;
    finalizar_pagina(&state, &client, resultado, format!("/pmp/equipamento/{}", equipamento_id)).await
}

#[derive(Debug, Deserialize)]
pub struct SalvarPmpPayload {
    pmp_id: Option<i64>,
    #[serde(flatten)]
    form: PmpForm,
}

pub async fn salvar_pmp(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path(equipamento_id): Path<i64>,
    Json(payload): Json<SalvarPmpPayload>,
) -> AcaoResult {
    let resultado = async {
        let pmp = state
            .pmp_service
            .salvar_pmp(&client, equipamento_id, payload.pmp_id, &payload.form)
            .await?;
        RespostaAcao::ok(format!("PMP {} salva.", pmp.codigo)).com_dados(&pmp)
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

pub async fn criar_atividade(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path(equipamento_id): Path<i64>,
    Json(atividade): Json<AtividadePlano>,
) -> AcaoResult {
    let resultado = async {
        let criada = state.pmp_service.criar_atividade(&client, equipamento_id, atividade).await?;
        RespostaAcao::ok("Atividade criada.").com_dados(&criada)
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

pub async fn editar_atividade(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path((_, id)): Path<(i64, i64)>,
    Json(atividade): Json<AtividadePlano>,
) -> AcaoResult {
    let resultado = async {
        let salva = state.pmp_service.editar_atividade(&client, id, atividade).await?;
        RespostaAcao::ok("Atividade atualizada.").com_dados(&salva)
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

pub async fn copiar_atividade(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path((equipamento_id, id)): Path<(i64, i64)>,
) -> AcaoResult {
    let resultado = async {
        let copia = state.pmp_service.copiar_atividade(&client, equipamento_id, id).await?;
        RespostaAcao::ok("Atividade copiada.").com_dados(&copia)
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

pub async fn alternar_atividade(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path((equipamento_id, id)): Path<(i64, i64)>,
) -> AcaoResult {
    let resultado = async {
        let atividade = state.pmp_service.alternar_atividade(&client, equipamento_id, id).await?;
        let msg = if atividade.status_ativo { "Atividade ativada." } else { "Atividade desativada." };
        RespostaAcao::ok(msg).com_dados(&atividade)
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

pub async fn excluir_atividade(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path((_, id)): Path<(i64, i64)>,
) -> AcaoResult {
    let resultado = async {
        let msg = state.pmp_service.excluir_atividade(&client, id).await?;
        Ok::<_, AppError>(RespostaAcao::ok(msg))
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

/// POST /pmp/gerar-os-pendentes
pub async fn gerar_os_pendentes(State(state): State<AppState>, Sessao(client): Sessao) -> AcaoResult {
    let resultado = async {
        let geracao = state.pmp_service.gerar_os_pendentes(&client).await?;
        let msg = geracao
            .message
            .clone()
            .unwrap_or_else(|| format!("{} OS preventiva(s) gerada(s).", geracao.os_geradas));
        RespostaAcao::ok(msg).com_dados(&geracao)
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}
