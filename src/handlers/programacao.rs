// src/handlers/programacao.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    api::BackendClient,
    common::{error::AppError, format::normalizar_data},
    config::AppState,
    handlers::{finalizar_acao, finalizar_pagina, AcaoResult, PaginaResult, RespostaAcao},
    middleware::auth::Sessao,
    models::ordens::{MoverRaiaPayload, SoltarCardPayload},
    views::programacao as view,
};

#[derive(Debug, Default, Deserialize)]
pub struct SemanaQuery {
    semana: Option<String>,
}

impl SemanaQuery {
    /// Semana pedida na URL; sem parâmetro, a semana corrente.
    fn referencia(&self) -> Result<NaiveDate, AppError> {
        match self.semana.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(texto) => normalizar_data(texto),
            None => Ok(chrono::Local::now().date_naive()),
        }
    }

    fn url(&self) -> String {
        match &self.semana {
            Some(s) => format!("/programacao?semana={}", s),
            None => "/programacao".into(),
        }
    }
}

pub async fn programacao_page(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Query(query): Query<SemanaQuery>,
) -> PaginaResult {
    let resultado = async {
        let referencia = query.referencia()?;
        let (user, _) = tokio::try_join!(
            state.sessoes.resolver(&client),
            state.programacao_service.carregar(&client),
        )?;
        let quadro = state.programacao_service.quadro(&client, referencia).await?;
        Ok::<_, AppError>(view::programacao_page(&user, &quadro))
    }
    .await;
    finalizar_pagina(&state, &client, resultado, query.url()).await
}

/// Só o fragmento do quadro, usado na navegação entre semanas e após eventos.
pub async fn quadro_fragmento(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Query(query): Query<SemanaQuery>,
) -> AcaoResult {
    let resultado = async {
        let referencia = query.referencia()?;
        state.programacao_service.carregar(&client).await?;
        let quadro = state.programacao_service.quadro(&client, referencia).await?;
        Ok::<_, AppError>(RespostaAcao::ok("").com_html(view::render_quadro(&quadro)))
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

async fn com_quadro(
    state: &AppState,
    client: &BackendClient,
    query: &SemanaQuery,
    msg: String,
) -> Result<RespostaAcao, AppError> {
    let quadro = state.programacao_service.quadro(client, query.referencia()?).await?;
    Ok(RespostaAcao::ok(msg).com_html(view::render_quadro(&quadro)))
}

pub async fn programar(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Query(query): Query<SemanaQuery>,
    Json(payload): Json<SoltarCardPayload>,
) -> AcaoResult {
    let resultado = async {
        let msg = state.programacao_service.programar(&client, &payload).await?;
        com_quadro(&state, &client, &query, msg).await
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

pub async fn desprogramar(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path(os_id): Path<i64>,
    Query(query): Query<SemanaQuery>,
) -> AcaoResult {
    let resultado = async {
        let msg = state.programacao_service.desprogramar(&client, os_id).await?;
        com_quadro(&state, &client, &query, msg).await
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

pub async fn prioridade(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Query(query): Query<SemanaQuery>,
    Json(payload): Json<MoverRaiaPayload>,
) -> AcaoResult {
    let resultado = async {
        let msg = state.programacao_service.alterar_prioridade(&client, &payload).await?;
        com_quadro(&state, &client, &query, msg).await
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}
