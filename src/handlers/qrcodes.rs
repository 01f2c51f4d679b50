// src/handlers/qrcodes.rs

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{finalizar_acao, finalizar_pagina, AcaoResult, PaginaErro, PaginaResult, RespostaAcao},
    middleware::auth::Sessao,
    services::qrcode_service::FiltroQr,
    views::qrcode as view,
};

/// GET /qrcodes
pub async fn qrcodes_page(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Query(filtro): Query<FiltroQr>,
) -> PaginaResult {
    let resultado = async {
        let (user, lista) = tokio::try_join!(
            state.sessoes.resolver(&client),
            state.qrcode_service.listar(&client, &filtro),
        )?;
        Ok::<_, AppError>(view::qrcodes_page(&user, &lista, &filtro))
    }
    .await;
    finalizar_pagina(&state, &client, resultado, "/qrcodes".into()).await
}

/// GET /qrcodes/pdf
pub async fn pdf(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Query(filtro): Query<FiltroQr>,
) -> Result<Response, PaginaErro> {
    let resultado = state.qrcode_service.exportar_pdf(&client, &filtro).await;
    let bytes = finalizar_pagina(&state, &client, resultado, "/qrcodes".into()).await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf"),
        (header::CONTENT_DISPOSITION, "attachment; filename=\"qrcodes_equipamentos.pdf\""),
    ];
    Ok((headers, bytes).into_response())
}

/// GET /qrcodes/scanner
pub async fn scanner_page(State(state): State<AppState>, Sessao(client): Sessao) -> PaginaResult {
    let resultado = state.sessoes.resolver(&client).await.map(|user| view::scanner_page(&user));
    finalizar_pagina(&state, &client, resultado, "/qrcodes/scanner".into()).await
}

#[derive(Debug, Deserialize)]
pub struct LeituraPayload {
    texto: String,
}

/// POST /qrcodes/ler
pub async fn ler(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Json(payload): Json<LeituraPayload>,
) -> AcaoResult {
    let resultado = async {
        let leitura = state.qrcode_service.ler(&client, &payload.texto).await?;
        RespostaAcao::ok(format!("Equipamento {} encontrado.", leitura.equipamento.tag))
            .com_html(view::fragmento_leitura(&leitura))
            .com_dados(&leitura)
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}
