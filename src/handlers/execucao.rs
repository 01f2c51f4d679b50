// src/handlers/execucao.rs

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::json;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{finalizar_acao, finalizar_pagina, AcaoResult, PaginaResult, RespostaAcao},
    middleware::auth::Sessao,
    models::execucao::{ExecucaoForm, MaterialForm},
    views::execucao as view,
};

fn agora() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// GET /execucao/{os_id}
pub async fn execucao_page(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path(os_id): Path<i64>,
) -> PaginaResult {
    let resultado = async {
        let (user, formulario) = tokio::try_join!(
            state.sessoes.resolver(&client),
            state.execucao_service.carregar(&client, os_id, agora()),
        )?;
        Ok::<_, AppError>(view::execucao_page(&user, &formulario))
    }
    .await;
    finalizar_pagina(&state, &client, resultado, format!("/execucao/{}", os_id)).await
}

pub async fn salvar(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path(os_id): Path<i64>,
    Json(form): Json<ExecucaoForm>,
) -> AcaoResult {
    let resultado = async {
        let (execucao, materiais) = state.execucao_service.salvar(&client, os_id, &form).await?;
        RespostaAcao::ok("Execução salva.").com_dados(&json!({"execucao": execucao, "materiais": materiais}))
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

pub async fn encerrar(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path(os_id): Path<i64>,
    Json(form): Json<ExecucaoForm>,
) -> AcaoResult {
    let resultado = async {
        let msg = state.execucao_service.encerrar(&client, os_id, form, agora()).await?;
        Ok::<_, AppError>(RespostaAcao::ok(msg))
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

/// Recalcula uma linha de material; a página só mostra os valores.
pub async fn calcular(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Json(form): Json<MaterialForm>,
) -> AcaoResult {
    let resultado = async {
        let linha = state.execucao_service.calcular(&client, &form).await?;
        RespostaAcao::ok("").com_dados(&linha)
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

pub async fn excluir_material(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path(id): Path<i64>,
) -> AcaoResult {
    let resultado = async {
        let msg = state.execucao_service.excluir_material(&client, id).await?;
        Ok::<_, AppError>(RespostaAcao::ok(msg))
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::testing::MockTransport;
    use crate::api::Metodo;
    use crate::events::EventoOs;
    use crate::handlers::testing::{estado, sessao};
    use crate::models::ordens::StatusOs;

    #[tokio::test]
    async fn loose_material_line_is_computed_without_backend() {
        let mock = MockTransport::new();
        let state = estado(&mock);
        let form: MaterialForm = serde_json::from_value(
            json!({"tipo_material": "avulso", "descricao": "Graxa", "quantidade": "2", "valor_unitario": "4,50"}),
        )
        .unwrap();

        let Json(resposta) = calcular(State(state.clone()), Sessao(sessao(&state)), Json(form)).await.unwrap();
        let dados = resposta.dados.unwrap();
        assert_eq!(dados["valor_total"], json!(9.0));
        assert!(mock.chamadas().is_empty());
    }

    #[tokio::test]
    async fn closing_an_order_notifies_open_tabs() {
        let mock = MockTransport::new();
        mock.ok(
            Metodo::Post,
            "/api/execucoes-os",
            json!({"success": true, "execucao": {"id": 11, "os_id": 5}}),
        );
        mock.ok(Metodo::Post, "/api/ordens-servico/5/encerrar", json!({"success": true}));
        let state = estado(&mock);
        let mut rx = state.bus.assinar();
        let form: ExecucaoForm =
            serde_json::from_value(json!({"data_inicio": "2025-03-10T08:00", "materiais": []})).unwrap();

        let Json(resposta) = encerrar(State(state.clone()), Sessao(sessao(&state)), Path(5), Json(form))
            .await
            .unwrap();
        assert_eq!(resposta.message, "OS #5 encerrada com sucesso.");
        match rx.recv().await.unwrap() {
            EventoOs::StatusAlterado { os_id, status, .. } => {
                assert_eq!(os_id, 5);
                assert_eq!(status, StatusOs::Concluida);
            }
            outro => panic!("evento inesperado: {outro:?}"),
        }
    }
}
