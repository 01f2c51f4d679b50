// src/handlers/ativos.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{finalizar_acao, finalizar_pagina, AcaoResult, PaginaResult, RespostaAcao},
    middleware::{
        auth::{AuthenticatedUser, Sessao},
        rbac::{pode, ExcluirAtivos},
    },
    models::ativos::{EdicaoNo, TipoNo},
    views::arvore as view,
};

pub async fn arvore_page(State(state): State<AppState>, Sessao(client): Sessao) -> PaginaResult {
    let resultado = async {
        let user = state.sessoes.resolver(&client).await?;
        let arvore = state.arvore_service.carregar(&client).await?;
        Ok::<_, AppError>(view::arvore_page(&user, &arvore, pode::<ExcluirAtivos>(&user)))
    }
    .await;
    finalizar_pagina(&state, &client, resultado, "/ativos".into()).await
}

pub async fn detalhes(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path((tipo, id)): Path<(TipoNo, i64)>,
) -> AcaoResult {
    let resultado = async {
        let detalhe = state.arvore_service.detalhes(&client, tipo, id).await?;
        Ok::<_, AppError>(RespostaAcao::ok("").com_html(view::fragmento_detalhes(&detalhe)))
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

pub async fn formulario_edicao(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path((tipo, id)): Path<(TipoNo, i64)>,
) -> AcaoResult {
    let resultado = async {
        let (filiais, setores, equipamentos) = state.arvore_service.carregar_listas(&client).await?;
        let html = view::fragmento_edicao(tipo, id, &filiais, &setores, &equipamentos)
            .ok_or_else(|| AppError::ResourceNotFound(format!("{} #{}", tipo.rotulo(), id)))?;
        Ok::<_, AppError>(RespostaAcao::ok("").com_html(html))
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

pub async fn editar(
    State(state): State<AppState>,
    Sessao(client): Sessao,
    Path((tipo, id)): Path<(TipoNo, i64)>,
    Json(edicao): Json<EdicaoNo>,
) -> AcaoResult {
    let resultado = async {
        if edicao.tipo() != tipo {
            return Err(AppError::RegraNegocio("O formulário não corresponde ao item editado.".into()));
        }
        let user = state.sessoes.resolver(&client).await?;
        let msg = state.arvore_service.editar(&client, id, &edicao).await?;
        let arvore = state.arvore_service.carregar(&client).await?;
        Ok::<_, AppError>(RespostaAcao::ok(msg).com_html(view::render_arvore(&arvore, pode::<ExcluirAtivos>(&user))))
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

#[derive(Debug, Deserialize)]
pub struct ExclusaoQuery {
    #[serde(default)]
    confirmar: bool,
}

pub async fn excluir(
    State(state): State<AppState>,
    sessao: AuthenticatedUser,
    Path((tipo, id)): Path<(TipoNo, i64)>,
    Query(query): Query<ExclusaoQuery>,
) -> AcaoResult {
    let AuthenticatedUser { user, client } = sessao;
    let resultado = async {
        let msg = state
            .arvore_service
            .excluir(&client, &user, tipo, id, query.confirmar)
            .await?;
        let arvore = state.arvore_service.carregar(&client).await?;
        Ok::<_, AppError>(RespostaAcao::ok(msg).com_html(view::render_arvore(&arvore, true)))
    }
    .await;
    finalizar_acao(&state, &client, resultado).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::testing::MockTransport;
    use crate::api::Metodo;
    use crate::handlers::testing::{estado, sessao};
    use crate::models::usuarios::{Perfil, User};
    use serde_json::json;

    #[tokio::test]
    async fn cascade_delete_asks_then_succeeds() {
        let mock = MockTransport::new();
        mock.ok(Metodo::Delete, "/api/setores/3", json!({"success": true, "message": "Setor excluído"}));
        mock.ok(Metodo::Get, "/api/filiais", json!({"success": true, "filiais": []}));
        mock.ok(Metodo::Get, "/api/setores", json!({"success": true, "setores": []}));
        mock.ok(Metodo::Get, "/api/equipamentos", json!({"success": true, "equipamentos": []}));
        let state = estado(&mock);
        let admin = User { id: 1, profile: Perfil::Admin, ..Default::default() };

        let primeira = excluir(
            State(state.clone()),
            AuthenticatedUser { user: admin.clone(), client: sessao(&state) },
            Path((TipoNo::Setor, 3)),
            Query(ExclusaoQuery { confirmar: false }),
        )
        .await
        .unwrap_err();
        assert!(matches!(primeira, AppError::ConfirmacaoNecessaria(_)));

        let Json(resposta) = excluir(
            State(state.clone()),
            AuthenticatedUser { user: admin, client: sessao(&state) },
            Path((TipoNo::Setor, 3)),
            Query(ExclusaoQuery { confirmar: true }),
        )
        .await
        .unwrap();
        assert_eq!(resposta.message, "Setor excluído");
        assert!(resposta.html.unwrap().contains("Nenhuma filial"));
    }

    #[tokio::test]
    async fn edit_rejects_mismatched_node_type() {
        let mock = MockTransport::new();
        let state = estado(&mock);
        let edicao: EdicaoNo =
            serde_json::from_value(json!({"tipo": "setor", "tag": "S03", "descricao": "Utilidades", "filial_id": 1})).unwrap();

        let err = editar(State(state.clone()), Sessao(sessao(&state)), Path((TipoNo::Filial, 3)), Json(edicao))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RegraNegocio(_)));
        assert!(mock.chamadas().is_empty());
    }
}
