//src/main.rs

use axum::{
    response::Redirect,
    routing::{delete, get, post, put},
    Router,
};
use tokio::{net::TcpListener, sync::broadcast::error::RecvError};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod api;
mod capacidades;
mod common;
mod config;
mod events;
mod handlers;
mod middleware;
mod models;
mod services;
mod store;
mod views;

use crate::config::AppState;

/// Mantém o quadro em memória em dia com os status publicados por outras telas.
fn ouvir_eventos(state: &AppState) {
    let mut rx = state.bus.assinar();
    let programacao = state.programacao_service.clone();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(evento) => programacao.sincronizar(&evento).await,
                Err(RecvError::Lagged(n)) => tracing::warn!("Sincronização do quadro perdeu {} evento(s)", n),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Configuração inválida: a aplicação não sobe.
    let app_state = AppState::new()?;
    ouvir_eventos(&app_state);

    let ativos_routes = Router::new()
        .route("/", get(handlers::ativos::arvore_page))
        .route(
            "/{tipo}/{id}",
            get(handlers::ativos::detalhes)
                .put(handlers::ativos::editar)
                .delete(handlers::ativos::excluir),
        )
        .route("/{tipo}/{id}/editar", get(handlers::ativos::formulario_edicao));

    let programacao_routes = Router::new()
        .route("/", get(handlers::programacao::programacao_page))
        .route("/quadro", get(handlers::programacao::quadro_fragmento))
        .route("/programar", post(handlers::programacao::programar))
        .route("/prioridade", post(handlers::programacao::prioridade))
        .route("/desprogramar/{id}", post(handlers::programacao::desprogramar));

    let pmp_routes = Router::new()
        .route("/", get(handlers::pmp::painel_page))
        .route("/gerar-os-pendentes", post(handlers::pmp::gerar_os_pendentes))
        .route("/equipamento/{id}", get(handlers::pmp::pmp_page))
        .route("/equipamento/{id}/pmps", post(handlers::pmp::salvar_pmp))
        .route("/equipamento/{id}/atividades", post(handlers::pmp::criar_atividade))
        .route(
            "/equipamento/{id}/atividades/{atividade_id}",
            put(handlers::pmp::editar_atividade).delete(handlers::pmp::excluir_atividade),
        )
        .route(
            "/equipamento/{id}/atividades/{atividade_id}/copiar",
            post(handlers::pmp::copiar_atividade),
        )
        .route(
            "/equipamento/{id}/atividades/{atividade_id}/alternar",
            post(handlers::pmp::alternar_atividade),
        );

    let execucao_routes = Router::new()
        .route("/calcular", post(handlers::execucao::calcular))
        .route("/materiais/{id}", delete(handlers::execucao::excluir_material))
        .route(
            "/{os_id}",
            get(handlers::execucao::execucao_page).post(handlers::execucao::salvar),
        )
        .route("/{os_id}/encerrar", post(handlers::execucao::encerrar));

    let qrcode_routes = Router::new()
        .route("/", get(handlers::qrcodes::qrcodes_page))
        .route("/pdf", get(handlers::qrcodes::pdf))
        .route("/scanner", get(handlers::qrcodes::scanner_page))
        .route("/ler", post(handlers::qrcodes::ler));

    let usuario_routes = Router::new()
        .route("/", get(handlers::usuarios::usuarios_page).post(handlers::usuarios::criar))
        .route(
            "/{id}",
            put(handlers::usuarios::atualizar).delete(handlers::usuarios::excluir),
        );

    let bind_addr = app_state.bind_addr.clone();

    let app = Router::new()
        .route("/", get(|| async { Redirect::to("/programacao") }))
        .route("/health", get(|| async { "OK" }))
        .route("/eventos", get(handlers::eventos::eventos))
        .nest("/ativos", ativos_routes)
        .nest("/programacao", programacao_routes)
        .nest("/pmp", pmp_routes)
        .nest("/execucao", execucao_routes)
        .nest("/qrcodes", qrcode_routes)
        .nest("/usuarios", usuario_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
