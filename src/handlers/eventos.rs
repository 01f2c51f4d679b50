// src/handlers/eventos.rs

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{stream, Stream};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    api::BackendClient,
    config::AppState,
    events::EventoOs,
    middleware::auth::AuthenticatedUser,
    services::programacao_service::ProgramacaoService,
};

/// Traduz o canal de eventos para SSE, só com as OS que estão no quadro da sessão.
/// Ouvinte atrasado pula o que perdeu.
pub fn stream_de_eventos(
    rx: broadcast::Receiver<EventoOs>,
    programacao: ProgramacaoService,
    client: BackendClient,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold((rx, programacao, client), |(mut rx, programacao, client)| async move {
        loop {
            match rx.recv().await {
                Ok(evento) => {
                    if !programacao.visivel(&client, evento.os_id()).await {
                        continue;
                    }
                    match Event::default().event(evento.nome()).json_data(&evento) {
                        Ok(sse) => return Some((Ok(sse), (rx, programacao, client))),
                        Err(e) => tracing::warn!("Evento da OS #{} não serializado: {}", evento.os_id(), e),
                    }
                }
                Err(RecvError::Lagged(n)) => tracing::debug!("Aba atrasada; {} evento(s) descartado(s)", n),
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

/// GET /eventos
pub async fn eventos(
    State(state): State<AppState>,
    AuthenticatedUser { user, client }: AuthenticatedUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("{} abriu uma aba ouvindo eventos de OS", user.email);
    let stream = stream_de_eventos(state.bus.assinar(), state.programacao_service.clone(), client);
    Sse::new(stream).keep_alive(KeepAlive::default())
}
