// src/events.rs

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::ordens::StatusOs;

/// Avisos entre abas/páginas abertas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum EventoOs {
    StatusAlterado { id: Uuid, os_id: i64, status: StatusOs },
    Programada { id: Uuid, os_id: i64 },
    Desprogramada { id: Uuid, os_id: i64 },
}

impl EventoOs {
    pub fn status_alterado(os_id: i64, status: StatusOs) -> Self {
        EventoOs::StatusAlterado { id: Uuid::new_v4(), os_id, status }
    }

    pub fn programada(os_id: i64) -> Self {
        EventoOs::Programada { id: Uuid::new_v4(), os_id }
    }

    pub fn desprogramada(os_id: i64) -> Self {
        EventoOs::Desprogramada { id: Uuid::new_v4(), os_id }
    }

    pub fn os_id(&self) -> i64 {
        match self {
            EventoOs::StatusAlterado { os_id, .. }
            | EventoOs::Programada { os_id, .. }
            | EventoOs::Desprogramada { os_id, .. } => *os_id,
        }
    }

    /// Nome do evento no stream SSE.
    pub fn nome(&self) -> &'static str {
        match self {
            EventoOs::StatusAlterado { .. } => "os_status",
            EventoOs::Programada { .. } => "os_programada",
            EventoOs::Desprogramada { .. } => "os_desprogramada",
        }
    }
}

/// Pub-sub de eventos de OS. Entrega "fire-and-forget": quem não está ouvindo perde.
#[derive(Clone)]
pub struct StatusBus {
    tx: broadcast::Sender<EventoOs>,
}

impl StatusBus {
    pub fn new(capacidade: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacidade);
        Self { tx }
    }

    pub fn publicar(&self, evento: EventoOs) {
        match self.tx.send(evento) {
            Ok(n) => tracing::debug!("Evento de OS entregue a {} ouvinte(s)", n),
            Err(broadcast::error::SendError(evento)) => {
                tracing::debug!("Nenhuma aba ouvindo; evento da OS #{} descartado", evento.os_id())
            }
        }
    }

    pub fn assinar(&self) -> broadcast::Receiver<EventoOs> {
        self.tx.subscribe()
    }
}

impl Default for StatusBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_receives_the_event() {
        let bus = StatusBus::default();
        let mut a = bus.assinar();
        let mut b = bus.assinar();

        bus.publicar(EventoOs::status_alterado(12, StatusOs::Concluida));

        for rx in [&mut a, &mut b] {
            match rx.recv().await.unwrap() {
                EventoOs::StatusAlterado { os_id, status, .. } => {
                    assert_eq!(os_id, 12);
                    assert_eq!(status, StatusOs::Concluida);
                }
                outro => panic!("evento inesperado: {outro:?}"),
            }
        }
    }

    #[test]
    fn publishing_without_listeners_is_harmless() {
        let bus = StatusBus::default();
        bus.publicar(EventoOs::programada(1));
    }

    #[test]
    fn event_serializes_with_tag() {
        let json = serde_json::to_value(EventoOs::status_alterado(3, StatusOs::Concluida)).unwrap();
        assert_eq!(json["tipo"], "status_alterado");
        assert_eq!(json["status"], "concluida");
    }
}
