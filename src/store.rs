// src/store.rs

use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::{
    common::error::AppError,
    models::{
        ordens::{OrdemServico, Prioridade, StatusOs},
        usuarios::User,
    },
};

/// Tudo que o quadro de programação pode mudar numa OS.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutacao {
    Programar {
        os_id: i64,
        data: NaiveDate,
        responsavel: String,
    },
    Desprogramar {
        os_id: i64,
    },
    AlterarPrioridade {
        os_id: i64,
        prioridade: Prioridade,
    },
    AlterarStatus {
        os_id: i64,
        status: StatusOs,
    },
}

impl Mutacao {
    pub fn os_id(&self) -> i64 {
        match self {
            Mutacao::Programar { os_id, .. }
            | Mutacao::Desprogramar { os_id }
            | Mutacao::AlterarPrioridade { os_id, .. }
            | Mutacao::AlterarStatus { os_id, .. } => *os_id,
        }
    }

    fn aplicar_em(&self, os: &mut OrdemServico) {
        match self {
            Mutacao::Programar { data, responsavel, .. } => {
                os.data_programada = Some(data.format("%Y-%m-%d").to_string());
                os.usuario_responsavel = Some(responsavel.clone());
                os.status = StatusOs::Programada;
            }
            Mutacao::Desprogramar { .. } => {
                os.data_programada = None;
                os.usuario_responsavel = None;
                os.status = StatusOs::Aberta;
            }
            Mutacao::AlterarPrioridade { prioridade, .. } => {
                os.prioridade = Some(prioridade.as_str().to_string());
            }
            Mutacao::AlterarStatus { status, .. } => {
                os.status = *status;
            }
        }
    }
}

/// Ficha para reverter uma mutação otimista.
#[derive(Debug, Clone)]
#[must_use = "uma mutação otimista precisa ser confirmada ou desfeita"]
pub struct Desfazer {
    anterior: OrdemServico,
}

impl Desfazer {
    pub fn os_id(&self) -> i64 {
        self.anterior.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct EstadoProgramacao {
    pub ordens: Vec<OrdemServico>,
    pub tecnicos: Vec<User>,
    pub versao: u64,
}

/// Estado do quadro. `aplicar` é a única porta de escrita em uma OS.
#[derive(Default)]
pub struct ProgramacaoStore {
    estado: RwLock<EstadoProgramacao>,
}

impl ProgramacaoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn substituir(&self, ordens: Vec<OrdemServico>, tecnicos: Vec<User>) {
        let mut estado = self.estado.write().await;
        estado.ordens = ordens;
        estado.tecnicos = tecnicos;
        estado.versao += 1;
    }

    pub async fn snapshot(&self) -> EstadoProgramacao {
        self.estado.read().await.clone()
    }

    pub async fn ordem(&self, os_id: i64) -> Option<OrdemServico> {
        self.estado
            .read()
            .await
            .ordens
            .iter()
            .find(|o| o.id == os_id)
            .cloned()
    }

    pub async fn aplicar(&self, mutacao: &Mutacao) -> Result<Desfazer, AppError> {
        let mut estado = self.estado.write().await;
        let os = estado
            .ordens
            .iter_mut()
            .find(|o| o.id == mutacao.os_id())
            .ok_or_else(|| AppError::ResourceNotFound(format!("OS #{}", mutacao.os_id())))?;

        let anterior = os.clone();
        mutacao.aplicar_em(os);
        estado.versao += 1;
        Ok(Desfazer { anterior })
    }

    /// Volta a OS ao que era antes da mutação (última escrita vence).
    pub async fn desfazer(&self, desfazer: Desfazer) {
        let mut estado = self.estado.write().await;
        if let Some(os) = estado.ordens.iter_mut().find(|o| o.id == desfazer.os_id()) {
            *os = desfazer.anterior;
            estado.versao += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(id: i64) -> OrdemServico {
        OrdemServico {
            id,
            descricao: format!("OS {id}"),
            prioridade: Some("alta".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn apply_then_undo_restores_previous_order() {
        let store = ProgramacaoStore::new();
        store.substituir(vec![os(1), os(2)], vec![]).await;

        let data = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let desfazer = store
            .aplicar(&Mutacao::Programar { os_id: 1, data, responsavel: "Ana".into() })
            .await
            .unwrap();

        let programada = store.ordem(1).await.unwrap();
        assert_eq!(programada.status, StatusOs::Programada);
        assert_eq!(programada.data_programada.as_deref(), Some("2025-03-10"));

        store.desfazer(desfazer).await;
        assert_eq!(store.ordem(1).await.unwrap(), os(1));
    }

    #[tokio::test]
    async fn unschedule_is_idempotent() {
        let store = ProgramacaoStore::new();
        store.substituir(vec![os(5)], vec![]).await;
        let data = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        let _ = store
            .aplicar(&Mutacao::Programar { os_id: 5, data, responsavel: "Ana".into() })
            .await
            .unwrap();

        let _ = store.aplicar(&Mutacao::Desprogramar { os_id: 5 }).await.unwrap();
        let uma_vez = store.ordem(5).await.unwrap();
        let _ = store.aplicar(&Mutacao::Desprogramar { os_id: 5 }).await.unwrap();
        let duas_vezes = store.ordem(5).await.unwrap();

        assert_eq!(uma_vez, duas_vezes);
        assert_eq!(duas_vezes.status, StatusOs::Aberta);
        assert!(duas_vezes.data_programada.is_none());
        assert!(duas_vezes.usuario_responsavel.is_none());
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let store = ProgramacaoStore::new();
        let err = store.aplicar(&Mutacao::Desprogramar { os_id: 99 }).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
    }
}
