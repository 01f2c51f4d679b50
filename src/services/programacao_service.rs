// src/services/programacao_service.rs

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use moka::future::Cache;
use serde::Serialize;
use validator::Validate;

use crate::{
    api::{BackendClient, OrdemRepository, UserRepository},
    common::{error::AppError, format::formatar_data_br, format::normalizar_data},
    events::{EventoOs, StatusBus},
    models::{
        ordens::{MoverRaiaPayload, OrdemServico, Prioridade, ProgramarPayload, SoltarCardPayload, StatusOs},
        usuarios::User,
    },
    store::{EstadoProgramacao, Mutacao, ProgramacaoStore},
};

/// Status pedidos ao backend para montar o quadro.
pub const STATUS_QUADRO: &str = "aberta,programada,em_andamento,concluida";

// =============================================================================
//  REGRAS DO QUADRO (puras)
// =============================================================================

/// Raia de uma OS ainda não programada.
///
/// Toda OS `aberta` com `pmp_id` vai para a raia preventiva e para nenhuma
/// outra, tenha ou não responsável ou data. As demais `aberta` ficam na raia da
/// prioridade enquanto não tiverem data; com data, aparecem na grade (célula do
/// técnico ou "sem técnico"). Prioridade ausente ou desconhecida cai em "média".
pub fn raia_da_ordem(os: &OrdemServico) -> Option<Prioridade> {
    if os.status != StatusOs::Aberta {
        return None;
    }
    if os.pmp_id.is_some() {
        return Some(Prioridade::Preventiva);
    }
    if os.dia_programado().is_some() {
        return None;
    }
    Some(os.prioridade().unwrap_or(Prioridade::Media))
}

/// OS que aparece na grade semanal em vez de numa raia.
pub fn na_grade(os: &OrdemServico) -> bool {
    match os.status {
        StatusOs::Programada | StatusOs::EmAndamento | StatusOs::Concluida => true,
        StatusOs::Aberta => raia_da_ordem(os).is_none(),
        _ => false,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Raia {
    pub prioridade: Prioridade,
    pub ordens: Vec<OrdemServico>,
}

pub fn montar_raias(ordens: &[OrdemServico]) -> Vec<Raia> {
    Prioridade::TODAS
        .iter()
        .map(|&prioridade| Raia {
            prioridade,
            ordens: ordens
                .iter()
                .filter(|o| raia_da_ordem(o) == Some(prioridade))
                .cloned()
                .collect(),
        })
        .collect()
}

pub fn inicio_da_semana(data: NaiveDate) -> NaiveDate {
    data - Duration::days(i64::from(data.weekday().num_days_from_monday()))
}

/// Segunda a domingo da semana de `referencia`.
pub fn dias_da_semana(referencia: NaiveDate) -> Vec<NaiveDate> {
    let inicio = inicio_da_semana(referencia);
    (0..7).map(|i| inicio + Duration::days(i)).collect()
}

fn mesmo_tecnico(responsavel: &str, tecnico: &User) -> bool {
    responsavel.trim().to_lowercase() == tecnico.name.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize)]
pub struct Celula {
    pub data: NaiveDate,
    pub usuario_id: i64,
    pub usuario_nome: String,
    pub ordens: Vec<OrdemServico>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinhaTecnico {
    pub tecnico: User,
    pub celulas: Vec<Celula>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quadro {
    pub dias: Vec<NaiveDate>,
    pub raias: Vec<Raia>,
    pub linhas: Vec<LinhaTecnico>,
    // Programadas para alguém que não está na lista de técnicos
    pub sem_tecnico: Vec<OrdemServico>,
}

impl Quadro {
    pub fn semana_anterior(&self) -> NaiveDate {
        self.dias[0] - Duration::days(7)
    }

    pub fn proxima_semana(&self) -> NaiveDate {
        self.dias[0] + Duration::days(7)
    }
}

pub fn montar_quadro(estado: &EstadoProgramacao, referencia: NaiveDate) -> Quadro {
    let dias = dias_da_semana(referencia);

    let linhas = estado
        .tecnicos
        .iter()
        .map(|tecnico| LinhaTecnico {
            tecnico: tecnico.clone(),
            celulas: dias
                .iter()
                .map(|&dia| Celula {
                    data: dia,
                    usuario_id: tecnico.id,
                    usuario_nome: tecnico.name.clone(),
                    ordens: estado
                        .ordens
                        .iter()
                        .filter(|o| na_grade(o))
                        .filter(|o| o.dia_programado() == Some(dia))
                        .filter(|o| o.responsavel().is_some_and(|r| mesmo_tecnico(r, tecnico)))
                        .cloned()
                        .collect(),
                })
                .collect(),
        })
        .collect();

    let sem_tecnico = estado
        .ordens
        .iter()
        .filter(|o| na_grade(o))
        .filter(|o| o.dia_programado().is_some_and(|d| dias.contains(&d)))
        .filter(|o| match o.responsavel() {
            Some(r) => !estado.tecnicos.iter().any(|t| mesmo_tecnico(r, t)),
            None => true,
        })
        .cloned()
        .collect();

    Quadro {
        raias: montar_raias(&estado.ordens),
        dias,
        linhas,
        sem_tecnico,
    }
}

// =============================================================================
//  SERVIÇO
// =============================================================================

/// Quadros em memória, um por sessão do navegador.
///
/// Cada sessão enxerga só as OS que o backend lhe entregou; as mutações de uma
/// sessão nunca passam pelo quadro de outra. Quadros ociosos expiram após `ttl`.
#[derive(Clone)]
pub struct ProgramacaoService {
    repo: OrdemRepository,
    users: UserRepository,
    stores: Cache<String, Arc<ProgramacaoStore>>,
    bus: StatusBus,
}

impl ProgramacaoService {
    pub fn new(
        repo: OrdemRepository,
        users: UserRepository,
        bus: StatusBus,
        capacidade: u64,
        ttl: std::time::Duration,
    ) -> Self {
        let stores = Cache::builder()
            .max_capacity(capacidade)
            .time_to_idle(ttl)
            .build();
        Self { repo, users, stores, bus }
    }

    fn chave(client: &BackendClient) -> Result<String, AppError> {
        client
            .chave_sessao()
            .map(str::to_string)
            .ok_or(AppError::NaoAutenticado)
    }

    async fn recarregar(&self, client: &BackendClient) -> Result<Arc<ProgramacaoStore>, AppError> {
        let chave = Self::chave(client)?;
        let (ordens, tecnicos) = tokio::try_join!(
            self.repo.list_para_programacao(client, STATUS_QUADRO),
            self.users.list_tecnicos(client),
        )?;
        tracing::info!(
            "Quadro de programação: {} OS, {} técnicos",
            ordens.len(),
            tecnicos.len()
        );
        let store = self
            .stores
            .get_with(chave, async { Arc::new(ProgramacaoStore::new()) })
            .await;
        store.substituir(ordens, tecnicos).await;
        Ok(store)
    }

    /// Quadro da sessão; se expirou ou nunca foi carregado, busca de novo.
    async fn store(&self, client: &BackendClient) -> Result<Arc<ProgramacaoStore>, AppError> {
        match self.stores.get(&Self::chave(client)?).await {
            Some(store) => Ok(store),
            None => self.recarregar(client).await,
        }
    }

    /// Recarrega ordens e técnicos. Falha aqui vira a tela de "Tentar novamente".
    pub async fn carregar(&self, client: &BackendClient) -> Result<(), AppError> {
        self.recarregar(client).await.map(|_| ())
    }

    pub async fn quadro(&self, client: &BackendClient, referencia: NaiveDate) -> Result<Quadro, AppError> {
        let store = self.store(client).await?;
        Ok(montar_quadro(&store.snapshot().await, referencia))
    }

    pub async fn esquecer(&self, client: &BackendClient) {
        if let Some(chave) = client.chave_sessao() {
            self.stores.invalidate(chave).await;
        }
    }

    /// A OS está no quadro desta sessão? Sem quadro carregado, nada é visível.
    pub async fn visivel(&self, client: &BackendClient, os_id: i64) -> bool {
        let Some(chave) = client.chave_sessao() else {
            return false;
        };
        match self.stores.get(chave).await {
            Some(store) => store.ordem(os_id).await.is_some(),
            None => false,
        }
    }

    /// Soltar um card numa célula: aplica na hora, desfaz se o backend recusar.
    pub async fn programar(
        &self,
        client: &BackendClient,
        payload: &SoltarCardPayload,
    ) -> Result<String, AppError> {
        payload.validate()?;
        let data = normalizar_data(&payload.data)?;
        let tecnico = payload.usuario_nome.trim().to_string();
        if tecnico.is_empty() {
            return Err(AppError::RegraNegocio("Selecione um técnico.".into()));
        }

        let store = self.store(client).await?;
        let atual = store
            .ordem(payload.os_id)
            .await
            .ok_or_else(|| AppError::ResourceNotFound(format!("OS #{}", payload.os_id)))?;
        if matches!(atual.status, StatusOs::Concluida | StatusOs::Cancelada) {
            return Err(AppError::RegraNegocio(format!(
                "A OS #{} está {} e não pode ser programada.",
                atual.id,
                atual.status.rotulo().to_lowercase()
            )));
        }

        let desfazer = store
            .aplicar(&Mutacao::Programar {
                os_id: payload.os_id,
                data,
                responsavel: tecnico.clone(),
            })
            .await?;

        let corpo = ProgramarPayload {
            id: payload.os_id,
            data_programada: data.format("%Y-%m-%d").to_string(),
            usuario_responsavel: tecnico.clone(),
            status: StatusOs::Programada,
        };

        match self.repo.programar(client, &corpo).await {
            Ok(_) => {
                self.bus.publicar(EventoOs::programada(payload.os_id));
                tracing::info!("OS #{} programada para {} ({})", payload.os_id, corpo.data_programada, tecnico);
                Ok(format!(
                    "OS #{} programada para {} - {}",
                    payload.os_id,
                    formatar_data_br(data),
                    tecnico
                ))
            }
            Err(e) => {
                tracing::warn!("Falha ao programar OS #{}: {}. Revertendo.", payload.os_id, e);
                store.desfazer(desfazer).await;
                Err(e)
            }
        }
    }

    pub async fn desprogramar(&self, client: &BackendClient, os_id: i64) -> Result<String, AppError> {
        let store = self.store(client).await?;
        let desfazer = store.aplicar(&Mutacao::Desprogramar { os_id }).await?;

        match self.repo.desprogramar(client, os_id).await {
            Ok(msg) => {
                self.bus.publicar(EventoOs::desprogramada(os_id));
                Ok(msg.unwrap_or_else(|| format!("OS #{} desprogramada.", os_id)))
            }
            Err(e) => {
                tracing::warn!("Falha ao desprogramar OS #{}: {}. Revertendo.", os_id, e);
                store.desfazer(desfazer).await;
                Err(e)
            }
        }
    }

    /// Card arrastado de uma raia para outra.
    pub async fn alterar_prioridade(
        &self,
        client: &BackendClient,
        payload: &MoverRaiaPayload,
    ) -> Result<String, AppError> {
        let store = self.store(client).await?;
        let atual = store
            .ordem(payload.os_id)
            .await
            .ok_or_else(|| AppError::ResourceNotFound(format!("OS #{}", payload.os_id)))?;
        if atual.pmp_id.is_some() && payload.prioridade != Prioridade::Preventiva {
            return Err(AppError::RegraNegocio(
                "OS gerada por PMP permanece na raia preventiva.".into(),
            ));
        }
        if raia_da_ordem(&atual) == Some(payload.prioridade) {
            return Ok(format!("OS #{} já está em {}.", atual.id, payload.prioridade.rotulo()));
        }

        let desfazer = store
            .aplicar(&Mutacao::AlterarPrioridade {
                os_id: payload.os_id,
                prioridade: payload.prioridade,
            })
            .await?;

        match self
            .repo
            .alterar_prioridade(client, payload.os_id, payload.prioridade)
            .await
        {
            Ok(_) => Ok(format!(
                "Prioridade da OS #{} alterada para {}.",
                payload.os_id,
                payload.prioridade.rotulo()
            )),
            Err(e) => {
                tracing::warn!("Falha ao alterar prioridade da OS #{}: {}. Revertendo.", payload.os_id, e);
                store.desfazer(desfazer).await;
                Err(e)
            }
        }
    }

    /// Reflete um status alterado em outra tela nos quadros que exibem a OS.
    pub async fn sincronizar(&self, evento: &EventoOs) {
        if let EventoOs::StatusAlterado { os_id, status, .. } = evento {
            let stores: Vec<Arc<ProgramacaoStore>> = self.stores.iter().map(|(_, store)| store).collect();
            let mut alterados = 0;
            for store in stores {
                if store
                    .aplicar(&Mutacao::AlterarStatus { os_id: *os_id, status: *status })
                    .await
                    .is_ok()
                {
                    alterados += 1;
                }
            }
            tracing::debug!("OS #{} -> {}: {} quadro(s) sincronizado(s)", os_id, status.as_str(), alterados);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::testing::{cliente, MockTransport};
    use crate::api::Metodo;
    use serde_json::json;

    fn os(id: i64, prioridade: &str) -> OrdemServico {
        OrdemServico {
            id,
            descricao: format!("OS {id}"),
            prioridade: Some(prioridade.into()),
            ..Default::default()
        }
    }

    fn tecnico(id: i64, nome: &str) -> User {
        User { id, name: nome.into(), ..Default::default() }
    }

    fn novo_service() -> ProgramacaoService {
        ProgramacaoService::new(
            OrdemRepository::new(),
            UserRepository::new(),
            StatusBus::default(),
            100,
            std::time::Duration::from_secs(60),
        )
    }

    fn sessao(mock: &Arc<MockTransport>, sid: &str) -> BackendClient {
        cliente(mock).com_sessao(Some(format!("laravel_session={sid}")))
    }

    /// Serviço com o quadro da sessão "abc" já carregado.
    async fn service_com(ordens: Vec<OrdemServico>) -> ProgramacaoService {
        let store = Arc::new(ProgramacaoStore::new());
        store
            .substituir(ordens, vec![tecnico(1, "João Silva"), tecnico(2, "Maria Santos")])
            .await;
        let service = novo_service();
        service.stores.insert("abc".to_string(), store).await;
        service
    }

    async fn ordem(service: &ProgramacaoService, mock: &Arc<MockTransport>, id: i64) -> Option<OrdemServico> {
        service.store(&sessao(mock, "abc")).await.unwrap().ordem(id).await
    }

    fn soltar(os_id: i64, data: &str, nome: &str) -> SoltarCardPayload {
        SoltarCardPayload { os_id, data: data.into(), usuario_id: Some(2), usuario_nome: nome.into() }
    }

    #[test]
    fn pmp_orders_live_only_in_preventive_lane() {
        let mut com_pmp = os(1, "alta");
        com_pmp.pmp_id = Some(10);
        let raias = montar_raias(&[com_pmp, os(2, "alta"), os(3, "Média"), os(4, "???")]);

        let preventiva = raias.iter().find(|r| r.prioridade == Prioridade::Preventiva).unwrap();
        let alta = raias.iter().find(|r| r.prioridade == Prioridade::Alta).unwrap();
        let media = raias.iter().find(|r| r.prioridade == Prioridade::Media).unwrap();

        assert_eq!(preventiva.ordens.iter().map(|o| o.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(alta.ordens.iter().map(|o| o.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(media.ordens.iter().map(|o| o.id).collect::<Vec<_>>(), vec![3, 4]);
        let total: usize = raias.iter().map(|r| r.ordens.len()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn scheduled_orders_stay_out_of_lanes() {
        let mut programada = os(1, "baixa");
        programada.status = StatusOs::Programada;
        assert_eq!(raia_da_ordem(&programada), None);
        assert!(na_grade(&programada));
    }

    #[test]
    fn open_order_with_technician_keeps_its_lane() {
        let mut atribuida = os(2, "baixa");
        atribuida.usuario_responsavel = Some("Ana".into());
        assert_eq!(raia_da_ordem(&atribuida), Some(Prioridade::Baixa));
        assert!(!na_grade(&atribuida));

        let mut preventiva = os(3, "alta");
        preventiva.pmp_id = Some(3);
        preventiva.usuario_responsavel = Some("Maria Santos".into());
        preventiva.data_programada = Some("2025-03-10".into());
        assert_eq!(raia_da_ordem(&preventiva), Some(Prioridade::Preventiva));
        assert!(!na_grade(&preventiva));
    }

    #[test]
    fn every_open_order_is_shown_exactly_once() {
        let mut com_pmp = os(1, "alta");
        com_pmp.pmp_id = Some(3);
        com_pmp.usuario_responsavel = Some("Maria Santos".into());
        let mut atribuida = os(2, "alta");
        atribuida.usuario_responsavel = Some("João Silva".into());
        let mut datada = os(3, "alta");
        datada.data_programada = Some("2025-03-11".into());
        datada.usuario_responsavel = Some("Maria Santos".into());
        let mut datada_sem_tecnico = os(4, "baixa");
        datada_sem_tecnico.data_programada = Some("2025-03-12".into());

        let estado = EstadoProgramacao {
            ordens: vec![com_pmp, atribuida, datada, datada_sem_tecnico],
            tecnicos: vec![tecnico(1, "João Silva"), tecnico(2, "Maria Santos")],
            versao: 1,
        };
        let quadro = montar_quadro(&estado, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());

        let mut vistas: Vec<i64> = quadro.raias.iter().flat_map(|r| r.ordens.iter().map(|o| o.id)).collect();
        vistas.extend(
            quadro
                .linhas
                .iter()
                .flat_map(|l| l.celulas.iter())
                .flat_map(|c| c.ordens.iter().map(|o| o.id)),
        );
        vistas.extend(quadro.sem_tecnico.iter().map(|o| o.id));
        vistas.sort();
        assert_eq!(vistas, vec![1, 2, 3, 4]);

        let preventiva = quadro.raias.iter().find(|r| r.prioridade == Prioridade::Preventiva).unwrap();
        assert_eq!(preventiva.ordens[0].id, 1);
        assert_eq!(quadro.linhas[1].celulas[1].ordens[0].id, 3);
        assert_eq!(quadro.sem_tecnico[0].id, 4);
    }

    #[test]
    fn week_starts_on_monday() {
        let quarta = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        let dias = dias_da_semana(quarta);
        assert_eq!(dias.len(), 7);
        assert_eq!(dias[0], NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(dias[6], NaiveDate::from_ymd_opt(2025, 3, 16).unwrap());
    }

    #[test]
    fn scheduled_order_lands_in_matching_cell() {
        let mut o = os(7, "alta");
        o.status = StatusOs::Programada;
        o.data_programada = Some("2025-03-10T00:00:00.000Z".into());
        o.usuario_responsavel = Some("maria santos".into());
        let mut fantasma = os(8, "alta");
        fantasma.status = StatusOs::Programada;
        fantasma.data_programada = Some("2025-03-11".into());
        fantasma.usuario_responsavel = Some("Ex-funcionário".into());

        let estado = EstadoProgramacao {
            ordens: vec![o, fantasma],
            tecnicos: vec![tecnico(1, "João Silva"), tecnico(2, "Maria Santos")],
            versao: 1,
        };
        let quadro = montar_quadro(&estado, NaiveDate::from_ymd_opt(2025, 3, 13).unwrap());

        assert!(quadro.linhas[0].celulas.iter().all(|c| c.ordens.is_empty()));
        assert_eq!(quadro.linhas[1].celulas[0].ordens[0].id, 7);
        assert_eq!(quadro.sem_tecnico.iter().map(|o| o.id).collect::<Vec<_>>(), vec![8]);
    }

    #[tokio::test]
    async fn drop_issues_single_put_and_announces_date() {
        let mock = MockTransport::new();
        mock.ok(Metodo::Put, "/api/ordens-servico/7/programar", json!({"success": true}));
        let service = service_com(vec![os(7, "alta")]).await;

        let msg = service
            .programar(&sessao(&mock, "abc"), &soltar(7, "2025-03-10", "Maria Santos"))
            .await
            .unwrap();

        assert!(msg.contains("programada para 10/03/2025"));
        let puts = mock.chamadas_para(Metodo::Put, "/api/ordens-servico/7/programar");
        assert_eq!(puts.len(), 1);
        assert_eq!(mock.chamadas().len(), 1);
        assert_eq!(
            puts[0].corpo,
            Some(json!({
                "id": 7,
                "data_programada": "2025-03-10",
                "usuario_responsavel": "Maria Santos",
                "status": "programada"
            }))
        );

        let quadro = service
            .quadro(&sessao(&mock, "abc"), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
            .await
            .unwrap();
        assert!(quadro.raias.iter().all(|r| r.ordens.is_empty()));
        assert_eq!(quadro.linhas[1].celulas[0].ordens[0].status, StatusOs::Programada);
    }

    #[tokio::test]
    async fn br_dates_are_normalized_before_sending() {
        let mock = MockTransport::new();
        mock.ok(Metodo::Put, "/api/ordens-servico/7/programar", json!({"success": true}));
        let service = service_com(vec![os(7, "alta")]).await;

        service
            .programar(&sessao(&mock, "abc"), &soltar(7, "10/03/2025", "Maria Santos"))
            .await
            .unwrap();

        let corpo = mock.chamadas()[0].corpo.clone().unwrap();
        assert_eq!(corpo["data_programada"], "2025-03-10");
    }

    #[tokio::test]
    async fn malformed_date_is_rejected_without_calling_backend() {
        let mock = MockTransport::new();
        let service = service_com(vec![os(7, "alta")]).await;

        let err = service
            .programar(&sessao(&mock, "abc"), &soltar(7, "2025-3-1x", "Maria Santos"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DataInvalida(_)));
        assert!(mock.chamadas().is_empty());
        assert_eq!(ordem(&service, &mock, 7).await.unwrap().status, StatusOs::Aberta);
    }

    #[tokio::test]
    async fn blank_technician_is_rejected() {
        let mock = MockTransport::new();
        let service = service_com(vec![os(7, "alta")]).await;
        let err = service
            .programar(&sessao(&mock, "abc"), &soltar(7, "2025-03-10", "   "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RegraNegocio(_)));
        assert!(mock.chamadas().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_rolls_back_the_drop() {
        let mock = MockTransport::new();
        mock.responder(
            Metodo::Put,
            "/api/ordens-servico/7/programar",
            500,
            json!({"success": false, "message": "erro no banco"}),
        );
        let service = service_com(vec![os(7, "alta")]).await;

        let err = service
            .programar(&sessao(&mock, "abc"), &soltar(7, "2025-03-10", "Maria Santos"))
            .await
            .unwrap_err();

        assert!(err.is_backend_failure());
        assert_eq!(ordem(&service, &mock, 7).await.unwrap(), os(7, "alta"));
    }

    #[tokio::test]
    async fn unschedule_resets_order_and_can_repeat() {
        let mock = MockTransport::new();
        mock.ok(Metodo::Post, "/api/ordens-servico/7/desprogramar", json!({"success": true}));
        let mut programada = os(7, "alta");
        programada.status = StatusOs::Programada;
        programada.data_programada = Some("2025-03-10".into());
        programada.usuario_responsavel = Some("Maria Santos".into());
        let service = service_com(vec![programada]).await;

        service.desprogramar(&sessao(&mock, "abc"), 7).await.unwrap();
        service.desprogramar(&sessao(&mock, "abc"), 7).await.unwrap();

        let o = ordem(&service, &mock, 7).await.unwrap();
        assert_eq!(o.status, StatusOs::Aberta);
        assert!(o.data_programada.is_none() && o.usuario_responsavel.is_none());
        assert_eq!(mock.chamadas_para(Metodo::Post, "/api/ordens-servico/7/desprogramar").len(), 2);
    }

    #[tokio::test]
    async fn unschedule_failure_restores_schedule() {
        let mock = MockTransport::new();
        mock.responder(Metodo::Post, "/api/ordens-servico/7/desprogramar", 503, json!(null));
        let mut programada = os(7, "alta");
        programada.status = StatusOs::Programada;
        programada.data_programada = Some("2025-03-10".into());
        programada.usuario_responsavel = Some("Maria Santos".into());
        let service = service_com(vec![programada.clone()]).await;

        assert!(service.desprogramar(&sessao(&mock, "abc"), 7).await.is_err());
        assert_eq!(ordem(&service, &mock, 7).await.unwrap(), programada);
    }

    #[tokio::test]
    async fn pmp_orders_cannot_leave_preventive_lane() {
        let mock = MockTransport::new();
        let mut com_pmp = os(3, "preventiva");
        com_pmp.pmp_id = Some(1);
        let service = service_com(vec![com_pmp]).await;

        let err = service
            .alterar_prioridade(&sessao(&mock, "abc"), &MoverRaiaPayload { os_id: 3, prioridade: Prioridade::Alta })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RegraNegocio(_)));
        assert!(mock.chamadas().is_empty());
    }

    #[tokio::test]
    async fn load_falls_back_to_board_endpoint() {
        let mock = MockTransport::new();
        mock.responder(Metodo::Get, "/api/ordens-servico", 500, json!({"success": false}));
        mock.ok(
            Metodo::Get,
            "/api/ordens-servico-programacao",
            json!({"success": true, "ordens": [{"id": 1, "prioridade": "baixa"}]}),
        );
        mock.ok(Metodo::Get, "/api/users", json!({"success": true, "users": [{"id": 2, "name": "Maria Santos"}]}));
        let service = novo_service();
        let client = sessao(&mock, "abc");

        service.carregar(&client).await.unwrap();

        let estado = service.store(&client).await.unwrap().snapshot().await;
        assert_eq!(estado.ordens.len(), 1);
        assert_eq!(estado.tecnicos[0].name, "Maria Santos");
        let users = mock.chamadas_para(Metodo::Get, "/api/users");
        assert_eq!(users[0].query, vec![("profile".to_string(), "user".to_string())]);
    }

    #[tokio::test]
    async fn status_events_update_the_board() {
        let mut o = os(9, "alta");
        o.status = StatusOs::EmAndamento;
        let service = service_com(vec![o]).await;

        service
            .sincronizar(&EventoOs::status_alterado(9, StatusOs::Concluida))
            .await;
        let store = service.stores.get("abc").await.unwrap();
        assert_eq!(store.ordem(9).await.unwrap().status, StatusOs::Concluida);
    }

    fn responder_quadro(mock: &Arc<MockTransport>, ordens: serde_json::Value) {
        mock.ok(Metodo::Get, "/api/ordens-servico", json!({"success": true, "ordens": ordens}));
        mock.ok(Metodo::Get, "/api/users", json!({"success": true, "users": [{"id": 2, "name": "Maria Santos"}]}));
    }

    #[tokio::test]
    async fn each_session_keeps_its_own_board() {
        let mock = MockTransport::new();
        let service = novo_service();
        let b = sessao(&mock, "B");
        let a = sessao(&mock, "A");

        responder_quadro(&mock, json!([{"id": 8, "descricao": "OS da empresa B", "status": "aberta"}]));
        service.carregar(&b).await.unwrap();
        responder_quadro(&mock, json!([{"id": 7, "descricao": "OS SECRETA empresa A", "status": "aberta"}]));
        service.carregar(&a).await.unwrap();

        mock.ok(Metodo::Put, "/api/ordens-servico/8/programar", json!({"success": true}));
        service.programar(&b, &soltar(8, "2025-03-10", "Maria Santos")).await.unwrap();
        assert_eq!(mock.chamadas_para(Metodo::Put, "/api/ordens-servico/8/programar").len(), 1);

        let quadro_b = service.quadro(&b, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()).await.unwrap();
        let json_b = serde_json::to_string(&quadro_b).unwrap();
        assert!(json_b.contains("OS da empresa B"));
        assert!(!json_b.contains("OS SECRETA"));

        let err = service.programar(&a, &soltar(8, "2025-03-10", "Maria Santos")).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
        assert!(service.visivel(&a, 7).await && !service.visivel(&a, 8).await);
    }

    #[tokio::test]
    async fn board_without_session_cookie_is_refused() {
        let mock = MockTransport::new();
        let service = novo_service();
        let err = service
            .quadro(&cliente(&mock), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NaoAutenticado));
        assert!(mock.chamadas().is_empty());
    }

    #[tokio::test]
    async fn forgotten_session_loses_its_board() {
        let mock = MockTransport::new();
        let service = service_com(vec![os(7, "alta")]).await;
        let client = sessao(&mock, "abc");
        assert!(service.visivel(&client, 7).await);

        service.esquecer(&client).await;
        assert!(!service.visivel(&client, 7).await);
    }

    #[tokio::test]
    async fn status_event_reaches_only_boards_showing_the_order() {
        let mock = MockTransport::new();
        let service = novo_service();
        responder_quadro(&mock, json!([{"id": 9, "status": "em_andamento"}]));
        service.carregar(&sessao(&mock, "A")).await.unwrap();
        responder_quadro(&mock, json!([{"id": 4, "status": "aberta"}]));
        service.carregar(&sessao(&mock, "B")).await.unwrap();

        service.sincronizar(&EventoOs::status_alterado(9, StatusOs::Concluida)).await;

        let a = service.stores.get("A").await.unwrap();
        let b = service.stores.get("B").await.unwrap();
        assert_eq!(a.ordem(9).await.unwrap().status, StatusOs::Concluida);
        assert!(b.ordem(9).await.is_none());
    }
}
