// src/config.rs

use std::{env, sync::Arc, time::Duration};

use crate::{
    api::{
        client::COOKIE_SESSAO_PADRAO, AssetRepository, BackendClient, ExecucaoRepository,
        HttpTransport, OrdemRepository, PlanoRepository, Transport, UserRepository,
    },
    capacidades::{Capacidades, LocalQrProvider, PdfExporter, QrProvider, RemoteQrProvider},
    events::StatusBus,
    middleware::auth::SessaoCache,
    services::{
        arvore_service::ArvoreService, execucao_service::ExecucaoService, pmp_service::PmpService,
        programacao_service::ProgramacaoService, qrcode_service::QrCodeService,
        user_service::UserService,
    },
};

const QR_REMOTO_PADRAO: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Como as sessões do navegador são reconhecidas e por quanto tempo o estado delas fica em memória.
#[derive(Debug, Clone)]
pub struct ConfigSessao {
    pub cookie: String,
    pub capacidade: u64,
    pub ttl: Duration,
}

impl Default for ConfigSessao {
    fn default() -> Self {
        Self {
            cookie: COOKIE_SESSAO_PADRAO.to_string(),
            capacidade: 10_000,
            ttl: Duration::from_secs(1800),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub bind_addr: String,
    pub backend: BackendClient,
    pub sessoes: Arc<SessaoCache>,
    pub bus: StatusBus,
    pub arvore_service: ArvoreService,
    pub programacao_service: ProgramacaoService,
    pub pmp_service: PmpService,
    pub execucao_service: ExecucaoService,
    pub qrcode_service: QrCodeService,
    pub user_service: UserService,
}

fn var_ou(nome: &str, padrao: &str) -> String {
    env::var(nome)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| padrao.to_string())
}

/// Escolhe os provedores de QR e PDF uma única vez, na inicialização.
fn carregar_capacidades(timeout: Duration) -> anyhow::Result<Capacidades> {
    let qr: Option<Arc<dyn QrProvider>> = match var_ou("QR_PROVIDER", "local").to_lowercase().as_str() {
        "local" => Some(Arc::new(LocalQrProvider)),
        "remote" | "remoto" => {
            let http = reqwest::Client::builder().timeout(timeout).build()?;
            Some(Arc::new(RemoteQrProvider::new(http, &var_ou("QR_REMOTE_URL", QR_REMOTO_PADRAO))))
        }
        "none" | "nenhum" => None,
        outro => anyhow::bail!("QR_PROVIDER inválido: '{}' (use local, remote ou none)", outro),
    };

    let pasta = var_ou("PDF_FONTS_DIR", "./fonts");
    let familia = var_ou("PDF_FONT_FAMILY", "Roboto");
    let pdf = match PdfExporter::carregar(&pasta, &familia) {
        Ok(exportador) => Some(Arc::new(exportador)),
        Err(e) => {
            tracing::warn!("⚠️ Exportação em PDF desativada: {}", e);
            None
        }
    };

    match &qr {
        Some(p) => tracing::info!("✅ Gerador de QR code: {}", p.nome()),
        None => tracing::warn!("⚠️ Gerador de QR code desativado"),
    }

    Ok(Capacidades { qr, pdf })
}

impl AppState {
    pub fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_url = env::var("BACKEND_URL")
            .map_err(|_| anyhow::anyhow!("BACKEND_URL deve ser definida"))?;
        let timeout_secs: u64 = var_ou("BACKEND_TIMEOUT_SECS", "10")
            .parse()
            .map_err(|e| anyhow::anyhow!("BACKEND_TIMEOUT_SECS inválido: {}", e))?;
        let timeout = Duration::from_secs(timeout_secs);

        let transport = HttpTransport::new(&backend_url, timeout)?;
        tracing::info!("✅ Backend REST em {} (timeout {}s)", backend_url, timeout_secs);

        let ttl_secs: u64 = var_ou("SESSION_CACHE_TTL_SECS", "1800")
            .parse()
            .map_err(|e| anyhow::anyhow!("SESSION_CACHE_TTL_SECS inválido: {}", e))?;
        let sessao = ConfigSessao {
            cookie: var_ou("SESSION_COOKIE", COOKIE_SESSAO_PADRAO),
            ttl: Duration::from_secs(ttl_secs),
            ..ConfigSessao::default()
        };

        let capacidades = carregar_capacidades(timeout)?;
        Ok(Self::montar(
            var_ou("BIND_ADDR", "0.0.0.0:8080"),
            Arc::new(transport),
            capacidades,
            sessao,
        ))
    }

    /// Monta o gráfico de dependências sobre um transporte qualquer.
    pub fn montar(
        bind_addr: String,
        transport: Arc<dyn Transport>,
        capacidades: Capacidades,
        sessao: ConfigSessao,
    ) -> Self {
        let backend = BackendClient::new(transport).com_cookie_sessao(&sessao.cookie);
        let bus = StatusBus::default();

        Self {
            bind_addr,
            sessoes: Arc::new(SessaoCache::new(UserRepository::new(), sessao.capacidade, sessao.ttl)),
            arvore_service: ArvoreService::new(AssetRepository::new()),
            programacao_service: ProgramacaoService::new(
                OrdemRepository::new(),
                UserRepository::new(),
                bus.clone(),
                sessao.capacidade,
                sessao.ttl,
            ),
            pmp_service: PmpService::new(PlanoRepository::new(), AssetRepository::new()),
            execucao_service: ExecucaoService::new(
                ExecucaoRepository::new(),
                OrdemRepository::new(),
                bus.clone(),
            ),
            qrcode_service: QrCodeService::new(AssetRepository::new(), capacidades),
            user_service: UserService::new(UserRepository::new()),
            backend,
            bus,
        }
    }
}
