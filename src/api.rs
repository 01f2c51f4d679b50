pub mod client;
pub use client::{BackendClient, HttpTransport, Metodo, Transport};
pub mod ativos_repo;
pub use ativos_repo::AssetRepository;
pub mod ordens_repo;
pub use ordens_repo::OrdemRepository;
pub mod execucao_repo;
pub use execucao_repo::ExecucaoRepository;
pub mod plano_repo;
pub use plano_repo::PlanoRepository;
pub mod user_repo;

pub use user_repo::UserRepository;
