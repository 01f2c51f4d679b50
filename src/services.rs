pub mod arvore_service;
pub mod execucao_service;
pub mod pmp_service;
pub mod programacao_service;
pub mod qrcode_service;
pub mod user_service;
