pub mod arvore;
pub mod execucao;
pub mod layout;
pub mod pmp;
pub mod programacao;
pub mod qrcode;
pub mod usuarios;
