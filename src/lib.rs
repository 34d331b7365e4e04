// Biblioteca da aplicação asana-sync
// Expõe módulos para uso em testes e no binário

pub mod config;
pub mod services;
pub mod utils;
