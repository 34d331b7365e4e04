use asana::AsanaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Asana error: {0}")]
    Asana(#[from] AsanaError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
