//! Tipos de erro para o crate asana

use thiserror::Error;

use crate::types::FieldKind;

/// Erros do cliente Asana e da camada de mapeamento
#[derive(Debug, Error)]
pub enum AsanaError {
    /// Erro de requisição HTTP
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Erro da API do Asana (status code não-2xx)
    #[error("Asana API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Erro de configuração
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Sync token rejeitado pela API (HTTP 412). `sync` traz o token novo, se veio no corpo.
    #[error("Sync token is invalid or expired")]
    InvalidSyncToken { sync: Option<String> },

    /// Duas invalidações seguidas de sync token para o mesmo recurso
    #[error("Event stream unavailable for resource {resource}: sync token rejected twice in a row")]
    EventStreamUnavailable { resource: String },

    /// Tipo de campo sem conversão (people, date)
    #[error("Serialization of {0} custom fields is not supported")]
    UnsupportedFieldKind(FieldKind),

    /// Token de tipo de campo que não conhecemos
    #[error("Unknown custom field type: {0}")]
    UnknownFieldKind(String),

    /// Catálogo pedido para um recurso que não é task, project ou workspace
    #[error("Resource kind '{0}' cannot provide custom fields; use a task, project or workspace")]
    UnsupportedResourceKind(String),

    /// TaskSerializer construído com o catálogo no-op
    #[error("Task serialization needs a real custom field catalog (got the no-op catalog)")]
    MissingFieldContext,

    /// Propriedade obrigatória sem campo correspondente no catálogo
    #[error("No custom field named '{property}' in {catalog}")]
    UnmatchedFieldDefinition { property: String, catalog: String },

    /// Nome de opção que não existe no campo enum/multi_enum
    #[error("Custom field '{field}' has no option named '{option}'")]
    UnmatchedChoiceOption { field: String, option: String },

    /// Action de evento desconhecida
    #[error("Unknown event action: {0}")]
    UnknownAction(String),

    /// Assinatura de webhook inválida
    #[error("Webhook signature mismatch")]
    InvalidSignature,
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, AsanaError>;
