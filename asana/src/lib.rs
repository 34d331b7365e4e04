//! Camada de mapeamento de custom fields da API Asana
//!
//! Converte tasks genéricas (task + custom fields) em tipos da aplicação e
//! vice-versa, escondendo paginação, sync tokens e a busca de definições de
//! campos por recurso.
//!
//! - **codec**: valor de wire ↔ valor semântico, por tipo de campo
//! - **catalog**: definições de campos por recurso, carregadas sob demanda
//! - **serialization**: `TaskSerializable` + `TaskSerializer`
//! - **events**: `EventPoller` com sync token por recurso
//! - **client / webhooks**: transporte HTTP (API 1.0)
//! - **session**: junta tudo com caches por sessão
//!
//! # API Asana 1.0
//!
//! - **Tasks**: `/tasks/{gid}`, `/projects/{gid}/tasks`
//! - **Custom Fields**: `/projects/{gid}/custom_field_settings`, `/workspaces/{gid}/custom_fields`
//! - **Events**: `/events?resource={gid}&sync={token}`
//! - **Webhooks**: `/webhooks`
//!
//! # Exemplo Básico
//!
//! ```rust,ignore
//! use asana::{task_serializable, Action, AsanaSession};
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     gid: String,
//!     name: String,
//!     dessert: String,
//!     languages: Vec<String>,
//! }
//!
//! task_serializable! {
//!     Person {
//!         gid: gid,
//!         name: name,
//!         fields: { "Favorite dessert" => dessert },
//!         optional: { "Languages spoken" => languages },
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> asana::Result<()> {
//!     // IMPORTANTE: Ler de variáveis de ambiente (NUNCA hardcode!)
//!     let token = std::env::var("ASANA_ACCESS_TOKEN")
//!         .expect("ASANA_ACCESS_TOKEN não configurado");
//!
//!     let session = AsanaSession::from_token(token)?;
//!     let people: Vec<Person> = session.project_records("1200000000000000").await?;
//!     let changed: Vec<Person> = session
//!         .recent_records("1200000000000000", &[Action::Added, Action::Changed])
//!         .await?;
//!     Ok(())
//! }
//! ```

// Módulos públicos
pub mod catalog;
pub mod client;
pub mod codec;
pub mod error;
pub mod events;
pub mod serialization;
pub mod session;
pub mod types;
pub mod webhooks;

// Re-exports principais
pub use client::AsanaClient;
pub use error::{AsanaError, Result};
pub use session::AsanaSession;

pub use catalog::{CatalogScope, FieldCatalog, FieldCatalogRegistry, FieldMap, FieldSettingsSource};
pub use codec::FieldData;
pub use events::{changed_gids, extract_events, extract_resource_events, EventPoller, EventSource};
pub use serialization::{FieldBindings, FieldProperty, TaskSerializable, TaskSerializer};

// Re-exports de types para conveniência
pub use types::{
    Action, ChoiceOption, CompactResource, CustomField, Event, EventPage, FieldDefinition,
    FieldKind, FieldValue, Resource, TaskRecord,
};
