//! Tipos da API do Asana
//!
//! - **CustomField / FieldDefinition / FieldKind**: custom fields e seus valores
//! - **TaskRecord**: task genérica com custom fields
//! - **Resource**: task, project, workspace ou portfolio
//! - **Event / Action / EventPage**: stream de eventos
//!
//! ## ⚠️ Notas Importantes
//!
//! - **Números**: `number_value` é guardado como string
//! - **Nomes de campos**: únicos por recurso, são a chave do mapeamento

pub mod custom_field;
pub mod event;
pub mod resource;
pub mod task;

pub use custom_field::{ChoiceOption, CustomField, FieldDefinition, FieldKind, FieldValue};
pub use event::{Action, Event, EventPage};
pub use resource::Resource;
pub use task::{CompactResource, TaskRecord};
