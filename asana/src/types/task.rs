//! Task genérica do Asana (nível de wire)
//!
//! Só os campos que a camada de mapeamento usa: identificação, custom fields
//! e os metadados que os hooks de pós-processamento costumam precisar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::{ChoiceOption, CustomField, FieldKind};
use crate::codec;

/// Referência compacta a outro recurso (`{"gid": ..., "name": ...}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactResource {
    pub gid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}

impl CompactResource {
    pub fn new(gid: impl Into<String>) -> Self {
        Self {
            gid: gid.into(),
            name: None,
            resource_type: None,
        }
    }
}

/// Task com seus custom fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// GID da task (vazio antes da criação)
    #[serde(default)]
    pub gid: String,

    /// Nome da task
    #[serde(default)]
    pub name: String,

    /// Instâncias de custom fields (definição + valor)
    #[serde(default, deserialize_with = "lenient_custom_fields")]
    pub custom_fields: Vec<CustomField>,

    /// Última modificação (read-only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,

    /// Task pai (subtasks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<CompactResource>,

    /// Projetos dos quais a task é membro
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<CompactResource>,
}

impl TaskRecord {
    pub fn new(gid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            gid: gid.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Campo com o nome exato
    pub fn field(&self, name: &str) -> Option<&CustomField> {
        self.custom_fields.iter().find(|field| field.name() == name)
    }

    /// Primeiro campo cujo nome contém `fragment`
    pub fn find_field(&self, fragment: &str) -> Option<&CustomField> {
        self.custom_fields
            .iter()
            .find(|field| field.name().contains(fragment))
    }

    /// Adiciona o campo ou sobrescreve o de mesmo nome
    pub fn set_field(&mut self, field: CustomField) {
        match self
            .custom_fields
            .iter_mut()
            .find(|existing| existing.name() == field.name())
        {
            Some(existing) => *existing = field,
            None => self.custom_fields.push(field),
        }
    }

    /// Seleciona opções de um multi_enum pelo nome, na ordem das opções do campo
    ///
    /// Retorna `false` se o campo não existe ou não é multi_enum.
    pub fn select_multi_choice(&mut self, field_name: &str, options: &[&str]) -> bool {
        let Some(field) = self
            .custom_fields
            .iter_mut()
            .find(|field| field.name().contains(field_name))
        else {
            return false;
        };
        if field.kind() != FieldKind::MultiChoice {
            return false;
        }

        let selected: Vec<ChoiceOption> = field
            .definition
            .enum_options
            .iter()
            .filter(|option| options.contains(&option.name.as_str()))
            .cloned()
            .collect();
        field.value.multi_enum_values = Some(selected);
        true
    }

    /// `true` se `modified_at` difere do da outra task
    pub fn modified_since(&self, other: &TaskRecord) -> bool {
        self.modified_at != other.modified_at
    }

    /// Mapa `custom_fields` (gid do campo → valor de wire) para create/update
    ///
    /// Campos people/date não têm conversão e ficam de fora.
    pub fn field_gid_values(&self) -> JsonMap<String, JsonValue> {
        self.custom_fields
            .iter()
            .filter_map(|field| match codec::to_wire_json(field) {
                Ok(value) => Some((field.gid().to_string(), value)),
                Err(e) => {
                    tracing::debug!("Campo '{}' fora do payload: {}", field.name(), e);
                    None
                }
            })
            .collect()
    }
}

/// Custom fields com tipo desconhecido são descartados em vez de derrubar a task inteira
fn lenient_custom_fields<'de, D>(deserializer: D) -> std::result::Result<Vec<CustomField>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<JsonValue>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<CustomField>(value) {
            Ok(field) => Some(field),
            Err(e) => {
                tracing::debug!("Ignorando custom field não suportado: {}", e);
                None
            }
        })
        .collect())
}
