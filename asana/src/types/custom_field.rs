//! Custom Fields do Asana
//!
//! A API devolve cada custom field com o valor espalhado em campos diferentes
//! conforme o `resource_subtype`:
//!
//! - `text` → `text_value`
//! - `number` → `number_value` (número no JSON, tratado como string aqui)
//! - `enum` → `enum_value` (uma opção)
//! - `multi_enum` → `multi_enum_values` (lista de opções)
//!
//! ⚠️ IMPORTANTE: `people` e `date` existem na API mas não têm conversão neste crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::error::{AsanaError, Result};

/// Tipo de um custom field, lido uma única vez do token `resource_subtype`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldKind {
    Number,
    Text,
    SingleChoice,
    MultiChoice,
    Person,
    Date,
}

impl FieldKind {
    /// Token exato usado pela API
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Number => "number",
            FieldKind::Text => "text",
            FieldKind::SingleChoice => "enum",
            FieldKind::MultiChoice => "multi_enum",
            FieldKind::Person => "people",
            FieldKind::Date => "date",
        }
    }

    /// `enum` e `multi_enum` carregam opções
    pub fn is_choice(&self) -> bool {
        matches!(self, FieldKind::SingleChoice | FieldKind::MultiChoice)
    }
}

impl FromStr for FieldKind {
    type Err = AsanaError;

    fn from_str(token: &str) -> Result<Self> {
        match token {
            "number" => Ok(FieldKind::Number),
            "text" => Ok(FieldKind::Text),
            "enum" => Ok(FieldKind::SingleChoice),
            "multi_enum" => Ok(FieldKind::MultiChoice),
            "people" => Ok(FieldKind::Person),
            "date" => Ok(FieldKind::Date),
            other => Err(AsanaError::UnknownFieldKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for FieldKind {
    type Error = AsanaError;

    fn try_from(token: String) -> Result<Self> {
        token.parse()
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opção de um campo enum/multi_enum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// GID da opção
    pub gid: String,

    /// Nome exibido
    pub name: String,

    /// Opção habilitada no Asana
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Cor da opção
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ChoiceOption {
    pub fn new(gid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            gid: gid.into(),
            name: name.into(),
            enabled: None,
            color: None,
        }
    }
}

/// Definição (schema) de um custom field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// GID do campo
    pub gid: String,

    /// Nome exibido; único dentro de um recurso e usado como chave de mapeamento
    pub name: String,

    /// Tipo do campo
    #[serde(rename = "resource_subtype")]
    pub kind: FieldKind,

    /// Opções, apenas para enum/multi_enum (ordem da API)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_options: Vec<ChoiceOption>,
}

impl FieldDefinition {
    pub fn new(gid: impl Into<String>, name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            gid: gid.into(),
            name: name.into(),
            kind,
            enum_options: Vec::new(),
        }
    }

    /// Define as opções de um campo enum/multi_enum
    pub fn with_options(mut self, options: Vec<ChoiceOption>) -> Self {
        self.enum_options = options;
        self
    }

    /// Busca a opção pelo nome exato
    pub fn option_named(&self, name: &str) -> Option<&ChoiceOption> {
        if !self.kind.is_choice() {
            return None;
        }
        self.enum_options.iter().find(|option| option.name == name)
    }
}

/// Valor armazenado numa instância de custom field
///
/// Só um dos campos é relevante, conforme o tipo da definição.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_value: Option<String>,

    /// ⚠️ Número chega como JSON number; guardamos como string para não perder o formato
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "number_as_string",
        serialize_with = "string_as_number"
    )]
    pub number_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_value: Option<ChoiceOption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_enum_values: Option<Vec<ChoiceOption>>,
}

/// Instância de custom field: definição + valor atual numa task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(flatten)]
    pub definition: FieldDefinition,

    #[serde(flatten)]
    pub value: FieldValue,
}

impl CustomField {
    /// Instância sem valor para a definição dada
    pub fn empty(definition: FieldDefinition) -> Self {
        Self {
            definition,
            value: FieldValue::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn gid(&self) -> &str {
        &self.definition.gid
    }

    pub fn kind(&self) -> FieldKind {
        self.definition.kind
    }

    /// Cria um campo text preenchido
    pub fn text(definition: FieldDefinition, value: impl Into<String>) -> Self {
        let mut field = Self::empty(definition);
        field.value.text_value = Some(value.into());
        field
    }

    /// Cria um campo number preenchido
    pub fn number(definition: FieldDefinition, value: impl Into<String>) -> Self {
        let mut field = Self::empty(definition);
        field.value.number_value = Some(value.into());
        field
    }

    /// Cria um campo enum com a opção selecionada
    pub fn single_choice(definition: FieldDefinition, selected: Option<ChoiceOption>) -> Self {
        let mut field = Self::empty(definition);
        field.value.enum_value = selected;
        field
    }

    /// Cria um campo multi_enum com as opções selecionadas (na ordem dada)
    pub fn multi_choice(definition: FieldDefinition, selected: Vec<ChoiceOption>) -> Self {
        let mut field = Self::empty(definition);
        field.value.multi_enum_values = Some(selected);
        field
    }
}

fn number_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::Number(number)) => Some(number.to_string()),
        Some(JsonValue::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

fn string_as_number<S>(value: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(text) => match text.parse::<serde_json::Number>() {
            Ok(number) => number.serialize(serializer),
            Err(_) => text.serialize(serializer),
        },
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_tokens_are_exact() {
        assert_eq!("enum".parse::<FieldKind>().unwrap(), FieldKind::SingleChoice);
        assert_eq!("multi_enum".parse::<FieldKind>().unwrap(), FieldKind::MultiChoice);
        assert_eq!(FieldKind::Person.as_str(), "people");
        assert!(matches!(
            "Enum".parse::<FieldKind>(),
            Err(AsanaError::UnknownFieldKind(token)) if token == "Enum"
        ));
    }

    #[test]
    fn test_custom_field_from_api_json() {
        let field: CustomField = serde_json::from_value(json!({
            "gid": "111",
            "name": "Favorite season",
            "resource_subtype": "enum",
            "enum_options": [
                {"gid": "1", "name": "Winter", "enabled": true, "color": "blue"},
                {"gid": "2", "name": "Summer", "enabled": true}
            ],
            "enum_value": {"gid": "2", "name": "Summer"},
            "number_value": null
        }))
        .unwrap();

        assert_eq!(field.kind(), FieldKind::SingleChoice);
        assert_eq!(field.definition.enum_options.len(), 2);
        assert_eq!(field.value.enum_value.unwrap().name, "Summer");
        assert!(field.value.number_value.is_none());
    }

    #[test]
    fn test_number_value_keeps_api_format() {
        let field: CustomField = serde_json::from_value(json!({
            "gid": "9",
            "name": "Age",
            "resource_subtype": "number",
            "number_value": 42.5
        }))
        .unwrap();
        assert_eq!(field.value.number_value.as_deref(), Some("42.5"));

        let back = serde_json::to_value(&field).unwrap();
        assert_eq!(back["number_value"], json!(42.5));
    }

    #[test]
    fn test_option_named_ignores_non_choice_fields() {
        let text = FieldDefinition::new("1", "Notes", FieldKind::Text)
            .with_options(vec![ChoiceOption::new("a", "A")]);
        assert!(text.option_named("A").is_none());

        let choice = FieldDefinition::new("2", "Season", FieldKind::SingleChoice)
            .with_options(vec![ChoiceOption::new("a", "A")]);
        assert_eq!(choice.option_named("A").unwrap().gid, "a");
        assert!(choice.option_named("B").is_none());
    }
}
