//! Conversão entre o valor de wire de um custom field e o valor semântico
//!
//! Uma tabela por tipo (`match` sobre [`FieldKind`]):
//!
//! | Tipo         | semântico            | gid                  |
//! |--------------|----------------------|----------------------|
//! | `text`       | string               | string               |
//! | `number`     | string               | string               |
//! | `enum`       | nome da opção        | gid da opção         |
//! | `multi_enum` | nomes (ordem salva)  | gids (ordem salva)   |
//! | `people`     | erro                 | erro                 |
//! | `date`       | erro                 | erro                 |

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::catalog::FieldMap;
use crate::error::{AsanaError, Result};
use crate::types::{ChoiceOption, CustomField, FieldKind};

/// Valor semântico de um campo: nada, um escalar ou uma lista
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldData {
    Null,
    Scalar(String),
    List(Vec<String>),
}

impl FieldData {
    /// Representação textual; `Null` vira string vazia
    pub fn stringify(&self) -> String {
        match self {
            FieldData::Null => String::new(),
            FieldData::Scalar(value) => value.clone(),
            FieldData::List(values) => format!("[{}]", values.join(", ")),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldData::Null)
    }
}

impl From<&str> for FieldData {
    fn from(value: &str) -> Self {
        FieldData::Scalar(value.to_string())
    }
}

impl From<String> for FieldData {
    fn from(value: String) -> Self {
        FieldData::Scalar(value)
    }
}

impl From<Vec<String>> for FieldData {
    fn from(values: Vec<String>) -> Self {
        FieldData::List(values)
    }
}

/// Valor do campo como a aplicação enxerga (nomes de opções)
pub fn to_semantic_value(field: &CustomField) -> Result<FieldData> {
    let value = &field.value;
    match field.kind() {
        FieldKind::Text => Ok(FieldData::Scalar(value.text_value.clone().unwrap_or_default())),
        FieldKind::Number => Ok(FieldData::Scalar(value.number_value.clone().unwrap_or_default())),
        FieldKind::SingleChoice => Ok(FieldData::Scalar(
            value
                .enum_value
                .as_ref()
                .map(|option| option.name.clone())
                .unwrap_or_default(),
        )),
        FieldKind::MultiChoice => Ok(FieldData::List(option_values(
            value.multi_enum_values.as_deref(),
            |option| option.name.clone(),
        ))),
        kind @ (FieldKind::Person | FieldKind::Date) => Err(AsanaError::UnsupportedFieldKind(kind)),
    }
}

/// Valor do campo como a API espera em updates (gids das opções)
pub fn to_wire_gid(field: &CustomField) -> Result<FieldData> {
    let value = &field.value;
    match field.kind() {
        FieldKind::Text => Ok(FieldData::Scalar(value.text_value.clone().unwrap_or_default())),
        FieldKind::Number => Ok(FieldData::Scalar(value.number_value.clone().unwrap_or_default())),
        FieldKind::SingleChoice => Ok(FieldData::Scalar(
            value
                .enum_value
                .as_ref()
                .map(|option| option.gid.clone())
                .unwrap_or_default(),
        )),
        FieldKind::MultiChoice => Ok(FieldData::List(option_values(
            value.multi_enum_values.as_deref(),
            |option| option.gid.clone(),
        ))),
        kind @ (FieldKind::Person | FieldKind::Date) => Err(AsanaError::UnsupportedFieldKind(kind)),
    }
}

/// JSON do valor para o mapa `custom_fields` de create/update
///
/// Number vira JSON number quando a string é numérica; enum sem seleção vira `null`.
pub fn to_wire_json(field: &CustomField) -> Result<JsonValue> {
    let wire = to_wire_gid(field)?;
    Ok(match (field.kind(), wire) {
        (FieldKind::Number, FieldData::Scalar(text)) => match text.parse::<serde_json::Number>() {
            Ok(number) => JsonValue::Number(number),
            Err(_) if text.is_empty() => JsonValue::Null,
            Err(_) => JsonValue::String(text),
        },
        (FieldKind::SingleChoice, FieldData::Scalar(gid)) if gid.is_empty() => JsonValue::Null,
        (_, FieldData::Scalar(text)) => JsonValue::String(text),
        (_, FieldData::List(gids)) => JsonValue::from(gids),
        (_, FieldData::Null) => JsonValue::Null,
    })
}

/// Escreve um valor semântico na instância de campo
///
/// - number: string; vazio/nulo vira `"0"`
/// - text: string; nulo vira `""`
/// - enum: opção com esse nome no catálogo; vazio/nulo limpa a seleção
/// - multi_enum: opções na ordem dada; nulo limpa a seleção
///
/// Nome de opção desconhecido falha com [`AsanaError::UnmatchedChoiceOption`].
pub fn apply_value(catalog: &FieldMap, field: &mut CustomField, data: FieldData) -> Result<()> {
    match field.kind() {
        FieldKind::Number => {
            let text = data.stringify();
            field.value.number_value = Some(if text.is_empty() { "0".to_string() } else { text });
        }
        FieldKind::Text => {
            field.value.text_value = Some(data.stringify());
        }
        FieldKind::SingleChoice => {
            let name = data.stringify();
            field.value.enum_value = if name.is_empty() {
                None
            } else {
                Some(resolve_option(catalog, field.name(), &name)?)
            };
        }
        FieldKind::MultiChoice => {
            let names = match data {
                FieldData::Null => Vec::new(),
                FieldData::List(names) => names,
                FieldData::Scalar(name) if name.is_empty() => Vec::new(),
                FieldData::Scalar(name) => vec![name],
            };
            let selected = names
                .iter()
                .map(|name| resolve_option(catalog, field.name(), name))
                .collect::<Result<Vec<_>>>()?;
            field.value.multi_enum_values = Some(selected);
        }
        kind @ (FieldKind::Person | FieldKind::Date) => {
            return Err(AsanaError::UnsupportedFieldKind(kind));
        }
    }
    Ok(())
}

fn resolve_option(catalog: &FieldMap, field_name: &str, option_name: &str) -> Result<ChoiceOption> {
    catalog
        .option_for_name(field_name, option_name)
        .cloned()
        .ok_or_else(|| AsanaError::UnmatchedChoiceOption {
            field: field_name.to_string(),
            option: option_name.to_string(),
        })
}

fn option_values(options: Option<&[ChoiceOption]>, pick: impl Fn(&ChoiceOption) -> String) -> Vec<String> {
    options.unwrap_or_default().iter().map(pick).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldDefinition;
    use serde_json::json;

    fn seasons() -> FieldDefinition {
        FieldDefinition::new("20", "Favorite season", FieldKind::SingleChoice).with_options(vec![
            ChoiceOption::new("s1", "Winter"),
            ChoiceOption::new("s2", "Summer"),
        ])
    }

    fn letters() -> FieldDefinition {
        FieldDefinition::new("30", "Letters", FieldKind::MultiChoice).with_options(vec![
            ChoiceOption::new("idA", "A"),
            ChoiceOption::new("idB", "B"),
            ChoiceOption::new("idC", "C"),
        ])
    }

    fn catalog() -> FieldMap {
        FieldMap::from_definitions(vec![
            FieldDefinition::new("10", "Age", FieldKind::Number),
            FieldDefinition::new("11", "Notes", FieldKind::Text),
            seasons(),
            letters(),
        ])
    }

    #[test]
    fn test_number_zero_value() {
        let catalog = catalog();
        let mut field = CustomField::empty(catalog.get("Age").unwrap().clone());

        apply_value(&catalog, &mut field, FieldData::Null).unwrap();
        assert_eq!(field.value.number_value.as_deref(), Some("0"));

        apply_value(&catalog, &mut field, "".into()).unwrap();
        assert_eq!(field.value.number_value.as_deref(), Some("0"));

        apply_value(&catalog, &mut field, "12".into()).unwrap();
        assert_eq!(to_semantic_value(&field).unwrap(), FieldData::Scalar("12".into()));
    }

    #[test]
    fn test_text_null_becomes_empty() {
        let catalog = catalog();
        let mut field = CustomField::empty(catalog.get("Notes").unwrap().clone());
        assert_eq!(to_semantic_value(&field).unwrap(), FieldData::Scalar(String::new()));

        apply_value(&catalog, &mut field, FieldData::Null).unwrap();
        assert_eq!(field.value.text_value.as_deref(), Some(""));

        apply_value(&catalog, &mut field, FieldData::List(vec!["a".into(), "b".into()])).unwrap();
        assert_eq!(field.value.text_value.as_deref(), Some("[a, b]"));
    }

    #[test]
    fn test_literal_null_text_is_kept() {
        let catalog = FieldMap::from_definitions(vec![
            FieldDefinition::new("11", "Notes", FieldKind::Text),
            FieldDefinition::new("21", "Answer", FieldKind::SingleChoice)
                .with_options(vec![ChoiceOption::new("n1", "null")]),
        ]);
        assert_eq!(FieldData::from("null").stringify(), "null");

        let mut notes = CustomField::empty(catalog.get("Notes").unwrap().clone());
        apply_value(&catalog, &mut notes, "null".into()).unwrap();
        assert_eq!(notes.value.text_value.as_deref(), Some("null"));
        assert_eq!(to_semantic_value(&notes).unwrap(), FieldData::Scalar("null".into()));

        let mut answer = CustomField::empty(catalog.get("Answer").unwrap().clone());
        apply_value(&catalog, &mut answer, "null".into()).unwrap();
        assert_eq!(to_wire_gid(&answer).unwrap(), FieldData::Scalar("n1".into()));
    }

    #[test]
    fn test_single_choice_names_and_gids() {
        let catalog = catalog();
        let mut field = CustomField::empty(seasons());

        assert_eq!(to_semantic_value(&field).unwrap(), FieldData::Scalar(String::new()));

        apply_value(&catalog, &mut field, "Summer".into()).unwrap();
        assert_eq!(to_semantic_value(&field).unwrap(), FieldData::Scalar("Summer".into()));
        assert_eq!(to_wire_gid(&field).unwrap(), FieldData::Scalar("s2".into()));

        apply_value(&catalog, &mut field, FieldData::Null).unwrap();
        assert!(field.value.enum_value.is_none());
    }

    #[test]
    fn test_single_choice_unknown_name_fails() {
        let catalog = catalog();
        let mut field = CustomField::single_choice(seasons(), Some(ChoiceOption::new("s1", "Winter")));

        let err = apply_value(&catalog, &mut field, "Autumn".into()).unwrap_err();
        assert!(matches!(
            err,
            AsanaError::UnmatchedChoiceOption { ref field, ref option } if field == "Favorite season" && option == "Autumn"
        ));
        assert_eq!(field.value.enum_value.unwrap().name, "Winter");
    }

    #[test]
    fn test_multi_choice_keeps_input_order() {
        let catalog = catalog();
        let mut field = CustomField::empty(letters());

        apply_value(&catalog, &mut field, FieldData::List(vec!["C".into(), "A".into()])).unwrap();
        assert_eq!(
            to_wire_gid(&field).unwrap(),
            FieldData::List(vec!["idC".into(), "idA".into()])
        );
        assert_eq!(
            to_semantic_value(&field).unwrap(),
            FieldData::List(vec!["C".into(), "A".into()])
        );

        apply_value(&catalog, &mut field, FieldData::Null).unwrap();
        assert_eq!(to_semantic_value(&field).unwrap(), FieldData::List(vec![]));
    }

    #[test]
    fn test_unsupported_kinds_fail_everywhere() {
        let catalog = catalog();
        for kind in [FieldKind::Person, FieldKind::Date] {
            let mut field = CustomField::empty(FieldDefinition::new("99", "Owner", kind));
            assert!(matches!(to_semantic_value(&field), Err(AsanaError::UnsupportedFieldKind(k)) if k == kind));
            assert!(matches!(to_wire_gid(&field), Err(AsanaError::UnsupportedFieldKind(_))));
            assert!(matches!(
                apply_value(&catalog, &mut field, "x".into()),
                Err(AsanaError::UnsupportedFieldKind(_))
            ));
        }
    }

    #[test]
    fn test_wire_json_shapes() {
        let number = CustomField::number(FieldDefinition::new("10", "Age", FieldKind::Number), "7");
        assert_eq!(to_wire_json(&number).unwrap(), json!(7));

        let empty_choice = CustomField::empty(seasons());
        assert_eq!(to_wire_json(&empty_choice).unwrap(), JsonValue::Null);

        let multi = CustomField::multi_choice(letters(), vec![ChoiceOption::new("idB", "B")]);
        assert_eq!(to_wire_json(&multi).unwrap(), json!(["idB"]));
    }
}
