//! TaskSerializer: tipo da aplicação ↔ TaskRecord
//!
//! ## Serialização (T → task)
//!
//! Para cada propriedade da tabela de `T`:
//! - campo existe no catálogo → codec + instância de campo na task
//! - campo não existe e a propriedade é opcional → ignorado
//! - campo não existe e a propriedade é obrigatória → erro, nenhuma task parcial
//!
//! ## Desserialização (task → T)
//!
//! Parte do `Default` de `T` e escreve cada campo da task que tem propriedade
//! com o mesmo nome. Campos sem propriedade são ignorados.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::catalog::FieldCatalog;
use crate::codec::{apply_value, to_semantic_value};
use crate::error::{AsanaError, Result};
use crate::serialization::TaskSerializable;
use crate::types::{CustomField, TaskRecord};

/// Serializador de `T` ligado ao catálogo de um recurso
pub struct TaskSerializer<T> {
    catalog: Arc<FieldCatalog>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for TaskSerializer<T> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            _marker: PhantomData,
        }
    }
}

impl<T: TaskSerializable> TaskSerializer<T> {
    /// ⚠️ O catálogo no-op não serve: sem definições não há como mapear campos
    pub fn new(catalog: Arc<FieldCatalog>) -> Result<Self> {
        if catalog.is_noop() {
            return Err(AsanaError::MissingFieldContext);
        }
        Ok(Self {
            catalog,
            _marker: PhantomData,
        })
    }

    pub fn catalog(&self) -> &Arc<FieldCatalog> {
        &self.catalog
    }

    // ========================================================================
    // T → TaskRecord
    // ========================================================================

    pub async fn serialize(&self, source: &T) -> Result<TaskRecord> {
        self.serialize_with(source, |_, _| {}).await
    }

    /// Serializa e deixa `hook` ajustar a task antes de devolvê-la
    pub async fn serialize_with<F>(&self, source: &T, hook: F) -> Result<TaskRecord>
    where
        F: FnOnce(&T, &mut TaskRecord),
    {
        let fields = self.catalog.fields().await?;
        let mut record = TaskRecord::new(source.gid(), source.name());

        for binding in T::bindings().iter() {
            let Some(definition) = fields.get(binding.name()) else {
                if binding.is_optional() {
                    tracing::debug!(
                        "Campo opcional '{}' não existe em {}, ignorando",
                        binding.name(),
                        self.catalog.scope()
                    );
                    continue;
                }
                return Err(AsanaError::UnmatchedFieldDefinition {
                    property: binding.name().to_string(),
                    catalog: self.catalog.to_string(),
                });
            };

            let mut field = CustomField::empty(definition.clone());
            apply_value(fields, &mut field, binding.read(source))?;
            record.set_field(field);
        }

        hook(source, &mut record);
        Ok(record)
    }

    pub async fn serialize_all(&self, sources: &[T]) -> Result<Vec<TaskRecord>> {
        let mut records = Vec::with_capacity(sources.len());
        for source in sources {
            records.push(self.serialize(source).await?);
        }
        Ok(records)
    }

    // ========================================================================
    // TaskRecord → T
    // ========================================================================

    pub fn deserialize(&self, task: &TaskRecord) -> Result<T> {
        self.deserialize_with(task, |_, _| {})
    }

    /// Desserializa e deixa `hook` completar o objeto com dados da task
    pub fn deserialize_with<F>(&self, task: &TaskRecord, hook: F) -> Result<T>
    where
        F: FnOnce(&TaskRecord, &mut T),
    {
        let bindings = T::bindings();
        let mut target = T::default();
        target.set_gid(task.gid.clone());
        target.set_name(task.name.clone());

        for field in &task.custom_fields {
            if let Some(binding) = bindings.get(field.name()) {
                binding.write(&mut target, to_semantic_value(field)?);
            }
        }

        hook(task, &mut target);
        Ok(target)
    }

    pub fn deserialize_all(&self, tasks: &[TaskRecord]) -> Result<Vec<T>> {
        tasks.iter().map(|task| self.deserialize(task)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldSettingsSource;
    use crate::codec::FieldData;
    use crate::types::{ChoiceOption, FieldDefinition, FieldKind, Resource};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Person {
        gid: String,
        name: String,
        dessert: String,
        season: String,
        age: String,
        languages: Vec<String>,
        nickname: Option<String>,
    }

    crate::task_serializable! {
        Person {
            gid: gid,
            name: name,
            fields: {
                "Favorite dessert" => dessert,
                "Favorite season" => season,
                "Age" => age,
            },
            optional: {
                "Languages spoken" => languages,
                "Nickname" => nickname,
            },
        }
    }

    struct StaticSource(Vec<FieldDefinition>);

    #[async_trait]
    impl FieldSettingsSource for StaticSource {
        async fn fetch_field_definitions(&self, _resource: &Resource) -> Result<Vec<FieldDefinition>> {
            Ok(self.0.clone())
        }
    }

    fn definitions() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("1", "Favorite dessert", FieldKind::Text),
            FieldDefinition::new("2", "Favorite season", FieldKind::SingleChoice).with_options(vec![
                ChoiceOption::new("s1", "Winter"),
                ChoiceOption::new("s2", "Summer"),
            ]),
            FieldDefinition::new("3", "Age", FieldKind::Number),
            FieldDefinition::new("4", "Languages spoken", FieldKind::MultiChoice).with_options(vec![
                ChoiceOption::new("idA", "Turkish"),
                ChoiceOption::new("idB", "French"),
                ChoiceOption::new("idC", "Spanish"),
            ]),
        ]
    }

    fn serializer(definitions: Vec<FieldDefinition>) -> TaskSerializer<Person> {
        let catalog = FieldCatalog::for_project("P1", Arc::new(StaticSource(definitions)));
        TaskSerializer::new(Arc::new(catalog)).unwrap()
    }

    fn ada() -> Person {
        Person {
            gid: "T1".into(),
            name: "Ada".into(),
            dessert: "Cake".into(),
            season: "Summer".into(),
            age: "36".into(),
            languages: vec!["Spanish".into(), "Turkish".into()],
            nickname: None,
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let serializer = serializer(definitions());
        let record = serializer.serialize(&ada()).await.unwrap();

        assert_eq!(record.gid, "T1");
        assert_eq!(record.name, "Ada");
        assert_eq!(record.custom_fields.len(), 4);
        assert!(record.field("Nickname").is_none());

        let back = serializer.deserialize(&record).unwrap();
        assert_eq!(back, ada());
    }

    #[tokio::test]
    async fn test_empty_number_round_trips_as_zero() {
        let serializer = serializer(definitions());
        let mut person = ada();
        person.age = String::new();

        let record = serializer.serialize(&person).await.unwrap();
        assert_eq!(record.field("Age").unwrap().value.number_value.as_deref(), Some("0"));
        assert_eq!(serializer.deserialize(&record).unwrap().age, "0");
    }

    #[tokio::test]
    async fn test_missing_optional_field_is_skipped() {
        let serializer = serializer(definitions()[..3].to_vec());
        let record = serializer.serialize(&ada()).await.unwrap();

        assert!(record.field("Languages spoken").is_none());
        assert_eq!(record.custom_fields.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_required_field_fails() {
        let serializer = serializer(definitions()[1..].to_vec());
        let err = serializer.serialize(&ada()).await.unwrap_err();

        match err {
            AsanaError::UnmatchedFieldDefinition { property, catalog } => {
                assert_eq!(property, "Favorite dessert");
                assert!(catalog.starts_with("project P1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_multi_choice_keeps_property_order() {
        let serializer = serializer(definitions());
        let mut person = ada();
        person.languages = vec!["Spanish".into(), "Turkish".into()];

        let record = serializer.serialize(&person).await.unwrap();
        let gids: Vec<_> = record.field("Languages spoken").unwrap().value.multi_enum_values.as_ref().unwrap()
            .iter()
            .map(|option| option.gid.as_str())
            .collect();
        assert_eq!(gids, vec!["idC", "idA"]);
    }

    #[tokio::test]
    async fn test_hooks_run_after_mapping() {
        let serializer = serializer(definitions());
        let record = serializer
            .serialize_with(&ada(), |source, record| {
                record.name = format!("{} ({})", source.name, source.season);
            })
            .await
            .unwrap();
        assert_eq!(record.name, "Ada (Summer)");

        let person = serializer
            .deserialize_with(&record, |task, person| {
                person.nickname = task.field("Favorite dessert").map(|field| field.name().to_string());
            })
            .unwrap();
        assert_eq!(person.nickname.as_deref(), Some("Favorite dessert"));
    }

    #[tokio::test]
    async fn test_literal_null_text_round_trips() {
        let serializer = serializer(definitions());
        let source = Person {
            dessert: "null".into(),
            ..ada()
        };

        let record = serializer.serialize(&source).await.unwrap();
        assert_eq!(
            record.field("Favorite dessert").unwrap().value.text_value.as_deref(),
            Some("null")
        );
        assert_eq!(serializer.deserialize(&record).unwrap(), source);
    }

    #[tokio::test]
    async fn test_unknown_task_fields_are_ignored() {
        let serializer = serializer(definitions());
        let mut record = serializer.serialize(&ada()).await.unwrap();
        record.set_field(CustomField::text(
            FieldDefinition::new("9", "Internal notes", FieldKind::Text),
            "ignored",
        ));

        assert_eq!(serializer.deserialize(&record).unwrap(), ada());
    }

    #[tokio::test]
    async fn test_batch_helpers() {
        let serializer = serializer(definitions());
        let records = serializer.serialize_all(&[ada(), ada()]).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(serializer.deserialize_all(&records).unwrap(), vec![ada(), ada()]);
        assert_eq!(
            crate::codec::to_semantic_value(records[0].field("Favorite season").unwrap()).unwrap(),
            FieldData::Scalar("Summer".into())
        );
    }

    #[test]
    fn test_noop_catalog_is_rejected() {
        let result = TaskSerializer::<Person>::new(Arc::new(FieldCatalog::noop()));
        assert!(matches!(result, Err(AsanaError::MissingFieldContext)));
    }
}
