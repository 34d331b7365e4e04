//! Catálogo de custom fields por recurso
//!
//! Cada [`FieldCatalog`] conhece as definições de campos de exatamente um
//! recurso (task, project ou workspace) e as carrega na primeira consulta.
//!
//! - Task: as definições vêm embutidas na própria task (sem rede)
//! - Project: `GET /projects/{gid}/custom_field_settings`
//! - Workspace: `GET /workspaces/{gid}/custom_fields`
//!
//! ⚠️ IMPORTANTE: depois de carregado o catálogo nunca muda. Uma carga que
//! falhou não é memorizada: a próxima consulta tenta de novo.

pub mod registry;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::error::Result;
use crate::types::{ChoiceOption, FieldDefinition, Resource, TaskRecord};

pub use registry::FieldCatalogRegistry;

/// Fonte das definições de campos de projects e workspaces
///
/// Implementada pelo [`crate::AsanaClient`]; testes usam dublês em memória.
#[async_trait]
pub trait FieldSettingsSource: Send + Sync {
    /// Todas as definições do recurso, com a paginação já esgotada
    async fn fetch_field_definitions(&self, resource: &Resource) -> Result<Vec<FieldDefinition>>;
}

/// Mapa nome → definição já carregado
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    by_name: HashMap<String, FieldDefinition>,
}

impl FieldMap {
    /// Indexa as definições pelo nome; nome repetido fica com a última
    pub fn from_definitions(definitions: Vec<FieldDefinition>) -> Self {
        let mut by_name = HashMap::with_capacity(definitions.len());
        for definition in definitions {
            if let Some(previous) = by_name.insert(definition.name.clone(), definition) {
                tracing::warn!(
                    "⚠️ Custom field '{}' aparece mais de uma vez (gid {} substituído)",
                    previous.name,
                    previous.gid
                );
            }
        }
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.by_name.get(name)
    }

    /// Opção `option` do campo `field`; `None` se o campo não existe,
    /// não é enum/multi_enum ou não tem essa opção
    pub fn option_for_name(&self, field: &str, option: &str) -> Option<&ChoiceOption> {
        self.get(field)?.option_named(option)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Nomes dos campos em ordem alfabética
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Recurso dono do catálogo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogScope {
    /// Catálogo vazio, usado quando não há contexto
    NoOp,
    Task(String),
    Project(String),
    Workspace(String),
}

impl fmt::Display for CatalogScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogScope::NoOp => write!(f, "no-op catalog"),
            CatalogScope::Task(gid) => write!(f, "task {}", gid),
            CatalogScope::Project(gid) => write!(f, "project {}", gid),
            CatalogScope::Workspace(gid) => write!(f, "workspace {}", gid),
        }
    }
}

/// Definições de custom fields de um recurso, carregadas sob demanda
pub struct FieldCatalog {
    scope: CatalogScope,
    embedded: Vec<FieldDefinition>,
    source: Option<Arc<dyn FieldSettingsSource>>,
    fields: OnceCell<FieldMap>,
}

impl FieldCatalog {
    /// Catálogo sempre vazio
    pub fn noop() -> Self {
        Self {
            scope: CatalogScope::NoOp,
            embedded: Vec::new(),
            source: None,
            fields: OnceCell::new(),
        }
    }

    /// Catálogo com as definições embutidas na task
    pub fn for_task(task: &TaskRecord) -> Self {
        Self {
            scope: CatalogScope::Task(task.gid.clone()),
            embedded: task
                .custom_fields
                .iter()
                .map(|field| field.definition.clone())
                .collect(),
            source: None,
            fields: OnceCell::new(),
        }
    }

    pub fn for_project(gid: impl Into<String>, source: Arc<dyn FieldSettingsSource>) -> Self {
        Self {
            scope: CatalogScope::Project(gid.into()),
            embedded: Vec::new(),
            source: Some(source),
            fields: OnceCell::new(),
        }
    }

    pub fn for_workspace(gid: impl Into<String>, source: Arc<dyn FieldSettingsSource>) -> Self {
        Self {
            scope: CatalogScope::Workspace(gid.into()),
            embedded: Vec::new(),
            source: Some(source),
            fields: OnceCell::new(),
        }
    }

    pub fn scope(&self) -> &CatalogScope {
        &self.scope
    }

    /// GID do recurso (`None` para o no-op)
    pub fn gid(&self) -> Option<&str> {
        match &self.scope {
            CatalogScope::NoOp => None,
            CatalogScope::Task(gid) | CatalogScope::Project(gid) | CatalogScope::Workspace(gid) => {
                Some(gid)
            }
        }
    }

    pub fn is_noop(&self) -> bool {
        self.scope == CatalogScope::NoOp
    }

    pub fn is_loaded(&self) -> bool {
        self.fields.initialized()
    }

    /// Mapa de campos, carregando na primeira chamada
    ///
    /// Chamadas concorrentes durante a primeira carga esperam a mesma carga.
    pub async fn fields(&self) -> Result<&FieldMap> {
        self.fields.get_or_try_init(|| self.load()).await
    }

    /// Definição pelo nome exato
    pub async fn get(&self, name: &str) -> Result<Option<FieldDefinition>> {
        Ok(self.fields().await?.get(name).cloned())
    }

    /// Opção de um campo enum/multi_enum pelo nome
    pub async fn option_for_name(&self, field: &str, option: &str) -> Result<Option<ChoiceOption>> {
        Ok(self.fields().await?.option_for_name(field, option).cloned())
    }

    /// Nomes dos campos já carregados (vazio antes da carga)
    pub fn field_names(&self) -> Vec<String> {
        self.fields.get().map(FieldMap::names).unwrap_or_default()
    }

    async fn load(&self) -> Result<FieldMap> {
        let definitions = match (&self.scope, &self.source) {
            (CatalogScope::NoOp, _) => Vec::new(),
            (CatalogScope::Task(_), _) => self.embedded.clone(),
            (CatalogScope::Project(gid), Some(source)) => {
                source
                    .fetch_field_definitions(&Resource::Project(gid.clone()))
                    .await?
            }
            (CatalogScope::Workspace(gid), Some(source)) => {
                source
                    .fetch_field_definitions(&Resource::Workspace(gid.clone()))
                    .await?
            }
            (CatalogScope::Project(_) | CatalogScope::Workspace(_), None) => Vec::new(),
        };

        let map = FieldMap::from_definitions(definitions);
        tracing::info!("📋 Catálogo de {} carregado: {} campos", self.scope, map.len());
        Ok(map)
    }
}

impl fmt::Display for FieldCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fields.get() {
            Some(map) => write!(f, "{} (fields: {})", self.scope, map.names().join(", ")),
            None => write!(f, "{} (not loaded)", self.scope),
        }
    }
}

impl fmt::Debug for FieldCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCatalog")
            .field("scope", &self.scope)
            .field("fields", &self.fields.get())
            .finish()
    }
}
