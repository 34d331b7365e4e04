//! Registry de catálogos por sessão
//!
//! Um [`FieldCatalog`] por GID de recurso, criado na primeira consulta e
//! mantido até o fim da sessão (sem eviction).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{FieldCatalog, FieldSettingsSource};
use crate::error::{AsanaError, Result};
use crate::types::Resource;

/// Cache de catálogos indexado pelo GID do recurso
pub struct FieldCatalogRegistry {
    source: Arc<dyn FieldSettingsSource>,
    catalogs: RwLock<HashMap<String, Arc<FieldCatalog>>>,
}

impl FieldCatalogRegistry {
    pub fn new(source: Arc<dyn FieldSettingsSource>) -> Self {
        Self {
            source,
            catalogs: RwLock::new(HashMap::new()),
        }
    }

    /// Catálogo do recurso, criando-o se ainda não existe
    ///
    /// Chamadas concorrentes para o mesmo GID recebem o mesmo `Arc`.
    /// Só task, project e workspace têm catálogo.
    pub async fn catalog_for(&self, resource: &Resource) -> Result<Arc<FieldCatalog>> {
        if matches!(resource, Resource::Portfolio(_)) {
            return Err(AsanaError::UnsupportedResourceKind(resource.kind_name().to_string()));
        }
        let gid = resource.gid();

        // Fast path: catálogo já existe
        {
            let catalogs = self.catalogs.read().await;
            if let Some(catalog) = catalogs.get(gid) {
                tracing::debug!("✅ Catálogo em cache para {}", resource);
                return Ok(Arc::clone(catalog));
            }
        }

        let mut catalogs = self.catalogs.write().await;
        let catalog = catalogs
            .entry(gid.to_string())
            .or_insert_with(|| {
                tracing::debug!("🆕 Criando catálogo para {}", resource);
                Arc::new(self.build(resource))
            });
        Ok(Arc::clone(catalog))
    }

    fn build(&self, resource: &Resource) -> FieldCatalog {
        match resource {
            Resource::Task(task) => FieldCatalog::for_task(task),
            Resource::Project(gid) => FieldCatalog::for_project(gid.clone(), Arc::clone(&self.source)),
            Resource::Workspace(gid) => {
                FieldCatalog::for_workspace(gid.clone(), Arc::clone(&self.source))
            }
            // Rejeitado em catalog_for antes de chegar aqui
            Resource::Portfolio(_) => FieldCatalog::noop(),
        }
    }

    /// Quantidade de catálogos criados
    pub async fn len(&self) -> usize {
        self.catalogs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.catalogs.read().await.is_empty()
    }

    pub async fn contains(&self, gid: &str) -> bool {
        self.catalogs.read().await.contains_key(gid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldDefinition, FieldKind, TaskRecord};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct SlowSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FieldSettingsSource for SlowSource {
        async fn fetch_field_definitions(&self, _resource: &Resource) -> Result<Vec<FieldDefinition>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(vec![FieldDefinition::new("1", "Languages spoken", FieldKind::MultiChoice)])
        }
    }

    fn registry() -> (Arc<SlowSource>, FieldCatalogRegistry) {
        let source = Arc::new(SlowSource {
            calls: AtomicUsize::new(0),
        });
        (source.clone(), FieldCatalogRegistry::new(source))
    }

    #[tokio::test]
    async fn test_same_gid_returns_same_catalog() {
        let (source, registry) = registry();
        let project = Resource::Project("P1".into());

        let first = registry.catalog_for(&project).await.unwrap();
        let second = registry.catalog_for(&project).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        first.fields().await.unwrap();
        second.fields().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_access_converges() {
        let (source, registry) = registry();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    let catalog = registry
                        .catalog_for(&Resource::Project("P1".into()))
                        .await
                        .unwrap();
                    catalog.get("Languages spoken").await.unwrap();
                    catalog
                })
            })
            .collect();

        let mut catalogs = Vec::new();
        for handle in handles {
            catalogs.push(handle.await.unwrap());
        }

        assert!(catalogs.iter().all(|catalog| Arc::ptr_eq(catalog, &catalogs[0])));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scope_follows_resource_kind() {
        let (source, registry) = registry();

        let task = registry
            .catalog_for(&Resource::Task(TaskRecord::new("T1", "Ada")))
            .await
            .unwrap();
        assert_eq!(task.scope(), &crate::catalog::CatalogScope::Task("T1".into()));
        task.fields().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        let workspace = registry
            .catalog_for(&Resource::Workspace("W1".into()))
            .await
            .unwrap();
        assert_eq!(workspace.gid(), Some("W1"));
        assert!(registry.contains("T1").await);
        assert!(registry.contains("W1").await);
    }

    #[tokio::test]
    async fn test_portfolio_is_rejected() {
        let (_, registry) = registry();
        let err = registry
            .catalog_for(&Resource::Portfolio("F1".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AsanaError::UnsupportedResourceKind(kind) if kind == "portfolio"));
        assert!(registry.is_empty().await);
    }
}
