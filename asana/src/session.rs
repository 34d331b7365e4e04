//! Sessão: cliente + catálogos + poller
//!
//! Todo cache vive aqui. Duas sessões nunca compartilham catálogos nem
//! sync tokens, e nada depende de estado global.
//!
//! As operações de registro têm duas formas: a simples e a `_with`, que
//! recebe os hooks de pós-processamento do [`TaskSerializer`].

use std::sync::Arc;

use crate::catalog::{FieldCatalog, FieldCatalogRegistry};
use crate::error::{AsanaError, Result};
use crate::events::{changed_gids, EventPoller};
use crate::serialization::{TaskSerializable, TaskSerializer};
use crate::types::{Action, Resource, TaskRecord};
use crate::AsanaClient;

/// Ponto de entrada para mapear tasks de projetos em tipos da aplicação
pub struct AsanaSession {
    client: Arc<AsanaClient>,
    registry: FieldCatalogRegistry,
    poller: EventPoller,
}

impl AsanaSession {
    pub fn new(client: AsanaClient) -> Self {
        let client = Arc::new(client);
        Self {
            registry: FieldCatalogRegistry::new(client.clone()),
            poller: EventPoller::new(client.clone()),
            client,
        }
    }

    /// Cria uma sessão a partir de um token
    pub fn from_token(access_token: impl Into<String>) -> Result<Self> {
        Ok(Self::new(AsanaClient::new(access_token)?))
    }

    pub fn client(&self) -> &AsanaClient {
        &self.client
    }

    pub fn registry(&self) -> &FieldCatalogRegistry {
        &self.registry
    }

    pub fn poller(&self) -> &EventPoller {
        &self.poller
    }

    /// Catálogo do recurso (memorizado na sessão)
    pub async fn catalog_for(&self, resource: &Resource) -> Result<Arc<FieldCatalog>> {
        self.registry.catalog_for(resource).await
    }

    /// Serializador de `T` para o recurso
    pub async fn serializer_for<T: TaskSerializable>(&self, resource: &Resource) -> Result<TaskSerializer<T>> {
        TaskSerializer::new(self.catalog_for(resource).await?)
    }

    async fn project_serializer<T: TaskSerializable>(&self, project_gid: &str) -> Result<TaskSerializer<T>> {
        self.serializer_for::<T>(&Resource::project(project_gid)).await
    }

    /// Converte uma task já buscada usando as definições embutidas nela
    ///
    /// O catálogo da task não entra no registry.
    pub fn convert_task<T: TaskSerializable>(&self, task: &TaskRecord) -> Result<T> {
        TaskSerializer::<T>::new(Arc::new(FieldCatalog::for_task(task)))?.deserialize(task)
    }

    /// Converte um objeto em task usando os campos do projeto
    pub async fn convert_to_task<T: TaskSerializable>(&self, source: &T, project_gid: &str) -> Result<TaskRecord> {
        self.project_serializer::<T>(project_gid)
            .await?
            .serialize(source)
            .await
    }

    // ========================================================================
    // LEITURA
    // ========================================================================

    /// Uma task do projeto como `T`
    pub async fn get_record<T: TaskSerializable>(&self, project_gid: &str, task_gid: &str) -> Result<T> {
        self.get_record_with(project_gid, task_gid, |_, _| {}).await
    }

    pub async fn get_record_with<T, D>(&self, project_gid: &str, task_gid: &str, hook: D) -> Result<T>
    where
        T: TaskSerializable,
        D: FnOnce(&TaskRecord, &mut T),
    {
        let serializer = self.project_serializer::<T>(project_gid).await?;
        let task = self.client.get_task(task_gid).await?;
        serializer.deserialize_with(&task, hook)
    }

    /// Todas as tasks do projeto como `T`
    pub async fn project_records<T: TaskSerializable>(&self, project_gid: &str) -> Result<Vec<T>> {
        self.project_records_with(project_gid, |_, _| {}).await
    }

    pub async fn project_records_with<T, D>(&self, project_gid: &str, hook: D) -> Result<Vec<T>>
    where
        T: TaskSerializable,
        D: Fn(&TaskRecord, &mut T),
    {
        let serializer = self.project_serializer::<T>(project_gid).await?;
        let tasks = self.client.get_project_tasks(project_gid).await?;
        tasks
            .iter()
            .map(|task| serializer.deserialize_with(task, &hook))
            .collect()
    }

    /// Tasks do projeto que tiveram eventos com as ações dadas desde o último poll
    ///
    /// Tasks deletadas/removidas não são buscadas de novo e cada task é buscada
    /// uma vez só, mesmo com várias ações no lote. Uma task que sumiu entre o
    /// evento e a busca (404) é ignorada.
    pub async fn recent_records<T: TaskSerializable>(&self, project_gid: &str, actions: &[Action]) -> Result<Vec<T>> {
        self.recent_records_with(project_gid, actions, |_, _| {}).await
    }

    pub async fn recent_records_with<T, D>(&self, project_gid: &str, actions: &[Action], hook: D) -> Result<Vec<T>>
    where
        T: TaskSerializable,
        D: Fn(&TaskRecord, &mut T),
    {
        let project = Resource::project(project_gid);
        let events = self.poller.task_events(&project, actions).await?;
        let serializer = self.serializer_for::<T>(&project).await?;

        let mut records = Vec::new();
        for gid in changed_gids(&events) {
            match self.client.get_task(&gid).await {
                Ok(task) => records.push(serializer.deserialize_with(&task, &hook)?),
                Err(AsanaError::ApiError { status: 404, .. }) => {
                    tracing::warn!("⚠️ Task {} não existe mais, ignorando evento", gid);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!("🔄 {} registros alterados no projeto {}", records.len(), project_gid);
        Ok(records)
    }

    /// Quantidade de tasks do projeto
    pub async fn record_count(&self, project_gid: &str) -> Result<u64> {
        self.client.get_task_count(project_gid).await
    }

    // ========================================================================
    // ESCRITA
    // ========================================================================

    /// Cria a task do objeto no projeto e devolve o objeto com o gid novo
    pub async fn create_record<T: TaskSerializable>(&self, project_gid: &str, source: &T) -> Result<T> {
        self.create_record_with(project_gid, source, |_, _| {}, |_, _| {})
            .await
    }

    pub async fn create_record_with<T, S, D>(
        &self,
        project_gid: &str,
        source: &T,
        serialize_hook: S,
        deserialize_hook: D,
    ) -> Result<T>
    where
        T: TaskSerializable,
        S: FnOnce(&T, &mut TaskRecord),
        D: FnOnce(&TaskRecord, &mut T),
    {
        let serializer = self.project_serializer::<T>(project_gid).await?;
        let record = serializer.serialize_with(source, serialize_hook).await?;
        let created = self.client.create_task(project_gid, &record).await?;
        serializer.deserialize_with(&created, deserialize_hook)
    }

    /// Atualiza a task do objeto (gid obrigatório)
    pub async fn update_record<T: TaskSerializable>(&self, project_gid: &str, source: &T) -> Result<T> {
        self.update_record_with(project_gid, source, |_, _| {}, |_, _| {})
            .await
    }

    pub async fn update_record_with<T, S, D>(
        &self,
        project_gid: &str,
        source: &T,
        serialize_hook: S,
        deserialize_hook: D,
    ) -> Result<T>
    where
        T: TaskSerializable,
        S: FnOnce(&T, &mut TaskRecord),
        D: FnOnce(&TaskRecord, &mut T),
    {
        if source.gid().is_empty() {
            return Err(AsanaError::ConfigError(format!(
                "Cannot update '{}' without a task gid",
                source.name()
            )));
        }
        let serializer = self.project_serializer::<T>(project_gid).await?;
        let record = serializer.serialize_with(source, serialize_hook).await?;
        let updated = self.client.update_task(&record).await?;
        serializer.deserialize_with(&updated, deserialize_hook)
    }

    /// Deleta a task do registro
    pub async fn delete_record(&self, task_gid: &str) -> Result<()> {
        if task_gid.is_empty() {
            return Err(AsanaError::ConfigError("Cannot delete a task without a gid".to_string()));
        }
        self.client.delete_task(task_gid).await
    }
}
