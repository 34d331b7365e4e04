//! Watcher de projeto: poll de eventos + re-busca das tasks alteradas
//!
//! A cada ciclo:
//! 1. Busca eventos de task do projeto desde o último sync token
//! 2. As demais tasks são buscadas de novo (uma vez cada) e seus custom
//!    fields convertidos em valores semânticos (nomes de opções, não gids)
//! 3. Tasks deletadas/removidas só são reportadas

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use asana::codec::{to_semantic_value, FieldData};
use asana::events::changed_gids;
use asana::{Action, AsanaError, AsanaSession, Resource, TaskRecord};
use chrono::{DateTime, Utc};

use crate::utils::logging::*;
use crate::utils::AppResult;

/// Task alterada com os valores dos custom fields suportados
#[derive(Debug, Clone, PartialEq)]
pub struct WatchedTask {
    pub gid: String,
    pub name: String,
    pub modified_at: Option<DateTime<Utc>>,
    pub fields: BTreeMap<String, FieldData>,
}

impl From<&TaskRecord> for WatchedTask {
    fn from(task: &TaskRecord) -> Self {
        // people/date não têm conversão e ficam de fora
        let fields = task
            .custom_fields
            .iter()
            .filter_map(|field| {
                to_semantic_value(field)
                    .ok()
                    .map(|value| (field.name().to_string(), value))
            })
            .collect();

        Self {
            gid: task.gid.clone(),
            name: task.name.clone(),
            modified_at: task.modified_at,
            fields,
        }
    }
}

/// Mudança observada num ciclo
#[derive(Debug, Clone, PartialEq)]
pub enum TaskChange {
    Updated(WatchedTask),
    Removed(String),
}

pub struct ProjectWatcher {
    session: Arc<AsanaSession>,
    project_gid: String,
    actions: Vec<Action>,
}

impl ProjectWatcher {
    pub fn new(session: Arc<AsanaSession>, project_gid: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            session,
            project_gid: project_gid.into(),
            actions,
        }
    }

    pub fn project_gid(&self) -> &str {
        &self.project_gid
    }

    /// Um ciclo de poll
    pub async fn tick(&self) -> AppResult<Vec<TaskChange>> {
        let project = Resource::project(self.project_gid.as_str());
        let events = self
            .session
            .poller()
            .task_events(&project, &self.actions)
            .await?;

        let mut changes = Vec::with_capacity(events.len());
        // Uma busca por task, mesmo com added + changed no mesmo lote
        for gid in changed_gids(&events) {
            let task = match self.session.client().get_task(&gid).await {
                Ok(task) => task,
                Err(AsanaError::ApiError { status: 404, .. }) => {
                    log_warning(&format!("⚠️ Task {} sumiu antes da busca", gid));
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let watched = WatchedTask::from(&task);
            log_record_changed(&watched.gid, &watched.name, watched.fields.len());
            for (field, value) in &watched.fields {
                log_field_value(&watched.gid, field, &value.stringify());
            }
            changes.push(TaskChange::Updated(watched));
        }

        for event in events.into_iter().filter(|event| event.action.is_removal()) {
            log_record_removed(&event.resource_gid);
            changes.push(TaskChange::Removed(event.resource_gid));
        }

        Ok(changes)
    }

    /// Roda `tick` a cada `interval` até `shutdown` completar
    ///
    /// Erros de um ciclo são logados e o loop continua.
    pub async fn run<F>(&self, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log_info("🛑 Watcher parado");
                    break;
                }
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(changes) if changes.is_empty() => {
                            tracing::debug!("Nenhuma mudança no projeto {}", self.project_gid);
                        }
                        Ok(changes) => {
                            log_info(&format!("🔄 {} mudanças no projeto {}", changes.len(), self.project_gid));
                        }
                        Err(e) => log_asana_api_error("poll", &e.to_string()),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asana::AsanaClient;
    use httpmock::prelude::*;
    use serde_json::json;

    fn session(server: &MockServer) -> Arc<AsanaSession> {
        let client = AsanaClient::new("token").unwrap().with_base_url(server.base_url());
        Arc::new(AsanaSession::new(client))
    }

    #[tokio::test]
    async fn test_tick_refetches_each_changed_task_once() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/events").query_param("sync", "s0");
                then.status(200).json_body(json!({
                    "data": [
                        {"type": "task", "action": "added", "resource": {"gid": "T1"}},
                        {"type": "task", "action": "deleted", "resource": {"gid": "T2"}},
                        {"type": "task", "action": "changed", "resource": {"gid": "T1"}}
                    ],
                    "sync": "s1",
                    "has_more": false
                }));
            })
            .await;
        let task = server
            .mock_async(|when, then| {
                when.method(GET).path("/tasks/T1");
                then.status(200).json_body(json!({
                    "data": {
                        "gid": "T1",
                        "name": "Ada",
                        "custom_fields": [
                            {
                                "gid": "1",
                                "name": "Favorite season",
                                "resource_subtype": "enum",
                                "enum_options": [{"gid": "w", "name": "Winter"}],
                                "enum_value": {"gid": "w", "name": "Winter"}
                            },
                            {"gid": "2", "name": "Owner", "resource_subtype": "people"}
                        ]
                    }
                }));
            })
            .await;

        let session = session(&server);
        session.poller().set_cursor("P1", "s0");
        let watcher = ProjectWatcher::new(session.clone(), "P1", Action::ALL.to_vec());

        let changes = tokio_test::assert_ok!(watcher.tick().await);

        task.assert_hits_async(1).await;
        assert_eq!(changes.len(), 2);
        match &changes[0] {
            TaskChange::Updated(watched) => {
                assert_eq!(watched.name, "Ada");
                assert_eq!(watched.fields.len(), 1);
                assert_eq!(watched.fields["Favorite season"], FieldData::Scalar("Winter".into()));
            }
            other => panic!("unexpected change: {other:?}"),
        }
        assert_eq!(changes[1], TaskChange::Removed("T2".into()));
        assert_eq!(session.poller().cursor("P1").as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn test_first_tick_only_takes_sync_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/events").query_param("resource", "P1");
                then.status(412).json_body(json!({
                    "errors": [{"message": "Sync token invalid or too old."}],
                    "sync": "first"
                }));
            })
            .await;

        let session = session(&server);
        let watcher = ProjectWatcher::new(session.clone(), "P1", vec![Action::Changed]);

        assert!(watcher.tick().await.unwrap().is_empty());
        assert_eq!(session.poller().cursor("P1").as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let server = MockServer::start_async().await;
        let watcher = ProjectWatcher::new(session(&server), "P1", vec![Action::Changed]);

        tokio::time::timeout(
            Duration::from_secs(5),
            watcher.run(Duration::from_secs(60), async {}),
        )
        .await
        .unwrap();
    }
}
