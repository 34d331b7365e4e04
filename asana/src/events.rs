//! Polling incremental do stream `/events`
//!
//! O Asana identifica a posição de cada consumidor no stream por um sync
//! token. O poller guarda um token por recurso e:
//!
//! 1. Busca eventos com o token atual (ou sem token, na primeira vez)
//! 2. Se o token foi rejeitado (412), descarta-o e tenta uma vez sem token
//! 3. Se a segunda tentativa também for rejeitada, desiste com
//!    [`AsanaError::EventStreamUnavailable`]
//! 4. Guarda o token novo antes de devolver os eventos
//!
//! ⚠️ IMPORTANTE: polls concorrentes no MESMO recurso não são coordenados.
//! Recursos diferentes não interferem entre si.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{AsanaError, Result};
use crate::types::{Action, Event, EventPage, Resource};

/// Fonte de páginas de eventos (transporte)
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Eventos desde `cursor` (todas as páginas) e o token seguinte
    ///
    /// Token rejeitado deve virar [`AsanaError::InvalidSyncToken`].
    async fn fetch_events(&self, cursor: Option<&str>, resource_gid: &str) -> Result<EventPage>;
}

/// Poller de eventos com um sync token por recurso
pub struct EventPoller {
    source: Arc<dyn EventSource>,
    cursors: Mutex<HashMap<String, String>>,
}

impl EventPoller {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            source,
            cursors: Mutex::new(HashMap::new()),
        }
    }

    /// Token atual do recurso
    pub fn cursor(&self, resource_gid: &str) -> Option<String> {
        self.lock_cursors().get(resource_gid).cloned()
    }

    /// Define o token (ex.: restaurado de armazenamento)
    pub fn set_cursor(&self, resource_gid: &str, sync: impl Into<String>) {
        self.lock_cursors().insert(resource_gid.to_string(), sync.into());
    }

    /// Esquece o token; o próximo poll recomeça o stream
    pub fn reset(&self, resource_gid: &str) -> Option<String> {
        self.lock_cursors().remove(resource_gid)
    }

    /// Payloads novos do recurso desde o último poll
    pub async fn poll(&self, resource: &Resource) -> Result<Vec<JsonValue>> {
        let gid = resource.gid();
        let cursor = self.cursor(gid);

        let page = match self.source.fetch_events(cursor.as_deref(), gid).await {
            Ok(page) => page,
            Err(AsanaError::InvalidSyncToken { .. }) => {
                tracing::warn!("⚠️ Sync token de {} rejeitado, reiniciando o stream", resource);
                self.reset(gid);
                match self.source.fetch_events(None, gid).await {
                    Ok(page) => page,
                    Err(AsanaError::InvalidSyncToken { .. }) => {
                        tracing::error!("❌ Stream de eventos de {} indisponível", resource);
                        return Err(AsanaError::EventStreamUnavailable {
                            resource: resource.to_string(),
                        });
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };

        tracing::debug!("🔄 {} eventos de {} (sync {})", page.data.len(), resource, page.sync);
        self.set_cursor(gid, page.sync);
        Ok(page.data)
    }

    /// Poll + classificação de eventos de task
    pub async fn task_events(&self, resource: &Resource, actions: &[Action]) -> Result<Vec<Event>> {
        let payloads = self.poll(resource).await?;
        Ok(extract_events(&payloads, actions))
    }

    fn lock_cursors(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // Lock envenenado: o mapa continua consistente (só insert/remove)
        self.cursors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Eventos de task cujas ações estão em `actions`
pub fn extract_events(payloads: &[JsonValue], actions: &[Action]) -> Vec<Event> {
    extract_resource_events(payloads, "task", actions)
}

/// Eventos de `resource_type` cujas ações estão em `actions`
///
/// Pares (gid, ação) repetidos ficam só com a primeira ocorrência, na ordem
/// de chegada. Entrada ou filtro vazio → lista vazia.
pub fn extract_resource_events(
    payloads: &[JsonValue],
    resource_type: &str,
    actions: &[Action],
) -> Vec<Event> {
    let mut seen = HashSet::new();
    payloads
        .iter()
        .filter_map(|payload| parse_event(payload, resource_type))
        .filter(|event| actions.contains(&event.action))
        .filter(|event| seen.insert((event.resource_gid.clone(), event.action)))
        .collect()
}

/// GIDs a buscar de novo: um por recurso, na ordem de chegada
///
/// Eventos de remoção ficam de fora. Um recurso com `added` e `changed` no
/// mesmo lote aparece uma vez só.
pub fn changed_gids(events: &[Event]) -> Vec<String> {
    let mut seen = HashSet::new();
    events
        .iter()
        .filter(|event| !event.action.is_removal())
        .filter(|event| seen.insert(event.resource_gid.as_str()))
        .map(|event| event.resource_gid.clone())
        .collect()
}

fn parse_event(payload: &JsonValue, resource_type: &str) -> Option<Event> {
    let resource = payload.get("resource")?;
    // Eventos antigos não trazem `type`; o tipo também vem em `resource.resource_type`
    let kind = payload
        .get("type")
        .or_else(|| resource.get("resource_type"))?
        .as_str()?;
    if kind != resource_type {
        return None;
    }
    let gid = resource.get("gid")?.as_str()?;
    let action = payload.get("action")?.as_str()?.parse::<Action>().ok()?;

    Some(Event {
        resource_gid: gid.to_string(),
        action,
        change: payload.get("change").filter(|change| !change.is_null()).cloned(),
    })
}
