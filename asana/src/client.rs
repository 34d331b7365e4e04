//! Cliente HTTP para a API do Asana (1.0)
//!
//! Toda resposta de sucesso vem no envelope `{"data": ...}`; coleções trazem
//! `next_page.offset` quando há mais páginas. Erros vêm como
//! `{"errors": [{"message": ...}]}`.
//!
//! ## ⚠️ Sync tokens (`/events`)
//!
//! - Sem `sync`: a API responde 412 com um token novo no corpo. Isso é o
//!   handshake do stream e vira uma página vazia com esse token.
//! - Com `sync` expirado: também 412, mas aqui vira
//!   [`AsanaError::InvalidSyncToken`] para o poller reiniciar.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::catalog::FieldSettingsSource;
use crate::error::{AsanaError, Result};
use crate::events::EventSource;
use crate::types::{EventPage, FieldDefinition, Resource, TaskRecord};

const DEFAULT_BASE_URL: &str = "https://app.asana.com/api/1.0";

/// Itens por página nas coleções
const PAGE_SIZE: u32 = 100;

/// Campos de definição de custom field pedidos à API
const FIELD_OPT_FIELDS: &[&str] = &[
    "name",
    "resource_subtype",
    "enum_options",
    "enum_options.name",
    "enum_options.enabled",
    "enum_options.color",
];

/// Campos de task pedidos à API
const TASK_OPT_FIELDS: &[&str] = &[
    "name",
    "modified_at",
    "parent",
    "parent.name",
    "projects",
    "projects.name",
    "custom_fields",
    "custom_fields.name",
    "custom_fields.resource_subtype",
    "custom_fields.enum_options",
    "custom_fields.enum_options.name",
    "custom_fields.text_value",
    "custom_fields.number_value",
    "custom_fields.enum_value",
    "custom_fields.enum_value.name",
    "custom_fields.multi_enum_values",
    "custom_fields.multi_enum_values.name",
];

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct NextPage {
    offset: String,
}

#[derive(Debug, Deserialize)]
struct CollectionPage<T> {
    data: Vec<T>,
    #[serde(default)]
    next_page: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    data: Vec<Value>,
    sync: String,
    #[serde(default)]
    has_more: bool,
}

/// Cliente para a API do Asana
///
/// Autenticação por Personal Access Token (Bearer).
#[derive(Clone, Debug)]
pub struct AsanaClient {
    http_client: HttpClient,
    access_token: String,
    base_url: String,
}

impl AsanaClient {
    /// Cria um novo cliente Asana
    ///
    /// # Timeouts
    ///
    /// - Total: 30s
    /// - Connect: 5s
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(access_token, 30, 5)
    }

    /// Cria um novo cliente com timeouts customizados
    pub fn with_timeouts(
        access_token: impl Into<String>,
        total_timeout_secs: u64,
        connect_timeout_secs: u64,
    ) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(total_timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .map_err(|e| AsanaError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Troca a URL base (testes, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Obtém o token de autenticação
    pub fn token(&self) -> &str {
        &self.access_token
    }

    /// Obtém a URL base da API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // HTTP
    // ========================================================================

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", &self.access_token))
            .header("Accept", "application/json")
    }

    /// Executa uma requisição GET sem tratar o status
    async fn get_raw(&self, endpoint: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!("GET {}", url);
        Ok(self.authorized(self.http_client.get(&url)).send().await?)
    }

    /// Executa uma requisição GET
    pub(crate) async fn get(&self, endpoint: &str) -> Result<Response> {
        let response = self.get_raw(endpoint).await?;
        self.handle_response(response).await
    }

    /// GET e desembrulha `data`
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let envelope: DataEnvelope<T> = self.get(endpoint).await?.json().await?;
        Ok(envelope.data)
    }

    /// Executa uma requisição POST com `{"data": body}`
    pub(crate) async fn post(&self, endpoint: &str, body: &Value) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!(
            "POST {} with body: {}",
            url,
            serde_json::to_string(body).unwrap_or_default()
        );

        let response = self
            .authorized(self.http_client.post(&url))
            .json(&json!({ "data": body }))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// POST e desembrulha `data`
    pub(crate) async fn post_json<T: DeserializeOwned>(&self, endpoint: &str, body: &Value) -> Result<T> {
        let envelope: DataEnvelope<T> = self.post(endpoint, body).await?.json().await?;
        Ok(envelope.data)
    }

    /// Executa uma requisição PUT com `{"data": body}`
    pub(crate) async fn put(&self, endpoint: &str, body: &Value) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("PUT {}", url);

        let response = self
            .authorized(self.http_client.put(&url))
            .json(&json!({ "data": body }))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// PUT e desembrulha `data`
    pub(crate) async fn put_json<T: DeserializeOwned>(&self, endpoint: &str, body: &Value) -> Result<T> {
        let envelope: DataEnvelope<T> = self.put(endpoint, body).await?.json().await?;
        Ok(envelope.data)
    }

    /// Executa uma requisição DELETE
    pub(crate) async fn delete(&self, endpoint: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("DELETE {}", url);

        let response = self
            .authorized(self.http_client.delete(&url))
            .send()
            .await?;

        self.handle_response(response).await?;
        Ok(())
    }

    /// GET de uma coleção, seguindo `next_page` até a última página
    pub(crate) async fn get_paginated<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        let separator = if endpoint.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut url = format!("{}{}limit={}", endpoint, separator, PAGE_SIZE);
            if let Some(offset) = &offset {
                url.push_str(&format!("&offset={}", urlencoding::encode(offset)));
            }

            let page: CollectionPage<T> = self.get(&url).await?.json().await?;
            items.extend(page.data);

            match page.next_page {
                Some(next) => offset = Some(next.offset),
                None => break,
            }
        }

        Ok(items)
    }

    /// Processa a resposta HTTP e trata erros
    async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!("❌ Asana API error ({}): {}", status_code, error_body);

        Err(AsanaError::ApiError {
            status: status_code,
            message: error_message(&error_body),
        })
    }

    // ========================================================================
    // TASKS
    // ========================================================================

    /// Busca uma task com seus custom fields
    pub async fn get_task(&self, task_gid: &str) -> Result<TaskRecord> {
        let endpoint = format!("/tasks/{}?opt_fields={}", task_gid, opt_fields(TASK_OPT_FIELDS, None));
        self.get_json(&endpoint).await
    }

    /// Todas as tasks de um projeto
    pub async fn get_project_tasks(&self, project_gid: &str) -> Result<Vec<TaskRecord>> {
        let endpoint = format!(
            "/projects/{}/tasks?opt_fields={}",
            project_gid,
            opt_fields(TASK_OPT_FIELDS, None)
        );
        let tasks: Vec<TaskRecord> = self.get_paginated(&endpoint).await?;
        tracing::info!("📥 {} tasks carregadas do projeto {}", tasks.len(), project_gid);
        Ok(tasks)
    }

    /// Quantidade de tasks de um projeto
    pub async fn get_task_count(&self, project_gid: &str) -> Result<u64> {
        let endpoint = format!("/projects/{}/task_counts?opt_fields=num_tasks", project_gid);
        let counts: Value = self.get_json(&endpoint).await?;
        Ok(counts["num_tasks"].as_u64().unwrap_or_default())
    }

    /// Cria uma task no projeto com os custom fields do registro
    pub async fn create_task(&self, project_gid: &str, record: &TaskRecord) -> Result<TaskRecord> {
        let endpoint = format!("/tasks?opt_fields={}", opt_fields(TASK_OPT_FIELDS, None));
        let body = json!({
            "name": record.name,
            "projects": [project_gid],
            "custom_fields": record.field_gid_values(),
        });

        let created: TaskRecord = self.post_json(&endpoint, &body).await?;
        tracing::info!("✅ Task criada: {} ({})", created.name, created.gid);
        Ok(created)
    }

    /// Atualiza nome e custom fields de uma task existente
    pub async fn update_task(&self, record: &TaskRecord) -> Result<TaskRecord> {
        let endpoint = format!(
            "/tasks/{}?opt_fields={}",
            record.gid,
            opt_fields(TASK_OPT_FIELDS, None)
        );
        let body = json!({
            "name": record.name,
            "custom_fields": record.field_gid_values(),
        });

        let updated: TaskRecord = self.put_json(&endpoint, &body).await?;
        tracing::info!("✅ Task atualizada: {}", updated.gid);
        Ok(updated)
    }

    pub async fn delete_task(&self, task_gid: &str) -> Result<()> {
        self.delete(&format!("/tasks/{}", task_gid)).await?;
        tracing::info!("🗑️ Task deletada: {}", task_gid);
        Ok(())
    }

    // ========================================================================
    // CUSTOM FIELDS
    // ========================================================================

    /// Definições dos custom fields ligados a um projeto
    pub async fn get_project_custom_fields(&self, project_gid: &str) -> Result<Vec<FieldDefinition>> {
        let endpoint = format!(
            "/projects/{}/custom_field_settings?opt_fields={}",
            project_gid,
            opt_fields(FIELD_OPT_FIELDS, Some("custom_field"))
        );
        let settings: Vec<Value> = self.get_paginated(&endpoint).await?;
        Ok(parse_definitions(
            settings
                .into_iter()
                .filter_map(|mut setting| setting.get_mut("custom_field").map(Value::take)),
        ))
    }

    /// Definições de todos os custom fields de um workspace
    pub async fn get_workspace_custom_fields(&self, workspace_gid: &str) -> Result<Vec<FieldDefinition>> {
        let endpoint = format!(
            "/workspaces/{}/custom_fields?opt_fields={}",
            workspace_gid,
            opt_fields(FIELD_OPT_FIELDS, None)
        );
        let fields: Vec<Value> = self.get_paginated(&endpoint).await?;
        Ok(parse_definitions(fields))
    }

    // ========================================================================
    // EVENTS
    // ========================================================================

    /// Uma requisição a `/events`; 412 é tratado conforme o cursor enviado
    async fn events_request(&self, resource_gid: &str, sync: Option<&str>) -> Result<EventsResponse> {
        let mut endpoint = format!("/events?resource={}", urlencoding::encode(resource_gid));
        if let Some(sync) = sync {
            endpoint.push_str(&format!("&sync={}", urlencoding::encode(sync)));
        }

        let response = self.get_raw(&endpoint).await?;
        if response.status() != StatusCode::PRECONDITION_FAILED {
            return Ok(self.handle_response(response).await?.json().await?);
        }

        let body: Value = response.json().await?;
        let fresh = body["sync"].as_str().map(str::to_string);

        match (sync, fresh) {
            (None, Some(fresh)) => {
                tracing::info!("🔑 Novo sync token para o recurso {}", resource_gid);
                Ok(EventsResponse {
                    data: Vec::new(),
                    sync: fresh,
                    has_more: false,
                })
            }
            (Some(_), fresh) => Err(AsanaError::InvalidSyncToken { sync: fresh }),
            (None, None) => Err(AsanaError::ApiError {
                status: StatusCode::PRECONDITION_FAILED.as_u16(),
                message: error_message(&body.to_string()),
            }),
        }
    }
}

#[async_trait]
impl FieldSettingsSource for AsanaClient {
    async fn fetch_field_definitions(&self, resource: &Resource) -> Result<Vec<FieldDefinition>> {
        match resource {
            Resource::Task(task) => Ok(task
                .custom_fields
                .iter()
                .map(|field| field.definition.clone())
                .collect()),
            Resource::Project(gid) => self.get_project_custom_fields(gid).await,
            Resource::Workspace(gid) => self.get_workspace_custom_fields(gid).await,
            Resource::Portfolio(_) => Err(AsanaError::UnsupportedResourceKind(
                resource.kind_name().to_string(),
            )),
        }
    }
}

#[async_trait]
impl EventSource for AsanaClient {
    async fn fetch_events(&self, cursor: Option<&str>, resource_gid: &str) -> Result<EventPage> {
        let mut page = self.events_request(resource_gid, cursor).await?;
        let mut data = std::mem::take(&mut page.data);

        while page.has_more {
            let sync = std::mem::take(&mut page.sync);
            page = self.events_request(resource_gid, Some(&sync)).await?;
            data.append(&mut page.data);
        }

        Ok(EventPage {
            data,
            sync: page.sync,
        })
    }
}

/// `opt_fields` separados por vírgula, opcionalmente com prefixo (`custom_field.name`)
fn opt_fields(fields: &[&str], prefix: Option<&str>) -> String {
    let joined = match prefix {
        Some(prefix) => std::iter::once(prefix.to_string())
            .chain(fields.iter().map(|field| format!("{}.{}", prefix, field)))
            .collect::<Vec<_>>()
            .join(","),
        None => fields.join(","),
    };
    urlencoding::encode(&joined).into_owned()
}

/// Primeira mensagem de `errors[]`, ou o corpo cru
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json["errors"][0]["message"]
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Definições com tipo desconhecido (formula, custom_id...) são descartadas
fn parse_definitions(raw: impl IntoIterator<Item = Value>) -> Vec<FieldDefinition> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<FieldDefinition>(value) {
            Ok(definition) => Some(definition),
            Err(e) => {
                tracing::debug!("Ignorando definição de custom field: {}", e);
                None
            }
        })
        .collect()
}
