//! Asana Webhooks API
//!
//! Webhooks entregam os mesmos eventos do stream `/events`, mas por push.
//!
//! ## Handshake
//!
//! Ao criar um webhook, o Asana faz um POST no `target` com o header
//! `X-Hook-Secret`. O endpoint precisa responder 200 ecoando o mesmo header.
//! A partir daí cada entrega vem assinada em `X-Hook-Signature`
//! (HMAC-SHA256 do corpo com o secret, em hex).
//!
//! ## Exemplo de Uso
//!
//! ```rust,no_run
//! use asana::webhooks::WebhookManager;
//!
//! # async fn example() -> asana::Result<()> {
//! let manager = WebhookManager::from_token("pat_token")?;
//!
//! let webhook = manager
//!     .create_webhook("project_gid", "https://myapp.com/webhooks/asana")
//!     .await?;
//! println!("Webhook criado: {}", webhook.gid);
//!
//! let webhooks = manager.list_webhooks("workspace_gid", Some("project_gid")).await?;
//! println!("Total de webhooks: {}", webhooks.len());
//! # Ok(())
//! # }
//! ```

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{AsanaError, Result};
use crate::types::CompactResource;
use crate::AsanaClient;

type HmacSha256 = Hmac<Sha256>;

/// Header do secret enviado no handshake
pub const HOOK_SECRET_HEADER: &str = "X-Hook-Secret";

/// Header da assinatura de cada entrega
pub const HOOK_SIGNATURE_HEADER: &str = "X-Hook-Signature";

/// Gerenciador de webhooks do Asana
pub struct WebhookManager {
    client: AsanaClient,
}

impl WebhookManager {
    /// Cria um novo WebhookManager com um cliente existente
    pub fn new(client: AsanaClient) -> Self {
        Self { client }
    }

    /// Cria um WebhookManager a partir de um token
    pub fn from_token(access_token: impl Into<String>) -> Result<Self> {
        Ok(Self::new(AsanaClient::new(access_token)?))
    }

    /// Registra um webhook para o recurso
    ///
    /// ⚠️ O Asana só conclui a criação depois do handshake no `target`.
    pub async fn create_webhook(&self, resource_gid: &str, target_url: &str) -> Result<Webhook> {
        let body = serde_json::json!({
            "resource": resource_gid,
            "target": target_url,
        });

        let webhook: Webhook = self.client.post_json("/webhooks", &body).await?;
        tracing::info!("🔔 Webhook {} criado para {}", webhook.gid, resource_gid);
        Ok(webhook)
    }

    /// Lista os webhooks do workspace, opcionalmente só os de um recurso
    ///
    /// **IMPORTANTE**: retorna apenas webhooks criados pelo usuário autenticado.
    pub async fn list_webhooks(&self, workspace_gid: &str, resource_gid: Option<&str>) -> Result<Vec<Webhook>> {
        let mut endpoint = format!("/webhooks?workspace={}", urlencoding::encode(workspace_gid));
        if let Some(resource) = resource_gid {
            endpoint.push_str(&format!("&resource={}", urlencoding::encode(resource)));
        }
        self.client.get_paginated(&endpoint).await
    }

    pub async fn get_webhook(&self, webhook_gid: &str) -> Result<Webhook> {
        self.client.get_json(&format!("/webhooks/{}", webhook_gid)).await
    }

    pub async fn delete_webhook(&self, webhook_gid: &str) -> Result<()> {
        self.client.delete(&format!("/webhooks/{}", webhook_gid)).await?;
        tracing::info!("🗑️ Webhook {} removido", webhook_gid);
        Ok(())
    }

    /// Remove todos os webhooks do recurso; retorna quantos foram removidos
    pub async fn delete_webhooks(&self, workspace_gid: &str, resource_gid: &str) -> Result<usize> {
        let webhooks = self.list_webhooks(workspace_gid, Some(resource_gid)).await?;
        for webhook in &webhooks {
            self.delete_webhook(&webhook.gid).await?;
        }
        Ok(webhooks.len())
    }
}

/// Valor a ecoar em `X-Hook-Secret` na resposta do handshake
///
/// `None` quando a requisição não é um handshake.
pub fn handshake_secret<'a>(header_value: Option<&'a str>) -> Option<&'a str> {
    header_value.map(str::trim).filter(|secret| !secret.is_empty())
}

/// Confere `X-Hook-Signature` contra o corpo cru da entrega
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> Result<()> {
    let expected = hex::decode(signature.trim()).map_err(|_| AsanaError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AsanaError::ConfigError(format!("Invalid webhook secret: {}", e)))?;
    mac.update(body);
    mac.verify_slice(&expected).map_err(|_| AsanaError::InvalidSignature)
}

/// Webhook registrado no Asana
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    /// GID do webhook
    pub gid: String,

    /// Recurso observado
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<CompactResource>,

    /// URL que recebe as entregas
    #[serde(default)]
    pub target: String,

    /// `false` depois de falhas repetidas de entrega
    #[serde(default)]
    pub active: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure_content: Option<String>,
}
