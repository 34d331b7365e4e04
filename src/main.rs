/// asana-sync: acompanha um projeto do Asana via stream de eventos
///
/// Fluxo:
/// - Carrega configuração (config/default, config/{RUN_MODE}, variáveis de ambiente)
/// - Cria a sessão Asana (cliente + catálogos + sync tokens)
/// - A cada intervalo busca eventos do projeto e re-busca as tasks alteradas
///
/// Ctrl+C (ou SIGTERM) encerra o loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use asana::webhooks::WebhookManager;
use asana::{AsanaClient, AsanaSession, Resource};

use asana_sync::config::Settings;
use asana_sync::services::ProjectWatcher;
use asana_sync::utils::logging::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 🔧 Carregar variáveis de ambiente do arquivo .env (se existir)
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    // Inicializar tracing
    init_logging();

    if dotenv_loaded {
        tracing::info!("✅ Arquivo .env carregado com sucesso");
    } else {
        tracing::debug!("Arquivo .env não encontrado - usando variáveis de ambiente do sistema");
    }

    // Carregar configurações
    let settings = Settings::new().context("Failed to load settings")?;
    settings.validate()?;
    let actions = settings.watched_actions()?;

    log_config_loaded(&std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()));

    let client = AsanaClient::new(settings.asana.token.clone())?.with_base_url(settings.asana.base_url.clone());
    let session = Arc::new(AsanaSession::new(client));

    // Carrega o catálogo do projeto logo no início para falhar cedo
    let catalog = session
        .catalog_for(&Resource::project(settings.watcher.project_id.as_str()))
        .await?;
    catalog.fields().await?;
    log_info(&format!("📋 {}", catalog));

    // Webhooks do projeto (informativo; o watcher usa polling)
    if let Some(workspace_id) = &settings.asana.workspace_id {
        let webhooks = WebhookManager::new(session.client().clone());
        match webhooks
            .list_webhooks(workspace_id, Some(settings.watcher.project_id.as_str()))
            .await
        {
            Ok(list) => log_info(&format!("🔔 {} webhooks registrados para o projeto", list.len())),
            Err(e) => log_warning(&format!("Não foi possível listar webhooks: {}", e)),
        }
    }

    let watcher = ProjectWatcher::new(session, settings.watcher.project_id.clone(), actions);
    log_watcher_started(watcher.project_gid(), settings.watcher.poll_interval_secs);

    watcher
        .run(Duration::from_secs(settings.watcher.poll_interval_secs), shutdown_signal())
        .await;

    log_info("🛑 asana-sync encerrado");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error(&format!("failed to install Ctrl+C handler: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log_error(&format!("failed to install signal handler: {}", e));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
