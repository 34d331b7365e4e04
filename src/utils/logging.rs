use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Filtro padrão quando `RUST_LOG` não está definido
pub const DEFAULT_LOG_FILTER: &str = "asana_sync=info,asana=info";

/// Inicializa o tracing; `RUST_LOG` sobrescreve o filtro padrão
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_watcher_started(project_id: &str, interval_secs: u64) {
    info!("🚀 Watching Asana project {} every {}s", project_id, interval_secs);
}

pub fn log_record_changed(task_gid: &str, name: &str, fields: usize) {
    info!("✏️ Task changed: {} - {} ({} custom fields)", task_gid, name, fields);
}

pub fn log_record_removed(task_gid: &str) {
    info!("🗑️ Task removed: {}", task_gid);
}

pub fn log_field_value(task_gid: &str, field: &str, value: &str) {
    debug!("   {} · {} = {}", task_gid, field, value);
}

pub fn log_asana_api_error(operation: &str, error: &str) {
    error!("Asana API error: {} - Error: {}", operation, error);
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
