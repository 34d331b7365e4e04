use serde::{Deserialize, Serialize};
use config::{Config, Environment, File};

use asana::Action;

use crate::utils::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub asana: AsanaSettings,
    pub watcher: WatcherSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AsanaSettings {
    pub token: String,
    #[serde(default)]
    pub workspace_id: Option<String>,  // Necessário apenas para webhooks
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatcherSettings {
    pub project_id: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_actions")]
    pub actions: Vec<String>,  // Tokens da API: added, changed, deleted, undeleted, removed
}

fn default_base_url() -> String {
    "https://app.asana.com/api/1.0".to_string()
}

fn default_poll_interval() -> u64 {
    30
}

fn default_actions() -> Vec<String> {
    vec!["added".into(), "changed".into(), "undeleted".into()]
}

impl Settings {
    pub fn new() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // ASANA_SYNC__WATCHER__PROJECT_ID=... etc.
            .add_source(Environment::with_prefix("ASANA_SYNC").separator("__"));

        // Variáveis de ambiente conhecidas têm prioridade
        if let Ok(token) = std::env::var("ASANA_ACCESS_TOKEN") {
            builder = builder.set_override("asana.token", token)?;
        }
        if let Ok(workspace_id) = std::env::var("ASANA_WORKSPACE_ID") {
            builder = builder.set_override("asana.workspace_id", workspace_id)?;
        }

        let s = builder.build()?;

        Ok(s.try_deserialize()?)
    }

    /// Rejeita token/projeto vazios e ações desconhecidas
    pub fn validate(&self) -> AppResult<()> {
        if self.asana.token.trim().is_empty() {
            return Err(AppError::Validation(
                "asana.token is empty (set ASANA_ACCESS_TOKEN)".to_string(),
            ));
        }
        if self.watcher.project_id.trim().is_empty() {
            return Err(AppError::Validation("watcher.project_id is empty".to_string()));
        }
        if self.watcher.poll_interval_secs == 0 {
            return Err(AppError::Validation(
                "watcher.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        self.watched_actions()?;
        Ok(())
    }

    /// Ações configuradas, já convertidas
    pub fn watched_actions(&self) -> AppResult<Vec<Action>> {
        self.watcher
            .actions
            .iter()
            .map(|token| {
                token
                    .trim()
                    .parse::<Action>()
                    .map_err(|e| AppError::Validation(e.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_parse_error_becomes_config_error() {
        let result: AppResult<Settings> = Config::builder()
            .add_source(File::from_str("[watcher]\npoll_interval_secs = \"often\"", FileFormat::Toml))
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(AppError::from);

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_defaults_are_applied() {
        let settings = from_toml(
            r#"
            [asana]
            token = "pat"

            [watcher]
            project_id = "P1"
            "#,
        );

        assert_eq!(settings.asana.base_url, "https://app.asana.com/api/1.0");
        assert_eq!(settings.watcher.poll_interval_secs, 30);
        assert_eq!(
            settings.watched_actions().unwrap(),
            vec![Action::Added, Action::Changed, Action::Undeleted]
        );
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_token() {
        let settings = from_toml(
            r#"
            [asana]
            token = " "

            [watcher]
            project_id = "P1"
            "#,
        );
        assert!(matches!(settings.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validation_rejects_unknown_action() {
        let settings = from_toml(
            r#"
            [asana]
            token = "pat"

            [watcher]
            project_id = "P1"
            actions = ["added", "created"]
            "#,
        );
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("created"));
    }
}
