//! Eventos do stream `/events`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{AsanaError, Result};

/// Ações que disparam eventos e webhooks
///
/// Ver https://developers.asana.com/docs/actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Added,
    Changed,
    Deleted,
    Undeleted,
    Removed,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Added,
        Action::Changed,
        Action::Deleted,
        Action::Undeleted,
        Action::Removed,
    ];

    /// Token JSON da ação
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Added => "added",
            Action::Changed => "changed",
            Action::Deleted => "deleted",
            Action::Undeleted => "undeleted",
            Action::Removed => "removed",
        }
    }

    /// A task deixou de existir (ou saiu do recurso observado)
    pub fn is_removal(&self) -> bool {
        matches!(self, Action::Deleted | Action::Removed)
    }
}

impl FromStr for Action {
    type Err = AsanaError;

    fn from_str(token: &str) -> Result<Self> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == token)
            .ok_or_else(|| AsanaError::UnknownAction(token.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evento classificado de um recurso
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// GID do recurso onde o evento ocorreu
    pub resource_gid: String,

    /// Tipo de mudança
    pub action: Action,

    /// Corpo `change` do evento, quando presente
    pub change: Option<JsonValue>,
}

impl Event {
    pub fn new(resource_gid: impl Into<String>, action: Action) -> Self {
        Self {
            resource_gid: resource_gid.into(),
            action,
            change: None,
        }
    }
}

/// Uma resposta completa de `/events` (todas as páginas) e o sync token seguinte
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPage {
    pub data: Vec<JsonValue>,
    pub sync: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tokens() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
        assert!(matches!("created".parse::<Action>(), Err(AsanaError::UnknownAction(_))));
    }
}
