//! Recursos endereçáveis por GID

use std::fmt;

use super::TaskRecord;

/// Recurso do Asana usado como contexto de custom fields ou de eventos
///
/// A variante `Task` carrega a task já buscada: o catálogo de uma task lê as
/// definições embutidas nela, sem nova requisição.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Task(TaskRecord),
    Project(String),
    Workspace(String),
    Portfolio(String),
}

impl Resource {
    pub fn project(gid: impl Into<String>) -> Self {
        Resource::Project(gid.into())
    }

    pub fn workspace(gid: impl Into<String>) -> Self {
        Resource::Workspace(gid.into())
    }

    pub fn gid(&self) -> &str {
        match self {
            Resource::Task(task) => &task.gid,
            Resource::Project(gid) | Resource::Workspace(gid) | Resource::Portfolio(gid) => gid,
        }
    }

    /// Nome do tipo como a API escreve em `resource_type`
    pub fn kind_name(&self) -> &'static str {
        match self {
            Resource::Task(_) => "task",
            Resource::Project(_) => "project",
            Resource::Workspace(_) => "workspace",
            Resource::Portfolio(_) => "portfolio",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind_name(), self.gid())
    }
}
