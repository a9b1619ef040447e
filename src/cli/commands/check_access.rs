//! check-access command - Report whether a project is writable

use anyhow::Result;
use serde::Serialize;

use crate::cli::Context;
use crate::engine::{EngineConfig, GateResult};

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessCheck {
    pub project: String,
    pub writable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AccessCheck {
    pub fn message(&self) -> String {
        match &self.reason {
            None => format!("Project '{}' is writable.", self.project),
            Some(reason) => format!("Project '{}' is not writable: {}", self.project, reason),
        }
    }
}

/// Gate `project` against the configured policy without touching the store.
pub fn check_access(ctx: &Context, project: &str) -> Result<AccessCheck> {
    let policy = EngineConfig::from(&ctx.config).policy;
    let reason = match policy.gate(project) {
        GateResult::Writable => None,
        GateResult::Denied(reason) => Some(reason.to_string()),
    };
    tracing::debug!(project, writable = reason.is_none(), "access checked");

    Ok(AccessCheck {
        project: project.to_string(),
        writable: reason.is_none(),
        reason,
    })
}
