//! engine::report
//!
//! Structured, caller-facing result of a mutation.
//!
//! Entry points return `Result<MutationSummary, MutationError>`. Callers
//! that need a uniform shape (the CLI, JSON output) convert either side
//! into a [`MutationReport`]: a message, an explicit error flag, and the
//! attempt count.

use serde::Serialize;

use super::runner::{AttemptError, MutationError, MutationSummary};
use super::strategy::EditError;
use crate::patch::ChangeSummary;

/// Which entry point produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Insert,
    Overwrite,
    ApplyDiff,
}

/// Classification of a failed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    AccessDenied,
    PatchFormat,
    Conflict,
    TitleChangeRejected,
    Transport,
    Cancelled,
}

impl AttemptError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AttemptError::Edit(EditError::Conflict(_)) => FailureKind::Conflict,
            AttemptError::Edit(EditError::TitleChange(_)) => FailureKind::TitleChangeRejected,
            AttemptError::Store(_) => FailureKind::Transport,
        }
    }
}

impl MutationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            MutationError::AccessDenied { .. } => FailureKind::AccessDenied,
            MutationError::PatchFormat(_) => FailureKind::PatchFormat,
            MutationError::TitleChangeRejected(_) => FailureKind::TitleChangeRejected,
            MutationError::Exhausted { last_error, .. } => last_error.kind(),
            MutationError::Cancelled { .. } => FailureKind::Cancelled,
        }
    }
}

/// Uniform result of one entry-point call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationReport {
    pub is_error: bool,
    pub message: String,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<ChangeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl MutationReport {
    pub fn success(operation: Operation, summary: &MutationSummary) -> Self {
        let target = format!(
            "page '{}' in project '{}'",
            summary.title, summary.project
        );
        let mut message = match (operation, summary.changes) {
            (Operation::Insert, Some(changes)) => {
                format!("Successfully inserted {} line(s) into {target}", changes.added)
            }
            (Operation::Insert, None) => format!("Successfully inserted lines into {target}"),
            (Operation::Overwrite, _) => format!("Successfully rewrote {target}"),
            (Operation::ApplyDiff, Some(changes)) => {
                format!("Successfully applied patch to {target}: {changes}")
            }
            (Operation::ApplyDiff, None) => format!("Successfully applied patch to {target}"),
        };
        if summary.attempts > 1 {
            message.push_str(&format!(
                " (attempt {}/{})",
                summary.attempts, summary.max_attempts
            ));
        }
        message.push('.');

        Self {
            is_error: false,
            message,
            attempts: summary.attempts,
            max_attempts: Some(summary.max_attempts),
            changes: summary.changes,
            kind: None,
        }
    }

    pub fn failure(err: &MutationError) -> Self {
        let max_attempts = match err {
            MutationError::Exhausted { max_attempts, .. } => Some(*max_attempts),
            _ => None,
        };
        Self {
            is_error: true,
            message: format!("Error: {err}"),
            attempts: err.attempts(),
            max_attempts,
            changes: None,
            kind: Some(err.kind()),
        }
    }

    pub fn from_result(
        operation: Operation,
        result: &Result<MutationSummary, MutationError>,
    ) -> Self {
        match result {
            Ok(summary) => Self::success(operation, summary),
            Err(err) => Self::failure(err),
        }
    }
}
