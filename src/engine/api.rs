//! engine::api
//!
//! The three mutation entry points.
//!
//! # Architecture
//!
//! ```text
//! request -> Access Gate -> [parse / preflight] -> Retry Controller -> summary
//! ```
//!
//! Every entry point gates the project first, then resolves its edit into a
//! [`MutationRequest`] and hands it to [`mutate_with_retry`]. Failures that
//! do not depend on page content (denied project, malformed patch, an
//! overwrite that renames the page) are returned before any attempt runs.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use pagewright::core::types::{PageTitle, ProjectName};
//! use pagewright::engine::{AccessPolicy, DiffRequest, Engine, EngineConfig};
//! use pagewright::store::mock::MockStore;
//!
//! # tokio_test::block_on(async {
//! let project = ProjectName::new("main").unwrap();
//! let title = PageTitle::new("Title").unwrap();
//! let store = MockStore::new().with_page(&project, &title, ["Title", "line1", "line2"]);
//!
//! let engine = Engine::new(
//!     Arc::new(store.clone()),
//!     EngineConfig {
//!         policy: AccessPolicy::new(["main"], [] as [&str; 0]),
//!         ..EngineConfig::default()
//!     },
//! );
//!
//! let summary = engine
//!     .apply_unified_diff(DiffRequest {
//!         project: project.clone(),
//!         title: title.clone(),
//!         patch_text: "--- a/Title\n+++ b/Title\n@@ -1,3 +1,3 @@\n Title\n-line1\n+line1 edited\n line2\n".into(),
//!         allow_title_change: false,
//!         retry_limit: None,
//!     })
//!     .await
//!     .unwrap();
//!
//! assert_eq!(summary.attempts, 1);
//! assert_eq!(
//!     store.page(&project, &title).unwrap().lines(),
//!     &["Title", "line1 edited", "line2"]
//! );
//! # });
//! ```

use std::sync::Arc;

use super::gate::{AccessPolicy, GateResult};
use super::guard::guard_title;
use super::runner::{mutate_with_retry, CancelFlag, MutationError, MutationSummary, RetryPolicy};
use super::strategy::{Edit, MutationRequest};
use crate::core::config::Config;
use crate::core::types::{PageContent, PageTitle, ProjectName};
use crate::patch::parse;
use crate::store::PageStore;

/// Engine settings resolved from configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub policy: AccessPolicy,
    pub retry: RetryPolicy,
}

impl From<&Config> for EngineConfig {
    /// Compile the access policy and retry settings once per load.
    fn from(config: &Config) -> Self {
        Self {
            policy: AccessPolicy::new(config.allow_patterns(), config.deny_patterns()),
            retry: RetryPolicy {
                default_retry_limit: config.retry_limit(),
                backoff: config.retry_backoff(),
            },
        }
    }
}

/// Insert lines after an anchor line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertRequest {
    pub project: ProjectName,
    pub title: PageTitle,
    /// Exact text of the line to insert after.
    pub target_line_text: String,
    /// Newline-separated lines to insert.
    pub text: String,
    pub retry_limit: Option<u32>,
}

/// Replace a page's whole content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverwriteRequest {
    pub project: ProjectName,
    pub title: PageTitle,
    /// Newline-separated replacement content.
    pub new_content: String,
    pub allow_title_change: bool,
    pub retry_limit: Option<u32>,
}

/// Apply a single-page unified diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRequest {
    pub project: ProjectName,
    pub title: PageTitle,
    pub patch_text: String,
    pub allow_title_change: bool,
    pub retry_limit: Option<u32>,
}

/// Page mutation engine.
///
/// Holds no page content between calls; independent calls may run
/// concurrently against the same engine.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn PageStore>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(store: Arc<dyn PageStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn PageStore {
        self.store.as_ref()
    }

    pub async fn insert_after_anchor(
        &self,
        request: InsertRequest,
    ) -> Result<MutationSummary, MutationError> {
        self.insert_after_anchor_with_cancel(request, &CancelFlag::new())
            .await
    }

    pub async fn insert_after_anchor_with_cancel(
        &self,
        request: InsertRequest,
        cancel: &CancelFlag,
    ) -> Result<MutationSummary, MutationError> {
        self.check_access(&request.project)?;
        let mutation = MutationRequest {
            retry_limit: self.retry_limit(request.retry_limit),
            project: request.project,
            title: request.title,
            edit: Edit::InsertAfterAnchor {
                target_line_text: request.target_line_text,
                lines: PageContent::from_text(&request.text),
            },
            allow_title_change: false,
        };
        self.run(&mutation, cancel).await
    }

    pub async fn overwrite(
        &self,
        request: OverwriteRequest,
    ) -> Result<MutationSummary, MutationError> {
        self.overwrite_with_cancel(request, &CancelFlag::new()).await
    }

    pub async fn overwrite_with_cancel(
        &self,
        request: OverwriteRequest,
        cancel: &CancelFlag,
    ) -> Result<MutationSummary, MutationError> {
        self.check_access(&request.project)?;

        // The candidate does not depend on fetched content, so a rename is
        // rejected once here instead of on every attempt.
        let new_content = PageContent::from_text(&request.new_content);
        guard_title(
            &new_content,
            request.title.as_str(),
            request.allow_title_change,
        )
        .map_err(MutationError::TitleChangeRejected)?;

        let mutation = MutationRequest {
            retry_limit: self.retry_limit(request.retry_limit),
            project: request.project,
            title: request.title,
            edit: Edit::Overwrite { new_content },
            allow_title_change: request.allow_title_change,
        };
        self.run(&mutation, cancel).await
    }

    pub async fn apply_unified_diff(
        &self,
        request: DiffRequest,
    ) -> Result<MutationSummary, MutationError> {
        self.apply_unified_diff_with_cancel(request, &CancelFlag::new())
            .await
    }

    pub async fn apply_unified_diff_with_cancel(
        &self,
        request: DiffRequest,
        cancel: &CancelFlag,
    ) -> Result<MutationSummary, MutationError> {
        self.check_access(&request.project)?;
        let patch = parse(&request.patch_text).map_err(|e| {
            tracing::debug!(project = %request.project, title = %request.title, error = %e, "rejected patch");
            MutationError::PatchFormat(e)
        })?;

        let mutation = MutationRequest {
            retry_limit: self.retry_limit(request.retry_limit),
            project: request.project,
            title: request.title,
            edit: Edit::ApplyPatch { patch },
            allow_title_change: request.allow_title_change,
        };
        self.run(&mutation, cancel).await
    }

    fn check_access(&self, project: &ProjectName) -> Result<(), MutationError> {
        match self.config.policy.gate(project.as_str()) {
            GateResult::Writable => Ok(()),
            GateResult::Denied(reason) => {
                tracing::info!(project = %project, %reason, "project is not writable");
                Err(MutationError::AccessDenied {
                    project: project.to_string(),
                    reason,
                })
            }
        }
    }

    fn retry_limit(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.config.retry.default_retry_limit)
    }

    async fn run(
        &self,
        request: &MutationRequest,
        cancel: &CancelFlag,
    ) -> Result<MutationSummary, MutationError> {
        mutate_with_retry(self.store.as_ref(), request, self.config.retry.backoff, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::gate::DenyReason;
    use crate::store::mock::MockStore;

    const NONE: [&str; 0] = [];

    fn ids() -> (ProjectName, PageTitle) {
        (
            ProjectName::new("main").unwrap(),
            PageTitle::new("Title").unwrap(),
        )
    }

    fn engine(store: &MockStore, allow: &[&str], deny: &[&str]) -> Engine {
        Engine::new(
            Arc::new(store.clone()),
            EngineConfig {
                policy: AccessPolicy::new(allow.iter().copied(), deny.iter().copied()),
                retry: RetryPolicy::default(),
            },
        )
    }

    fn overwrite(content: &str, allow_title_change: bool) -> OverwriteRequest {
        let (project, title) = ids();
        OverwriteRequest {
            project,
            title,
            new_content: content.into(),
            allow_title_change,
            retry_limit: None,
        }
    }

    #[tokio::test]
    async fn denied_project_makes_no_store_calls() {
        let (project, title) = ids();
        let store = MockStore::new().with_page(&project, &title, ["Title"]);
        let engine = engine(&store, &["main"], &["main"]);

        let err = engine.overwrite(overwrite("Title\nx", false)).await.unwrap_err();

        assert_eq!(
            err,
            MutationError::AccessDenied {
                project: "main".into(),
                reason: DenyReason::DeniedBy {
                    pattern: "main".into()
                },
            }
        );
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn insert_is_gated() {
        let store = MockStore::new();
        let engine = engine(&store, &NONE, &NONE);
        let (project, title) = ids();

        let err = engine
            .insert_after_anchor(InsertRequest {
                project,
                title,
                target_line_text: "a".into(),
                text: "b".into(),
                retry_limit: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, MutationError::AccessDenied { .. }));
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn overwrite_rename_rejected_before_any_attempt() {
        let (project, title) = ids();
        let store = MockStore::new().with_page(&project, &title, ["Title"]);
        let engine = engine(&store, &["main"], &NONE);

        let err = engine.overwrite(overwrite("Renamed\nbody", false)).await.unwrap_err();

        assert!(matches!(err, MutationError::TitleChangeRejected(_)));
        assert_eq!(err.attempts(), 0);
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn overwrite_rename_allowed() {
        let (project, title) = ids();
        let store = MockStore::new().with_page(&project, &title, ["Title"]);
        let engine = engine(&store, &["main"], &NONE);

        engine.overwrite(overwrite("Renamed\nbody", true)).await.unwrap();

        assert_eq!(
            store.page(&project, &title),
            Some(PageContent::from(["Renamed", "body"]))
        );
    }

    #[tokio::test]
    async fn malformed_patch_rejected_before_any_attempt() {
        let (project, title) = ids();
        let store = MockStore::new().with_page(&project, &title, ["Title"]);
        let engine = engine(&store, &["main"], &NONE);

        let err = engine
            .apply_unified_diff(DiffRequest {
                project,
                title,
                patch_text: "not a patch".into(),
                allow_title_change: false,
                retry_limit: Some(5),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, MutationError::PatchFormat(_)));
        assert!(err.to_string().contains("--- a/Page title"));
        assert!(store.operations().is_empty());
    }

    #[test]
    fn engine_config_from_loaded_config() {
        let config = Config::from_file(crate::core::config::FileConfig {
            project: Some("main".into()),
            retry_limit: Some(1),
            retry_backoff_ms: Some(50),
            access: Some(crate::core::config::AccessConfig {
                allow: None,
                deny: vec!["main-archive".into()],
            }),
            store: None,
        });

        let engine_config = EngineConfig::from(&config);
        assert!(engine_config.policy.is_writable("main"));
        assert!(!engine_config.policy.is_writable("main-archive"));
        assert_eq!(engine_config.retry.default_retry_limit, 1);
        assert_eq!(engine_config.retry.backoff, std::time::Duration::from_millis(50));
    }

    #[tokio::test]
    async fn default_retry_limit_comes_from_config() {
        let (project, title) = ids();
        let store = MockStore::new().with_page(&project, &title, ["Title"]);
        let mut engine = engine(&store, &["main"], &NONE);
        engine.config.retry.default_retry_limit = 1;

        let summary = engine.overwrite(overwrite("Title\nx", false)).await.unwrap();
        assert_eq!(summary.max_attempts, 2);

        let mut request = overwrite("Title\ny", false);
        request.retry_limit = Some(0);
        let summary = engine.overwrite(request).await.unwrap();
        assert_eq!(summary.max_attempts, 1);
    }
}
