//! engine::gate
//!
//! Access gating for page mutations.
//!
//! # Architecture
//!
//! Gating decides whether a project may be mutated at all, before any
//! content is fetched. The policy is an ordered list of deny patterns and an
//! ordered list of allow patterns, compiled once when the policy is built.
//!
//! **Key insight:** evaluation is deny-first. A project matching any deny
//! pattern is never writable, whatever the allow list says. An empty allow
//! list makes every project read-only (editability is opt-in).
//!
//! # Patterns
//!
//! Each pattern is a regular expression matched against the *whole* project
//! name. A pattern that is not a valid regex is kept as a literal and
//! matched by exact string equality instead.
//!
//! # Invariants
//!
//! - Gating is a pure predicate with no side effects
//! - Gating is deterministic given the same policy and project
//! - A deny match always wins
//!
//! # Example
//!
//! ```
//! use pagewright::engine::gate::{AccessPolicy, GateResult};
//!
//! let policy = AccessPolicy::new(["team-.*", "main"], ["team-archive"]);
//!
//! assert!(policy.is_writable("main"));
//! assert!(policy.is_writable("team-notes"));
//! assert!(!policy.is_writable("team-archive"));
//! assert!(!policy.is_writable("maintenance"));
//!
//! match policy.gate("team-archive") {
//!     GateResult::Writable => unreachable!(),
//!     GateResult::Denied(reason) => println!("{reason}"),
//! }
//! ```

use regex::Regex;
use serde::Serialize;

/// A compiled access pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Valid regex, anchored to the whole project name.
    Regex { source: String, regex: Regex },
    /// Invalid regex source, matched by exact string equality.
    Literal(String),
}

impl Pattern {
    /// Compile a pattern, falling back to a literal on invalid regex.
    pub fn compile(source: &str) -> Self {
        match Regex::new(&format!("^(?:{source})$")) {
            Ok(regex) => Pattern::Regex {
                source: source.to_string(),
                regex,
            },
            Err(e) => {
                tracing::debug!(pattern = source, error = %e, "invalid regex, matching literally");
                Pattern::Literal(source.to_string())
            }
        }
    }

    /// Whether the project name matches this pattern.
    pub fn matches(&self, project: &str) -> bool {
        match self {
            Pattern::Regex { regex, .. } => regex.is_match(project),
            Pattern::Literal(literal) => literal == project,
        }
    }

    /// The pattern as written in configuration.
    pub fn source(&self) -> &str {
        match self {
            Pattern::Regex { source, .. } => source,
            Pattern::Literal(literal) => literal,
        }
    }

    /// Whether this pattern fell back to literal matching.
    pub fn is_literal(&self) -> bool {
        matches!(self, Pattern::Literal(_))
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source())
    }
}

/// Allow/deny policy deciding which projects are writable.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    allow: Vec<Pattern>,
    deny: Vec<Pattern>,
}

/// Why a project was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DenyReason {
    /// A deny pattern matched.
    DeniedBy { pattern: String },
    /// No allow pattern matched.
    NotAllowed { allowed: Vec<String> },
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::DeniedBy { pattern } => {
                write!(f, "matched deny pattern '{pattern}'")
            }
            DenyReason::NotAllowed { allowed } if allowed.is_empty() => {
                write!(f, "no projects are configured as editable")
            }
            DenyReason::NotAllowed { allowed } => {
                write!(
                    f,
                    "not in the list of editable projects. Editable projects: {}",
                    allowed.join(", ")
                )
            }
        }
    }
}

/// Result of gating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateResult {
    /// The project may be mutated.
    Writable,
    /// The project must not be mutated.
    Denied(DenyReason),
}

impl GateResult {
    pub fn is_writable(&self) -> bool {
        matches!(self, GateResult::Writable)
    }
}

impl AccessPolicy {
    /// Build a policy from allow and deny pattern sources.
    pub fn new<A, D>(allow: A, deny: D) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self {
            allow: allow
                .into_iter()
                .map(|p| Pattern::compile(p.as_ref()))
                .collect(),
            deny: deny
                .into_iter()
                .map(|p| Pattern::compile(p.as_ref()))
                .collect(),
        }
    }

    /// A policy that refuses every project.
    pub fn deny_all() -> Self {
        Self::default()
    }

    pub fn allow_patterns(&self) -> &[Pattern] {
        &self.allow
    }

    pub fn deny_patterns(&self) -> &[Pattern] {
        &self.deny
    }

    /// Decide whether `project` may be mutated, with the reason if not.
    pub fn gate(&self, project: &str) -> GateResult {
        if let Some(pattern) = self.deny.iter().find(|p| p.matches(project)) {
            return GateResult::Denied(DenyReason::DeniedBy {
                pattern: pattern.source().to_string(),
            });
        }
        if self.allow.iter().any(|p| p.matches(project)) {
            return GateResult::Writable;
        }
        GateResult::Denied(DenyReason::NotAllowed {
            allowed: self.allow.iter().map(|p| p.source().to_string()).collect(),
        })
    }

    /// Whether `project` may be mutated.
    pub fn is_writable(&self, project: &str) -> bool {
        self.gate(project).is_writable()
    }
}
