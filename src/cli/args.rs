//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file instead of searching
//! - `--store <path>`: Page store root directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pagewright - safe, retrying edits to wiki pages
#[derive(Parser, Debug)]
#[command(name = "pagewright")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to load instead of the default search path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Page store root directory
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true, conflicts_with = "debug")]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Page targeted by a mutation.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Page title (also the expected first line)
    #[arg(long)]
    pub title: String,

    /// Project name (defaults to the configured project)
    #[arg(long)]
    pub project: Option<String>,

    /// Retries after the first attempt (defaults to the configured limit)
    #[arg(long, value_name = "N")]
    pub retry_limit: Option<u32>,
}

/// Replacement content for `write`.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct ContentInput {
    /// New page content; use newlines to separate lines
    #[arg(long, allow_hyphen_values = true)]
    pub content: Option<String>,

    /// Read new page content from a file ("-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// Patch text for `apply-diff`.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct PatchInput {
    /// Unified diff text
    #[arg(long, allow_hyphen_values = true)]
    pub patch: Option<String>,

    /// Read the unified diff from a file ("-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Insert lines after an anchor line
    #[command(
        name = "insert",
        long_about = "Insert lines after the first line whose text equals the anchor exactly.\n\n\
            If no line matches, the lines are appended to the end of the page.",
        after_help = "\
EXAMPLES:
    # Add two lines under a heading
    pagewright insert --title \"Weekly sync\" --after \"Agenda\" --text $'item one\\nitem two'"
    )]
    Insert {
        #[command(flatten)]
        target: TargetArgs,

        /// Exact text of the line to insert after
        #[arg(long = "after", value_name = "ANCHOR", allow_hyphen_values = true)]
        after: String,

        /// Lines to insert; use newlines to separate lines
        #[arg(long, allow_hyphen_values = true)]
        text: String,
    },

    /// Replace a page's entire content
    #[command(
        name = "write",
        long_about = "Replace a page's entire content.\n\n\
            The first line of the new content must equal the page title unless \
            --allow-title-change is given."
    )]
    Write {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        input: ContentInput,

        /// Allow the first line to differ from the title
        #[arg(long)]
        allow_title_change: bool,
    },

    /// Apply a single-page unified diff
    #[command(
        name = "apply-diff",
        long_about = "Apply a unified diff to a page.\n\n\
            The diff must touch exactly one file. Hunks are located by their context \
            lines within a small window around the declared position; if any hunk \
            cannot be located, nothing is applied.",
        after_help = "\
EXAMPLES:
    # Apply a patch from a file
    pagewright apply-diff --title \"Weekly sync\" --file change.diff

    # Apply a patch from stdin
    git diff --no-index old.txt new.txt | pagewright apply-diff --title \"Weekly sync\" --file -"
    )]
    ApplyDiff {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        input: PatchInput,

        /// Allow the patch to change the first line
        #[arg(long)]
        allow_title_change: bool,
    },

    /// Check whether a project is writable under the current policy
    #[command(name = "check-access")]
    CheckAccess {
        /// Project name to check
        project: String,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the path of the config file in use
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_insert() {
        let cli = Cli::try_parse_from([
            "pagewright", "insert", "--title", "T", "--after", "a", "--text", "b",
        ])
        .unwrap();
        let Command::Insert { target, after, text } = cli.command else {
            panic!("expected insert");
        };
        assert_eq!(target.title, "T");
        assert_eq!(target.project, None);
        assert_eq!(after, "a");
        assert_eq!(text, "b");
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pagewright", "check-access", "main", "--json", "--store", "/tmp/x",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn write_requires_exactly_one_source() {
        let none = Cli::try_parse_from(["pagewright", "write", "--title", "T"]);
        assert!(none.is_err());

        let both = Cli::try_parse_from([
            "pagewright", "write", "--title", "T", "--content", "x", "--file", "f",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn retry_limit_must_be_non_negative() {
        let result = Cli::try_parse_from([
            "pagewright", "apply-diff", "--title", "T", "--patch", "p", "--retry-limit", "-1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn patch_text_may_start_with_dashes() {
        let cli = Cli::try_parse_from([
            "pagewright", "apply-diff", "--title", "T", "--patch", "--- a/T\n+++ b/T\n",
        ])
        .unwrap();
        let Command::ApplyDiff { input, .. } = cli.command else {
            panic!("expected apply-diff");
        };
        assert_eq!(input.patch.as_deref(), Some("--- a/T\n+++ b/T\n"));
    }

    #[test]
    fn quiet_conflicts_with_debug() {
        let result = Cli::try_parse_from(["pagewright", "-q", "--debug", "config", "path"]);
        assert!(result.is_err());
    }
}
