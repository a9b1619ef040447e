//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the engine to execute the command
//! 3. Returns a structured result that `dispatch` renders
//!
//! Handlers do NOT edit pages directly.
//!
//! # Async Commands
//!
//! Mutations are async because store operations involve I/O. Each one
//! runs on its own tokio runtime; Ctrl-C sets the engine's cancel flag so
//! the in-flight attempt completes and no new attempt starts.

mod apply_diff;
mod check_access;
mod config_cmd;
mod insert;
mod write;

// Re-export command functions for testing and direct invocation
pub use apply_diff::apply_diff;
pub use check_access::{check_access, AccessCheck};
pub use config_cmd::{effective, path as config_path, show as config_show, EffectiveConfig};
pub use insert::insert;
pub use write::write;

use std::future::Future;
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context as _, Result};

use crate::cli::args::{Command, ConfigAction};
use crate::cli::Context;
use crate::core::types::PageTitle;
use crate::engine::{CancelFlag, MutationError, MutationReport, MutationSummary};
use crate::ui::output;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<ExitCode> {
    match command {
        Command::Insert {
            target,
            after,
            text,
        } => render(ctx, insert(ctx, &target, &after, &text)?),
        Command::Write {
            target,
            input,
            allow_title_change,
        } => render(ctx, write(ctx, &target, &input, allow_title_change)?),
        Command::ApplyDiff {
            target,
            input,
            allow_title_change,
        } => render(ctx, apply_diff(ctx, &target, &input, allow_title_change)?),
        Command::CheckAccess { project } => {
            let check = check_access(ctx, &project)?;
            if ctx.json {
                output::json(&check)?;
            } else {
                output::print(check.message(), ctx.verbosity);
            }
            Ok(exit_code(!check.writable))
        }
        Command::Config { action } => {
            match action {
                ConfigAction::Show => config_show(ctx)?,
                ConfigAction::Path => config_path(ctx)?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn render(ctx: &Context, report: MutationReport) -> Result<ExitCode> {
    output::report(&report, ctx.json, ctx.verbosity)?;
    Ok(exit_code(report.is_error))
}

fn exit_code(is_error: bool) -> ExitCode {
    if is_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn parse_title(title: &str) -> Result<PageTitle> {
    PageTitle::new(title).context("Invalid page title")
}

/// Run one engine call to completion on a fresh runtime.
///
/// Ctrl-C sets the cancel flag handed to `call`.
fn run_mutation<F, Fut>(call: F) -> Result<Result<MutationSummary, MutationError>>
where
    F: FnOnce(CancelFlag) -> Fut,
    Fut: Future<Output = Result<MutationSummary, MutationError>>,
{
    let rt = tokio::runtime::Runtime::new()?;
    let cancel = CancelFlag::new();

    Ok(rt.block_on(async {
        let flag = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted; stopping after the current attempt");
                flag.cancel();
            }
        });
        call(cancel).await
    }))
}

/// Text given inline, or read from a file (`-` for stdin).
///
/// File input has CRLF line endings normalized to `\n`, and a single
/// trailing newline is dropped so that a text file's final line terminator
/// does not become an extra empty line.
fn read_input(inline: Option<&str>, file: Option<&Path>) -> Result<String> {
    if let Some(text) = inline {
        return Ok(text.to_string());
    }
    let path = file.context("No input given")?;
    let mut text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    if text.contains('\r') {
        text = text.replace("\r\n", "\n");
    }
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn inline_input_is_verbatim() {
        assert_eq!(read_input(Some("a\n"), None).unwrap(), "a\n");
    }

    #[test]
    fn file_input_drops_one_trailing_newline() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("content.txt");
        std::fs::write(&path, "Title\nbody\n\n").unwrap();
        assert_eq!(read_input(None, Some(&path)).unwrap(), "Title\nbody\n");
    }

    #[test]
    fn crlf_file_input_is_normalized() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("content.txt");
        std::fs::write(&path, "Title\r\nbody\r\n").unwrap();
        assert_eq!(read_input(None, Some(&path)).unwrap(), "Title\nbody");
    }

    #[test]
    fn missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.txt");
        assert!(read_input(None, Some(&path)).is_err());
    }

    #[test]
    fn blank_title_rejected() {
        assert!(parse_title("  ").is_err());
        assert!(parse_title("Title").is_ok());
    }
}
