//! apply-diff command - Apply a unified diff to a page

use anyhow::Result;

use super::{parse_title, read_input, run_mutation};
use crate::cli::args::{PatchInput, TargetArgs};
use crate::cli::Context;
use crate::engine::{DiffRequest, MutationReport, Operation};

/// Apply a single-page unified diff to the target page.
pub fn apply_diff(
    ctx: &Context,
    target: &TargetArgs,
    input: &PatchInput,
    allow_title_change: bool,
) -> Result<MutationReport> {
    let patch_text = read_input(input.patch.as_deref(), input.file.as_deref())?;
    let request = DiffRequest {
        project: ctx.project(target.project.as_deref())?,
        title: parse_title(&target.title)?,
        patch_text,
        allow_title_change,
        retry_limit: target.retry_limit,
    };
    let engine = ctx.engine()?;

    let result = run_mutation(|cancel| async move {
        engine.apply_unified_diff_with_cancel(request, &cancel).await
    })?;
    Ok(MutationReport::from_result(Operation::ApplyDiff, &result))
}
