//! write command - Replace a page's entire content

use anyhow::Result;

use super::{parse_title, read_input, run_mutation};
use crate::cli::args::{ContentInput, TargetArgs};
use crate::cli::Context;
use crate::engine::{MutationReport, Operation, OverwriteRequest};

/// Overwrite the target page with the given content.
pub fn write(
    ctx: &Context,
    target: &TargetArgs,
    input: &ContentInput,
    allow_title_change: bool,
) -> Result<MutationReport> {
    let new_content = read_input(input.content.as_deref(), input.file.as_deref())?;
    let request = OverwriteRequest {
        project: ctx.project(target.project.as_deref())?,
        title: parse_title(&target.title)?,
        new_content,
        allow_title_change,
        retry_limit: target.retry_limit,
    };
    let engine = ctx.engine()?;

    let result = run_mutation(|cancel| async move {
        engine.overwrite_with_cancel(request, &cancel).await
    })?;
    Ok(MutationReport::from_result(Operation::Overwrite, &result))
}
