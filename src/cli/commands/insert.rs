//! insert command - Insert lines after an anchor line

use anyhow::Result;

use super::{parse_title, run_mutation};
use crate::cli::args::TargetArgs;
use crate::cli::Context;
use crate::engine::{InsertRequest, MutationReport, Operation};

/// Insert `text` after the first line equal to `after`.
///
/// Engine failures become an error report; only setup problems (no
/// project, bad title, no runtime) are returned as `Err`.
pub fn insert(ctx: &Context, target: &TargetArgs, after: &str, text: &str) -> Result<MutationReport> {
    let request = InsertRequest {
        project: ctx.project(target.project.as_deref())?,
        title: parse_title(&target.title)?,
        target_line_text: after.to_string(),
        text: text.to_string(),
        retry_limit: target.retry_limit,
    };
    let engine = ctx.engine()?;

    let result = run_mutation(|cancel| async move {
        engine.insert_after_anchor_with_cancel(request, &cancel).await
    })?;
    Ok(MutationReport::from_result(Operation::Insert, &result))
}
