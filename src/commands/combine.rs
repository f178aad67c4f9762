use anyhow::Result;
use calref_core::reconcile::CombineMode;

use super::{Context, ReferenceArgs, WindowArgs};

/// `intersect` and `union`.
pub async fn run(
    ctx: &Context,
    calendar_ids: Vec<String>,
    mode: CombineMode,
    window: &WindowArgs,
    refs: &ReferenceArgs,
) -> Result<()> {
    if calendar_ids.len() < 2 {
        anyhow::bail!("At least two calendar IDs are required");
    }

    let request = ctx.request(calendar_ids, window, refs)?;
    ctx.reconcile_and_print(request, mode).await
}
