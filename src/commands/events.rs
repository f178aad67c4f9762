use anyhow::Result;
use calref_core::constants::PRIMARY_CALENDAR_ID;
use calref_core::reconcile::CombineMode;

use super::{Context, ReferenceArgs, WindowArgs};

pub async fn run(
    ctx: &Context,
    calendar_id: Option<String>,
    window: &WindowArgs,
    refs: &ReferenceArgs,
) -> Result<()> {
    let calendar_id = calendar_id.unwrap_or_else(|| PRIMARY_CALENDAR_ID.to_string());
    let request = ctx.request(vec![calendar_id], window, refs)?;

    ctx.reconcile_and_print(request, CombineMode::Single).await
}
