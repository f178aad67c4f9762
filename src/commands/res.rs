use anyhow::Result;
use calref_core::cancel::cancellable;
use calref_core::directory::filter_by_building;
use calref_core::gateway::CalendarGateway;

use super::Context;
use crate::render;

pub async fn list(ctx: &Context, building: Option<&str>) -> Result<()> {
    let gateway = ctx.gateway().await?;
    let resources = cancellable(
        &ctx.cancel,
        gateway.fetch_resources(&ctx.settings.customer_id),
    )
    .await?;

    let resources = filter_by_building(&resources, building.unwrap_or_default());

    println!("{}", render::resources(&resources, ctx.format)?);
    Ok(())
}
