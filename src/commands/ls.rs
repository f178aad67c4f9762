use anyhow::Result;
use calref_core::cancel::cancellable;
use calref_core::gateway::CalendarGateway;

use super::Context;
use crate::render;

pub async fn run(ctx: &Context) -> Result<()> {
    let gateway = ctx.gateway().await?;
    let calendars = cancellable(&ctx.cancel, gateway.fetch_calendar_list()).await?;

    println!("{}", render::calendars(&calendars, ctx.format)?);
    Ok(())
}
