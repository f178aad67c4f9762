use anyhow::Result;
use calref_core::cancel::cancellable;
use calref_core::gateway::CalendarGateway;
use calref_core::{CalRefError, CalRefResult};
use calref_provider_google::GoogleGateway;
use tokio_util::sync::CancellationToken;

use super::Context;

pub async fn run(ctx: &Context, logout: bool) -> Result<()> {
    let store = ctx.credential_store();
    let cache_path = ctx.settings.token_cache_path();

    if logout {
        if store.logout()? {
            println!("Removed cached credential {}", cache_path.display());
        } else {
            println!("No cached credential at {}", cache_path.display());
        }
        return Ok(());
    }

    let credential = store.authorize(&ctx.cancel).await?;
    let gateway = GoogleGateway::new(credential);

    match account_email(&gateway, &ctx.cancel).await? {
        Some(email) => println!("Authorized as {email}"),
        None => println!("Authorized"),
    }
    println!("Credential saved to {}", cache_path.display());

    Ok(())
}

/// The authorized account, if the service reports it. Only cancellation is an error.
async fn account_email(
    gateway: &dyn CalendarGateway,
    cancel: &CancellationToken,
) -> CalRefResult<Option<String>> {
    match cancellable(cancel, gateway.authenticated_email()).await {
        Ok(email) => Ok(Some(email)),
        Err(CalRefError::Cancelled) => Err(CalRefError::Cancelled),
        Err(e) => {
            tracing::debug!(error = %e, "Could not look up authorized account");
            Ok(None)
        }
    }
}
