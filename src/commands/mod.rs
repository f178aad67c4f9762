pub mod auth;
pub mod combine;
pub mod events;
pub mod ls;
pub mod res;

use anyhow::{Context as _, Result};
use calref_core::reconcile::{CombineMode, ReconcileRequest, reconcile};
use calref_core::reference::ReferenceSources;
use calref_core::window::QueryWindow;
use calref_provider_google::{CredentialStore, GoogleGateway};
use chrono::Utc;
use clap::Args;
use tokio_util::sync::CancellationToken;

use crate::render::{self, DEFAULT_EVENT_FIELDS, EventField, Format};
use crate::settings::Settings;

/// `--since` / `--until`.
#[derive(Debug, Clone, Default, Args)]
pub struct WindowArgs {
    /// Start date (RFC3339 or YYYY-MM-DD)
    #[arg(long, default_value = "")]
    pub since: String,

    /// End date (RFC3339 or YYYY-MM-DD)
    #[arg(long, default_value = "")]
    pub until: String,
}

/// Where to look for the details of private events.
#[derive(Debug, Clone, Default, Args)]
pub struct ReferenceArgs {
    /// Reference calendar ID for private event completion (repeatable)
    #[arg(short = 'r', long = "ref")]
    pub refs: Vec<String>,

    /// Use all of your calendars as references
    #[arg(short = 'R', long = "ref-mycals")]
    pub ref_my_calendars: bool,

    /// Use every resource calendar in this building as a reference
    #[arg(long)]
    pub building: Option<String>,
}

/// What every command needs: settings, output options and the cancel token.
pub struct Context {
    pub settings: Settings,
    pub format: Format,
    fields: Vec<EventField>,
    pub cancel: CancellationToken,
}

impl Context {
    pub fn new(settings: Settings, format: Format, fields: Vec<EventField>, cancel: CancellationToken) -> Self {
        Context {
            settings,
            format,
            fields,
            cancel,
        }
    }

    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::new(
            self.settings.token_cache_path(),
            self.settings.credentials_path(),
            self.settings.auth_timeout(),
        )
    }

    pub async fn gateway(&self) -> Result<GoogleGateway> {
        self.credential_store()
            .gateway(&self.cancel)
            .await
            .context("Failed to authorize")
    }

    pub fn fields(&self) -> &[EventField] {
        if self.fields.is_empty() {
            DEFAULT_EVENT_FIELDS
        } else {
            &self.fields
        }
    }

    pub fn request(
        &self,
        calendar_ids: Vec<String>,
        window: &WindowArgs,
        refs: &ReferenceArgs,
    ) -> Result<ReconcileRequest> {
        let tz = self.settings.timezone();
        let today = Utc::now().with_timezone(&tz).date_naive();
        let window = QueryWindow::parse(&window.since, &window.until, tz, today)?;

        let references = ReferenceSources {
            explicit_ids: refs.refs.clone(),
            include_my_calendars: refs.ref_my_calendars,
            building_id: refs.building.clone(),
            customer_id: self.settings.customer_id.clone(),
        };

        let mut request = ReconcileRequest::new(calendar_ids, window, references);
        request.reference_concurrency = self.settings.reference_concurrency;
        Ok(request)
    }

    /// Build the request, run it and print the events.
    pub async fn reconcile_and_print(&self, request: ReconcileRequest, mode: CombineMode) -> Result<()> {
        let gateway = self.gateway().await?;
        let events = reconcile(&gateway, &request, mode, &self.cancel).await?;

        println!("{}", render::events(&events, self.fields(), self.format)?);
        Ok(())
    }
}
