//! `CalendarGateway` over the Calendar v3 and Directory v1 REST APIs.

use async_trait::async_trait;
use calref_core::directory::{CalendarEntry, CalendarResource, primary_calendar_email};
use calref_core::gateway::CalendarGateway;
use calref_core::window::QueryWindow;
use calref_core::{CalRefError, CalRefResult, Event};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;
use url::Url;

use crate::auth::TokenRefresher;
use crate::credential::Credential;

pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const DIRECTORY_API_BASE: &str = "https://admin.googleapis.com/admin/directory/v1";

/// One page of a Google list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug)]
pub struct GoogleGateway {
    http: reqwest::Client,
    calendar_base: String,
    directory_base: String,
    credential: Mutex<Credential>,
    refresher: Option<TokenRefresher>,
    email: OnceCell<String>,
}

impl GoogleGateway {
    pub fn new(credential: Credential) -> Self {
        GoogleGateway {
            http: reqwest::Client::new(),
            calendar_base: CALENDAR_API_BASE.to_string(),
            directory_base: DIRECTORY_API_BASE.to_string(),
            credential: Mutex::new(credential),
            refresher: None,
            email: OnceCell::new(),
        }
    }

    pub fn with_refresher(mut self, refresher: TokenRefresher) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Point the gateway at other API roots (a local mock server in tests).
    pub fn with_base_urls(mut self, calendar: impl Into<String>, directory: impl Into<String>) -> Self {
        self.calendar_base = calendar.into();
        self.directory_base = directory.into();
        self
    }

    fn endpoint(&self, base: &str, segments: &[&str], context_id: &str) -> CalRefResult<Url> {
        let mut url = Url::parse(base)
            .map_err(|e| CalRefError::Config(format!("invalid API base URL '{base}': {e}")))?;

        url.path_segments_mut()
            .map_err(|_| CalRefError::Config(format!("API base URL '{base}' cannot take a path")))?
            .pop_if_empty()
            .extend(segments);

        debug!(calendar = context_id, url = %url, "Built endpoint");
        Ok(url)
    }

    /// The access token to send, refreshed first if it has expired.
    async fn access_token(&self) -> CalRefResult<String> {
        let mut credential = self.credential.lock().await;

        if let Some(refresher) = &self.refresher {
            if credential.is_expired() {
                *credential = refresher.refresh(&credential).await?;
            }
        }

        Ok(credential.access_token.clone())
    }

    async fn force_refresh(&self, rejected_token: &str) -> CalRefResult<()> {
        let Some(refresher) = &self.refresher else {
            return Err(CalRefError::Auth(
                "access token rejected; run `calref auth` to re-authorize".into(),
            ));
        };

        let mut credential = self.credential.lock().await;

        // Another request may have refreshed while this one waited.
        if credential.access_token == rejected_token {
            *credential = refresher.refresh(&credential).await?;
        }

        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url, context_id: &str) -> CalRefResult<T> {
        let mut retried = false;

        loop {
            let token = self.access_token().await?;

            let response = self
                .http
                .get(url.clone())
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| CalRefError::fetch(context_id, e))?;

            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !retried {
                debug!(calendar = context_id, "Access token rejected, refreshing");
                self.force_refresh(&token).await?;
                retried = true;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(CalRefError::fetch(context_id, format!("{status}: {}", body.trim())));
            }

            return response
                .json::<T>()
                .await
                .map_err(|e| CalRefError::fetch(context_id, format!("invalid response: {e}")));
        }
    }

    /// Follow `nextPageToken` until the listing is exhausted.
    async fn get_all<T: DeserializeOwned>(&self, url: Url, context_id: &str) -> CalRefResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut page_url = url.clone();
            if let Some(token) = &page_token {
                page_url.query_pairs_mut().append_pair("pageToken", token);
            }

            let page: Page<T> = self.get_json(&page_url, context_id).await?;
            items.extend(page.items);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl CalendarGateway for GoogleGateway {
    async fn fetch_events(&self, calendar_id: &str, window: &QueryWindow) -> CalRefResult<Vec<Event>> {
        let mut url = self.endpoint(
            &self.calendar_base,
            &["calendars", calendar_id, "events"],
            calendar_id,
        )?;

        url.query_pairs_mut()
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime")
            .append_pair("showDeleted", "false")
            .append_pair("timeMin", &window.time_min())
            .append_pair("timeMax", &window.time_max());

        let events: Vec<Event> = self.get_all(url, calendar_id).await?;
        debug!(calendar = calendar_id, events = events.len(), "Fetched events");

        Ok(events)
    }

    async fn fetch_calendar_list(&self) -> CalRefResult<Vec<CalendarEntry>> {
        let url = self.endpoint(&self.calendar_base, &["users", "me", "calendarList"], "calendarList")?;
        self.get_all(url, "calendarList").await
    }

    async fn fetch_resources(&self, customer_id: &str) -> CalRefResult<Vec<CalendarResource>> {
        let url = self.endpoint(
            &self.directory_base,
            &["customer", customer_id, "resources", "calendars"],
            customer_id,
        )?;
        self.get_all(url, customer_id).await
    }

    async fn authenticated_email(&self) -> CalRefResult<String> {
        self.email
            .get_or_try_init(|| async {
                let calendars = self.fetch_calendar_list().await?;
                primary_calendar_email(&calendars)
                    .map(str::to_string)
                    .ok_or_else(|| CalRefError::Auth("no primary calendar in calendar list".into()))
            })
            .await
            .cloned()
    }
}
