//! Obtaining and refreshing the Google OAuth credential.

use std::path::PathBuf;
use std::time::Duration;

use calref_core::cancel::cancellable;
use calref_core::{CalRefError, CalRefResult};
use google_calendar::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app_config::ClientConfig;
use crate::credential::{Credential, CredentialCache};
use crate::gateway::GoogleGateway;
use crate::loopback::LoopbackListener;

/// Read-only access to calendars and to the directory's calendar resources.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar.readonly",
    "https://www.googleapis.com/auth/admin.directory.resource.calendar.readonly",
];

/// Produces authorized gateways from the cache or the browser flow.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    cache: CredentialCache,
    credentials_path: PathBuf,
    auth_timeout: Duration,
}

impl CredentialStore {
    pub fn new(
        cache_path: impl Into<PathBuf>,
        credentials_path: impl Into<PathBuf>,
        auth_timeout: Duration,
    ) -> Self {
        CredentialStore {
            cache: CredentialCache::new(cache_path),
            credentials_path: credentials_path.into(),
            auth_timeout,
        }
    }

    /// An authorized gateway.
    ///
    /// A cached credential is used as-is, expired or not; the gateway
    /// refreshes it on first use. Without a usable cache the interactive
    /// flow runs.
    pub async fn gateway(&self, cancel: &CancellationToken) -> CalRefResult<GoogleGateway> {
        let credential = match self.cache.load() {
            Some(credential) => {
                debug!(path = %self.cache.path().display(), "Using cached credential");
                credential
            }
            None => self.authorize(cancel).await?,
        };

        Ok(GoogleGateway::new(credential).with_refresher(self.refresher()))
    }

    /// Run the browser authorization flow and cache the result.
    pub async fn authorize(&self, cancel: &CancellationToken) -> CalRefResult<Credential> {
        let config = ClientConfig::load(&self.credentials_path)?;
        let listener = LoopbackListener::bind().await?;

        let mut client = Client::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            listener.redirect_uri(),
            String::new(),
            String::new(),
        );

        let scopes: Vec<String> = SCOPES.iter().map(|s| s.to_string()).collect();
        let consent_url = client.user_consent_url(&scopes);
        let expected_state = query_param(&consent_url, "state");

        eprintln!("\nOpen this URL in your browser to authorize calref:\n");
        eprintln!("{}\n", consent_url);

        // Try to open the browser automatically
        if open::that(&consent_url).is_err() {
            eprintln!("(Could not open browser automatically, please copy the URL above)");
        }

        let callback = listener.wait_for_code(self.auth_timeout, cancel).await?;

        if expected_state.is_some_and(|state| state != callback.state) {
            return Err(CalRefError::Auth("state mismatch in redirect".into()));
        }

        eprintln!("Received authorization code, exchanging for tokens...");

        let token = cancellable(cancel, async {
            client
                .get_access_token(&callback.code, &callback.state)
                .await
                .map_err(|e| CalRefError::Auth(format!("code exchange failed: {e}")))
        })
        .await?;

        if token.access_token.is_empty() {
            return Err(CalRefError::Auth("token response carried no access token".into()));
        }

        let credential = Credential::from_token(&token, "");
        self.cache.save(&credential)?;

        info!(path = %self.cache.path().display(), "Authorization complete");
        Ok(credential)
    }

    /// Delete the cached credential. Returns whether one existed.
    pub fn logout(&self) -> CalRefResult<bool> {
        self.cache.remove()
    }

    fn refresher(&self) -> TokenRefresher {
        TokenRefresher {
            cache: self.cache.clone(),
            credentials_path: self.credentials_path.clone(),
        }
    }
}

/// Exchanges a refresh token for a new access token and re-caches it.
#[derive(Debug, Clone)]
pub struct TokenRefresher {
    cache: CredentialCache,
    credentials_path: PathBuf,
}

impl TokenRefresher {
    pub async fn refresh(&self, current: &Credential) -> CalRefResult<Credential> {
        if current.refresh_token.is_empty() {
            return Err(CalRefError::Auth(
                "access token expired and no refresh token is cached; run `calref auth`".into(),
            ));
        }

        let config = ClientConfig::load(&self.credentials_path)?;

        let client = Client::new(
            config.client_id,
            config.client_secret,
            String::new(),
            current.access_token.clone(),
            current.refresh_token.clone(),
        );

        let token = client
            .refresh_access_token()
            .await
            .map_err(|e| CalRefError::Auth(format!("token refresh failed: {e}")))?;

        // Google typically doesn't return a new refresh_token on refresh
        let credential = Credential::from_token(&token, &current.refresh_token);
        self.cache.save(&credential)?;

        debug!("Refreshed access token");
        Ok(credential)
    }
}

fn query_param(url: &str, name: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}
