//! OAuth client configuration.
//!
//! Reads the `credentials.json` downloaded from the Google Cloud console.
//! Both the `installed` and `web` shapes are accepted, as is a flat object
//! with just `client_id` and `client_secret`.

use std::path::Path;

use calref_core::{CalRefError, CalRefResult};
use serde::Deserialize;

/// Google OAuth client credentials (user-provided).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CredentialsFile {
    Installed { installed: ClientConfig },
    Web { web: ClientConfig },
    Flat(ClientConfig),
}

impl ClientConfig {
    pub fn load(path: &Path) -> CalRefResult<Self> {
        if !path.exists() {
            return Err(CalRefError::Config(format!(
                "Google OAuth client credentials not found.\n\n\
                Download an OAuth client (Desktop app) from\n\
                https://console.cloud.google.com/apis/credentials\n\
                and save it as {}\n\
                (or point CALREF_OAUTH_CREDENTIALS_JSON at it).\n\n\
                Application default credentials (gcloud auth application-default login)\n\
                are not used; a client file is required.",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents).map_err(|e| {
            CalRefError::Config(format!(
                "Failed to parse OAuth credentials from {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn from_json(contents: &str) -> CalRefResult<Self> {
        let file: CredentialsFile = serde_json::from_str(contents)?;

        let config = match file {
            CredentialsFile::Installed { installed } => installed,
            CredentialsFile::Web { web } => web,
            CredentialsFile::Flat(config) => config,
        };

        if config.client_id.is_empty() {
            return Err(CalRefError::Config("client_id is empty".into()));
        }

        Ok(config)
    }
}
