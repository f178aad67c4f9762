//! The cached OAuth credential.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use calref_core::{CalRefError, CalRefResult};
use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use google_calendar::AccessToken;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Access/refresh token pair as persisted in the cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Credential {
    /// A credential from a token response. A response without a refresh
    /// token keeps `previous_refresh_token`.
    pub fn from_token(token: &AccessToken, previous_refresh_token: &str) -> Self {
        let refresh_token = if token.refresh_token.is_empty() {
            previous_refresh_token.to_string()
        } else {
            token.refresh_token.clone()
        };

        let expiry = (token.expires_in > 0).then(|| Utc::now() + Duration::seconds(token.expires_in));

        Credential {
            access_token: token.access_token.clone(),
            refresh_token,
            expiry,
        }
    }

    /// Whether the stored expiry has passed. Without an expiry the token
    /// is assumed valid until the API says otherwise.
    pub fn is_expired(&self) -> bool {
        self.expiry.is_some_and(|expiry| Utc::now() >= expiry)
    }
}

/// Location of the credential cache file.
#[derive(Debug, Clone)]
pub struct CredentialCache {
    path: PathBuf,
}

impl CredentialCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CredentialCache { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached credential. Missing or unreadable caches yield `None`.
    pub fn load(&self) -> Option<Credential> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "No cached credential");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable credential cache");
                None
            }
        }
    }

    /// Replace the cache atomically.
    ///
    /// The directory is created owner-only, the file is written owner-only
    /// to a sibling temporary file and renamed over the cache while an
    /// exclusive lock is held.
    pub fn save(&self, credential: &Credential) -> CalRefResult<()> {
        let contents = serde_json::to_string_pretty(credential)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent)?;
        }

        let lock = File::create(self.sibling("lock"))?;
        FileExt::lock_exclusive(&lock)?;

        let result = self.write_and_rename(contents.as_bytes());

        if let Err(e) = FileExt::unlock(&lock) {
            warn!(error = %e, "Failed to release credential cache lock");
        }

        result?;
        debug!(path = %self.path.display(), "Saved credential");
        Ok(())
    }

    /// Delete the cache. Returns whether a file was removed.
    pub fn remove(&self) -> CalRefResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CalRefError::Io(e)),
        }
    }

    fn sibling(&self, extension: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(extension);
        self.path.with_file_name(name)
    }

    fn write_and_rename(&self, contents: &[u8]) -> CalRefResult<()> {
        let tmp = self.sibling("tmp");

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            CalRefError::Io(e)
        })
    }
}

fn create_private_dir(dir: &Path) -> CalRefResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)?;
    }
    #[cfg(not(unix))]
    fs::create_dir_all(dir)?;

    Ok(())
}
