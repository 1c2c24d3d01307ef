use async_trait::async_trait;
use common::config::DropboxConfig;
use common::{Error, Result};
use std::time::Duration;
use tracing::warn;

const DROPBOX_CONTENT_URL: &str = "https://content.dropboxapi.com";

/// Read-only access to the staff file drop. Absence of a file is the normal
/// "nothing uploaded yet" signal, not an error.
#[async_trait]
pub trait TripSource: Send + Sync {
    /// Fetch the raw file at `path`, or `None` when no file exists there.
    async fn fetch(&self, path: &str) -> Result<Option<String>>;
}

pub struct DropboxSource {
    client: rquest::Client,
    base_url: String,
    token: String,
}

impl DropboxSource {
    pub fn new(config: &DropboxConfig) -> Result<Self> {
        let client = rquest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: DROPBOX_CONTENT_URL.to_string(),
            token: config.token.clone(),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl TripSource for DropboxSource {
    async fn fetch(&self, path: &str) -> Result<Option<String>> {
        let url = format!("{}/2/files/download", self.base_url);
        let arg = serde_json::json!({ "path": path }).to_string();

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Dropbox-API-Arg", arg)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("source store: {e}")))?;

        // The status must be checked before trusting the body; a partial or
        // rejected download is an upstream failure, not trip data.
        let status = response.status();
        if status.as_u16() == 409 {
            // files/download reports a missing path as a 409 with a
            // machine-readable error summary in the body.
            let body = response.text().await.unwrap_or_default();
            if body.contains("path/not_found") {
                warn!(path = %path, "No trip data file found");
                return Ok(None);
            }
            return Err(Error::UpstreamUnavailable(format!(
                "source store rejected download of {path}: {body}"
            )));
        }
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "source store returned {status} for {path}"
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("source store: {e}")))?;

        Ok(Some(text))
    }
}
