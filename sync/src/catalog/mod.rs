use async_trait::async_trait;
use chrono::NaiveDate;
use common::config::SocrataConfig;
use common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::models::TripRecord;

/// Destination open-data catalog: checkpoint query plus idempotent upsert.
#[async_trait]
pub trait TripCatalog: Send + Sync {
    /// The latest checkout date currently published in the dataset.
    async fn latest_checkout_date(&self) -> Result<NaiveDate>;

    /// Upsert a slice of records, keyed on trip_id. Re-upserting the same
    /// records leaves the dataset unchanged.
    async fn upsert(&self, records: &[TripRecord]) -> Result<()>;
}

const CHECKPOINT_QUERY: &str =
    "SELECT checkout_date as date where checkout_date is not null ORDER BY checkout_date DESC LIMIT 1";

#[derive(Debug, Deserialize)]
struct CheckpointRow {
    date: String,
}

pub struct SocrataCatalog {
    client: rquest::Client,
    base_url: String,
    resource_id: String,
    app_token: String,
    api_key_id: String,
    api_key_secret: String,
}

impl SocrataCatalog {
    pub fn new(config: &SocrataConfig) -> Result<Self> {
        let client = rquest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("https://{}", config.domain),
            resource_id: config.resource_id.clone(),
            app_token: config.app_token.clone(),
            api_key_id: config.api_key_id.clone(),
            api_key_secret: config.api_key_secret.clone(),
        })
    }

    fn resource_url(&self) -> String {
        format!("{}/resource/{}.json", self.base_url, self.resource_id)
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl TripCatalog for SocrataCatalog {
    async fn latest_checkout_date(&self) -> Result<NaiveDate> {
        let response = self
            .client
            .get(self.resource_url())
            .query(&[("$query", CHECKPOINT_QUERY)])
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("catalog query: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "catalog query returned {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("catalog query body: {e}")))?;
        let rows: Vec<CheckpointRow> = serde_json::from_str(&body)?;

        let Some(row) = rows.first() else {
            return Err(Error::NoCheckpointFound(
                "no existing data; there may be something wrong with the dataset".to_string(),
            ));
        };

        // Socrata renders floating timestamps like 2022-01-31T00:00:00.000;
        // only the date part matters for the checkpoint.
        let date_part = row.date.get(..10).unwrap_or(&row.date);
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| {
            Error::Other(format!("unparseable checkpoint date {:?}: {e}", row.date))
        })?;

        debug!(date = %date, "Resolved catalog checkpoint");
        Ok(date)
    }

    async fn upsert(&self, records: &[TripRecord]) -> Result<()> {
        let payload = serde_json::to_vec(records)?;

        let response = self
            .client
            .post(self.resource_url())
            .basic_auth(&self.api_key_id, Some(&self.api_key_secret))
            .header("X-App-Token", self.app_token.as_str())
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("catalog upsert: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamUnavailable(format!(
                "catalog upsert returned {status}: {body}"
            )));
        }

        Ok(())
    }
}
