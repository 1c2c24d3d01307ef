mod publish;
mod transform;
mod validate;

pub use publish::BatchPublisher;
pub use transform::RowTransformer;
pub use validate::SchemaValidator;

use chrono::NaiveDate;
use common::Result;
use tracing::info;

use crate::catalog::TripCatalog;
use crate::models::SourcePeriod;
use crate::source::TripSource;

/// Summary of one sync run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub periods_published: usize,
    pub records_published: usize,
}

/// Drives the catalogue-up-to-date loop: resolve the checkpoint, then fetch,
/// transform, validate and publish one period at a time until the source has
/// nothing more to offer. Strictly sequential; the checkpoint is a max-date
/// query, so periods must land in chronological order.
pub struct SyncDriver<'a> {
    source: &'a dyn TripSource,
    catalog: &'a dyn TripCatalog,
    publisher: BatchPublisher,
    source_root: String,
    today: NaiveDate,
}

impl<'a> SyncDriver<'a> {
    pub fn new(
        source: &'a dyn TripSource,
        catalog: &'a dyn TripCatalog,
        publisher: BatchPublisher,
        source_root: &str,
        today: NaiveDate,
    ) -> Self {
        Self {
            source,
            catalog,
            publisher,
            source_root: source_root.to_string(),
            today,
        }
    }

    pub async fn run(&self) -> Result<SyncOutcome> {
        let mut outcome = SyncOutcome::default();

        info!("Resolving catalog checkpoint");
        let checkpoint = self.catalog.latest_checkout_date().await?;

        let bound = SourcePeriod::latest_available(self.today);
        let mut period = SourcePeriod::from_date(checkpoint);
        info!(checkpoint = %checkpoint, latest_available = %bound, "Checkpoint resolved");

        if period >= bound {
            info!("Catalog already up to date; nothing to sync");
            return Ok(outcome);
        }

        loop {
            period = period.next();
            let path = period.source_path(&self.source_root);
            info!(period = %period, path = %path, "Checking for source data");

            let Some(csv_text) = self.source.fetch(&path).await? else {
                // The expected steady state: staff have not uploaded the
                // next period yet.
                info!(period = %period, "No source file yet; sync complete");
                break;
            };

            info!(period = %period, "Transforming data");
            let records = RowTransformer::transform_file(&csv_text)?;

            info!(period = %period, rows = records.len(), "Validating data");
            SchemaValidator::validate_all(&records)?;

            info!(period = %period, rows = records.len(), "Publishing trips");
            self.publisher.publish(self.catalog, &records).await?;

            outcome.periods_published += 1;
            outcome.records_published += records.len();
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BikeType, TripRecord};
    use async_trait::async_trait;
    use common::Error;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StaticSource {
        files: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    impl StaticSource {
        fn empty() -> Self {
            Self {
                files: HashMap::new(),
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn with_file(path: &str, content: &str) -> Self {
            let mut source = Self::empty();
            source.files.insert(path.to_string(), content.to_string());
            source
        }

        fn fetch_count(&self) -> usize {
            self.fetched.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TripSource for StaticSource {
        async fn fetch(&self, path: &str) -> common::Result<Option<String>> {
            self.fetched.lock().unwrap().push(path.to_string());
            Ok(self.files.get(path).cloned())
        }
    }

    struct MemoryCatalog {
        checkpoint: NaiveDate,
        rows: Mutex<HashMap<String, TripRecord>>,
        upsert_calls: Mutex<usize>,
        fail_on_call: Option<usize>,
    }

    impl MemoryCatalog {
        fn with_checkpoint(year: i32, month: u32, day: u32) -> Self {
            Self {
                checkpoint: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
                rows: Mutex::new(HashMap::new()),
                upsert_calls: Mutex::new(0),
                fail_on_call: None,
            }
        }

        fn failing_on_call(mut self, call: usize) -> Self {
            self.fail_on_call = Some(call);
            self
        }

        fn row_count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        fn row(&self, trip_id: &str) -> Option<TripRecord> {
            self.rows.lock().unwrap().get(trip_id).cloned()
        }
    }

    #[async_trait]
    impl TripCatalog for MemoryCatalog {
        async fn latest_checkout_date(&self) -> common::Result<NaiveDate> {
            Ok(self.checkpoint)
        }

        async fn upsert(&self, records: &[TripRecord]) -> common::Result<()> {
            let call = {
                let mut calls = self.upsert_calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if self.fail_on_call == Some(call) {
                return Err(Error::UpstreamUnavailable(
                    "catalog refused the write".to_string(),
                ));
            }
            let mut rows = self.rows.lock().unwrap();
            for record in records {
                let key = record.trip_id.clone().unwrap_or_default();
                rows.insert(key, record.clone());
            }
            Ok(())
        }
    }

    const HEADER: &str = "TripId,MembershipType,Bike,BikeType,CheckoutDateLocal,CheckoutTimeLocal,CheckoutKioskID,CheckoutKioskName,ReturnKioskID,ReturnKioskName,DurationMins";

    fn january_report() -> String {
        format!(
            "{HEADER}\n\
             100,Local365,15001,Classic Bike,1/05/2022,08:15:00,2537,Guadalupe/West Mall,2568,Dean Keeton/Speedway,12\n\
             101,Explorer,00123,Classic Bike,1/06/2022,17:40:00,2568,Dean Keeton/Speedway,2537,Guadalupe/West Mall,33\n"
        )
    }

    fn complete_record(trip_id: &str) -> TripRecord {
        TripRecord {
            trip_id: Some(trip_id.to_string()),
            membership_type: Some("Local365".into()),
            bicycle_id: Some("15001".into()),
            bike_type: Some(BikeType::Electric),
            checkout_date: Some("2022-01-05".into()),
            checkout_time: Some("08:15:00".into()),
            checkout_kiosk_id: Some("2537".into()),
            checkout_kiosk: Some("Guadalupe/West Mall".into()),
            return_kiosk_id: Some("2568".into()),
            return_kiosk: Some("Dean Keeton/Speedway".into()),
            trip_duration_minutes: Some("12".into()),
            month: Some("1".into()),
            year: Some("2022".into()),
        }
    }

    fn driver<'a>(
        source: &'a StaticSource,
        catalog: &'a MemoryCatalog,
        today: NaiveDate,
    ) -> SyncDriver<'a> {
        SyncDriver::new(
            source,
            catalog,
            BatchPublisher::new(10_000),
            "austinbcycletripdata",
            today,
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_checkpoint_at_bound_means_zero_fetches() {
        // Checkpoint 2022-01-31 with the bound at January 2022: done
        // without touching the source at all.
        let source = StaticSource::empty();
        let catalog = MemoryCatalog::with_checkpoint(2022, 1, 31);

        let outcome = driver(&source, &catalog, date(2022, 2, 1))
            .run()
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::default());
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_terminates_cleanly() {
        // February 2022 has not been uploaded; the run is a normal no-op
        // and the catalog keeps whatever it had.
        let source = StaticSource::empty();
        let catalog = MemoryCatalog::with_checkpoint(2022, 1, 31);

        let outcome = driver(&source, &catalog, date(2022, 3, 10))
            .run()
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::default());
        assert_eq!(
            *source.fetched.lock().unwrap(),
            vec!["/austinbcycletripdata/2022/TripReport-022022.csv".to_string()]
        );
        assert_eq!(catalog.row_count(), 0);
    }

    #[tokio::test]
    async fn test_publishes_each_available_period_then_stops() {
        let source = StaticSource::with_file(
            "/austinbcycletripdata/2022/TripReport-012022.csv",
            &january_report(),
        );
        let catalog = MemoryCatalog::with_checkpoint(2021, 12, 31);

        let outcome = driver(&source, &catalog, date(2022, 2, 10))
            .run()
            .await
            .unwrap();

        assert_eq!(outcome.periods_published, 1);
        assert_eq!(outcome.records_published, 2);
        assert_eq!(
            *source.fetched.lock().unwrap(),
            vec![
                "/austinbcycletripdata/2022/TripReport-012022.csv".to_string(),
                "/austinbcycletripdata/2022/TripReport-022022.csv".to_string(),
            ]
        );

        let published = catalog.row("100").unwrap();
        assert_eq!(published.bike_type, Some(BikeType::Electric));
        assert_eq!(published.checkout_date.as_deref(), Some("2022-01-05"));
        assert_eq!(published.month.as_deref(), Some("1"));
        assert_eq!(published.year.as_deref(), Some("2022"));
        assert_eq!(catalog.row("101").unwrap().bike_type, Some(BikeType::Classic));
    }

    #[tokio::test]
    async fn test_invalid_row_aborts_before_anything_is_published() {
        // Second row is missing its duration; the whole file is suspect.
        let report = format!(
            "{HEADER}\n\
             100,Local365,15001,Classic Bike,1/05/2022,08:15:00,2537,A,2568,B,12\n\
             101,Explorer,00123,Classic Bike,1/06/2022,17:40:00,2568,B,2537,A,\n"
        );
        let source = StaticSource::with_file(
            "/austinbcycletripdata/2022/TripReport-012022.csv",
            &report,
        );
        let catalog = MemoryCatalog::with_checkpoint(2021, 12, 31);

        let err = driver(&source, &catalog, date(2022, 2, 10))
            .run()
            .await
            .unwrap_err();

        match err {
            Error::SchemaViolation(fields) => {
                assert_eq!(fields, vec!["trip_duration_minutes".to_string()]);
            }
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
        assert_eq!(catalog.row_count(), 0);
    }

    #[tokio::test]
    async fn test_republishing_a_batch_is_idempotent() {
        let catalog = MemoryCatalog::with_checkpoint(2021, 12, 31);
        let publisher = BatchPublisher::new(10_000);
        let records = vec![complete_record("100"), complete_record("101")];

        publisher.publish(&catalog, &records).await.unwrap();
        let after_first: Vec<_> = {
            let rows = catalog.rows.lock().unwrap();
            let mut ids: Vec<_> = rows.keys().cloned().collect();
            ids.sort();
            ids
        };

        publisher.publish(&catalog, &records).await.unwrap();
        let after_second: Vec<_> = {
            let rows = catalog.rows.lock().unwrap();
            let mut ids: Vec<_> = rows.keys().cloned().collect();
            ids.sort();
            ids
        };

        assert_eq!(after_first, after_second);
        assert_eq!(catalog.row_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_batch_reports_its_position() {
        let catalog = MemoryCatalog::with_checkpoint(2021, 12, 31).failing_on_call(2);
        let publisher = BatchPublisher::new(2);
        let records: Vec<_> = (0..5)
            .map(|i| complete_record(&i.to_string()))
            .collect();

        let err = publisher.publish(&catalog, &records).await.unwrap_err();
        match err {
            Error::PublishFailed { index, total, .. } => {
                assert_eq!(index, 2);
                assert_eq!(total, 3);
            }
            other => panic!("expected PublishFailed, got {other:?}"),
        }
        // the first batch stays committed; upserts are not rolled back
        assert_eq!(catalog.row_count(), 2);
    }
}
