use chrono::{Datelike, NaiveDate};
use common::{Error, Result};
use serde::Deserialize;

use crate::models::{BikeType, TripRecord};

/// Date formats seen in the staff reports: US locale, occasionally already
/// ISO. Anything else fails the run.
const SOURCE_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%m/%d/%y", "%Y-%m-%d"];

/// One row of the staff trip report, keyed by source column names. Only the
/// mapped columns are read; anything else in the file is dropped. The
/// source's own BikeType column is among the dropped ones, since bike_type
/// is derived from the bicycle identifier instead.
#[derive(Debug, Deserialize)]
struct SourceRow {
    #[serde(rename = "TripId", default)]
    trip_id: Option<String>,
    #[serde(rename = "MembershipType", default)]
    membership_type: Option<String>,
    #[serde(rename = "Bike", default)]
    bicycle_id: Option<String>,
    #[serde(rename = "CheckoutDateLocal", default)]
    checkout_date: Option<String>,
    #[serde(rename = "CheckoutTimeLocal", default)]
    checkout_time: Option<String>,
    #[serde(rename = "CheckoutKioskID", default)]
    checkout_kiosk_id: Option<String>,
    #[serde(rename = "CheckoutKioskName", default)]
    checkout_kiosk: Option<String>,
    #[serde(rename = "ReturnKioskID", default)]
    return_kiosk_id: Option<String>,
    #[serde(rename = "ReturnKioskName", default)]
    return_kiosk: Option<String>,
    #[serde(rename = "DurationMins", default)]
    trip_duration_minutes: Option<String>,
}

pub struct RowTransformer;

impl RowTransformer {
    /// Parse a whole trip report and map every row to the canonical shape.
    pub fn transform_file(csv_text: &str) -> Result<Vec<TripRecord>> {
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        let mut records = Vec::new();
        for row in reader.deserialize() {
            let row: SourceRow = row?;
            records.push(Self::transform_row(row)?);
        }
        Ok(records)
    }

    fn transform_row(row: SourceRow) -> Result<TripRecord> {
        // Empty date values pass through as null; they are caught by schema
        // validation, never defaulted here.
        let checkout_date = match row.checkout_date.as_deref() {
            None => None,
            Some(raw) => Some(reformat_date(raw)?),
        };

        let (year, month) = match checkout_date.as_deref() {
            None => (None, None),
            Some(iso) => {
                let date = NaiveDate::parse_from_str(iso, "%Y-%m-%d").map_err(|e| {
                    Error::MalformedRow(format!("bad canonical date {iso:?}: {e}"))
                })?;
                // month is published without zero padding
                (Some(date.year().to_string()), Some(date.month().to_string()))
            }
        };

        let bike_type = row.bicycle_id.as_deref().map(BikeType::classify);

        Ok(TripRecord {
            trip_id: row.trip_id,
            membership_type: row.membership_type,
            bicycle_id: row.bicycle_id,
            bike_type,
            checkout_date,
            checkout_time: row.checkout_time,
            checkout_kiosk_id: row.checkout_kiosk_id,
            checkout_kiosk: row.checkout_kiosk,
            return_kiosk_id: row.return_kiosk_id,
            return_kiosk: row.return_kiosk,
            trip_duration_minutes: row.trip_duration_minutes,
            month,
            year,
        })
    }
}

fn reformat_date(raw: &str) -> Result<String> {
    for format in SOURCE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date.format("%Y-%m-%d").to_string());
        }
    }
    Err(Error::MalformedRow(format!(
        "unparseable checkout date {raw:?}"
    )))
}
