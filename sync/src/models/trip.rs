use serde::{Deserialize, Serialize};

/// Bike classification derived from the fleet numbering convention: e-bikes
/// carry 5-digit numbers from 15000 up, or a 6-character number with the same
/// leading digits and a trailing "E".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BikeType {
    #[serde(rename = "Electric Bike")]
    Electric,
    #[serde(rename = "Classic Bike")]
    Classic,
}

impl BikeType {
    /// Classify a bicycle by the shape of its identifier. The source file
    /// carries its own bike type column, but it is not trusted; this
    /// derivation is authoritative.
    pub fn classify(bicycle_id: &str) -> Self {
        let leading = bicycle_id
            .get(0..2)
            .and_then(|prefix| prefix.parse::<u32>().ok());

        match bicycle_id.len() {
            5 if leading.is_some_and(|n| n >= 15) => BikeType::Electric,
            6 if leading.is_some_and(|n| n >= 15) && bicycle_id.ends_with('E') => {
                BikeType::Electric
            }
            _ => BikeType::Classic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BikeType::Electric => "Electric Bike",
            BikeType::Classic => "Classic Bike",
        }
    }
}

/// Canonical trip row as published to the catalog. Every field travels as
/// text; the catalog coerces trip_duration_minutes to a number on its side.
/// Fields are optional until the record has passed schema validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub trip_id: Option<String>,
    pub membership_type: Option<String>,
    pub bicycle_id: Option<String>,
    pub bike_type: Option<BikeType>,
    pub checkout_date: Option<String>,
    pub checkout_time: Option<String>,
    pub checkout_kiosk_id: Option<String>,
    pub checkout_kiosk: Option<String>,
    pub return_kiosk_id: Option<String>,
    pub return_kiosk: Option<String>,
    pub trip_duration_minutes: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
}

impl TripRecord {
    /// Field names paired with value presence, in catalog column order.
    pub fn field_presence(&self) -> [(&'static str, bool); 13] {
        [
            ("trip_id", self.trip_id.is_some()),
            ("membership_type", self.membership_type.is_some()),
            ("bicycle_id", self.bicycle_id.is_some()),
            ("bike_type", self.bike_type.is_some()),
            ("checkout_date", self.checkout_date.is_some()),
            ("checkout_time", self.checkout_time.is_some()),
            ("checkout_kiosk_id", self.checkout_kiosk_id.is_some()),
            ("checkout_kiosk", self.checkout_kiosk.is_some()),
            ("return_kiosk_id", self.return_kiosk_id.is_some()),
            ("return_kiosk", self.return_kiosk.is_some()),
            (
                "trip_duration_minutes",
                self.trip_duration_minutes.is_some(),
            ),
            ("month", self.month.is_some()),
            ("year", self.year.is_some()),
        ]
    }
}
