use common::{Error, Result};

use crate::models::TripRecord;

/// Confirms every required field is present and non-null before publish.
/// All fields are text for transport; the catalog handles numeric coercion
/// of the duration, so there is nothing to type-check beyond presence.
pub struct SchemaValidator;

impl SchemaValidator {
    /// Check one record exhaustively. Every missing field lands in a single
    /// error rather than stopping at the first, so one pass shows every
    /// problem with the row.
    pub fn validate(record: &TripRecord) -> Result<()> {
        let missing: Vec<String> = record
            .field_presence()
            .into_iter()
            .filter(|&(_, present)| !present)
            .map(|(name, _)| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::SchemaViolation(missing))
        }
    }

    /// Validate a whole file's worth of records. The first invalid row aborts
    /// the run; nothing from a suspect file gets published.
    pub fn validate_all(records: &[TripRecord]) -> Result<()> {
        for record in records {
            Self::validate(record)?;
        }
        Ok(())
    }
}
