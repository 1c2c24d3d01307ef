mod period;
mod trip;

pub use period::SourcePeriod;
pub use trip::{BikeType, TripRecord};
