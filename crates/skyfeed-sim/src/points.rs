//! ---
//! sky_section: "02-telemetry-simulation"
//! sky_subsection: "module"
//! sky_type: "source"
//! sky_scope: "code"
//! sky_description: "Telemetry point record synthesized by the engine."
//! sky_version: "v0.1.0"
//! sky_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::trajectory::Coordinate;

/// Synthesized telemetry sample emitted for one trajectory coordinate.
///
/// Altitude and timestamp are generated, not sourced from the dataset. The
/// timestamp serializes as an ISO-8601 string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl TelemetryPoint {
    pub fn new(coordinate: &Coordinate, altitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            longitude: coordinate.longitude,
            latitude: coordinate.latitude,
            altitude,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_timestamp_as_iso_8601() {
        let point = TelemetryPoint::new(
            &Coordinate {
                longitude: 10.75,
                latitude: 59.91,
            },
            1200.0,
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        );
        let json = serde_json::to_value(&point).expect("point serializes");
        assert_eq!(json["longitude"], 10.75);
        assert_eq!(json["latitude"], 59.91);
        assert_eq!(json["altitude"], 1200.0);
        assert_eq!(json["timestamp"], "2024-06-01T12:00:00Z");
    }
}
