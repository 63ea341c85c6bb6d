//! ---
//! sky_section: "02-telemetry-simulation"
//! sky_subsection: "01-bootstrap"
//! sky_type: "source"
//! sky_scope: "code"
//! sky_description: "Telemetry engine module exports and shared types."
//! sky_version: "v0.1.0"
//! sky_owner: "tbd"
//! ---
//! Trajectory replay and telemetry synthesis for the SkyFeed project.
//!
//! The engine walks a fixed geographic path, synthesizes altitude and
//! timestamps for each coordinate, and hands points out in small jittered
//! batches that mimic delayed and out-of-order network delivery.

pub mod altitude;
pub mod engine;
pub mod points;
pub mod trajectory;

pub use altitude::AltitudeProfile;
pub use engine::{EngineSettings, TelemetryEngine};
pub use points::TelemetryPoint;
pub use trajectory::{Coordinate, DataLoadError, Trajectory};
