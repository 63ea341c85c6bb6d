//! ---
//! sky_section: "01-core-functionality"
//! sky_subsection: "module"
//! sky_type: "source"
//! sky_scope: "code"
//! sky_description: "Shared primitives and utilities for the SkyFeed runtime."
//! sky_version: "v0.1.0"
//! sky_owner: "tbd"
//! ---
//! Core shared primitives for the SkyFeed workspace.
//! This crate exposes configuration loading, logging bootstrap, and
//! metrics utilities consumed by the engine, API, and daemon crates.

pub mod config;
pub mod logging;
pub mod metrics;

pub use config::{ApiConfig, AppConfig, LoggingConfig, MetricsConfig, SimulationConfig};
pub use logging::{init_tracing, LogFormat};
pub use metrics::{new_registry, FeedMetrics, SharedRegistry};
