//! ---
//! sky_section: "02-telemetry-simulation"
//! sky_subsection: "module"
//! sky_type: "source"
//! sky_scope: "code"
//! sky_description: "Trajectory dataset loading and validation."
//! sky_version: "v0.1.0"
//! sky_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Failures raised while loading the trajectory dataset. All variants are
/// fatal at engine construction.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("unable to read trajectory file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid trajectory JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("trajectory file {path} does not declare any feature")]
    MissingFeature { path: PathBuf },
    #[error("trajectory coordinate list is empty")]
    EmptyTrajectory,
}

/// Single geographic position along the trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

/// Raw dataset shape: a GeoJSON-like document whose first feature carries
/// the ordered coordinate list.
#[derive(Debug, Deserialize)]
struct TrajectoryFile {
    #[serde(default)]
    features: Vec<TrajectoryFeature>,
}

#[derive(Debug, Deserialize)]
struct TrajectoryFeature {
    geometry: TrajectoryGeometry,
}

#[derive(Debug, Deserialize)]
struct TrajectoryGeometry {
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
}

/// Ordered, immutable sequence of coordinates traversed by the engine.
///
/// The type enforces the non-empty invariant at construction; every handle
/// that exists points at one or more coordinates in traversal order.
#[derive(Debug, Clone)]
pub struct Trajectory {
    coordinates: Vec<Coordinate>,
}

impl Trajectory {
    /// Load the dataset from disk. Schema validation is limited to the
    /// feature/geometry nesting and a non-empty coordinate list.
    pub fn from_path(path: &Path) -> Result<Self, DataLoadError> {
        let contents = fs::read_to_string(path).map_err(|source| DataLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: TrajectoryFile =
            serde_json::from_str(&contents).map_err(|source| DataLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let feature = file
            .features
            .into_iter()
            .next()
            .ok_or_else(|| DataLoadError::MissingFeature {
                path: path.to_path_buf(),
            })?;
        Self::from_pairs(feature.geometry.coordinates)
    }

    /// Build a trajectory from `[longitude, latitude]` pairs.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = [f64; 2]>,
    ) -> Result<Self, DataLoadError> {
        let coordinates: Vec<Coordinate> = pairs
            .into_iter()
            .map(|[longitude, latitude]| Coordinate {
                longitude,
                latitude,
            })
            .collect();
        if coordinates.is_empty() {
            return Err(DataLoadError::EmptyTrajectory);
        }
        Ok(Self { coordinates })
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Coordinate> {
        self.coordinates.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coordinate> {
        self.coordinates.iter()
    }
}
