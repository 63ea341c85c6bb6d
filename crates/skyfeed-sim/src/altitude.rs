//! ---
//! sky_section: "02-telemetry-simulation"
//! sky_subsection: "module"
//! sky_type: "source"
//! sky_scope: "code"
//! sky_description: "Synthetic altitude profile over the trajectory."
//! sky_version: "v0.1.0"
//! sky_owner: "tbd"
//! ---

/// Altitude band used when synthesizing the vertical profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltitudeProfile {
    pub min_altitude: f64,
    pub max_altitude: f64,
}

impl Default for AltitudeProfile {
    fn default() -> Self {
        Self {
            min_altitude: 100.0,
            max_altitude: 5000.0,
        }
    }
}

impl AltitudeProfile {
    /// Deterministic altitude for a trajectory index; noise is applied by
    /// the engine on top of this value.
    ///
    /// The flight is split into three phases over the traversal:
    /// a quadratic ease-in climb across the first 20%, a gentle sinusoidal
    /// cruise around the ceiling, and a quadratic descent across the last
    /// 20% that never drops below the floor.
    pub fn altitude_at(&self, index: usize, total: usize) -> f64 {
        let progress = index as f64 / total as f64;
        if progress < 0.2 {
            let climb = progress / 0.2;
            self.min_altitude + (self.max_altitude - self.min_altitude) * climb * climb
        } else if progress > 0.8 {
            let descent = (progress - 0.8) / 0.2;
            (self.max_altitude * (1.0 - descent * descent)).max(self.min_altitude)
        } else {
            self.max_altitude + (progress * 10.0).sin() * 200.0
        }
    }
}
