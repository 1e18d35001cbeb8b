//! Configuration for the snapshot generator, the feed timers and the server.
//!
//! Simulation constants default to the values the dashboard was tuned with.
//! Server settings are read from `DRISHTI_*` environment variables.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::geo::LonLat;
use crate::model::AlertLevel;

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 3000;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    InvalidVar { var: &'static str, value: String },

    #[error("{field} must be positive")]
    NotPositive { field: &'static str },

    #[error("{field} must lie within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },

    #[error("{field} bounds are inverted: {min} > {max}")]
    InvertedBounds {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("{field} must be finite and non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("alert weights must be non-negative with a positive total")]
    InvalidAlertWeights,

    #[error("tracked markers ({tracked}) exceed pilgrim points ({points})")]
    TooManyMarkers { tracked: usize, points: usize },
}

/// Closed interval used for clamping generated values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        for value in [self.min, self.max] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { field, value });
            }
        }
        if self.min > self.max {
            return Err(ConfigError::InvertedBounds {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Relative alert-level weights for one time-of-day regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlertWeights {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl AlertWeights {
    pub fn table(&self) -> [(AlertLevel, f64); 4] {
        [
            (AlertLevel::Low, self.low),
            (AlertLevel::Medium, self.medium),
            (AlertLevel::High, self.high),
            (AlertLevel::Critical, self.critical),
        ]
    }

    fn is_valid(&self) -> bool {
        let table = self.table();
        table.iter().all(|(_, w)| w.is_finite() && *w >= 0.0)
            && table.iter().map(|(_, w)| w).sum::<f64>() > 0.0
    }
}

/// Every tunable constant of the generator and the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationConfig {
    /// Centre of the event area.
    pub center: LonLat,

    /// Radius of the event area in degrees (about 2.2 km).
    pub radius: f64,

    /// Number of staffed checkpoints per snapshot.
    pub checkpoint_count: usize,

    /// Number of positional pilgrim samples per snapshot.
    pub pilgrim_points: usize,

    /// Allowed range of a sector's current density.
    pub density: Bounds,

    /// Upper clamp of a sector's predicted density.
    pub predicted_density_ceiling: f64,

    /// Allowed range of the +15/+30 minute forecasts.
    pub forecast: Bounds,

    pub peak_alert_weights: AlertWeights,
    pub off_peak_alert_weights: AlertWeights,

    /// How often a fresh snapshot replaces the current one.
    pub refresh_interval: Duration,

    /// Chance per refresh that an AI advisory is raised.
    pub advisory_probability: f64,

    /// How often tracked pilgrim markers are nudged.
    pub jitter_interval: Duration,

    /// Number of pilgrim points rendered as moving markers.
    pub tracked_markers: usize,

    /// Maximum total displacement per jitter step, in degrees.
    pub jitter_magnitude: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            center: LonLat(75.7772, 23.1825),
            radius: 0.02,
            checkpoint_count: 20,
            pilgrim_points: 500,
            density: Bounds::new(0.1, 0.95),
            predicted_density_ceiling: 0.98,
            forecast: Bounds::new(0.05, 0.99),
            peak_alert_weights: AlertWeights {
                low: 2.0,
                medium: 4.0,
                high: 3.0,
                critical: 1.0,
            },
            off_peak_alert_weights: AlertWeights {
                low: 5.0,
                medium: 3.0,
                high: 1.5,
                critical: 0.5,
            },
            refresh_interval: Duration::from_secs(8),
            advisory_probability: 0.1,
            jitter_interval: Duration::from_secs(3),
            tracked_markers: 150,
            jitter_magnitude: 0.00015,
        }
    }
}

impl SimulationConfig {
    /// Check that every constant produces in-range draws.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(ConfigError::NotPositive { field: "radius" });
        }
        if self.pilgrim_points == 0 {
            return Err(ConfigError::NotPositive {
                field: "pilgrim_points",
            });
        }
        if self.refresh_interval.is_zero() {
            return Err(ConfigError::NotPositive {
                field: "refresh_interval",
            });
        }
        if self.jitter_interval.is_zero() {
            return Err(ConfigError::NotPositive {
                field: "jitter_interval",
            });
        }
        if !self.jitter_magnitude.is_finite() || self.jitter_magnitude < 0.0 {
            return Err(ConfigError::Negative {
                field: "jitter_magnitude",
                value: self.jitter_magnitude,
            });
        }
        self.density.validate("density")?;
        self.forecast.validate("forecast")?;
        Bounds::new(self.density.max, self.predicted_density_ceiling)
            .validate("predicted_density_ceiling")?;
        if !(0.0..=1.0).contains(&self.advisory_probability) {
            return Err(ConfigError::OutOfUnitRange {
                field: "advisory_probability",
                value: self.advisory_probability,
            });
        }
        if !self.peak_alert_weights.is_valid() || !self.off_peak_alert_weights.is_valid() {
            return Err(ConfigError::InvalidAlertWeights);
        }
        if self.tracked_markers > self.pilgrim_points {
            return Err(ConfigError::TooManyMarkers {
                tracked: self.tracked_markers,
                points: self.pilgrim_points,
            });
        }
        Ok(())
    }
}

/// Which map backend the dashboard should render with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapProvider {
    Mapbox,
    Leaflet,
}

/// Settings read from the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,

    /// Fixed RNG seed for reproducible feeds.
    pub seed: Option<u64>,

    /// Overrides the snapshot refresh interval.
    pub refresh_interval: Option<Duration>,

    pub mapbox_token: Option<String>,
}

impl ServerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_var(&lookup, "DRISHTI_PORT")?.unwrap_or(DEFAULT_PORT);
        let seed = parse_var(&lookup, "DRISHTI_SEED")?;
        let refresh_interval = match parse_var::<u64, _>(&lookup, "DRISHTI_REFRESH_SECS")? {
            Some(0) => {
                return Err(ConfigError::InvalidVar {
                    var: "DRISHTI_REFRESH_SECS",
                    value: "0".to_string(),
                });
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };
        let mapbox_token = lookup("DRISHTI_MAPBOX_TOKEN").filter(|t| !t.trim().is_empty());

        Ok(Self {
            port,
            seed,
            refresh_interval,
            mapbox_token,
        })
    }

    pub fn map_provider(&self) -> MapProvider {
        if self.mapbox_token.is_some() {
            MapProvider::Mapbox
        } else {
            MapProvider::Leaflet
        }
    }

    /// Simulation settings with this server's overrides applied.
    pub fn simulation(&self) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        if let Some(interval) = self.refresh_interval {
            config.refresh_interval = interval;
        }
        config
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { var, value }),
    }
}
