//! Simulation configuration and the error type for fallible loading.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Grid dimensions and hex size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub columns: usize,
    pub rows: usize,
    /// Hex circumradius in world units
    pub cell_size: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 9,
            rows: 9,
            cell_size: 40.0,
        }
    }
}

/// Top-level simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    /// Repair fragments exchanged for one integrity point
    pub fragment_exchange_rate: i32,
    /// Upper bound on the elapsed time accepted per tick
    pub max_delta_millis: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            fragment_exchange_rate: 10,
            max_delta_millis: 1000.0 / 60.0,
        }
    }
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.columns == 0 || self.grid.rows == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must have at least one cell, got {}x{}",
                self.grid.columns, self.grid.rows
            )));
        }
        if !(self.grid.cell_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "cell_size must be positive, got {}",
                self.grid.cell_size
            )));
        }
        if self.fragment_exchange_rate <= 0 {
            return Err(ConfigError::Invalid(format!(
                "fragment_exchange_rate must be positive, got {}",
                self.fragment_exchange_rate
            )));
        }
        if !(self.max_delta_millis > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_delta_millis must be positive, got {}",
                self.max_delta_millis
            )));
        }
        Ok(())
    }
}

/// Errors that can occur while loading configuration or catalogs
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON error: {}", e),
            ConfigError::Invalid(reason) => write!(f, "Invalid configuration: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}
