use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use mandeltile_core::{fit_to_grid, EscapeParams};
use mandeltile_render::ColorMapping;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Canvas width in pixels; trimmed to a multiple of the grid side.
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Size of the tile worker pool. Must be a perfect square.
    #[serde(default = "default_num_workers")]
    pub num_workers: u32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Each zoom-in divides the plane ranges by this; zoom-out multiplies.
    #[serde(default = "default_zoom_factor")]
    pub zoom_factor: f64,
    #[serde(default = "default_escape_modulus_sq")]
    pub escape_modulus_sq: f64,
    #[serde(default)]
    pub color_mapping: ColorMapping,
    /// How long to wait for all tiles of a frame before giving up on the rest.
    #[serde(default = "default_frame_timeout_ms")]
    pub frame_timeout_ms: u64,
    /// Where to write the final frame at end of input.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

fn default_width() -> u32 {
    1050
}
fn default_height() -> u32 {
    600
}
fn default_num_workers() -> u32 {
    9
}
fn default_max_iterations() -> u32 {
    1000
}
fn default_zoom_factor() -> f64 {
    2.0
}
fn default_escape_modulus_sq() -> f64 {
    EscapeParams::DEFAULT_ESCAPE_MODULUS_SQ
}
fn default_frame_timeout_ms() -> u64 {
    30_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            num_workers: default_num_workers(),
            max_iterations: default_max_iterations(),
            zoom_factor: default_zoom_factor(),
            escape_modulus_sq: default_escape_modulus_sq(),
            color_mapping: ColorMapping::default(),
            frame_timeout_ms: default_frame_timeout_ms(),
            output: None,
        }
    }
}

impl AppConfig {
    /// Largest accepted iteration budget. Every tile draw allocates a
    /// histogram with one bucket per possible escape time.
    pub const MAX_ITERATIONS_LIMIT: u32 = 1_000_000;

    /// Load the configuration from its usual location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&crate::app_dir::config_path())
    }

    /// Load the configuration from `path`, falling back to defaults when the
    /// file is missing or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<AppConfig>(&json) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    error!("Failed to parse config {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Check every value and trim the canvas so the worker grid tiles it exactly.
    pub fn validate(mut self) -> Result<Self, AppError> {
        if !(1..=Self::MAX_ITERATIONS_LIMIT).contains(&self.max_iterations) {
            return Err(AppError::Config(format!(
                "max_iterations must be in 1..={}, got {}",
                Self::MAX_ITERATIONS_LIMIT,
                self.max_iterations
            )));
        }
        if self.zoom_factor <= 0.0 || !self.zoom_factor.is_finite() {
            return Err(AppError::Config(format!(
                "zoom_factor must be positive and finite, got {}",
                self.zoom_factor
            )));
        }
        if self.frame_timeout_ms == 0 {
            return Err(AppError::Config("frame_timeout_ms must be > 0".into()));
        }
        self.escape_params()?;

        let (width, height) = fit_to_grid(self.width, self.height, self.num_workers)?;
        if (width, height) != (self.width, self.height) {
            warn!(
                from_width = self.width,
                from_height = self.height,
                width,
                height,
                "Trimmed canvas to fit the worker grid"
            );
        }
        self.width = width;
        self.height = height;
        Ok(self)
    }

    pub fn escape_params(&self) -> Result<EscapeParams, AppError> {
        Ok(EscapeParams::new(self.escape_modulus_sq)?)
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }
}
