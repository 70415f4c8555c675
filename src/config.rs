// src/config.rs

//! Defines the configuration structures for `nnsurf`.
//!
//! Every section derives `Deserialize` with `#[serde(default)]`, so a JSON
//! config file only needs the keys it wants to override. Section types that
//! belong to a component (`LocatorConfig`, `LineConfig`, `CameraConfig`) live
//! next to that component and are re-used here.
//!
//! The global [`CONFIG`] is loaded lazily from the file named by the
//! `NNSURF_CONFIG` environment variable, falling back to defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::camera::CameraConfig;
use crate::locator::LocatorConfig;
use crate::renderer::RenderPasses;
use crate::tracer::LineConfig;

/// Environment variable naming the config file used for [`CONFIG`].
pub const CONFIG_ENV_VAR: &str = "NNSURF_CONFIG";

/// Global configuration, loaded on first access.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env_or_default);

// --- Top-Level Configuration Structure ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Frame size, threading and passes.
    pub render: RenderConfig,
    /// Root search and shading.
    pub locator: LocatorConfig,
    /// Field line tracing and colouring.
    pub lines: LineConfig,
    pub camera: CameraConfig,
    /// Iso-level animation and weight initialisation.
    pub animation: AnimationConfig,
    /// Where exported frames go.
    pub output: OutputConfig,
}

impl Config {
    /// Reads a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads the file named by `NNSURF_CONFIG`; defaults if unset or unreadable.
    pub fn from_env_or_default() -> Config {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Config::load(&path).unwrap_or_else(|e| {
                warn!("{:#}. Using default configuration.", e);
                Config::default()
            }),
            None => Config::default(),
        }
    }
}

// --- Render Configuration ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    /// Worker threads for the surface pass. 0 picks the available parallelism.
    pub threads: usize,
    pub passes: RenderPasses,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 512,
            height: 512,
            threads: 0,
            passes: RenderPasses::default(),
        }
    }
}

impl RenderConfig {
    /// `threads`, with 0 resolved to the machine's available parallelism.
    pub fn resolved_threads(&self) -> usize {
        if self.threads > 0 {
            return self.threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

// --- Animation Configuration ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Iso level of the first frame.
    pub iso_start: f32,
    /// Iso-level change per second.
    pub iso_speed: f32,
    /// If false every frame uses `iso_start`.
    pub animate: bool,
    pub fps: f32,
    pub frames: usize,
    /// Seed for the random initial weights.
    pub seed: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        AnimationConfig {
            iso_start: 0.0,
            iso_speed: 0.2,
            animate: true,
            fps: 25.0,
            frames: 50,
            seed: 1,
        }
    }
}

// --- Output Configuration ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Frames are named `{prefix}_{index:04}.ppm`.
    pub prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: PathBuf::from("frames"),
            prefix: "frame".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.directory.join(format!("{}_{:04}.ppm", self.prefix, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::MarchStrategy;

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{
            "render": { "width": 64, "passes": "SURFACE" },
            "locator": { "strategy": "floor_scan" },
            "animation": { "frames": 3 }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.render.width, 64);
        assert_eq!(config.render.height, 512);
        assert_eq!(config.render.passes, RenderPasses::SURFACE);
        assert_eq!(config.locator.strategy, MarchStrategy::FloorScan);
        assert_eq!(config.locator.refine_iterations, 16);
        assert_eq!(config.animation.frames, 3);
        assert_eq!(config.animation.iso_speed, 0.2);
        assert_eq!(config.lines, LineConfig::default());
    }

    #[test]
    fn defaults_round_trip() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Config::default());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let json = r#"{ "locator": { "strategy": "bisection" } }"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn missing_file_is_an_error_with_context() {
        let err = Config::load("/nonexistent/nnsurf.json").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }

    #[test]
    fn frame_paths_are_zero_padded() {
        let out = OutputConfig::default();
        assert_eq!(out.frame_path(7), PathBuf::from("frames/frame_0007.ppm"));
    }

    #[test]
    fn zero_threads_resolves_to_at_least_one() {
        assert!(RenderConfig::default().resolved_threads() >= 1);
    }
}
