use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::backend::wgpu_backend::GpuInit;
use crate::noise::DEFAULT_SEED;
use crate::simulation::types::GRID_SIZE;

/// Largest grid side accepted from configuration.
pub const MAX_GRID_SIZE: u32 = 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown variant `{0}` (expected `fluid` or `synapse`)")]
    Variant(String),
    #[error("unknown backend `{0}` (expected `auto`, `software` or `fallback`)")]
    Backend(String),
    #[error("invalid seed `{0}`")]
    Seed(String),
    #[error("invalid grid size `{0}` (power of two between 8 and 1024)")]
    Grid(String),
}

/// Which effect is rendered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Variant {
    /// Advected dye grid; particles on the fallback path.
    #[default]
    Fluid,
    /// Node network glow; stroked connections on the fallback path.
    Synapse,
}

impl FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fluid" => Ok(Variant::Fluid),
            "synapse" => Ok(Variant::Synapse),
            _ => Err(ConfigError::Variant(s.to_string())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Fluid => write!(f, "fluid"),
            Variant::Synapse => write!(f, "synapse"),
        }
    }
}

/// Which accelerated backend is probed at mount.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum BackendPreference {
    /// Hardware GPU through wgpu.
    #[default]
    Auto,
    /// Grid kernels on the CPU.
    Software,
    /// Skip negotiation and use the canvas fallback.
    Fallback,
}

impl FromStr for BackendPreference {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "gpu" | "wgpu" => Ok(BackendPreference::Auto),
            "software" | "host" | "cpu" => Ok(BackendPreference::Software),
            "fallback" | "canvas" => Ok(BackendPreference::Fallback),
            _ => Err(ConfigError::Backend(s.to_string())),
        }
    }
}

pub fn parse_grid_size(s: &str) -> Result<u32, ConfigError> {
    match s.trim().parse::<u32>() {
        Ok(n) if n.is_power_of_two() && (8..=MAX_GRID_SIZE).contains(&n) => Ok(n),
        _ => Err(ConfigError::Grid(s.to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct EffectConfig {
    pub variant: Variant,
    pub backend: BackendPreference,
    pub seed: u64,
    /// Side of the simulation grid, a power of two.
    pub grid_size: u32,
    /// Resolution of the post stage relative to the window, on both grid paths.
    pub render_scale: f32,
    /// Fixed simulation step instead of the wall clock.
    pub fixed_timestep: Option<Duration>,
    pub gpu: GpuInit,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            backend: BackendPreference::default(),
            seed: u64::from(DEFAULT_SEED),
            grid_size: GRID_SIZE,
            render_scale: 0.5,
            fixed_timestep: None,
            gpu: GpuInit::default(),
        }
    }
}

impl EffectConfig {
    /// Defaults overridden by `BACKDROP_VARIANT`, `BACKDROP_BACKEND`,
    /// `BACKDROP_SEED` and `BACKDROP_GRID`. Bad values are logged and skipped.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("BACKDROP_VARIANT") {
            match v.parse() {
                Ok(variant) => config.variant = variant,
                Err(e) => log::warn!("ignoring BACKDROP_VARIANT: {e}"),
            }
        }
        if let Some(v) = lookup("BACKDROP_BACKEND") {
            match v.parse() {
                Ok(backend) => config.backend = backend,
                Err(e) => log::warn!("ignoring BACKDROP_BACKEND: {e}"),
            }
        }
        if let Some(v) = lookup("BACKDROP_SEED") {
            match v.trim().parse() {
                Ok(seed) => config.seed = seed,
                Err(_) => log::warn!("ignoring BACKDROP_SEED: {}", ConfigError::Seed(v)),
            }
        }
        if let Some(v) = lookup("BACKDROP_GRID") {
            match parse_grid_size(&v) {
                Ok(size) => config.grid_size = size,
                Err(e) => log::warn!("ignoring BACKDROP_GRID: {e}"),
            }
        }

        config
    }
}
