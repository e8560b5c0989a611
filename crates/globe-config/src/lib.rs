//! Configuration system for the Globe viewer.
//!
//! Provides runtime-configurable settings that persist to disk as RON files.
//! Supports CLI overrides via clap, hot-reload detection, and forward/backward
//! compatible serialization. Live scene parameters are not part of this
//! configuration and are never persisted.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AssetConfig, CameraConfig, Config, DebugConfig, PlanetConfig, RenderConfig, WindowConfig,
};
pub use error::{ConfigError, default_config_dir};
