//! Command-line argument parsing for the Globe viewer.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Globe command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "globe", about = "Layered procedural planet viewer")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Start in fullscreen.
    #[arg(long)]
    pub fullscreen: Option<bool>,

    /// Directory holding the planet textures.
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Skip the atmosphere shell.
    #[arg(long)]
    pub no_atmosphere: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(fs) = args.fullscreen {
            self.window.fullscreen = fs;
        }
        if let Some(ref dir) = args.assets {
            self.assets.dir = dir.clone();
        }
        if args.no_atmosphere {
            self.planet.atmosphere = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args() -> CliArgs {
        CliArgs {
            width: None,
            height: None,
            fullscreen: None,
            assets: None,
            no_atmosphere: false,
            log_level: None,
            config: None,
        }
    }

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(1920),
            assets: Some(PathBuf::from("/tmp/earth")),
            no_atmosphere: true,
            ..empty_args()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.assets.dir, PathBuf::from("/tmp/earth"));
        assert!(!config.planet.atmosphere);
        // Non-overridden fields retain defaults
        assert_eq!(config.window.height, 720);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&empty_args());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["globe", "--no-atmosphere", "--log-level", "debug"]);
        assert!(args.no_atmosphere);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.width.is_none());
    }
}
