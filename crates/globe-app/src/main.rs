//! The binary entry point for the Globe viewer.

use clap::Parser;
use globe_app::platform::PlatformDirs;
use globe_config::{CliArgs, Config};
use tracing::{error, info};

fn main() {
    let args = CliArgs::parse();

    let dirs = match PlatformDirs::resolve(args.config.as_deref()) {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("Failed to resolve platform directories: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = dirs.create_dirs() {
        eprintln!("Failed to initialize platform directories: {e}");
        std::process::exit(1);
    }

    let mut config = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };
    config.apply_cli_overrides(&args);

    globe_log::init_logging(Some(dirs.log_dir.as_path()), cfg!(debug_assertions), Some(&config));
    info!(
        config = %dirs.config_dir.display(),
        logs = %dirs.log_dir.display(),
        assets = %config.assets.dir.display(),
        "Globe starting"
    );

    if let Err(e) = globe_app::window::run(config) {
        error!("{e}");
        std::process::exit(1);
    }
}
