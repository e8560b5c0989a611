//! Per-user directories for the viewer's config and log files.

use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while resolving or creating directories.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The OS did not provide a configuration directory.
    #[error("could not determine OS configuration directory")]
    NoConfigDir,

    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
}

const APP_NAME: &str = "globe";

/// OS-specific directory paths.
///
/// XDG on Linux, Known Folders on Windows, Library on macOS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDirs {
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    /// JSON log files written by debug builds.
    pub log_dir: PathBuf,
}

impl PlatformDirs {
    /// Resolve directories without creating them.
    ///
    /// An explicit `config_dir` (from `--config`) replaces the OS default.
    pub fn resolve(config_dir: Option<&Path>) -> Result<Self, PlatformError> {
        let app_root = dirs::config_dir()
            .ok_or(PlatformError::NoConfigDir)?
            .join(APP_NAME);
        let log_dir = dirs::data_local_dir()
            .map(|base| base.join(APP_NAME))
            .unwrap_or_else(|| app_root.clone())
            .join("logs");

        Ok(Self {
            config_dir: config_dir.map_or(app_root, Path::to_path_buf),
            log_dir,
        })
    }

    /// Directories rooted under `root`, for tests.
    pub fn resolve_with_root(root: &Path) -> Self {
        let app_dir = root.join(APP_NAME);
        Self {
            config_dir: app_dir.join("config"),
            log_dir: app_dir.join("logs"),
        }
    }

    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}
