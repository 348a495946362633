pub mod diff;
pub mod install;
pub mod log;
pub mod pull;
pub mod push;
pub mod run;
pub mod status;

use anyhow::{Context, Result};
use cfgsync_core::config::default_config_path;
use cfgsync_core::{Config, ConfigFile};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

pub fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let file = match custom_path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => ConfigFile::load(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => ConfigFile::default(),
    };
    Ok(Config::resolve(file)?)
}

/// Prints the "not installed" hint and returns false when the mirror is
/// missing.
pub fn check_initialized(config: &Config) -> bool {
    require_initialized(config).is_ok()
}

/// Like `check_initialized`, for commands that must not exit cleanly
/// without a mirror.
pub fn require_initialized(config: &Config) -> Result<()> {
    if let Err(e) = config.ensure_initialized() {
        println!(
            "{}",
            format!("No mirror found at {}", config.mirror_dir.display()).red()
        );
        println!("Run {} to set one up", "cfgsync install --remote <url>".cyan());
        return Err(e.into());
    }
    Ok(())
}

pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgsync_core::Error;
    use tempfile::TempDir;

    fn config_for(mirror: &Path) -> Config {
        let file = ConfigFile {
            mirror_dir: Some(mirror.to_path_buf()),
            ..Default::default()
        };
        Config::resolve_with(file, mirror, mirror).unwrap()
    }

    #[test]
    fn test_missing_mirror_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());

        let err = require_initialized(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::MirrorNotInitialized(_))
        ));
        assert!(!check_initialized(&config));
    }

    #[test]
    fn test_push_and_pull_fail_without_mirror() {
        let dir = TempDir::new().unwrap();

        assert!(push::run(config_for(dir.path()), true).is_err());
        assert!(pull::run(config_for(dir.path()), true).is_err());
    }

    #[test]
    fn test_initialized_mirror_passes() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();

        assert!(require_initialized(&config_for(dir.path())).is_ok());
    }
}
