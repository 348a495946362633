//! Configuration, resolved once at startup and passed explicitly to every
//! component.
//!
//! The optional TOML file at `<config_dir>/cfgsync/config.toml` only needs the
//! keys that differ from the defaults:
//!
//! ```toml
//! mirror_dir = "/home/me/dotfiles/vscode"
//! poll_interval_secs = 600
//! classification = "scratch-branch"
//! preview = "html"
//! ```

use crate::error::{Error, Result};
use crate::models::{FileKind, TrackedFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 1200;
pub const DEFAULT_DEBOUNCE_SECS: u64 = 300;
pub const STATE_DIR_NAME: &str = ".cfgsync";

/// How the remote drift detector decides whether incoming commits matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationStrategy {
    /// Compare file contents at merge-base, HEAD and the remote tip in memory.
    #[default]
    Tree,
    /// Merge the remote tip into a disposable branch and inspect the staged diff.
    ScratchBranch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    #[default]
    Text,
    Html,
}

/// On-disk representation; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub mirror_dir: Option<PathBuf>,
    pub editor_user_dir: Option<PathBuf>,
    pub editor_dir_name: Option<String>,
    pub editor_cli: Option<String>,
    pub editor_processes: Option<Vec<String>>,
    pub remote: Option<String>,
    pub remote_branches: Option<Vec<String>>,
    pub poll_interval_secs: Option<u64>,
    pub debounce_secs: Option<u64>,
    pub classification: Option<ClassificationStrategy>,
    pub preview: Option<PreviewMode>,
    pub html_viewer: Option<String>,
    pub extensions_manifest: Option<String>,
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads the file if it exists; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

/// Default location of the config file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cfgsync").join("config.toml"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSettings {
    pub cli: String,
    pub process_names: Vec<String>,
    pub user_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mirror_dir: PathBuf,
    pub state_dir: PathBuf,
    pub tracked: Vec<TrackedFile>,
    pub manifest_path: PathBuf,
    pub manifest_repo_path: PathBuf,
    pub remote: String,
    pub remote_branches: Vec<String>,
    pub poll_interval: Duration,
    pub debounce: Duration,
    pub classification: ClassificationStrategy,
    pub preview: PreviewMode,
    pub html_viewer: Option<String>,
    pub editor: EditorSettings,
}

impl Config {
    /// Resolves a config file against the platform's home and config
    /// directories.
    pub fn resolve(file: ConfigFile) -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("could not determine home directory".to_string()))?;
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;
        Self::resolve_with(file, &home, &config_dir)
    }

    /// Resolution with explicit base directories.
    ///
    /// The editor keeps its user files in `<config_dir>/<editor_dir_name>/User`
    /// on every supported platform (`~/.config`, `~/Library/Application
    /// Support`, `%APPDATA%`).
    pub fn resolve_with(file: ConfigFile, home: &Path, config_dir: &Path) -> Result<Self> {
        let mirror_dir = file
            .mirror_dir
            .unwrap_or_else(|| home.join(".cfgsync").join("mirror"));
        let editor_dir_name = file.editor_dir_name.unwrap_or_else(|| "Code".to_string());
        let user_dir = file
            .editor_user_dir
            .unwrap_or_else(|| config_dir.join(&editor_dir_name).join("User"));

        let remote_branches = file
            .remote_branches
            .unwrap_or_else(|| vec!["master".to_string(), "main".to_string()]);
        if remote_branches.is_empty() {
            return Err(Error::Config(
                "remote_branches must name at least one branch".to_string(),
            ));
        }

        let poll_interval_secs = file.poll_interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        if poll_interval_secs == 0 {
            return Err(Error::Config(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }

        let manifest_name = file
            .extensions_manifest
            .unwrap_or_else(|| "extensions.txt".to_string());

        let tracked = vec![
            TrackedFile::new("settings.json", &user_dir, &mirror_dir, FileKind::Json),
            TrackedFile::new("keybindings.json", &user_dir, &mirror_dir, FileKind::Json),
        ];

        Ok(Self {
            state_dir: mirror_dir.join(STATE_DIR_NAME),
            manifest_path: mirror_dir.join(&manifest_name),
            manifest_repo_path: PathBuf::from(manifest_name),
            tracked,
            remote: file.remote.unwrap_or_else(|| "origin".to_string()),
            remote_branches,
            poll_interval: Duration::from_secs(poll_interval_secs),
            debounce: Duration::from_secs(file.debounce_secs.unwrap_or(DEFAULT_DEBOUNCE_SECS)),
            classification: file.classification.unwrap_or_default(),
            preview: file.preview.unwrap_or_default(),
            html_viewer: file.html_viewer,
            editor: EditorSettings {
                cli: file.editor_cli.unwrap_or_else(|| "code".to_string()),
                process_names: file
                    .editor_processes
                    .unwrap_or_else(default_editor_processes),
                user_dir,
            },
            mirror_dir,
        })
    }

    pub fn hash_marker_path(&self) -> PathBuf {
        self.state_dir.join("last_hash")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join("sync.log")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.state_dir.join("cfgsync.lock")
    }

    pub fn conflicts_dir(&self) -> PathBuf {
        self.state_dir.join("conflicts")
    }

    pub fn preview_path(&self) -> PathBuf {
        self.state_dir.join("preview.html")
    }

    /// Fails unless the mirror directory holds a git repository.
    pub fn ensure_initialized(&self) -> Result<()> {
        if self.mirror_dir.join(".git").exists() {
            Ok(())
        } else {
            Err(Error::MirrorNotInitialized(self.mirror_dir.clone()))
        }
    }

    /// Paths inside the repository that previews and classification look at.
    pub fn watched_repo_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.tracked.iter().map(|t| t.repo_path.clone()).collect();
        paths.push(self.manifest_repo_path.clone());
        paths
    }
}

fn default_editor_processes() -> Vec<String> {
    if cfg!(windows) {
        vec!["Code.exe".to_string()]
    } else if cfg!(target_os = "macos") {
        vec!["Electron".to_string(), "Code Helper".to_string()]
    } else {
        vec!["code".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolve(file: ConfigFile) -> Result<Config> {
        Config::resolve_with(file, Path::new("/home/me"), Path::new("/home/me/.config"))
    }

    #[test]
    fn test_defaults() {
        let config = resolve(ConfigFile::default()).unwrap();

        assert_eq!(config.mirror_dir, PathBuf::from("/home/me/.cfgsync/mirror"));
        assert_eq!(
            config.state_dir,
            PathBuf::from("/home/me/.cfgsync/mirror/.cfgsync")
        );
        assert_eq!(config.poll_interval, Duration::from_secs(1200));
        assert_eq!(config.debounce, Duration::from_secs(300));
        assert_eq!(config.remote, "origin");
        assert_eq!(config.remote_branches, vec!["master", "main"]);
        assert_eq!(config.classification, ClassificationStrategy::Tree);
        assert_eq!(config.preview, PreviewMode::Text);
        assert_eq!(config.tracked.len(), 2);
        assert_eq!(
            config.tracked[0].local_path,
            PathBuf::from("/home/me/.config/Code/User/settings.json")
        );
        assert_eq!(
            config.tracked[1].mirror_path,
            PathBuf::from("/home/me/.cfgsync/mirror/keybindings.json")
        );
        assert_eq!(
            config.manifest_path,
            PathBuf::from("/home/me/.cfgsync/mirror/extensions.txt")
        );
    }

    #[test]
    fn test_parse_overrides() {
        let file = ConfigFile::parse(
            r#"
            mirror_dir = "/srv/mirror"
            editor_dir_name = "VSCodium"
            editor_cli = "codium"
            poll_interval_secs = 60
            classification = "scratch-branch"
            preview = "html"
            remote_branches = ["main"]
            "#,
        )
        .unwrap();
        let config = resolve(file).unwrap();

        assert_eq!(config.mirror_dir, PathBuf::from("/srv/mirror"));
        assert_eq!(
            config.editor.user_dir,
            PathBuf::from("/home/me/.config/VSCodium/User")
        );
        assert_eq!(config.editor.cli, "codium");
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.classification, ClassificationStrategy::ScratchBranch);
        assert_eq!(config.preview, PreviewMode::Html);
        assert_eq!(config.remote_branches, vec!["main"]);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(matches!(
            ConfigFile::parse("poll_every = 5"),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let file = ConfigFile {
            poll_interval_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(resolve(file), Err(Error::Config(_))));

        let file = ConfigFile {
            remote_branches: Some(Vec::new()),
            ..Default::default()
        };
        assert!(matches!(resolve(file), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let file = ConfigFile::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn test_ensure_initialized() {
        let dir = TempDir::new().unwrap();
        let file = ConfigFile {
            mirror_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let config = resolve(file).unwrap();

        assert!(matches!(
            config.ensure_initialized(),
            Err(Error::MirrorNotInitialized(_))
        ));

        std::fs::create_dir(dir.path().join(".git")).unwrap();
        assert!(config.ensure_initialized().is_ok());
    }
}
