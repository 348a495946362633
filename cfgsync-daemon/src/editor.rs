//! [`EditorBackend`] backed by the editor's command line and the OS process
//! table.

use cfgsync_core::config::EditorSettings;
use cfgsync_core::error::{Error, Result};
use cfgsync_core::ports::EditorBackend;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct EditorCli {
    cli: String,
    process_names: Vec<String>,
}

impl EditorCli {
    pub fn new(settings: &EditorSettings) -> Self {
        Self {
            cli: settings.cli.clone(),
            process_names: settings.process_names.clone(),
        }
    }

    /// Whether the editor CLI can be found on `PATH`.
    pub fn is_available(&self) -> bool {
        which::which(&self.cli).is_ok()
    }

    fn program(&self) -> Result<PathBuf> {
        which::which(&self.cli)
            .map_err(|e| Error::Editor(format!("{} not found: {}", self.cli, e)))
    }
}

impl EditorBackend for EditorCli {
    fn is_running(&self) -> bool {
        self.process_names.iter().any(|name| is_process_running(name))
    }

    fn installed_extensions(&self) -> Result<Vec<String>> {
        let output = Command::new(self.program()?)
            .arg("--list-extensions")
            .output()?;
        if !output.status.success() {
            return Err(Error::Editor(format!(
                "--list-extensions failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(parse_extension_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn install_extension(&self, id: &str) -> Result<()> {
        debug!("Installing extension {}", id);
        let output = Command::new(self.program()?)
            .args(["--install-extension", id])
            .output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(Error::Editor(format!(
                "installing {} failed: {}",
                id,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

pub fn parse_extension_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Check if a process with this exact name is running (Unix)
#[cfg(unix)]
pub fn is_process_running(name: &str) -> bool {
    Command::new("pgrep")
        .args(["-x", name])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check if a process with this image name is running (Windows)
#[cfg(windows)]
pub fn is_process_running(name: &str) -> bool {
    Command::new("tasklist")
        .args(["/FI", &format!("IMAGENAME eq {}", name)])
        .output()
        .map(|o| {
            let output = String::from_utf8_lossy(&o.stdout).to_lowercase();
            output.contains(&name.to_lowercase())
        })
        .unwrap_or(false)
}

#[cfg(not(any(unix, windows)))]
pub fn is_process_running(_name: &str) -> bool {
    false
}
