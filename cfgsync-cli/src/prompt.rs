//! Terminal implementations of the confirmation port.

use crate::display::print_preview;
use cfgsync_core::diff::DiffPreview;
use cfgsync_core::ports::{ConfirmationBackend, Prompt};
use cfgsync_core::{Config, PreviewMode};
use colored::Colorize;
use dialoguer::Confirm;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::warn;

/// Asks on the controlling terminal. Escape or a closed terminal count as
/// "no".
pub struct TerminalPrompt {
    mode: PreviewMode,
    preview_path: PathBuf,
    viewer: Option<String>,
}

impl TerminalPrompt {
    pub fn new(config: &Config) -> Self {
        Self {
            mode: config.preview,
            preview_path: config.preview_path(),
            viewer: config.html_viewer.clone(),
        }
    }

    fn show(&self, preview: &DiffPreview) {
        if self.mode == PreviewMode::Html {
            match self.open_html(preview) {
                Ok(()) => {
                    println!(
                        "  {}: {}",
                        "Preview".bold(),
                        self.preview_path.display().to_string().dimmed()
                    );
                    return;
                }
                Err(e) => warn!("Could not open HTML preview: {}", e),
            }
        }
        print_preview(preview);
    }

    fn open_html(&self, preview: &DiffPreview) -> std::io::Result<()> {
        if let Some(parent) = self.preview_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.preview_path, preview.to_html())?;
        open_in_viewer(&self.preview_path, self.viewer.as_deref())
    }
}

impl ConfirmationBackend for TerminalPrompt {
    fn notify(&self, title: &str, body: &str) {
        print_notice(title, body);
    }

    fn confirm(&self, prompt: &Prompt) -> bool {
        print_header(prompt);
        if let Some(preview) = &prompt.preview {
            self.show(preview);
        }

        match Confirm::new()
            .with_prompt(prompt.title.as_str())
            .default(false)
            .interact_opt()
        {
            Ok(Some(answer)) => answer,
            Ok(None) => false,
            Err(e) => {
                warn!("Prompt failed: {}", e);
                false
            }
        }
    }
}

/// Answers every prompt with yes, still printing what is being accepted.
pub struct AssumeYes;

impl ConfirmationBackend for AssumeYes {
    fn notify(&self, title: &str, body: &str) {
        print_notice(title, body);
    }

    fn confirm(&self, prompt: &Prompt) -> bool {
        print_header(prompt);
        if let Some(preview) = &prompt.preview {
            print_preview(preview);
        }
        println!("{}", "Proceeding without confirmation (--yes)".dimmed());
        true
    }
}

fn print_header(prompt: &Prompt) {
    println!();
    println!("{}", prompt.title.bold().cyan());
    println!("{}", prompt.body);
    println!();
}

fn print_notice(title: &str, body: &str) {
    println!();
    println!("{} {}", "!".yellow().bold(), title.yellow().bold());
    println!("  {}", body);
}

fn open_in_viewer(path: &Path, viewer: Option<&str>) -> std::io::Result<()> {
    let mut command = match viewer {
        Some(viewer) => Command::new(viewer),
        None => default_viewer(),
    };
    command.arg(path).spawn().map(|_| ())
}

#[cfg(target_os = "macos")]
fn default_viewer() -> Command {
    Command::new("open")
}

#[cfg(windows)]
fn default_viewer() -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]);
    command
}

#[cfg(not(any(target_os = "macos", windows)))]
fn default_viewer() -> Command {
    Command::new("xdg-open")
}
