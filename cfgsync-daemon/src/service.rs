//! Per-user service definitions that start `cfgsync run` at login.

use cfgsync_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

const LAUNCHD_LABEL: &str = "dev.cfgsync.agent";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// `~/.config/systemd/user/cfgsync.service`
    SystemdUser,
    /// `~/Library/LaunchAgents/dev.cfgsync.agent.plist`
    LaunchAgent,
}

impl ServiceKind {
    pub fn current() -> Option<Self> {
        if cfg!(target_os = "linux") {
            Some(ServiceKind::SystemdUser)
        } else if cfg!(target_os = "macos") {
            Some(ServiceKind::LaunchAgent)
        } else {
            None
        }
    }

    pub fn definition_path(&self, home: &Path, config_dir: &Path) -> PathBuf {
        match self {
            ServiceKind::SystemdUser => config_dir
                .join("systemd")
                .join("user")
                .join("cfgsync.service"),
            ServiceKind::LaunchAgent => home
                .join("Library")
                .join("LaunchAgents")
                .join(format!("{}.plist", LAUNCHD_LABEL)),
        }
    }

    pub fn render(&self, exe: &Path, config: Option<&Path>) -> String {
        let args = service_args(exe, config);
        match self {
            ServiceKind::SystemdUser => {
                let exec = args
                    .iter()
                    .map(|a| quote_systemd(a))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!(
                    "[Unit]\n\
                     Description=cfgsync editor settings sync\n\
                     After=network-online.target\n\
                     \n\
                     [Service]\n\
                     ExecStart={}\n\
                     Restart=on-failure\n\
                     \n\
                     [Install]\n\
                     WantedBy=default.target\n",
                    exec
                )
            }
            ServiceKind::LaunchAgent => {
                let program_args = args
                    .iter()
                    .map(|a| format!("        <string>{}</string>\n", escape_xml(a)))
                    .collect::<String>();
                format!(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                     <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
                     <plist version=\"1.0\">\n\
                     <dict>\n\
                     \x20   <key>Label</key>\n\
                     \x20   <string>{}</string>\n\
                     \x20   <key>ProgramArguments</key>\n\
                     \x20   <array>\n\
                     {}\
                     \x20   </array>\n\
                     \x20   <key>RunAtLoad</key>\n\
                     \x20   <true/>\n\
                     </dict>\n\
                     </plist>\n",
                    LAUNCHD_LABEL, program_args
                )
            }
        }
    }
}

/// Writes the definition for this platform and returns where it went.
pub fn register_service(exe: &Path, config: Option<&Path>) -> Result<PathBuf> {
    let kind = ServiceKind::current().ok_or_else(|| {
        Error::Config("service registration is not supported on this platform".to_string())
    })?;
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Config("could not determine home directory".to_string()))?;
    let config_dir = dirs::config_dir()
        .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;

    let path = kind.definition_path(&home, &config_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, kind.render(exe, config))?;
    info!("Wrote service definition {:?}", path);
    Ok(path)
}

fn service_args(exe: &Path, config: Option<&Path>) -> Vec<String> {
    let mut args = vec![exe.display().to_string()];
    if let Some(config) = config {
        args.push("--config".to_string());
        args.push(config.display().to_string());
    }
    args.push("run".to_string());
    args.push("--skip-first-remote-check".to_string());
    args
}

fn quote_systemd(arg: &str) -> String {
    if arg.contains(char::is_whitespace) || arg.contains('"') {
        format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
