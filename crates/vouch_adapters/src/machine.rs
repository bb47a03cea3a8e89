use std::path::{Path, PathBuf};

use vouch_core::ports::MachineIdentity;

const LINUX_MACHINE_ID_PATHS: [&str; 2] = ["/etc/machine-id", "/var/lib/dbus/machine-id"];
const DEFAULT_MACHINE_ID: &str = "vouch-cli-default-key";

/// Machine fingerprint from the OS: the systemd/dbus machine id on Linux, a
/// fixed per-OS string elsewhere.
pub struct SystemMachineIdentity {
    id_paths: Vec<PathBuf>,
}

impl SystemMachineIdentity {
    pub fn new() -> Self {
        Self {
            id_paths: LINUX_MACHINE_ID_PATHS.iter().map(PathBuf::from).collect(),
        }
    }

    /// Read the machine id from custom locations instead of the system ones
    pub fn with_id_paths(id_paths: Vec<PathBuf>) -> Self {
        Self { id_paths }
    }

    fn read_machine_id(paths: &[PathBuf]) -> Option<String> {
        paths.iter().find_map(|p| read_trimmed(p))
    }
}

impl Default for SystemMachineIdentity {
    fn default() -> Self {
        Self::new()
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn os_fallback_id() -> Option<&'static str> {
    match std::env::consts::OS {
        "macos" => Some("macos-fallback-key"),
        "windows" => Some("windows-fallback-key"),
        _ => None,
    }
}

impl MachineIdentity for SystemMachineIdentity {
    fn machine_id(&self) -> String {
        Self::read_machine_id(&self.id_paths)
            .or_else(|| os_fallback_id().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_MACHINE_ID.to_string())
    }

    fn username(&self) -> String {
        whoami::username()
    }
}
