//! Linux implementations of the input core's collaborators
//!
//! - `CommandSystem`: reboot and mount by running configured commands
//! - `SysfsUsbState`: USB gadget state from sysfs
//! - `LogUi`: a headless UI that writes everything to the log

use anyhow::{anyhow, Context};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{ConnectivityCheck, RecoveryUi, ScreenLayout, SystemActions};
use crate::config::SystemConfig;

/// Runs external commands for reboot and mount
#[derive(Debug, Clone)]
pub struct CommandSystem {
    reboot_command: Vec<String>,
    mount_command: Vec<String>,
}

impl CommandSystem {
    pub fn new(reboot_command: Vec<String>, mount_command: Vec<String>) -> Self {
        Self {
            reboot_command,
            mount_command,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(config.reboot_command.clone(), config.mount_command.clone())
    }
}

/// Run `argv[0]` with the remaining arguments and require a zero exit status
fn run_command(argv: &[String]) -> anyhow::Result<()> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow!("No command configured"))?;

    tracing::info!("Running {} {:?}", program, args);
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("Failed to start {}", program))?;

    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("{} exited with {}", program, status))
    }
}

impl SystemActions for CommandSystem {
    fn reboot(&self) -> anyhow::Result<()> {
        run_command(&self.reboot_command)
    }

    fn mount_system(&self) -> anyhow::Result<()> {
        run_command(&self.mount_command)
    }
}

/// Reads the Android USB gadget state file.
///
/// The host is considered attached when the state is CONNECTED or
/// CONFIGURED, i.e. the first byte is `C`.
#[derive(Debug, Clone)]
pub struct SysfsUsbState {
    state_path: PathBuf,
}

impl SysfsUsbState {
    pub fn new(state_path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: state_path.into(),
        }
    }
}

impl ConnectivityCheck for SysfsUsbState {
    fn is_connected(&self) -> bool {
        let mut file = match File::open(&self.state_path) {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!("Failed to open {:?}: {}", self.state_path, e);
                return false;
            }
        };

        let mut first = [0u8; 1];
        match file.read(&mut first) {
            Ok(1) => first[0] == b'C',
            Ok(_) => false,
            Err(e) => {
                tracing::debug!("Failed to read {:?}: {}", self.state_path, e);
                false
            }
        }
    }
}

/// Headless UI: log lines go to `tracing`, the overlay state is only tracked
#[derive(Debug)]
pub struct LogUi {
    text_visible: AtomicBool,
    layout: ScreenLayout,
}

impl LogUi {
    pub fn new(layout: ScreenLayout) -> Self {
        Self {
            text_visible: AtomicBool::new(false),
            layout,
        }
    }
}

impl Default for LogUi {
    fn default() -> Self {
        Self::new(ScreenLayout::default())
    }
}

impl RecoveryUi for LogUi {
    fn print(&self, text: &str) {
        tracing::info!("[ui] {}", text);
    }

    fn show_text(&self, visible: bool) {
        let previous = self.text_visible.swap(visible, Ordering::SeqCst);
        if previous != visible {
            tracing::info!("Text log {}", if visible { "shown" } else { "hidden" });
        }
    }

    fn is_text_visible(&self) -> bool {
        self.text_visible.load(Ordering::SeqCst)
    }

    fn screen_layout(&self) -> ScreenLayout {
        self.layout
    }
}
