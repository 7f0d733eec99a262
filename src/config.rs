//! Configuration management for the recovery input core
//!
//! Provides settings loading with schema versioning and migrations.
//! Configuration is read from an explicit path, the `RECOVERY_INPUT_CONFIG`
//! environment variable, or `<config dir>/recovery-input/config.json`, and
//! falls back to built-in defaults when no file exists.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::codes::{KEY_HOME, KEY_POWER, KEY_VOLUMEDOWN, KEY_VOLUMEUP};
use crate::platform::ScreenLayout;
use crate::queue::OverflowPolicy;

/// Current config schema version
pub const CURRENT_VERSION: u32 = 2;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RECOVERY_INPUT_CONFIG";

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Failed to serialise config: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Unknown config version: {0}")]
    UnknownVersion(u32),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Schema version for migrations
    pub version: u32,
    /// Key tracking and action queue settings
    pub input: InputConfig,
    /// Touchscreen gesture settings
    pub touch: TouchConfig,
    /// Hotkey bindings for the default key policy
    pub hotkeys: HotkeyConfig,
    /// Reboot, mount and connectivity settings
    pub system: SystemConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            input: InputConfig::default(),
            touch: TouchConfig::default(),
            hotkeys: HotkeyConfig::default(),
            system: SystemConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Key tracking and action queue configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Hold time after which a press counts as long (ms)
    pub long_press_ms: u64,
    /// How long `wait_key` blocks before giving up, unless USB is connected (s)
    pub wait_key_timeout_secs: u64,
    /// Maximum number of queued action codes
    pub queue_capacity: usize,
    /// What happens to pushes while the queue is full
    pub overflow: OverflowPolicy,
    /// Directory scanned for `event*` device nodes
    pub device_dir: PathBuf,
    /// Period of the hot-plug rescan (ms)
    pub rescan_interval_ms: u64,
    /// Accumulated trackball motion that produces one up/down key
    pub trackball_threshold: i32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 750,
            wait_key_timeout_secs: 120,
            queue_capacity: 256,
            overflow: OverflowPolicy::default(),
            device_dir: PathBuf::from("/dev/input"),
            rescan_interval_ms: 5000,
            trackball_threshold: 3,
        }
    }
}

impl InputConfig {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn wait_key_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_key_timeout_secs)
    }

    pub fn rescan_interval(&self) -> Duration {
        Duration::from_millis(self.rescan_interval_ms)
    }
}

/// Display rotation applied to touch coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    UpsideDown,
    Clockwise270,
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Self::None),
            90 => Ok(Self::Clockwise90),
            180 => Ok(Self::UpsideDown),
            270 => Ok(Self::Clockwise270),
            other => Err(format!("unsupported rotation {} (use 0, 90, 180 or 270)", other)),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        match rotation {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::UpsideDown => 180,
            Rotation::Clockwise270 => 270,
        }
    }
}

/// Touchscreen configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TouchConfig {
    /// Whether touch gestures are recognised at all
    pub enabled: bool,
    /// Display rotation, fixed for the lifetime of the process
    pub rotation: Rotation,
    /// Framebuffer width in pixels
    pub display_width: i32,
    /// Framebuffer height in pixels
    pub display_height: i32,
    /// Vertical travel that produces one scroll step (px)
    pub scroll_threshold_px: i32,
    /// Menu geometry used by the built-in UI to map taps to rows
    pub layout: ScreenLayout,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rotation: Rotation::default(),
            display_width: 720,
            display_height: 1280,
            scroll_threshold_px: 20,
            layout: ScreenLayout::default(),
        }
    }
}

/// Key codes used by the default key policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Key whose repeated presses reboot the device
    pub power: u16,
    /// First key of the alternating mount combo
    pub volume_up: u16,
    /// Second key of the alternating mount combo
    pub volume_down: u16,
    /// Key that must be held for the visibility chord
    pub toggle_modifier: u16,
    /// Key that completes the visibility chord
    pub toggle_key: u16,
    /// Key that toggles visibility on its own
    pub alt_toggle: u16,
    /// Presses needed to trigger the reboot or mount combo
    pub combo_presses: u32,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            power: KEY_POWER,
            volume_up: KEY_VOLUMEUP,
            volume_down: KEY_VOLUMEDOWN,
            toggle_modifier: KEY_POWER,
            toggle_key: KEY_VOLUMEUP,
            alt_toggle: KEY_HOME,
            combo_presses: 7,
        }
    }
}

/// Reboot, mount and connectivity configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SystemConfig {
    /// Initial state of the reboot gate
    pub enable_reboot: bool,
    /// Whether the mount combo is honoured
    pub allow_system_mount: bool,
    /// Command (program and arguments) used to reboot
    pub reboot_command: Vec<String>,
    /// Command (program and arguments) used to mount /system
    pub mount_command: Vec<String>,
    /// Sysfs file reporting USB gadget state
    pub usb_state_path: PathBuf,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            enable_reboot: true,
            allow_system_mount: true,
            reboot_command: vec!["reboot".to_string()],
            mount_command: vec!["mount".to_string(), "/system".to_string()],
            usb_state_path: PathBuf::from("/sys/class/android_usb/android0/state"),
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// File the log is appended to, in addition to stdout
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: Some(PathBuf::from("/tmp/recovery.log")),
        }
    }
}

impl Config {
    /// Check values that would make the input core misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "input.queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.hotkeys.combo_presses == 0 {
            return Err(ConfigError::Invalid(
                "hotkeys.combo_presses must be at least 1".to_string(),
            ));
        }
        if self.touch.enabled && (self.touch.display_width <= 0 || self.touch.display_height <= 0)
        {
            return Err(ConfigError::Invalid(
                "touch display dimensions must be positive".to_string(),
            ));
        }
        if self.touch.enabled && self.touch.layout.row_height <= 0 {
            return Err(ConfigError::Invalid(
                "touch.layout.row_height must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Get the default config file path (<config dir>/recovery-input/config.json)
pub fn default_config_path() -> PathBuf {
    config_dir_or_fallback()
        .join("recovery-input")
        .join("config.json")
}

/// Get the config directory, falling back to /etc if unavailable
fn config_dir_or_fallback() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| {
        tracing::debug!("Could not determine config directory, using /etc");
        PathBuf::from("/etc")
    })
}

/// Resolve which config file to read
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    default_config_path()
}

/// Load configuration, using defaults when the file does not exist
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = resolve_config_path(explicit);
    load_from_path(&path)
}

/// Load configuration from a specific file
pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::info!("Config file {:?} not found, using defaults", path);
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(ConfigError::Parse)?;

    let migrated = migrate_config(config)?;
    migrated.validate()?;

    tracing::info!(
        "Config loaded from {:?}: touch={}, queue_capacity={}",
        path,
        migrated.touch.enabled,
        migrated.input.queue_capacity
    );
    Ok(migrated)
}

/// Save configuration to a specific file, creating parent directories
pub fn save_to_path(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
    }

    let contents = serde_json::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    fs::write(path, contents).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Config saved to {:?}", path);
    Ok(())
}

/// Migrate configuration from older schema versions
fn migrate_config(mut config: Config) -> Result<Config, ConfigError> {
    let original_version = config.version;

    if config.version > CURRENT_VERSION {
        return Err(ConfigError::UnknownVersion(config.version));
    }

    while config.version < CURRENT_VERSION {
        config = apply_migration(config)?;
    }

    if config.version != original_version {
        tracing::info!(
            "Migrated config from version {} to {}",
            original_version,
            config.version
        );
    }

    Ok(config)
}

/// Apply a single migration step
fn apply_migration(config: Config) -> Result<Config, ConfigError> {
    match config.version {
        // Version 0 -> 1: unversioned files
        0 => {
            let mut migrated = config;
            migrated.version = 1;
            Ok(migrated)
        }
        // Version 1 -> 2: the hot-plug rescan interval became configurable;
        // version 1 files that set it to zero meant "use the default"
        1 => {
            let mut migrated = config;
            if migrated.input.rescan_interval_ms == 0 {
                migrated.input.rescan_interval_ms = InputConfig::default().rescan_interval_ms;
            }
            migrated.version = 2;
            Ok(migrated)
        }
        v => Err(ConfigError::UnknownVersion(v)),
    }
}
