//! Configuration schema, defaults, and layered loading.
//!
//! Precedence: defaults < config file < environment < CLI
use crate::transport::local::{BindScope, DEFAULT_PROBE_TARGET};
use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
pub const ENV_PREFIX: &str = "PHOTOBRIDGE_";

pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "photobridge")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("photobridge.toml"))
}

/// Fully resolved bridge configuration after all layers merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Directory receiving both uploaded photos and pairing QR images
    pub save_dir: PathBuf,
    /// Listener port; 0 picks an ephemeral port
    pub port: u16,
    pub bind_scope: BindScope,
    /// Outbound address used only to ask the OS which interface routes to it
    pub probe_target: String,
    pub max_upload_bytes: usize,
    pub qr_prefix: String,
}

impl BridgeConfig {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
            ..Self::default()
        }
    }

    /// Rejects values the listener or pairing service cannot work with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.save_dir.as_os_str().is_empty(),
            "Invalid config: save_dir must not be empty"
        );
        ensure!(
            self.max_upload_bytes > 0,
            "Invalid config: max_upload_bytes must be > 0"
        );
        ensure!(
            !self.qr_prefix.trim().is_empty(),
            "Invalid config: qr_prefix must not be empty"
        );
        ensure!(
            !self.qr_prefix.contains(['/', '\\']),
            "Invalid config: qr_prefix must not contain path separators"
        );
        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("evidence"),
            port: DEFAULT_PORT,
            bind_scope: BindScope::AllInterfaces,
            probe_target: DEFAULT_PROBE_TARGET.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            qr_prefix: "pairing_qr".to_string(),
        }
    }
}

/// Values given on the command line, applied over the loaded config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub save_dir: Option<PathBuf>,
    pub port: Option<u16>,
}

/// Loads config from defaults/file/env.
pub fn load_config() -> Result<BridgeConfig> {
    load_config_from(&config_path())
}

/// Same as [`load_config`] but reads the TOML layer from `path`.
pub fn load_config_from(path: &Path) -> Result<BridgeConfig> {
    let config: BridgeConfig = Figment::new()
        .merge(Serialized::defaults(BridgeConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()
        .context("Failed to load configuration")?;

    config.validate()?;

    Ok(config)
}

/// Applies runtime overrides to a loaded config.
pub fn apply_overrides(mut config: BridgeConfig, overrides: &ConfigOverrides) -> BridgeConfig {
    if let Some(dir) = &overrides.save_dir {
        config.save_dir = dir.clone();
    }
    if let Some(port) = overrides.port {
        config.port = port;
    }
    config
}
