/*============================================================
  Synavera Project: Pro-Hook
  Module: prohook_core::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load Pro-Hook configuration from TOML, falling back to the
    paths and channel tables of a stock Ubuntu host.

  Security / Safety Notes:
    Configuration is read-only input; paths named here are only
    ever opened for reading, except the optional log file.

  Dependencies:
    serde + toml for parsing, dirs for the per-user location.

  Operational Scope:
    Loaded once at start-up by the entry point.

  Revision History:
    2025-11-12 COD  Introduced layered hook configuration.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Every field has a default; partial files are valid
    - Explicit paths must exist, implicit ones may not
============================================================*/

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::classifier::ClassifierConfig;
use crate::error::{HookError, Result};

const SYSTEM_CONFIG: &str = "/etc/ubuntu-advantage/apt-hook.toml";

/// Root configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HookConfig {
    pub paths: PathsConfig,
    pub channels: ClassifierConfig,
    pub host: HostConfig,
    pub logging: LoggingConfig,
}

/// Host files the hook consults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub dpkg_status: PathBuf,
    pub esm_lists_dir: PathBuf,
    pub apt_news: PathBuf,
    pub expired_notice: PathBuf,
    pub os_release: PathBuf,
    pub cloud_id: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dpkg_status: PathBuf::from("/var/lib/dpkg/status"),
            esm_lists_dir: PathBuf::from("/var/lib/ubuntu-advantage/apt-esm/var/lib/apt/lists"),
            apt_news: PathBuf::from("/var/lib/ubuntu-advantage/messages/apt-news"),
            expired_notice: PathBuf::from("/var/lib/ubuntu-advantage/notices/5-contract_expired"),
            os_release: PathBuf::from("/etc/os-release"),
            cloud_id: PathBuf::from("/run/cloud-init/cloud-id"),
        }
    }
}

/// Overrides for facts normally probed from the host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub architecture: Option<String>,
    pub codename: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub file: Option<PathBuf>,
    pub verbose: bool,
}

impl HookConfig {
    /// Load from `path` when given, else the first existing default location.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        for candidate in default_locations() {
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }
        Ok(Self::default())
    }

    /// Load and parse a TOML file that must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            HookError::Config(format!("Failed to read {}: {err}", path.display()))
        })?;
        Self::parse(&text)
            .map_err(|err| HookError::Config(format!("{}: {err}", path.display())))
    }

    fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("pro-hook").join("config.toml"));
    }
    locations.push(PathBuf::from(SYSTEM_CONFIG));
    locations
}
