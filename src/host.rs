/*============================================================
  Synavera Project: Pro-Hook
  Module: prohook_core::host
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Gather host facts the advisories depend on: release
    codename, dpkg architecture, and cloud platform.

  Security / Safety Notes:
    Executes `dpkg --print-architecture` with the caller's
    privileges; reads world-readable files only.

  Dependencies:
    std::process for the dpkg query.

  Operational Scope:
    Consulted on the pre-prompt path to locate ESM indexes and
    to pick the matching "learn more" link.

  Revision History:
    2025-11-12 COD  Crafted host fact helpers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic command invocation with explicit checks
    - Absent informational files degrade to defaults
============================================================*/

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{HookError, Result};

/// Subset of `/etc/os-release` used by the hook.
#[allow(dead_code)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    pub id: String,
    pub name: String,
    pub version: String,
    pub version_id: String,
    pub version_codename: String,
}

/// Cloud platform reported by cloud-init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudId {
    Aws,
    Azure,
    Gce,
    None,
}

/// Parse `KEY=value` lines, stripping surrounding quotes. A missing file is empty.
pub fn read_os_release(path: &Path) -> Result<OsRelease> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(OsRelease::default()),
        Err(source) => {
            return Err(HookError::FileRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    Ok(parse_os_release(&text))
}

fn parse_os_release(text: &str) -> OsRelease {
    let fields: HashMap<&str, &str> = text
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim().trim_matches('"').trim_matches('\'')))
        .collect();
    let field = |key: &str| fields.get(key).map(|v| v.to_string()).unwrap_or_default();

    OsRelease {
        id: field("ID"),
        name: field("NAME"),
        version: field("VERSION"),
        version_id: field("VERSION_ID"),
        version_codename: field("VERSION_CODENAME"),
    }
}

/// Host package architecture as dpkg names it (`amd64`, `arm64`, ...).
pub fn dpkg_architecture() -> Result<String> {
    let output = Command::new("dpkg")
        .arg("--print-architecture")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|err| map_spawn_error(err, "dpkg"))?;

    if !output.status.success() {
        return Err(HookError::CommandFailure {
            command: "dpkg --print-architecture".into(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Cloud platform from cloud-init's `cloud-id`, matched by prefix.
pub fn cloud_id(path: &Path) -> CloudId {
    match fs::read_to_string(path) {
        Ok(text) => parse_cloud_id(&text),
        Err(_) => CloudId::None,
    }
}

fn parse_cloud_id(text: &str) -> CloudId {
    let text = text.trim_start();
    if text.starts_with("aws") {
        CloudId::Aws
    } else if text.starts_with("azure") {
        CloudId::Azure
    } else if text.starts_with("gce") {
        CloudId::Gce
    } else {
        CloudId::None
    }
}

fn map_spawn_error(err: io::Error, command: &str) -> HookError {
    if err.kind() == io::ErrorKind::NotFound {
        HookError::CommandMissing {
            command: command.into(),
        }
    } else {
        HookError::Io(err)
    }
}
