/*============================================================
  Synavera Project: Pro-Hook
  Module: prohook_core::transaction
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Shared structures describing the apt transaction carried by
    statistics and pre-prompt hook messages.

  Security / Safety Notes:
    Pure data container; no I/O performed in this module.

  Dependencies:
    serde for decoding message params.

  Operational Scope:
    Built once from the payload message and read by the origin
    classifier; discarded at process exit.

  Revision History:
    2025-11-12 COD  Introduced transaction model types.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Clear data contracts between modules
    - Immutable after decoding
============================================================*/

use serde::Deserialize;

use crate::error::{HookError, Result};
use crate::session::Message;

/// Package set apt is about to change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub command: String,
    #[serde(default, rename = "unknown-packages")]
    pub unknown_packages: Vec<String>,
    #[serde(default)]
    pub packages: Vec<PackageEntry>,
}

/// One package in the transaction.
#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize)]
pub struct PackageEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub automatic: bool,
    #[serde(default)]
    pub current: Option<String>,
    #[serde(default)]
    pub versions: Versions,
}

/// Candidate, install, and current version of a package.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Versions {
    #[serde(default)]
    pub candidate: VersionRecord,
    #[serde(default)]
    pub install: VersionRecord,
    #[serde(default)]
    pub current: VersionRecord,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub pin: i64,
    #[serde(default)]
    pub origins: Vec<Origin>,
}

/// Repository a version is published in.
#[allow(dead_code)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Origin {
    #[serde(default)]
    pub archive: String,
    #[serde(default)]
    pub codename: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub site: String,
}

impl Transaction {
    /// Decode the transaction carried in a payload message's params.
    pub fn from_message(message: &Message) -> Result<Self> {
        if message.params.is_null() {
            return Ok(Self::default());
        }
        Transaction::deserialize(&message.params).map_err(|source| HookError::Decode {
            context: format!("transaction params of `{}`", message.method),
            source,
        })
    }

    /// Distribution codename taken from the first candidate origin that names one.
    pub fn distribution_codename(&self) -> Option<&str> {
        self.packages
            .iter()
            .flat_map(|pkg| pkg.versions.candidate.origins.iter())
            .map(|origin| origin.codename.as_str())
            .find(|codename| !codename.is_empty())
    }
}

impl PackageEntry {
    pub fn is_upgrade(&self) -> bool {
        self.mode == "upgrade"
    }
}

impl VersionRecord {
    /// Any origin in the list carries this origin identifier.
    pub fn has_origin(&self, origin: &str) -> bool {
        self.origins.iter().any(|candidate| candidate.origin == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(params: &str) -> Message {
        let raw = format!(
            "{{\"jsonrpc\":\"2.0\",\"method\":\"org.debian.apt.hooks.install.statistics\",\"params\":{params}}}"
        );
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn decodes_apt_statistics_params() {
        let msg = message(
            r#"{"command":"upgrade","unknown-packages":[],"packages":[
                {"id":1,"name":"libssl3","architecture":"amd64","mode":"upgrade","automatic":true,
                 "versions":{
                   "candidate":{"id":10,"version":"3.0.2-0ubuntu1.12","architecture":"amd64","pin":500,
                     "origins":[{"archive":"jammy-security","codename":"jammy","version":"22.04",
                                 "origin":"Ubuntu","label":"Ubuntu","site":""}]},
                   "install":{"id":10,"version":"3.0.2-0ubuntu1.12","architecture":"amd64","pin":500,
                     "origins":[{"archive":"jammy-security","codename":"jammy","version":"22.04",
                                 "origin":"Ubuntu","label":"Ubuntu","site":""}]},
                   "current":{"id":9,"version":"3.0.2-0ubuntu1.10","architecture":"amd64","pin":100,"origins":[]}}}
            ]}"#,
        );
        let tx = Transaction::from_message(&msg).unwrap();
        assert_eq!(tx.command, "upgrade");
        assert_eq!(tx.packages.len(), 1);
        let pkg = &tx.packages[0];
        assert!(pkg.is_upgrade());
        assert!(pkg.automatic);
        assert!(pkg.versions.install.has_origin("Ubuntu"));
        assert!(pkg.versions.current.origins.is_empty());
        assert_eq!(tx.distribution_codename(), Some("jammy"));
    }

    #[test]
    fn absent_version_records_have_no_origins() {
        let msg = message(r#"{"packages":[{"id":3,"name":"hello","mode":"install"}]}"#);
        let tx = Transaction::from_message(&msg).unwrap();
        let pkg = &tx.packages[0];
        assert!(!pkg.is_upgrade());
        assert!(pkg.versions.install.origins.is_empty());
        assert_eq!(tx.distribution_codename(), None);
    }

    #[test]
    fn wrong_shape_is_a_decode_error() {
        let msg = message(r#"{"packages":"nope"}"#);
        let err = Transaction::from_message(&msg).unwrap_err();
        assert!(matches!(err, HookError::Decode { .. }));
    }
}
