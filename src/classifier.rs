/*============================================================
  Synavera Project: Pro-Hook
  Module: prohook_core::classifier
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Classify the upgrades in an apt transaction by the channel
    their install version comes from.

  Security / Safety Notes:
    Pure computation over decoded hook data; no I/O.

  Dependencies:
    serde for loading channel rules from configuration.

  Operational Scope:
    Feeds the security update count shown after apt statistics
    and the expired-subscription package list shown at the
    pre-prompt.

  Revision History:
    2025-11-12 COD  Authored configurable origin classifier.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Channel tables are data, not code
    - Deterministic ordering for reproducible output
============================================================*/

use serde::Deserialize;

use crate::transaction::{Origin, Transaction, VersionRecord};

/// Security channels counted after apt statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelTag {
    Standard,
    EsmInfra,
    EsmApps,
}

/// Matches an origin by identifier and archive suffix.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OriginMatcher {
    pub origin: String,
    pub archive_suffix: String,
}

impl OriginMatcher {
    pub fn new(origin: &str, archive_suffix: &str) -> Self {
        Self {
            origin: origin.to_string(),
            archive_suffix: archive_suffix.to_string(),
        }
    }

    pub fn matches(&self, origin: &Origin) -> bool {
        origin.origin == self.origin && origin.archive.ends_with(&self.archive_suffix)
    }
}

/// A channel and the origins that identify it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelRule {
    pub tag: ChannelTag,
    pub matchers: Vec<OriginMatcher>,
}

/// Channel tables consulted by the classifier. Rule order is match priority.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub channels: Vec<ChannelRule>,
    pub restricted_origins: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            channels: vec![
                ChannelRule {
                    tag: ChannelTag::EsmApps,
                    matchers: vec![OriginMatcher::new("UbuntuESMApps", "-apps-security")],
                },
                ChannelRule {
                    tag: ChannelTag::EsmInfra,
                    matchers: vec![OriginMatcher::new("UbuntuESM", "-infra-security")],
                },
                ChannelRule {
                    tag: ChannelTag::Standard,
                    matchers: vec![OriginMatcher::new("Ubuntu", "-security")],
                },
            ],
            restricted_origins: [
                "UbuntuESM",
                "UbuntuESMApps",
                "UbuntuCC",
                "UbuntuCIS",
                "UbuntuFIPS",
                "UbuntuFIPSUpdates",
                "UbuntuFIPSPreview",
                "UbuntuRealtimeKernel",
                "UbuntuROS",
                "UbuntuROSUpdates",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl ClassifierConfig {
    /// First channel whose matchers accept any origin of `record`.
    pub fn classify(&self, record: &VersionRecord) -> Option<ChannelTag> {
        self.channels
            .iter()
            .find(|rule| {
                record
                    .origins
                    .iter()
                    .any(|origin| rule.matchers.iter().any(|m| m.matches(origin)))
            })
            .map(|rule| rule.tag)
    }

    fn is_restricted(&self, record: &VersionRecord) -> bool {
        self.restricted_origins
            .iter()
            .any(|origin| record.has_origin(origin))
    }
}

/// Security upgrades per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecurityCounts {
    pub standard: usize,
    pub esm_infra: usize,
    pub esm_apps: usize,
}

impl SecurityCounts {
    pub fn total(&self) -> usize {
        self.standard + self.esm_infra + self.esm_apps
    }

    fn bump(&mut self, tag: ChannelTag) {
        match tag {
            ChannelTag::Standard => self.standard += 1,
            ChannelTag::EsmInfra => self.esm_infra += 1,
            ChannelTag::EsmApps => self.esm_apps += 1,
        }
    }
}

/// Count upgrades by the channel of their install version.
pub fn count_security_updates(transaction: &Transaction, config: &ClassifierConfig) -> SecurityCounts {
    let mut counts = SecurityCounts::default();
    for package in transaction.packages.iter().filter(|pkg| pkg.is_upgrade()) {
        if let Some(tag) = config.classify(&package.versions.install) {
            counts.bump(tag);
        }
    }
    counts
}

/// Names of upgrades whose install version comes from an entitlement-restricted origin.
pub fn collect_restricted_packages(
    transaction: &Transaction,
    config: &ClassifierConfig,
) -> Vec<String> {
    transaction
        .packages
        .iter()
        .filter(|pkg| pkg.is_upgrade() && config.is_restricted(&pkg.versions.install))
        .map(|pkg| pkg.name.clone())
        .collect()
}
