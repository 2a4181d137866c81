/*============================================================
  Synavera Project: Pro-Hook
  Module: prohook_core::diff
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Find installed packages that have a newer version waiting in
    an ESM channel the host cannot currently reach.

  Security / Safety Notes:
    Reads the dpkg status database and the ESM package lists
    cached by the Pro client; never writes.

  Dependencies:
    None beyond std; relies on the status parser and the
    Debian version comparator.

  Operational Scope:
    Invoked on the apt pre-prompt message to decide which ESM
    advisory (infra or apps) to show.

  Revision History:
    2025-11-12 COD  Crafted restricted-channel diff engine.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Missing indexes are an empty channel, not a failure
    - Deterministic ordering following the status database
============================================================*/

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::status::{read_status_file, StatusRecord};
use crate::version::is_newer;

/// ESM channels served from esm.ubuntu.com.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictedChannel {
    Infra,
    Apps,
}

impl RestrictedChannel {
    pub fn list_name(self) -> &'static str {
        match self {
            RestrictedChannel::Infra => "infra",
            RestrictedChannel::Apps => "apps",
        }
    }
}

impl fmt::Display for RestrictedChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "esm-{}", self.list_name())
    }
}

/// Installed packages with pending updates per restricted channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestrictedUpdates {
    pub infra: Vec<String>,
    pub apps: Vec<String>,
}

/// Security then updates index for `channel`, in load order.
pub fn index_paths(
    lists_dir: &Path,
    channel: RestrictedChannel,
    codename: &str,
    arch: &str,
) -> [PathBuf; 2] {
    let name = channel.list_name();
    ["security", "updates"].map(|pocket| {
        lists_dir.join(format!(
            "esm.ubuntu.com_{name}_ubuntu_dists_{codename}-{name}-{pocket}_main_binary-{arch}_Packages"
        ))
    })
}

/// Merge index files into one name-keyed table; later entries overwrite earlier ones.
pub fn load_restricted_index(paths: &[PathBuf]) -> Result<HashMap<String, StatusRecord>> {
    let mut index = HashMap::new();
    for path in paths {
        for record in read_status_file(path)? {
            index.insert(record.name.clone(), record);
        }
    }
    Ok(index)
}

/// Installed packages whose restricted index version is strictly newer.
pub fn diff_channel(
    installed: &[StatusRecord],
    index: &HashMap<String, StatusRecord>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    installed
        .iter()
        .filter(|record| record.is_installed())
        .filter(|record| {
            index
                .get(&record.name)
                .map_or(false, |candidate| is_newer(&candidate.version, &record.version))
        })
        .filter(|record| seen.insert(record.name.clone()))
        .map(|record| record.name.clone())
        .collect()
}

/// Diff the installed set against both ESM channels.
pub fn find_restricted_updates(
    status_path: &Path,
    lists_dir: &Path,
    codename: &str,
    arch: &str,
) -> Result<RestrictedUpdates> {
    let installed = read_status_file(status_path)?;

    let mut updates = RestrictedUpdates::default();
    for channel in [RestrictedChannel::Infra, RestrictedChannel::Apps] {
        let index = load_restricted_index(&index_paths(lists_dir, channel, codename, arch))?;
        let names = diff_channel(&installed, &index);
        match channel {
            RestrictedChannel::Infra => updates.infra = names,
            RestrictedChannel::Apps => updates.apps = names,
        }
    }
    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn record(name: &str, version: &str, status: &str) -> StatusRecord {
        StatusRecord {
            name: name.into(),
            version: version.into(),
            status: status.into(),
            source: String::new(),
        }
    }

    fn index_of(records: Vec<StatusRecord>) -> HashMap<String, StatusRecord> {
        records.into_iter().map(|r| (r.name.clone(), r)).collect()
    }

    #[test]
    fn newer_restricted_version_is_reported() {
        let installed = vec![record("pkg", "1.0", "install ok installed")];
        let index = index_of(vec![record("pkg", "1.1", "")]);
        assert_eq!(diff_channel(&installed, &index), vec!["pkg".to_string()]);
    }

    #[test]
    fn equal_or_older_versions_are_not_reported() {
        let installed = vec![
            record("same", "1.0", "install ok installed"),
            record("older", "2.0", "install ok installed"),
        ];
        let index = index_of(vec![record("same", "1.0", ""), record("older", "1.9", "")]);
        assert!(diff_channel(&installed, &index).is_empty());
    }

    #[test]
    fn packages_not_installed_are_skipped() {
        let installed = vec![record("gone", "1.0", "deinstall ok config-files")];
        let index = index_of(vec![record("gone", "2.0", "")]);
        assert!(diff_channel(&installed, &index).is_empty());
    }

    #[test]
    fn multiarch_duplicates_reported_once() {
        let installed = vec![
            record("libfoo", "1.0", "install ok installed"),
            record("libfoo", "1.0", "install ok installed"),
        ];
        let index = index_of(vec![record("libfoo", "1.0+esm1", "")]);
        assert_eq!(diff_channel(&installed, &index), vec!["libfoo".to_string()]);
    }

    #[test]
    fn index_paths_follow_apt_list_naming() {
        let [security, updates] = index_paths(
            Path::new("/lists"),
            RestrictedChannel::Apps,
            "jammy",
            "amd64",
        );
        assert_eq!(
            security,
            PathBuf::from(
                "/lists/esm.ubuntu.com_apps_ubuntu_dists_jammy-apps-security_main_binary-amd64_Packages"
            )
        );
        assert_eq!(
            updates,
            PathBuf::from(
                "/lists/esm.ubuntu.com_apps_ubuntu_dists_jammy-apps-updates_main_binary-amd64_Packages"
            )
        );
    }

    #[test]
    fn updates_index_overrides_security_index() {
        let dir = tempfile::tempdir().unwrap();
        let paths = index_paths(dir.path(), RestrictedChannel::Infra, "xenial", "amd64");
        fs::write(&paths[0], "Package: pkg\nVersion: 1.5\n").unwrap();
        fs::write(&paths[1], "Package: pkg\nVersion: 1.2\n").unwrap();

        let index = load_restricted_index(&paths).unwrap();
        assert_eq!(index["pkg"].version, "1.2");

        let installed = vec![record("pkg", "1.3", "install ok installed")];
        assert!(diff_channel(&installed, &index).is_empty());
    }

    #[test]
    fn end_to_end_with_missing_channel() {
        let dir = tempfile::tempdir().unwrap();
        let status = dir.path().join("status");
        fs::write(
            &status,
            "Package: openssl\nStatus: install ok installed\nVersion: 1.0.2g-1ubuntu4.20\n\n\
             Package: nginx\nStatus: install ok installed\nVersion: 1.10.3-0ubuntu0.16.04.5\n",
        )
        .unwrap();
        let [infra_security, _] =
            index_paths(dir.path(), RestrictedChannel::Infra, "xenial", "amd64");
        fs::write(
            &infra_security,
            "Package: openssl\nVersion: 1.0.2g-1ubuntu4.20+esm1\nSource: openssl\n",
        )
        .unwrap();

        let updates = find_restricted_updates(&status, dir.path(), "xenial", "amd64").unwrap();
        assert_eq!(updates.infra, vec!["openssl".to_string()]);
        assert!(updates.apps.is_empty());
    }

    #[test]
    fn nothing_provisioned_yields_empty_results() {
        let dir = tempfile::tempdir().unwrap();
        let updates =
            find_restricted_updates(&dir.path().join("status"), dir.path(), "jammy", "arm64")
                .unwrap();
        assert_eq!(updates, RestrictedUpdates::default());
    }
}
