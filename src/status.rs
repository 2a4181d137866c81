/*============================================================
  Synavera Project: Pro-Hook
  Module: prohook_core::status
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Parse dpkg status databases and apt `Packages` indexes into
    flat records of name, version, status, and source.

  Security / Safety Notes:
    Read-only access to local package databases; no writes.

  Dependencies:
    None beyond std.

  Operational Scope:
    Supplies the restricted-channel diff with the installed set
    and with the contents of the ESM package indexes.

  Revision History:
    2025-11-12 COD  Crafted stanza parser for dpkg databases.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Structured parsing with clear failure modes
    - Absent optional inputs are empty, not fatal
============================================================*/

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::{HookError, Result};

/// One stanza of a dpkg status file or apt package index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRecord {
    pub name: String,
    pub version: String,
    pub status: String,
    pub source: String,
}

impl StatusRecord {
    /// `Status:` field marks the package as installed on this system.
    pub fn is_installed(&self) -> bool {
        self.status.contains("installed")
    }
}

/// Parse stanzas from `reader`, preserving source order.
pub fn parse_status<R: BufRead>(mut reader: R) -> io::Result<Vec<StatusRecord>> {
    let mut records = Vec::new();
    let mut current: Option<StatusRecord> = None;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let decoded = String::from_utf8_lossy(&buf);
        let line = decoded.trim();

        if let Some(name) = line.strip_prefix("Package:") {
            if let Some(done) = current.take() {
                records.push(done);
            }
            current = Some(StatusRecord {
                name: name.trim().to_string(),
                ..StatusRecord::default()
            });
            continue;
        }

        let Some(record) = current.as_mut() else {
            continue;
        };
        if let Some(value) = line.strip_prefix("Version:") {
            record.version = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("Status:") {
            record.status = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("Source:") {
            record.source = value.trim().to_string();
        }
    }

    if let Some(done) = current.take() {
        records.push(done);
    }
    Ok(records)
}

/// Read and parse `path`; a path that does not exist yields no records.
pub fn read_status_file(path: &Path) -> Result<Vec<StatusRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(HookError::FileRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    parse_status(BufReader::new(file)).map_err(|source| HookError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}
