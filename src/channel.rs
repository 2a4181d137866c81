/*============================================================
  Synavera Project: Pro-Hook
  Module: prohook_core::channel
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Adopt the socket apt passes to JSON hooks through the
    APT_HOOK_SOCKET environment variable.

  Security / Safety Notes:
    Verifies the descriptor is open before taking ownership so
    an invalid value cannot alias an unrelated file. Ownership
    closes the descriptor on every exit path.

  Dependencies:
    libc for the fcntl descriptor probe.

  Operational Scope:
    Called once by the entry point before the session starts.

  Revision History:
    2025-11-12 COD  Added socket acquisition.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit validation before unsafe ownership transfer
    - Actionable diagnostics for misconfigured hosts
============================================================*/

use std::env;
use std::os::fd::{FromRawFd, RawFd};
use std::os::unix::net::UnixStream;

use crate::error::{HookError, Result};

/// Environment variable apt sets for JSON hooks.
pub const SOCKET_ENV: &str = "APT_HOOK_SOCKET";

/// Take ownership of the hook socket, preferring an explicit descriptor.
pub fn acquire(fd_override: Option<RawFd>) -> Result<UnixStream> {
    let fd = match fd_override {
        Some(fd) => fd,
        None => parse_descriptor(env::var(SOCKET_ENV).ok().as_deref())?,
    };

    // SAFETY: fcntl(F_GETFD) only queries descriptor flags.
    if unsafe { libc::fcntl(fd, libc::F_GETFD) } == -1 {
        return Err(HookError::Channel(format!(
            "descriptor {fd} is not open: {}",
            std::io::Error::last_os_error()
        )));
    }

    // SAFETY: the descriptor is open and apt hands it to this process exclusively.
    Ok(unsafe { UnixStream::from_raw_fd(fd) })
}

fn parse_descriptor(raw: Option<&str>) -> Result<RawFd> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(HookError::Channel(format!("{SOCKET_ENV} is missing or empty")));
    }
    match raw.parse::<RawFd>() {
        Ok(fd) if fd >= 0 => Ok(fd),
        _ => Err(HookError::Channel(format!(
            "{SOCKET_ENV} must be a non-negative decimal descriptor, found {raw:?}"
        ))),
    }
}
