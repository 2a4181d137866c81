/*============================================================
  Synavera Project: Pro-Hook
  Module: prohook_core::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise Pro-Hook error types so every failure in a hook
    invocation carries its context and maps to a stable exit.

  Security / Safety Notes:
    Error contexts expose method names and file paths only;
    payload bodies are never echoed into diagnostics.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate fatal hook failures to the
    binary entry point, which logs them and exits.

  Revision History:
    2025-11-12 COD  Established hook error taxonomy.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for operational tooling
============================================================*/

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use thiserror::Error;

use crate::session::SessionState;

/// Result alias for Pro-Hook operations.
pub type Result<T> = std::result::Result<T, HookError>;

/// Enumerates high-level error domains surfaced by Pro-Hook.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Framing: {0}")]
    Framing(String),
    #[error("Decode: {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Protocol violation: expected `{expected}`, received `{received}`")]
    ProtocolViolation { expected: String, received: String },
    #[error("Session: `{operation}` is not permitted while {state}")]
    OutOfOrder {
        operation: &'static str,
        state: SessionState,
    },
    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Channel: {0}")]
    Channel(String),
    #[error("Required command `{command}` not found in PATH")]
    CommandMissing { command: String },
    #[error("Command `{command}` failed with status {status}: {stderr}")]
    CommandFailure {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl HookError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            HookError::Framing(_) => ExitCode::from(30),
            HookError::Decode { .. } => ExitCode::from(31),
            HookError::ProtocolViolation { .. } => ExitCode::from(32),
            HookError::OutOfOrder { .. } => ExitCode::from(33),
            HookError::Channel(_) => ExitCode::from(34),
            HookError::CommandMissing { .. } => ExitCode::from(10),
            HookError::CommandFailure { .. } => ExitCode::from(11),
            HookError::Config(_) => ExitCode::from(20),
            HookError::FileRead { .. } => ExitCode::from(40),
            HookError::Filesystem(_) => ExitCode::from(41),
            HookError::Io(_) => ExitCode::from(42),
        }
    }

    /// Whether the failure happened on the hook socket rather than on disk.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            HookError::Framing(_)
                | HookError::Decode { .. }
                | HookError::ProtocolViolation { .. }
                | HookError::OutOfOrder { .. }
        )
    }
}
