/*============================================================
  Synavera Project: Pro-Hook
  Module: prohook_core::session
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Drive the apt JSON hook protocol (version 0.2) over the
    socket handed to us: hello handshake, one payload message,
    and the closing bye.

  Security / Safety Notes:
    Writes exactly one response (the hello reply) to the apt
    socket. Any framing or decode failure closes the session;
    a corrupted exchange is never resumed.

  Dependencies:
    serde / serde_json for message decoding and the reply.

  Operational Scope:
    Owned by the binary entry point for the lifetime of one
    hook invocation.

  Revision History:
    2025-11-12 COD  Authored line-delimited JSON-RPC session.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit state machine with no hidden transitions
    - Result-first error handling, no retries
============================================================*/

use std::fmt;
use std::io::{BufRead, BufReader, Read, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HookError, Result};

pub const METHOD_HELLO: &str = "org.debian.apt.hooks.hello";
pub const METHOD_STATISTICS: &str = "org.debian.apt.hooks.install.statistics";
pub const METHOD_PRE_PROMPT: &str = "org.debian.apt.hooks.install.pre-prompt";
pub const METHOD_BYE: &str = "org.debian.apt.hooks.bye";

/// The only protocol version this hook speaks.
pub const PROTOCOL_VERSION: &str = "0.2";

/// Lifecycle of a hook session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    AwaitingHello,
    AwaitingPayload,
    AwaitingBye,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Unopened => "unopened",
            SessionState::AwaitingHello => "awaiting hello",
            SessionState::AwaitingPayload => "awaiting payload",
            SessionState::AwaitingBye => "awaiting bye",
            SessionState::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// One decoded JSON-RPC message from apt.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub params: Value,
}

#[derive(Serialize)]
struct HelloResponse<'a> {
    jsonrpc: &'a str,
    id: i64,
    result: HelloResult<'a>,
}

#[derive(Serialize)]
struct HelloResult<'a> {
    version: &'a str,
}

/// Line-delimited JSON-RPC session over a duplex byte stream.
pub struct Session<S: Read + Write> {
    reader: BufReader<S>,
    state: SessionState,
}

impl<S: Read + Write> Session<S> {
    /// Attach a stream; the session then waits for apt's hello.
    pub fn new(stream: S) -> Self {
        let mut session = Self {
            reader: BufReader::new(stream),
            state: SessionState::Unopened,
        };
        session.state = SessionState::AwaitingHello;
        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Bytes already pulled from the stream but not consumed by a message.
    pub fn buffered(&self) -> &[u8] {
        self.reader.buffer()
    }

    /// Read hello, check the advertised versions, and answer with ours.
    pub fn handshake(&mut self) -> Result<()> {
        self.expect_state("handshake", SessionState::AwaitingHello)?;
        let outcome = self.read_message().and_then(|hello| {
            require_method(&hello, METHOD_HELLO)?;
            require_supported_version(&hello)?;
            self.write_hello_response(hello.id.unwrap_or(0))
        });
        self.advance(outcome, SessionState::AwaitingPayload)
    }

    /// Read the single hook payload, whatever its method.
    pub fn read_payload(&mut self) -> Result<Message> {
        self.expect_state("read_payload", SessionState::AwaitingPayload)?;
        let outcome = self.read_message();
        self.advance(outcome, SessionState::AwaitingBye)
    }

    /// Read apt's closing bye.
    pub fn terminate(&mut self) -> Result<()> {
        self.expect_state("terminate", SessionState::AwaitingBye)?;
        let outcome = self
            .read_message()
            .and_then(|bye| require_method(&bye, METHOD_BYE));
        self.advance(outcome, SessionState::Closed)
    }

    /// Read one JSON line followed by its mandatory empty separator line.
    pub fn read_message(&mut self) -> Result<Message> {
        let mut line = Vec::new();
        self.reader
            .read_until(b'\n', &mut line)
            .map_err(|err| HookError::Framing(format!("failed to read message line: {err}")))?;

        let message: Message =
            serde_json::from_slice(&line).map_err(|source| HookError::Decode {
                context: "malformed hook message".into(),
                source,
            })?;

        let mut separator = Vec::new();
        let read = self
            .reader
            .read_until(b'\n', &mut separator)
            .map_err(|err| HookError::Framing(format!("failed to read separator line: {err}")))?;
        if read == 0 {
            return Err(HookError::Framing(
                "stream closed before the empty separator line".into(),
            ));
        }
        let separator = trim_line_ending(&separator);
        if !separator.is_empty() {
            return Err(HookError::Framing(format!(
                "expected empty separator line, found {:?}",
                String::from_utf8_lossy(separator)
            )));
        }

        Ok(message)
    }

    fn write_hello_response(&mut self, id: i64) -> Result<()> {
        let response = HelloResponse {
            jsonrpc: "2.0",
            id,
            result: HelloResult {
                version: PROTOCOL_VERSION,
            },
        };
        let mut payload = serde_json::to_vec(&response).map_err(|source| HookError::Decode {
            context: "encoding hello response".into(),
            source,
        })?;
        payload.extend_from_slice(b"\n\n");

        let stream = self.reader.get_mut();
        stream.write_all(&payload)?;
        stream.flush()?;
        Ok(())
    }

    fn expect_state(&mut self, operation: &'static str, expected: SessionState) -> Result<()> {
        if self.state == expected {
            return Ok(());
        }
        let state = self.state;
        self.state = SessionState::Closed;
        Err(HookError::OutOfOrder { operation, state })
    }

    fn advance<T>(&mut self, outcome: Result<T>, next: SessionState) -> Result<T> {
        self.state = if outcome.is_ok() {
            next
        } else {
            SessionState::Closed
        };
        outcome
    }
}

fn require_method(message: &Message, expected: &str) -> Result<()> {
    if message.method == expected {
        Ok(())
    } else {
        Err(HookError::ProtocolViolation {
            expected: expected.to_string(),
            received: message.method.clone(),
        })
    }
}

/// A hello that lists its versions must include ours; no negotiation beyond that.
fn require_supported_version(hello: &Message) -> Result<()> {
    let Some(versions) = hello.params.get("versions").and_then(Value::as_array) else {
        return Ok(());
    };
    if versions
        .iter()
        .any(|v| v.as_str() == Some(PROTOCOL_VERSION))
    {
        return Ok(());
    }
    let offered: Vec<String> = versions
        .iter()
        .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
        .collect();
    Err(HookError::ProtocolViolation {
        expected: format!("protocol version {PROTOCOL_VERSION}"),
        received: offered.join(", "),
    })
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
