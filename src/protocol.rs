//! Wire shapes exchanged between the sandbox, the browser host page and the
//! preview host.
//!
//! Sandbox → host page: `{ kind: "console-message", level, args }`, posted with
//! `window.parent.postMessage`. The host page wraps it in an [`Envelope`] that
//! records which render generation the sending frame belonged to and which
//! attached page relayed it. Host → page traffic is a stream of
//! [`HostEvent`]s.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::console::LogEntry;
use crate::document::RenderedDocument;
use crate::source::SourceBundle;

/// Console channel a message was emitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Log,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Log => "log",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// A structured message posted from inside the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BridgeMessage {
    ConsoleMessage { level: LogLevel, args: Vec<String> },
    /// Any kind this host does not know about.
    #[serde(other)]
    Unknown,
}

impl BridgeMessage {
    /// Decode a raw payload. Malformed payloads yield `None` and are only
    /// traced, never surfaced.
    pub fn decode(payload: &Value) -> Option<Self> {
        match BridgeMessage::deserialize(payload) {
            Ok(message) => Some(message),
            Err(err) => {
                tracing::trace!(%err, "dropping malformed bridge payload");
                None
            }
        }
    }
}

/// A sandbox payload as relayed by the host page.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Envelope {
    /// Generation of the frame that posted `payload`; `0` when the sender is
    /// no longer the live frame.
    #[serde(default)]
    pub generation: u64,
    /// Id of the attached page that relayed the payload; `0` if unknown.
    #[serde(default)]
    pub client: u64,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    pub fn new(generation: u64, payload: Value) -> Self {
        Self {
            generation,
            client: 0,
            payload,
        }
    }

    pub fn with_client(mut self, client: u64) -> Self {
        self.client = client;
        self
    }
}

/// Updates pushed from the preview host to the browser host page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HostEvent {
    /// First event on every stream: the id the page tags its relays with.
    /// The page resets its console when it sees this.
    Attached { client: u64 },
    /// Replace the sandboxed frame with a fresh one showing `document`.
    Reload {
        generation: u64,
        document: RenderedDocument,
    },
    Log { entry: LogEntry },
    Cleared,
    Panel { visible: bool },
    /// Current source buffers; sent when a client attaches and after edits
    /// that did not originate from the page itself.
    Source { bundle: SourceBundle },
}

impl HostEvent {
    /// SSE event name for this event.
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::Attached { .. } => "attached",
            HostEvent::Reload { .. } => "reload",
            HostEvent::Log { .. } => "log",
            HostEvent::Cleared => "cleared",
            HostEvent::Panel { .. } => "panel",
            HostEvent::Source { .. } => "source",
        }
    }
}
