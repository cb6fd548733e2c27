//! Sandboxed renderer and message bridge.
//!
//! A mounted [`PreviewHost`] runs one actor task that owns the source
//! buffers, the console feed and the debounce timer. Everything else talks to
//! it through a [`PreviewHandle`]; everything it produces goes out as
//! [`HostEvent`]s on a broadcast channel.
//!
//! ```text
//!   Idle ──edit──▶ Pending ──deadline──▶ render ──▶ Idle
//!                  │    ▲
//!                  └edit┘ (deadline re-armed)
//! ```
//!
//! The reload marker is appended on the Idle → Pending edge, before the
//! deadline is armed. Rendering bumps the generation and hands the new
//! document out without waiting for the sandbox to load it. Bridge messages
//! from any generation other than the live one are dropped.
//!
//! Pages [`attach`](PreviewHandle::attach) to get a snapshot and a live event
//! receiver taken in the same actor step. Only the most recently attached
//! page relays sandbox messages; the others are display-only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

use crate::config::PreviewConfig;
use crate::console::{LogEntry, LogFeed};
use crate::document::{build_document, RenderedDocument};
use crate::error::{PreviewError, Result};
use crate::protocol::{BridgeMessage, Envelope, HostEvent};
use crate::source::{SourceBundle, SourceField};

const EVENT_CAPACITY: usize = 256;

/// One sandboxed surface instance. A new session replaces the previous one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSession {
    pub generation: u64,
    pub document: RenderedDocument,
}

/// Point-in-time view of a mounted preview.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub bundle: SourceBundle,
    pub session: Option<RenderSession>,
    pub entries: Vec<LogEntry>,
    pub panel_visible: bool,
    /// A reload is scheduled but has not happened yet.
    pub pending: bool,
}

impl Snapshot {
    pub fn generation(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderState {
    Idle,
    Pending { deadline: Instant },
}

/// A page attached to the preview: its relay id, the state at the moment it
/// attached and every event published after that moment.
pub struct Attachment {
    pub client: u64,
    pub snapshot: Snapshot,
    pub events: broadcast::Receiver<HostEvent>,
}

enum Command {
    Edit {
        field: SourceField,
        text: String,
        echo: bool,
    },
    Deliver(Envelope),
    Clear,
    TogglePanel(oneshot::Sender<bool>),
    Snapshot(oneshot::Sender<Snapshot>),
    Attach {
        rejoin: Option<u64>,
        reply: oneshot::Sender<Attachment>,
    },
    Detach(u64),
}

/// Owner of a preview's configuration and outbound event channel.
pub struct PreviewHost {
    config: PreviewConfig,
    initial: SourceBundle,
    mounted: Arc<AtomicBool>,
    events: broadcast::Sender<HostEvent>,
}

impl PreviewHost {
    pub fn new(config: PreviewConfig, initial: SourceBundle) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            initial,
            mounted: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }

    /// Start the render actor. The initial bundle is rendered straight away
    /// as generation 1. Must be called inside a tokio runtime.
    ///
    /// Only one mount may be alive at a time; dropping the returned guard
    /// stops the actor and frees the host for another mount.
    pub fn mount(&self) -> Result<Mounted> {
        if self.mounted.swap(true, Ordering::AcqRel) {
            return Err(PreviewError::AlreadyMounted);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let actor = Actor {
            config: self.config,
            bundle: self.initial.clone(),
            feed: LogFeed::new(self.config.max_log_entries),
            session: None,
            state: RenderState::Idle,
            clients: Vec::new(),
            next_client: 0,
            commands: rx,
            events: self.events.clone(),
            _flag: MountFlag(Arc::clone(&self.mounted)),
        };
        let task = tokio::spawn(actor.run());
        debug!(debounce_ms = self.config.debounce_ms(), "preview mounted");

        Ok(Mounted {
            handle: PreviewHandle {
                commands: tx,
                events: self.events.clone(),
            },
            task,
        })
    }
}

/// Guard for a running render actor. Dropping it aborts the actor, which
/// releases the debounce timer and the bridge listener together. The host
/// accepts a new mount once the aborted actor has actually been dropped.
pub struct Mounted {
    handle: PreviewHandle,
    task: JoinHandle<()>,
}

impl Mounted {
    pub fn handle(&self) -> PreviewHandle {
        self.handle.clone()
    }
}

impl Drop for Mounted {
    fn drop(&mut self) {
        self.task.abort();
        debug!("preview unmounted");
    }
}

/// Owned by the actor; frees the host for another mount when the actor is
/// dropped, whether it returned or was aborted.
struct MountFlag(Arc<AtomicBool>);

impl Drop for MountFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Cheap, cloneable access to a mounted preview.
#[derive(Clone)]
pub struct PreviewHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<HostEvent>,
}

impl PreviewHandle {
    /// An edit typed into the host page. Not echoed back as a `source` event.
    pub fn edit(&self, field: SourceField, text: impl Into<String>) -> Result<()> {
        self.send(Command::Edit {
            field,
            text: text.into(),
            echo: false,
        })
    }

    /// An edit from outside the page (file watcher); the new buffers are
    /// broadcast so attached editors catch up.
    pub fn load(&self, field: SourceField, text: impl Into<String>) -> Result<()> {
        self.send(Command::Edit {
            field,
            text: text.into(),
            echo: true,
        })
    }

    /// Hand a relayed sandbox message to the bridge.
    pub fn deliver(&self, envelope: Envelope) -> Result<()> {
        self.send(Command::Deliver(envelope))
    }

    pub fn clear(&self) -> Result<()> {
        self.send(Command::Clear)
    }

    /// Flip console panel visibility, returning the new state.
    pub async fn toggle_panel(&self) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::TogglePanel(tx))?;
        rx.await.map_err(|_| PreviewError::HostStopped)
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| PreviewError::HostStopped)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }

    /// Register a page. It becomes the relay until another page attaches.
    pub async fn attach(&self) -> Result<Attachment> {
        self.request_attach(None).await
    }

    /// Take a fresh snapshot and receiver for an already attached page,
    /// keeping its id and relay position.
    pub async fn resync(&self, client: u64) -> Result<Attachment> {
        self.request_attach(Some(client)).await
    }

    /// Forget a page. The previously attached page, if any, relays again.
    pub fn detach(&self, client: u64) -> Result<()> {
        self.send(Command::Detach(client))
    }

    async fn request_attach(&self, rejoin: Option<u64>) -> Result<Attachment> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Attach { rejoin, reply: tx })?;
        rx.await.map_err(|_| PreviewError::HostStopped)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PreviewError::HostStopped)
    }
}

struct Actor {
    config: PreviewConfig,
    bundle: SourceBundle,
    feed: LogFeed,
    session: Option<RenderSession>,
    state: RenderState,
    /// Attached pages, oldest first. The last one is the relay.
    clients: Vec<u64>,
    next_client: u64,
    commands: mpsc::UnboundedReceiver<Command>,
    events: broadcast::Sender<HostEvent>,
    _flag: MountFlag,
}

impl Actor {
    async fn run(mut self) {
        self.render();

        loop {
            let deadline = match self.state {
                RenderState::Pending { deadline } => Some(deadline),
                RenderState::Idle => None,
            };

            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = wait_for(deadline) => self.render(),
            }
        }

        debug!("preview actor stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Edit { field, text, echo } => self.edit(field, text, echo),
            Command::Deliver(envelope) => self.deliver(envelope),
            Command::Clear => {
                self.feed.clear();
                self.publish(HostEvent::Cleared);
            }
            Command::TogglePanel(reply) => {
                let visible = self.feed.toggle_panel();
                self.publish(HostEvent::Panel { visible });
                let _ = reply.send(visible);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Attach { rejoin, reply } => {
                let _ = reply.send(self.attach(rejoin));
            }
            Command::Detach(client) => {
                self.clients.retain(|&c| c != client);
                debug!(client, relay = ?self.clients.last(), "client detached");
            }
        }
    }

    fn attach(&mut self, rejoin: Option<u64>) -> Attachment {
        let client = match rejoin {
            Some(client) => {
                if !self.clients.contains(&client) {
                    self.clients.insert(0, client);
                }
                client
            }
            None => {
                self.next_client += 1;
                self.clients.push(self.next_client);
                debug!(client = self.next_client, "client attached");
                self.next_client
            }
        };
        Attachment {
            client,
            snapshot: self.snapshot(),
            events: self.events.subscribe(),
        }
    }

    fn edit(&mut self, field: SourceField, text: String, echo: bool) {
        if !self.bundle.set(field, text) {
            return;
        }
        if echo {
            self.publish(HostEvent::Source {
                bundle: self.bundle.clone(),
            });
        }

        if self.state == RenderState::Idle {
            let marker = self.feed.push_marker();
            self.publish(HostEvent::Log { entry: marker });
            debug!(%field, "reload pending");
        } else {
            trace!(%field, "debounce re-armed");
        }
        self.state = RenderState::Pending {
            deadline: Instant::now() + self.config.debounce,
        };
    }

    fn render(&mut self) {
        let generation = self.generation() + 1;
        let document = build_document(&self.bundle);
        debug!(generation, bytes = document.len(), "reloading preview");

        self.publish(HostEvent::Reload {
            generation,
            document: document.clone(),
        });
        self.session = Some(RenderSession {
            generation,
            document,
        });
        self.state = RenderState::Idle;
    }

    fn deliver(&mut self, envelope: Envelope) {
        let live = self.generation();
        if envelope.generation != live {
            trace!(
                from = envelope.generation,
                live,
                "dropping message from superseded frame"
            );
            return;
        }
        if let Some(&relay) = self.clients.last() {
            if envelope.client != relay {
                trace!(from = envelope.client, relay, "dropping message from non-relay page");
                return;
            }
        }
        let Some(message) = BridgeMessage::decode(&envelope.payload) else {
            return;
        };

        let receipt = self.feed.receive(message);
        if let Some(entry) = receipt.appended {
            self.publish(HostEvent::Log { entry });
        }
        if receipt.revealed {
            self.publish(HostEvent::Panel { visible: true });
        }
    }

    fn generation(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.generation)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            bundle: self.bundle.clone(),
            session: self.session.clone(),
            entries: self.feed.entries().cloned().collect(),
            panel_visible: self.feed.is_panel_visible(),
            pending: matches!(self.state, RenderState::Pending { .. }),
        }
    }

    fn publish(&self, event: HostEvent) {
        // Err only means nobody is subscribed.
        let _ = self.events.send(event);
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
