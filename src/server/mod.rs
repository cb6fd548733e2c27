use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use async_stream::stream;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::PreviewConfig;
use crate::document::SANDBOX_POLICY;
use crate::error::{PreviewError, Result};
use crate::protocol::{Envelope, HostEvent};
use crate::renderer::{Attachment, PreviewHandle, PreviewHost, Snapshot};
use crate::source::{SourceBundle, SourceField};
use crate::watch::{load_bundle, SourceWatcher};

mod css;
mod inline_js;
mod page;
mod panels;
mod toolbar;
pub(crate) mod util;

/// Settings for [`run_dev_server`].
#[derive(Debug, Clone)]
pub struct DevOptions {
    /// Project directory holding `index.html`, `style.css` and `script.js`.
    /// Without one the preview starts empty and is edited in the browser only.
    pub dir: Option<PathBuf>,
    pub addr: SocketAddr,
    pub config: PreviewConfig,
}

/// Static facts shown in the host page toolbar.
#[derive(Debug, Clone)]
pub struct PageInfo {
    pub project: String,
    pub debounce_ms: u64,
    pub watching: bool,
}

#[derive(Clone)]
struct AppState {
    handle: PreviewHandle,
    info: Arc<PageInfo>,
    shutdown: watch::Receiver<bool>,
}

/// Start the preview dev server and block until ctrl-c.
pub async fn run_dev_server(opts: DevOptions) -> Result<()> {
    let bundle = match &opts.dir {
        Some(dir) => load_bundle(dir)?,
        None => SourceBundle::default(),
    };
    let host = PreviewHost::new(opts.config, bundle);
    let mounted = host.mount()?;

    // File watcher
    let watcher = match &opts.dir {
        Some(dir) => Some(SourceWatcher::start(dir, mounted.handle())?),
        None => None,
    };

    let info = PageInfo {
        project: opts
            .dir
            .as_ref()
            .and_then(|d| d.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scratch".to_string()),
        debounce_ms: opts.config.debounce_ms(),
        watching: watcher.is_some(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app = router_with_shutdown(mounted.handle(), info, shutdown_rx);

    let listener = tokio::net::TcpListener::bind(opts.addr)
        .await
        .map_err(PreviewError::Bind)?;
    let port = opts.addr.port();
    info!(addr = %opts.addr, "preview dev server listening");
    eprintln!("preview dev server");
    if let Some(dir) = &opts.dir {
        eprintln!("  sources:  {}", dir.display());
    }
    eprintln!("  host:     http://localhost:{port}/");
    eprintln!("  document: http://localhost:{port}/document");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .map_err(PreviewError::Bind)?;

    drop(watcher);
    drop(mounted);
    Ok(())
}

/// Routes for a mounted preview. Event streams stay open until the client
/// disconnects.
pub fn router(handle: PreviewHandle, info: PageInfo) -> Router {
    let (_, shutdown) = watch::channel(false);
    router_with_shutdown(handle, info, shutdown)
}

fn router_with_shutdown(
    handle: PreviewHandle,
    info: PageInfo,
    shutdown: watch::Receiver<bool>,
) -> Router {
    let state = AppState {
        handle,
        info: Arc::new(info),
        shutdown,
    };
    Router::new()
        .route("/", get(serve_host_page))
        .route("/events", get(serve_events))
        .route("/source", post(serve_source))
        .route("/bridge", post(serve_bridge))
        .route("/console/clear", post(serve_clear))
        .route("/console/toggle", post(serve_toggle))
        .route("/state", get(serve_state))
        .route("/document", get(serve_document))
        .with_state(state)
}

impl IntoResponse for PreviewError {
    fn into_response(self) -> Response {
        let status = match self {
            PreviewError::HostStopped => StatusCode::SERVICE_UNAVAILABLE,
            PreviewError::AlreadyMounted => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

// ── Route handlers ────────────────────────────────────────────────────

/// Serve the host UI (editors, sandboxed frame, console).
async fn serve_host_page(State(state): State<AppState>) -> Result<Html<String>> {
    let snapshot = state.handle.snapshot().await?;
    Ok(Html(page::build_host_page(&state.info, &snapshot)))
}

/// Stream host events. Each connection attaches as a page and first replays
/// the state captured at attach time, so a freshly opened page shows the live
/// frame and the existing console feed. A stream that falls behind the
/// broadcast replays the whole state again.
async fn serve_events(State(state): State<AppState>) -> Result<Response> {
    let handle = state.handle.clone();
    let Attachment {
        client,
        snapshot,
        mut events,
    } = handle.attach().await?;
    let detach = Detach {
        handle: handle.clone(),
        client,
    };
    let mut shutdown = state.shutdown.clone();
    let mut pending = replay_events(client, snapshot);

    let stream = stream! {
        let _detach = detach;
        loop {
            for event in pending.drain(..) {
                yield Ok::<Event, Infallible>(sse_event(&event));
            }
            let next = tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => None,
                received = events.recv() => Some(received),
            };
            match next {
                Some(Ok(event)) => pending.push(event),
                Some(Err(RecvError::Lagged(skipped))) => {
                    warn!(client, skipped, "event stream fell behind; replaying state");
                    match handle.resync(client).await {
                        Ok(attachment) => {
                            events = attachment.events;
                            pending = replay_events(client, attachment.snapshot);
                        }
                        Err(_) => break,
                    }
                }
                Some(Err(RecvError::Closed)) | None => break,
            }
        }
    };
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()).into_response())
}

/// Detaches a page when its event stream goes away.
struct Detach {
    handle: PreviewHandle,
    client: u64,
}

impl Drop for Detach {
    fn drop(&mut self) {
        let _ = self.handle.detach(self.client);
    }
}

#[derive(Deserialize)]
struct SourceEdit {
    field: SourceField,
    #[serde(default)]
    text: String,
}

async fn serve_source(
    State(state): State<AppState>,
    Json(edit): Json<SourceEdit>,
) -> Result<StatusCode> {
    state.handle.edit(edit.field, edit.text)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Relay from the host page. Any payload is accepted; the bridge decides
/// what to keep.
async fn serve_bridge(
    State(state): State<AppState>,
    Json(envelope): Json<Envelope>,
) -> Result<StatusCode> {
    state.handle.deliver(envelope)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn serve_clear(State(state): State<AppState>) -> Result<StatusCode> {
    state.handle.clear()?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
struct PanelResponse {
    visible: bool,
}

async fn serve_toggle(State(state): State<AppState>) -> Result<Json<PanelResponse>> {
    let visible = state.handle.toggle_panel().await?;
    Ok(Json(PanelResponse { visible }))
}

async fn serve_state(State(state): State<AppState>) -> Result<Json<Snapshot>> {
    Ok(Json(state.handle.snapshot().await?))
}

/// Serve the live document standalone. It runs on the host origin, so the
/// browser is told to sandbox it with the same policy as the preview frame.
async fn serve_document(State(state): State<AppState>) -> Result<Response> {
    let snapshot = state.handle.snapshot().await?;
    let session = snapshot.session.ok_or(PreviewError::HostStopped)?;
    let policy = format!("sandbox {SANDBOX_POLICY}");
    Ok((
        [(header::CONTENT_SECURITY_POLICY, policy)],
        Html(session.document.to_string()),
    )
        .into_response())
}

// ── Helpers ───────────────────────────────────────────────────────────

fn replay_events(client: u64, snapshot: Snapshot) -> Vec<HostEvent> {
    let mut replay = vec![
        HostEvent::Attached { client },
        HostEvent::Source {
            bundle: snapshot.bundle,
        },
    ];
    if let Some(session) = snapshot.session {
        replay.push(HostEvent::Reload {
            generation: session.generation,
            document: session.document,
        });
    }
    replay.extend(
        snapshot
            .entries
            .into_iter()
            .map(|entry| HostEvent::Log { entry }),
    );
    replay.push(HostEvent::Panel {
        visible: snapshot.panel_visible,
    });
    replay
}

fn sse_event(event: &HostEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(event.name()).data(data)
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone without signalling: nobody will ever shut us down.
            std::future::pending::<()>().await;
        }
    }
}

async fn shutdown_signal(tx: watch::Sender<bool>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
    let _ = tx.send(true);
}
