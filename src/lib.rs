pub mod config;
pub mod console;
pub mod document;
pub mod error;
pub mod protocol;
pub mod renderer;
pub mod server;
pub mod source;
pub mod telemetry;
pub mod watch;

use std::path::Path;

pub use config::PreviewConfig;
pub use console::{LogEntry, LogFeed};
pub use document::{build_document, RenderedDocument};
pub use error::{PreviewError, Result};
pub use protocol::{BridgeMessage, Envelope, HostEvent, LogLevel};
pub use renderer::{Attachment, Mounted, PreviewHandle, PreviewHost, RenderSession, Snapshot};
pub use source::{SourceBundle, SourceField};

/// Build the preview document for a project directory.
pub fn render_dir(dir: &Path) -> Result<RenderedDocument> {
    let bundle = watch::load_bundle(dir)?;
    Ok(build_document(&bundle))
}
