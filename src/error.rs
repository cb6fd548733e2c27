use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// All errors produced by the preview host and dev server.
///
/// Preview content never produces one of these: broken user markup or script
/// only ever shows up as entries in the console feed.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Reading or writing a source file failed.
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file watcher could not be created or attached.
    #[error("file watcher: {0}")]
    Watch(#[from] notify::Error),
    /// The server socket could not be bound or served.
    #[error("server: {0}")]
    Bind(#[source] io::Error),
    /// The async runtime could not be started.
    #[error("async runtime: {0}")]
    Runtime(#[source] io::Error),
    /// A preview host only accepts one mounted view at a time.
    #[error("preview host is already mounted")]
    AlreadyMounted,
    /// The render actor has gone away (unmounted or panicked).
    #[error("preview host has stopped")]
    HostStopped,
}

pub type Result<T> = std::result::Result<T, PreviewError>;

/// Shorthand constructors.
impl PreviewError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
