//! File-backed sources: load a project directory into a [`SourceBundle`] and
//! push later changes on disk into a mounted preview.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::error::{PreviewError, Result};
use crate::renderer::PreviewHandle;
use crate::source::{SourceBundle, SourceField};

/// Read `index.html`, `style.css` and `script.js` from `dir`. Missing files
/// leave their buffer empty.
pub fn load_bundle(dir: &Path) -> Result<SourceBundle> {
    let mut bundle = SourceBundle::default();
    for field in SourceField::ALL {
        let path = dir.join(field.file_name());
        match fs::read_to_string(&path) {
            Ok(text) => {
                bundle.set(field, text);
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(PreviewError::io(path, err)),
        }
    }
    Ok(bundle)
}

/// Keeps a notify watcher on a project directory alive. Dropping it stops
/// watching.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
}

impl SourceWatcher {
    pub fn start(dir: &Path, handle: PreviewHandle) -> Result<Self> {
        if !dir.is_dir() {
            return Err(PreviewError::io(
                dir,
                std::io::Error::new(ErrorKind::NotFound, "not a directory"),
            ));
        }

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event.kind.is_modify() || event.kind.is_create() {
                    for path in &event.paths {
                        sync_path(path, &handle);
                    }
                }
            }
            Err(err) => warn!(%err, "file watcher error"),
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        info!(dir = %dir.display(), "watching sources");

        Ok(Self { _watcher: watcher })
    }
}

/// Push the contents of `path` into the preview if it names a source file.
pub(crate) fn sync_path(path: &Path, handle: &PreviewHandle) {
    let Some(field) = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(SourceField::from_file_name)
    else {
        return;
    };
    match fs::read_to_string(path) {
        Ok(text) => {
            if let Err(err) = handle.load(field, text) {
                debug!(%err, "preview gone, ignoring change");
            }
        }
        Err(err) => warn!(path = %path.display(), %err, "cannot read changed source"),
    }
}
