//! Preview document builder: turns a [`SourceBundle`] into a standalone HTML
//! document with the console bridge bootstrap injected ahead of user script.
//!
//! The builder is plain string templating. It never validates or repairs the
//! user's markup, styles or script; whatever goes wrong surfaces later inside
//! the sandbox and comes back through the message protocol.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::source::SourceBundle;

/// `sandbox` attribute for the frame that shows a [`RenderedDocument`]:
/// scripts run, but the frame gets an opaque origin and cannot navigate the
/// top-level context or open pop-ups.
pub const SANDBOX_POLICY: &str = "allow-scripts";

/// Rules applied before the user's CSS: centre the content on a dark,
/// non-scrolling canvas.
pub const BASELINE_CSS: &str = "\
* { box-sizing: border-box; }
html, body { margin: 0; width: 100%; height: 100%; }
body {
  display: flex; align-items: center; justify-content: center;
  background: transparent; color-scheme: dark; overflow: hidden;
}";

/// Forwards `console.log/warn/error`, uncaught errors and unhandled
/// rejections to the parent frame as `console-message` payloads.
pub const CONSOLE_BOOTSTRAP: &str = r#"(function () {
  function stringify(value) {
    if (typeof value === 'string') return value;
    if (value !== null && typeof value === 'object') {
      try { return JSON.stringify(value); } catch (e) { return String(value); }
    }
    return String(value);
  }
  function send(level, args) {
    var parts = [];
    for (var i = 0; i < args.length; i++) parts.push(stringify(args[i]));
    try {
      window.parent.postMessage({ kind: 'console-message', level: level, args: parts }, '*');
    } catch (e) {}
  }
  ['log', 'warn', 'error'].forEach(function (level) {
    var original = console[level];
    console[level] = function () {
      original.apply(console, arguments);
      send(level, Array.prototype.slice.call(arguments));
    };
  });
  window.onerror = function (message) {
    send('error', ['Error: ' + message]);
    return false;
  };
  window.addEventListener('unhandledrejection', function (event) {
    send('error', ['Uncaught (in promise): ' + event.reason]);
  });
})();"#;

/// A fully assembled preview document. Cheap to clone; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderedDocument(Arc<str>);

impl RenderedDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RenderedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RenderedDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the standalone preview document for `bundle`.
pub fn build_document(bundle: &SourceBundle) -> RenderedDocument {
    let capacity = 512
        + BASELINE_CSS.len()
        + CONSOLE_BOOTSTRAP.len()
        + bundle.html.len()
        + bundle.css.len()
        + bundle.js.len();
    let mut out = String::with_capacity(capacity);

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");

    // Baseline rules, then the user's.
    out.push_str("<style>\n");
    out.push_str(BASELINE_CSS);
    out.push('\n');
    out.push_str(&bundle.css);
    out.push_str("\n</style>\n");

    // Must run before every user script, inline ones in the markup included.
    out.push_str("<script>\n");
    out.push_str(CONSOLE_BOOTSTRAP);
    out.push_str("\n</script>\n</head>\n<body>\n");

    out.push_str(&bundle.html);
    out.push('\n');

    out.push_str("<script>\n");
    out.push_str(&bundle.js);
    out.push_str("\n</script>\n</body>\n</html>\n");

    RenderedDocument(out.into())
}
