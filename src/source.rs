//! The user-edited source buffers that define preview content.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the three independent text buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceField {
    Html,
    Css,
    Js,
}

impl SourceField {
    pub const ALL: [SourceField; 3] = [SourceField::Html, SourceField::Css, SourceField::Js];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceField::Html => "html",
            SourceField::Css => "css",
            SourceField::Js => "js",
        }
    }

    /// File name used for this buffer inside a project directory.
    pub fn file_name(self) -> &'static str {
        match self {
            SourceField::Html => "index.html",
            SourceField::Css => "style.css",
            SourceField::Js => "script.js",
        }
    }

    /// Reverse of [`SourceField::file_name`].
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.file_name() == name)
    }
}

impl fmt::Display for SourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(SourceField::Html),
            "css" => Ok(SourceField::Css),
            "js" => Ok(SourceField::Js),
            other => Err(format!("unknown source field: {other}")),
        }
    }
}

/// Markup, styles and script for one preview. Every field is always defined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceBundle {
    pub html: String,
    pub css: String,
    pub js: String,
}

impl SourceBundle {
    pub fn new(html: impl Into<String>, css: impl Into<String>, js: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            css: css.into(),
            js: js.into(),
        }
    }

    pub fn get(&self, field: SourceField) -> &str {
        match field {
            SourceField::Html => &self.html,
            SourceField::Css => &self.css,
            SourceField::Js => &self.js,
        }
    }

    /// Replace one buffer. Returns `false` when the text is unchanged.
    pub fn set(&mut self, field: SourceField, text: String) -> bool {
        let slot = match field {
            SourceField::Html => &mut self.html,
            SourceField::Css => &mut self.css,
            SourceField::Js => &mut self.js,
        };
        if *slot == text {
            return false;
        }
        *slot = text;
        true
    }
}
