use crate::source::{SourceBundle, SourceField};

use super::util::html_escape;

pub(super) fn build_editor_panel(bundle: &SourceBundle) -> String {
    let mut html = String::from(r#"<div class="editors">"#);
    for field in SourceField::ALL {
        html.push_str(&format!(
            r#"<div class="editor">
  <div class="editor-header">{label}</div>
  <textarea id="editor-{name}" data-field="{name}" spellcheck="false">{text}</textarea>
</div>"#,
            label = field.file_name(),
            name = field.as_str(),
            text = html_escape(bundle.get(field)),
        ));
    }
    html.push_str("</div>");
    html
}

/// Frame container plus the console panel beneath it. The frame itself is
/// created by the inline script on each reload.
pub(super) fn build_preview_panel(panel_visible: bool) -> String {
    let open = if panel_visible { " open" } else { "" };
    format!(
        r#"<div class="frame-wrap" id="frame-wrap"></div>
<div class="console{open}" id="console">
  <div class="console-header">
    <span>console</span>
    <button onclick="clearConsole()" title="Clear console">Clear</button>
  </div>
  <ul class="console-list" id="console-list"></ul>
</div>"#,
    )
}
