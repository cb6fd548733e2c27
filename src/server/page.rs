use crate::renderer::Snapshot;

use super::css::build_css;
use super::inline_js::build_inline_js;
use super::panels::{build_editor_panel, build_preview_panel};
use super::toolbar::build_toolbar;
use super::util::html_escape;
use super::PageInfo;

pub(super) fn build_host_page(info: &PageInfo, snapshot: &Snapshot) -> String {
    let css = build_css();
    let toolbar = build_toolbar(info);
    let editor_panel = build_editor_panel(&snapshot.bundle);
    let preview_panel = build_preview_panel(snapshot.panel_visible);
    let inline_js = build_inline_js();

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Preview | {project}</title>
<style>
  {css}
</style>
</head>
<body>
{toolbar}
<div class="split">
  <div class="panel">
    <div class="panel-label">source</div>
    {editor_panel}
  </div>
  <div class="divider" id="divider"></div>
  <div class="panel">
    {preview_panel}
  </div>
</div>
{inline_js}
</body>
</html>"##,
        project = html_escape(&info.project),
        css = css,
        toolbar = toolbar,
        editor_panel = editor_panel,
        preview_panel = preview_panel,
        inline_js = inline_js,
    )
}
