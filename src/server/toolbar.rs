use super::util::html_escape;
use super::PageInfo;

pub(super) fn build_toolbar(info: &PageInfo) -> String {
    // Badges
    let mut badges = Vec::new();
    badges.push(r#"<span class="label">preview dev</span>"#.to_string());
    badges.push(format!(
        r#"<span class="sep">|</span><span class="project">{}</span>"#,
        html_escape(&info.project)
    ));
    badges.push(format!(
        r#"<span class="badge">debounce {}ms</span>"#,
        info.debounce_ms
    ));
    if info.watching {
        badges.push(r#"<span class="badge">watching</span>"#.to_string());
    }
    badges.push(r#"<span class="badge live" id="status">gen 0</span>"#.to_string());

    // Actions
    let actions = r#"<div class="actions">
  <button id="console-toggle" onclick="togglePanel()" title="Show or hide the console">Console <span id="console-count">0</span></button>
  <a href="/document" target="_blank" title="Open the rendered document">Document</a>
  <a href="/state" target="_blank" title="Host state as JSON">State</a>
</div>"#;

    format!(
        r#"<div class="toolbar">
  {badges}
  {actions}
</div>"#,
        badges = badges.join("\n  "),
        actions = actions,
    )
}
