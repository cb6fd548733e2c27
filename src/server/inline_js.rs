use crate::console::RELOAD_MARKER;
use crate::document::SANDBOX_POLICY;

use super::util::script_json;

/// Client half of the host: replaces the sandboxed frame on `reload`,
/// relays frame messages to `/bridge`, renders the console feed and posts
/// editor input to `/source`.
pub(super) fn build_inline_js() -> String {
    let marker_json = script_json(&RELOAD_MARKER);

    format!(
        r#"<script>
(function () {{
  var frameWrap = document.getElementById('frame-wrap');
  var consoleEl = document.getElementById('console');
  var list = document.getElementById('console-list');
  var countEl = document.getElementById('console-count');
  var toggleBtn = document.getElementById('console-toggle');
  var statusEl = document.getElementById('status');
  var marker = {marker_json};
  var frame = null;
  var generation = 0;
  var client = 0;
  var total = 0;
  var errors = 0;

  function post(path, body) {{
    var init = {{ method: 'POST' }};
    if (body !== undefined) {{
      init.headers = {{ 'Content-Type': 'application/json' }};
      init.body = JSON.stringify(body);
    }}
    return fetch(path, init).catch(function () {{}});
  }}

  // ── Sandboxed frame ──────────────────────────────────────────────
  function reload(next, html) {{
    if (next === generation) return;
    generation = next;
    var fresh = document.createElement('iframe');
    fresh.setAttribute('sandbox', '{sandbox}');
    fresh.setAttribute('title', 'preview');
    fresh.srcdoc = html;
    if (frame) frame.remove();
    frameWrap.appendChild(fresh);
    frame = fresh;
    statusEl.textContent = 'gen ' + generation;
    statusEl.className = 'badge live';
  }}

  // ── Message bridge ───────────────────────────────────────────────
  window.addEventListener('message', function (event) {{
    var from = frame && event.source === frame.contentWindow ? generation : 0;
    var body;
    try {{
      body = {{ generation: from, client: client, payload: JSON.parse(JSON.stringify(event.data)) }};
    }} catch (e) {{
      return;
    }}
    post('/bridge', body);
  }});

  // ── Console panel ────────────────────────────────────────────────
  function updateCount() {{
    countEl.textContent = total;
    toggleBtn.classList.toggle('has-errors', errors > 0);
  }}

  function resetConsole() {{
    list.innerHTML = '';
    total = 0;
    errors = 0;
    updateCount();
  }}

  function appendEntry(entry) {{
    var li = document.createElement('li');
    var isMarker = entry.level === 'log' && entry.message === marker;
    li.className = isMarker ? 'marker' : entry.level;
    var time = document.createElement('time');
    time.textContent = String(entry.timestamp).slice(11, 19);
    li.appendChild(time);
    li.appendChild(document.createTextNode(entry.message));
    list.appendChild(li);
    list.scrollTop = list.scrollHeight;
    if (isMarker) {{
      statusEl.textContent = 'reloading';
      statusEl.className = 'badge pending';
    }} else {{
      total++;
      if (entry.level === 'error') errors++;
    }}
    updateCount();
  }}

  window.togglePanel = function () {{ post('/console/toggle'); }};
  window.clearConsole = function () {{ post('/console/clear'); }};

  // ── Editors ──────────────────────────────────────────────────────
  document.querySelectorAll('textarea[data-field]').forEach(function (ta) {{
    ta.addEventListener('input', function () {{
      post('/source', {{ field: ta.dataset.field, text: ta.value }});
    }});
  }});

  function applySource(bundle) {{
    ['html', 'css', 'js'].forEach(function (field) {{
      var ta = document.getElementById('editor-' + field);
      if (ta && ta.value !== bundle[field]) ta.value = bundle[field];
    }});
  }}

  // ── Host events ──────────────────────────────────────────────────
  var events = new EventSource('/events');

  function on(name, handler) {{
    events.addEventListener(name, function (e) {{ handler(JSON.parse(e.data)); }});
  }}
  // Opens every replay of the host state.
  on('attached', function (d) {{
    client = d.client;
    resetConsole();
  }});
  on('reload', function (d) {{ reload(d.generation, d.document); }});
  on('log', function (d) {{ appendEntry(d.entry); }});
  on('cleared', function () {{ resetConsole(); }});
  on('panel', function (d) {{ consoleEl.classList.toggle('open', d.visible); }});
  on('source', function (d) {{ applySource(d.bundle); }});

  // ── Divider drag-resize ──────────────────────────────────────────
  var divider = document.getElementById('divider');
  var split = divider.parentElement;
  var dragging = false;
  divider.addEventListener('mousedown', function (e) {{
    dragging = true;
    e.preventDefault();
  }});
  document.addEventListener('mousemove', function (e) {{
    if (!dragging) return;
    var rect = split.getBoundingClientRect();
    var frac = (e.clientX - rect.left) / rect.width;
    var clamped = Math.max(0.2, Math.min(0.8, frac));
    split.style.gridTemplateColumns = clamped + 'fr 4px ' + (1 - clamped) + 'fr';
  }});
  document.addEventListener('mouseup', function () {{ dragging = false; }});
}})();
</script>"#,
        marker_json = marker_json,
        sandbox = SANDBOX_POLICY,
    )
}
