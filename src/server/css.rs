pub(super) fn build_css() -> &'static str {
    r#"* { margin: 0; padding: 0; box-sizing: border-box; }
html, body { width: 100%; height: 100%; background: #0A0A0A; color: #A0A0A0;
  font-family: 'JetBrains Mono', monospace; font-size: 12px; }

/* ── Toolbar ─────────────────────────────────────── */
.toolbar {
  height: 36px; display: flex; align-items: center; padding: 0 14px;
  border-bottom: 1px solid #2A2A2A; font-size: 11px; gap: 10px;
  background: #0A0A0A; user-select: none;
}
.toolbar .label { color: #666; }
.toolbar .project { color: #D4AF37; font-weight: 600; }
.toolbar .badge {
  color: #A0A0A0; background: #1F1F1F; padding: 2px 8px;
  border-radius: 3px; font-size: 10px;
}
.toolbar .badge.live { color: #22C55E; }
.toolbar .badge.pending { color: #F59E0B; }
.toolbar .sep { color: #333; }
.toolbar .actions { margin-left: auto; display: flex; gap: 6px; }
.toolbar .actions button, .toolbar .actions a {
  background: #1F1F1F; border: 1px solid #2A2A2A; color: #A0A0A0;
  padding: 3px 10px; border-radius: 3px; font-size: 10px; cursor: pointer;
  font-family: inherit; text-decoration: none; display: inline-flex;
  align-items: center;
}
.toolbar .actions button:hover, .toolbar .actions a:hover {
  color: #FFF; border-color: #444;
}
.toolbar .actions button.has-errors { color: #EF4444; border-color: #3F1818; }

/* ── Split view ──────────────────────────────────── */
.split {
  display: grid; grid-template-columns: 1fr 4px 1fr;
  height: calc(100vh - 36px);
}
.panel { position: relative; overflow: hidden; display: flex; flex-direction: column; }
.panel-label {
  position: absolute; top: 8px; left: 12px; font-size: 10px; color: #444;
  z-index: 10; text-transform: uppercase; letter-spacing: 1px;
}
.divider { background: #2A2A2A; cursor: col-resize; position: relative; }
.divider:hover { background: #444; }

/* ── Editors ─────────────────────────────────────── */
.editors { display: grid; grid-template-rows: 1fr 1fr 1fr; height: 100%; }
.editor { display: flex; flex-direction: column; border-bottom: 1px solid #2A2A2A; }
.editor-header {
  height: 26px; display: flex; align-items: center; padding: 0 12px;
  font-size: 10px; color: #666; text-transform: uppercase; letter-spacing: 1px;
  background: #111;
}
.editor textarea {
  flex: 1; width: 100%; resize: none; border: none; outline: none;
  background: #0E0E0E; color: #D0D0D0; padding: 10px 12px;
  font-family: inherit; font-size: 12px; line-height: 1.6; tab-size: 2;
}

/* ── Preview ─────────────────────────────────────── */
.frame-wrap { flex: 1; position: relative; background: #141414; }
.frame-wrap iframe { width: 100%; height: 100%; border: none; display: block; }

/* ── Console ─────────────────────────────────────── */
.console { display: none; height: 38%; border-top: 1px solid #2A2A2A; flex-direction: column; }
.console.open { display: flex; }
.console-header {
  height: 26px; display: flex; align-items: center; gap: 8px; padding: 0 12px;
  font-size: 10px; color: #666; text-transform: uppercase; letter-spacing: 1px;
  background: #111;
}
.console-header button {
  margin-left: auto; background: none; border: 1px solid #2A2A2A; color: #888;
  font-family: inherit; font-size: 10px; padding: 1px 8px; border-radius: 3px;
  cursor: pointer;
}
.console-list { flex: 1; overflow-y: auto; list-style: none; padding: 4px 0; }
.console-list li {
  padding: 3px 12px; border-bottom: 1px solid #151515;
  white-space: pre-wrap; word-break: break-word; font-size: 11px;
}
.console-list li.log { color: #A0A0A0; }
.console-list li.warn { color: #F59E0B; background: rgba(245,158,11,0.05); }
.console-list li.error { color: #EF4444; background: rgba(239,68,68,0.06); }
.console-list li.marker { color: #555; text-align: center; }
.console-list li time { color: #444; margin-right: 8px; }"#
}
