use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::time::sleep;

use srcdoc_preview::console::RELOAD_MARKER;
use srcdoc_preview::{
    build_document, Envelope, HostEvent, LogLevel, PreviewConfig, PreviewError, PreviewHost,
    SourceBundle, SourceField,
};

const DEBOUNCE: Duration = Duration::from_millis(800);

fn host() -> PreviewHost {
    PreviewHost::new(
        PreviewConfig::default().with_debounce(DEBOUNCE),
        SourceBundle::new("<button>Hi</button>", "button{color:red}", ""),
    )
}

fn drain(rx: &mut broadcast::Receiver<HostEvent>) -> Vec<HostEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

fn reloads(events: &[HostEvent]) -> Vec<u64> {
    events
        .iter()
        .filter_map(|e| match e {
            HostEvent::Reload { generation, .. } => Some(*generation),
            _ => None,
        })
        .collect()
}

fn panel_changes(events: &[HostEvent]) -> Vec<bool> {
    events
        .iter()
        .filter_map(|e| match e {
            HostEvent::Panel { visible } => Some(*visible),
            _ => None,
        })
        .collect()
}

fn console(level: &str, args: &[&str]) -> Value {
    json!({ "kind": "console-message", "level": level, "args": args })
}

fn messages(snapshot: &srcdoc_preview::Snapshot) -> Vec<&str> {
    snapshot.entries.iter().map(|e| e.message.as_str()).collect()
}

// ── Render cycle ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn mount_renders_generation_one_immediately() {
    let host = host();
    let mut events = host.subscribe();
    let mounted = host.mount().unwrap();

    let snap = mounted.handle().snapshot().await.unwrap();
    assert_eq!(snap.generation(), 1);
    assert!(!snap.pending);
    assert!(snap.entries.is_empty());

    let session = snap.session.unwrap();
    assert_eq!(session.document, build_document(&snap.bundle));
    assert_eq!(reloads(&drain(&mut events)), [1]);
}

#[tokio::test(start_paused = true)]
async fn burst_of_edits_coalesces_into_one_reload() {
    let host = host();
    let mut events = host.subscribe();
    let mounted = host.mount().unwrap();
    let handle = mounted.handle();

    for i in 0..5 {
        handle
            .edit(SourceField::Css, format!("button{{width:{i}0px}}"))
            .unwrap();
        sleep(Duration::from_millis(100)).await;
    }
    handle.edit(SourceField::Html, "<button>Bye</button>").unwrap();

    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.generation(), 1);
    assert!(snap.pending);

    sleep(DEBOUNCE + Duration::from_millis(1)).await;

    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.generation(), 2);
    assert!(!snap.pending);
    assert_eq!(
        snap.session.as_ref().unwrap().document,
        build_document(&SourceBundle::new(
            "<button>Bye</button>",
            "button{width:40px}",
            ""
        ))
    );

    let events = drain(&mut events);
    assert_eq!(reloads(&events), [1, 2]);
    assert_eq!(messages(&snap), [RELOAD_MARKER]);
}

#[tokio::test(start_paused = true)]
async fn marker_is_appended_before_the_timer_fires() {
    let host = host();
    let mounted = host.mount().unwrap();
    let handle = mounted.handle();

    handle.edit(SourceField::Js, "console.log('x')").unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(messages(&snap), [RELOAD_MARKER]);
    assert_eq!(snap.entries[0].level, LogLevel::Log);
    assert_eq!(snap.generation(), 1);

    sleep(DEBOUNCE - Duration::from_millis(1)).await;
    assert_eq!(handle.snapshot().await.unwrap().generation(), 1);

    sleep(Duration::from_millis(2)).await;
    assert_eq!(handle.snapshot().await.unwrap().generation(), 2);
}

#[tokio::test(start_paused = true)]
async fn every_cycle_gets_exactly_one_marker_ahead_of_its_reload() {
    let host = host();
    let mut events = host.subscribe();
    let mounted = host.mount().unwrap();
    let handle = mounted.handle();
    handle.snapshot().await.unwrap();
    drain(&mut events);

    for cycle in 0..2 {
        handle.edit(SourceField::Js, format!("let a = {cycle};")).unwrap();
        handle.edit(SourceField::Js, format!("let b = {cycle};")).unwrap();
        sleep(DEBOUNCE * 2).await;
    }
    handle.snapshot().await.unwrap();

    let kinds: Vec<String> = drain(&mut events)
        .iter()
        .map(|e| match e {
            HostEvent::Log { entry } => entry.message.clone(),
            HostEvent::Reload { generation, .. } => format!("reload {generation}"),
            other => other.name().to_string(),
        })
        .collect();
    assert_eq!(
        kinds,
        [RELOAD_MARKER, "reload 2", RELOAD_MARKER, "reload 3"]
    );
}

#[tokio::test(start_paused = true)]
async fn unchanged_text_does_not_schedule_a_reload() {
    let host = host();
    let mounted = host.mount().unwrap();
    let handle = mounted.handle();

    handle.edit(SourceField::Html, "<button>Hi</button>").unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert!(!snap.pending);
    assert!(snap.entries.is_empty());
}

#[tokio::test(start_paused = true)]
async fn load_echoes_the_new_bundle() {
    let host = host();
    let mut events = host.subscribe();
    let mounted = host.mount().unwrap();
    let handle = mounted.handle();

    handle.edit(SourceField::Css, "a{}").unwrap();
    handle.load(SourceField::Js, "go()").unwrap();
    handle.snapshot().await.unwrap();

    let sources: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            HostEvent::Source { bundle } => Some(bundle),
            _ => None,
        })
        .collect();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].css, "a{}");
    assert_eq!(sources[0].js, "go()");
}

// ── Message bridge ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn console_arguments_are_space_joined() {
    let host = host();
    let mounted = host.mount().unwrap();
    let handle = mounted.handle();

    for level in ["log", "warn", "error"] {
        handle
            .deliver(Envelope::new(1, console(level, &["a", "1", "true"])))
            .unwrap();
    }

    let snap = handle.snapshot().await.unwrap();
    let got: Vec<_> = snap
        .entries
        .iter()
        .map(|e| (e.level, e.message.as_str()))
        .collect();
    assert_eq!(
        got,
        [
            (LogLevel::Log, "a 1 true"),
            (LogLevel::Warn, "a 1 true"),
            (LogLevel::Error, "a 1 true"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn errors_reveal_the_panel_and_nothing_else_does() {
    let host = host();
    let mut events = host.subscribe();
    let mounted = host.mount().unwrap();
    let handle = mounted.handle();

    handle.deliver(Envelope::new(1, console("log", &["hi"]))).unwrap();
    handle.deliver(Envelope::new(1, console("warn", &["careful"]))).unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert!(!snap.panel_visible);
    assert!(panel_changes(&drain(&mut events)).is_empty());

    handle
        .deliver(Envelope::new(1, console("error", &["Error: boom"])))
        .unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert!(snap.panel_visible);
    assert_eq!(panel_changes(&drain(&mut events)), [true]);

    // Hidden again by the user, then another error re-opens it.
    assert!(!handle.toggle_panel().await.unwrap());
    handle
        .deliver(Envelope::new(1, console("error", &["Uncaught (in promise): nope"])))
        .unwrap();
    assert!(handle.snapshot().await.unwrap().panel_visible);
    assert_eq!(panel_changes(&drain(&mut events)), [false, true]);
}

#[tokio::test(start_paused = true)]
async fn messages_from_superseded_frames_are_dropped() {
    let host = host();
    let mounted = host.mount().unwrap();
    let handle = mounted.handle();

    // Still generation 1 while the reload is pending: accepted after the marker.
    handle.edit(SourceField::Js, "setInterval(tick, 10)").unwrap();
    handle.deliver(Envelope::new(1, console("log", &["tick"]))).unwrap();

    sleep(DEBOUNCE * 2).await;

    // The generation 1 interval keeps posting after the reload.
    handle.deliver(Envelope::new(1, console("log", &["tick"]))).unwrap();
    handle.deliver(Envelope::new(0, console("error", &["stale"]))).unwrap();
    handle.deliver(Envelope::new(2, console("log", &["fresh"]))).unwrap();

    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.generation(), 2);
    assert_eq!(messages(&snap), [RELOAD_MARKER, "tick", "fresh"]);
    assert!(!snap.panel_visible);
}

#[tokio::test(start_paused = true)]
async fn unknown_and_malformed_payloads_are_ignored() {
    let host = host();
    let mut events = host.subscribe();
    let mounted = host.mount().unwrap();
    let handle = mounted.handle();
    handle.snapshot().await.unwrap();
    drain(&mut events);

    let payloads = [
        json!({ "kind": "resize", "height": 20 }),
        json!({ "kind": "console-message", "level": "debug", "args": [] }),
        json!({ "kind": "console-message", "args": ["x"] }),
        json!("hello"),
        Value::Null,
    ];
    for payload in payloads {
        handle.deliver(Envelope::new(1, payload)).unwrap();
    }

    let snap = handle.snapshot().await.unwrap();
    assert!(snap.entries.is_empty());
    assert!(!snap.panel_visible);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn clear_and_toggle_controls() {
    let host = host();
    let mut events = host.subscribe();
    let mounted = host.mount().unwrap();
    let handle = mounted.handle();

    handle.deliver(Envelope::new(1, console("log", &["one"]))).unwrap();
    handle.clear().unwrap();
    assert!(handle.toggle_panel().await.unwrap());
    assert!(!handle.toggle_panel().await.unwrap());

    let snap = handle.snapshot().await.unwrap();
    assert!(snap.entries.is_empty());
    assert!(!snap.panel_visible);

    let events = drain(&mut events);
    assert!(events.contains(&HostEvent::Cleared));
    assert_eq!(panel_changes(&events), [true, false]);
}

// ── Attached pages ────────────────────────────────────────────────────

fn live_messages(rx: &mut broadcast::Receiver<HostEvent>) -> Vec<String> {
    drain(rx)
        .into_iter()
        .filter_map(|e| match e {
            HostEvent::Log { entry } => Some(entry.message),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn attach_splits_history_from_live_events() {
    let host = host();
    let mounted = host.mount().unwrap();
    let handle = mounted.handle();

    handle.deliver(Envelope::new(1, console("log", &["before"]))).unwrap();
    let mut page = handle.attach().await.unwrap();
    handle
        .deliver(Envelope::new(1, console("log", &["after"])).with_client(page.client))
        .unwrap();
    handle.snapshot().await.unwrap();

    assert_eq!(messages(&page.snapshot), ["before"]);
    assert_eq!(live_messages(&mut page.events), ["after"]);
}

#[tokio::test(start_paused = true)]
async fn only_the_latest_page_relays() {
    let host = host();
    let mounted = host.mount().unwrap();
    let handle = mounted.handle();

    let first = handle.attach().await.unwrap();
    let mut second = handle.attach().await.unwrap();
    assert_ne!(first.client, second.client);

    for client in [first.client, second.client] {
        handle
            .deliver(Envelope::new(1, console("error", &["boom"])).with_client(client))
            .unwrap();
    }
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(messages(&snap), ["boom"]);
    assert_eq!(panel_changes(&drain(&mut second.events)), [true]);

    // Closing the relaying page hands the relay back to the earlier one.
    handle.detach(second.client).unwrap();
    handle
        .deliver(Envelope::new(1, console("log", &["kept"])).with_client(first.client))
        .unwrap();
    handle
        .deliver(Envelope::new(1, console("log", &["gone"])).with_client(second.client))
        .unwrap();
    assert_eq!(
        messages(&handle.snapshot().await.unwrap()),
        ["boom", "kept"]
    );
}

#[tokio::test(start_paused = true)]
async fn resync_keeps_the_page_id_and_relay() {
    let host = host();
    let mounted = host.mount().unwrap();
    let handle = mounted.handle();

    let page = handle.attach().await.unwrap();
    handle
        .deliver(Envelope::new(1, console("log", &["one"])).with_client(page.client))
        .unwrap();

    let again = handle.resync(page.client).await.unwrap();
    assert_eq!(again.client, page.client);
    assert_eq!(messages(&again.snapshot), ["one"]);

    handle
        .deliver(Envelope::new(1, console("log", &["two"])).with_client(page.client))
        .unwrap();
    assert_eq!(
        messages(&handle.snapshot().await.unwrap()),
        ["one", "two"]
    );
}

// ── Lifecycle ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn only_one_mount_at_a_time() {
    let host = host();
    let first = host.mount().unwrap();
    assert!(matches!(host.mount(), Err(PreviewError::AlreadyMounted)));

    let stale = first.handle();
    drop(first);
    // The aborted actor has not been dropped yet, so the host is still taken.
    assert!(matches!(host.mount(), Err(PreviewError::AlreadyMounted)));
    tokio::task::yield_now().await;

    assert!(matches!(
        stale.snapshot().await,
        Err(PreviewError::HostStopped)
    ));

    let second = host.mount().unwrap();
    assert_eq!(second.handle().snapshot().await.unwrap().generation(), 1);
}

#[tokio::test(start_paused = true)]
async fn unmount_cancels_a_pending_reload() {
    let host = host();
    let mut events = host.subscribe();
    let mounted = host.mount().unwrap();
    let handle = mounted.handle();

    handle.edit(SourceField::Css, "button{color:blue}").unwrap();
    handle.snapshot().await.unwrap();
    drop(mounted);

    sleep(DEBOUNCE * 2).await;
    assert_eq!(reloads(&drain(&mut events)), [1]);
    assert!(handle.edit(SourceField::Css, "x").is_err());
}
