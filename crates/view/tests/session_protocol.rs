#![forbid(unsafe_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use kindlens_core::protocol::{decode_intent, HostEvent, Intent};
use kindlens_core::Cell;
use kindlens_host::{DocumentOpener, Host, HostConfig, MockCatalog};
use kindlens_view::{channel, Phase, ViewConfig, ViewSession};
use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedReceiver};

const KEY: &str = "example.com/v1/Widget";

fn widget_crd() -> serde_json::Value {
    json!({"spec": {
        "group": "example.com", "scope": "Namespaced",
        "names": {"kind": "Widget", "plural": "widgets"},
        "versions": [{"name": "v1", "served": true, "storage": true,
            "additionalPrinterColumns": [{"name": "Size", "jsonPath": ".spec.size"}],
            "schema": {"openAPIV3Schema": {"type": "object", "properties": {
                "spec": {"type": "object", "required": ["size"], "properties": {
                    "size": {"type": "integer", "description": "How big."},
                    "ports": {"type": "array", "items": {"type": "object", "properties": {
                        "name": {"type": "string"}, "port": {"type": "integer"}
                    }}}
                }},
                "status": {"type": "object", "properties": {"phase": {"type": "string"}}}
            }}}}]
    }})
}

fn widget(name: &str, ns: &str, size: i64) -> serde_json::Value {
    json!({"metadata": {"name": name, "namespace": ns}, "spec": {"size": size}})
}

#[derive(Default)]
struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl DocumentOpener for RecordingOpener {
    fn open(&self, text: &str, _language: &str) -> anyhow::Result<()> {
        self.opened.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Apply host messages until `done` holds.
async fn settle(s: &mut ViewSession, rx: &mut UnboundedReceiver<String>, done: impl Fn(&ViewSession) -> bool) {
    while !done(s) {
        let raw = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("host answered in time")
            .expect("host still running");
        s.handle_message(&raw);
    }
}

fn offline_session() -> (ViewSession, UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ViewSession::new(tx, ViewConfig::default()), rx)
}

fn results(columns: &[&str], rows: Vec<Vec<Cell>>, token: Option<u64>) -> HostEvent {
    HostEvent::Results {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows,
        status: String::new(),
        token,
    }
}

#[tokio::test]
async fn browse_filter_sort_and_open_against_live_host() {
    let opener = Arc::new(RecordingOpener::default());
    let catalog = MockCatalog::new()
        .with_crd(widget_crd())
        .with_namespaces(&["default", "prod"])
        .with_objects(KEY, vec![widget("a", "default", 3), widget("b", "prod", 1), widget("c", "prod", 2)]);
    let host = Host::new(Arc::new(catalog), opener.clone(), HostConfig::default());
    let (view_tx, host_rx, host_tx, mut view_rx) = channel();
    let task = tokio::spawn(host.run(host_rx, host_tx));

    let mut s = ViewSession::new(view_tx, ViewConfig::default());
    s.start();
    settle(&mut s, &mut view_rx, |s| !s.scope_options().is_empty()).await;
    assert_eq!(s.catalog().entries()[0].display_key, KEY);
    assert_eq!(s.scope(), Some("All namespaces"));

    s.select(KEY);
    assert!(s.is_loading());
    settle(&mut s, &mut view_rx, |s| s.has_results()).await;
    assert_eq!(s.phase(), Phase::Populated);

    let tree: Vec<String> = s.tree().lines().into_iter().map(|l| l.name).collect();
    assert_eq!(tree, vec!["spec", "size", "ports", "status", "phase"]);
    let size = &s.tree().lines()[1];
    assert!(size.required);
    assert_eq!(size.type_badge, "integer");
    s.toggle_node(&[0, 1]);
    let ports: Vec<String> = s.tree().lines().into_iter().skip(3).take(2).map(|l| l.name).collect();
    assert_eq!(ports, vec!["name", "port"]);
    assert!(s.raw_text().contains("ports:"));

    assert_eq!(s.table().state().columns(), &["Namespace", "Name", "Size", "Age"]);
    assert_eq!(s.status_line(), "3 widgets in All namespaces | Showing 3 of 3");
    s.click_header(2);
    let names: Vec<&str> = s.table().body().iter().map(|r| r.cells[1].as_str()).collect();
    assert_eq!(names, vec!["b", "c", "a"]);
    s.edit_filter(0, "PROD");
    assert_eq!(s.table().body().len(), 2);

    // row 1 is now "c" in prod
    assert!(s.trigger_row_action(1, 0));
    s.open_schema();
    s.set_scope("default");
    settle(&mut s, &mut view_rx, |s| s.has_results()).await;
    assert_eq!(s.table().body().len(), 1);
    assert!(!s.table().state().has_active_filters());
    assert!(s.status_line().starts_with("1 widgets in default"));

    {
        let opened = opener.opened.lock().unwrap();
        assert_eq!(opened.len(), 2);
        assert!(opened[0].contains("name: c"));
        assert!(opened[1].contains("ports:"));
    }

    drop(s);
    task.await.unwrap();
}

#[tokio::test]
async fn unknown_kind_reports_error_and_stays_interactive() {
    let host = Host::new(
        Arc::new(MockCatalog::new().with_crd(widget_crd())),
        Arc::new(RecordingOpener::default()),
        HostConfig::default(),
    );
    let (view_tx, host_rx, host_tx, mut view_rx) = channel();
    tokio::spawn(host.run(host_rx, host_tx));
    let mut s = ViewSession::new(view_tx, ViewConfig::default());
    s.start();
    settle(&mut s, &mut view_rx, |s| !s.scope_options().is_empty()).await;

    s.select("nope.io/v1/Gone");
    settle(&mut s, &mut view_rx, |s| s.error().is_some()).await;
    assert!(s.error().unwrap().contains("nope.io/v1/Gone"));
    assert_eq!(s.catalog().entries().len(), 1);

    s.select(KEY);
    settle(&mut s, &mut view_rx, |s| s.has_results()).await;
    assert!(s.error().is_none());
    assert!(!s.tree().is_empty());
}

#[test]
fn superseded_select_responses_are_dropped() {
    let (mut s, _rx) = offline_session();
    let first = s.select("a/v1/A");
    let second = s.select("b/v1/B");
    assert!(second > first);
    let stale_schema = HostEvent::ResourceData {
        details: json!({"properties": {"spec": {"type": "object"}}}),
        description: Some("A".into()),
        raw_text: "a".into(),
        token: Some(first),
    };
    assert!(!s.handle(stale_schema));
    assert!(!s.handle(results(&["Name"], vec![vec![Cell::from("old")]], Some(first))));
    assert!(s.tree().is_empty());
    assert!(!s.has_results());
    assert!(s.handle(results(&["Name"], vec![vec![Cell::from("new")]], Some(second))));
    assert_eq!(s.table().body()[0].cells, vec!["new"]);
}

#[test]
fn scope_change_after_select_keeps_schema_but_drops_old_rows() {
    let (mut s, _rx) = offline_session();
    let sel = s.select("a/v1/A");
    let scope = s.set_scope("prod");
    let schema = HostEvent::ResourceData {
        details: json!({"properties": {"status": {"type": "object"}}}),
        description: None,
        raw_text: String::new(),
        token: Some(sel),
    };
    assert!(s.handle(schema));
    assert_eq!(s.tree().roots()[0].name, "status");
    assert!(!s.handle(HostEvent::Clear { token: Some(sel) }));
    assert!(!s.handle(results(&["Name"], vec![], Some(sel))));
    assert!(s.handle(HostEvent::Clear { token: Some(scope) }));
    assert!(s.handle(results(&["Name"], vec![vec![Cell::from("p")]], Some(scope))));
    assert_eq!(s.table().body().len(), 1);
}

#[test]
fn untokened_events_always_apply() {
    let (mut s, _rx) = offline_session();
    s.select("a/v1/A");
    s.select("a/v1/A");
    assert!(s.handle(results(&["k"], vec![vec![Cell::Int(1)]], None)));
    assert!(s.handle(HostEvent::Error { message: "late".into(), token: None }));
    assert_eq!(s.error(), Some("late"));
}

#[test]
fn shape_change_clears_sort_and_filter_before_display() {
    let (mut s, _rx) = offline_session();
    s.handle(results(&["a", "b"], vec![vec![Cell::from("x"), Cell::Int(2)], vec![Cell::from("y"), Cell::Int(1)]], None));
    s.click_header(1);
    s.edit_filter(0, "x");
    assert_eq!(s.table().body().len(), 1);
    s.handle(results(&["a", "c"], vec![vec![Cell::from("x"), Cell::Int(2)], vec![Cell::from("y"), Cell::Int(1)]], None));
    assert_eq!(s.table().state().sort_col(), None);
    assert!(s.table().header().iter().all(|h| h.sort.is_none()));
    assert_eq!(s.table().body().len(), 2);
}

#[test]
fn outbound_intents_are_well_formed() {
    let (mut s, mut rx) = offline_session();
    s.start();
    let token = s.select(KEY);
    s.set_scope("prod");
    let sent: Vec<Intent> = std::iter::from_fn(|| rx.try_recv().ok()).map(|raw| decode_intent(&raw).unwrap()).collect();
    assert_eq!(
        sent,
        vec![
            Intent::Ready,
            Intent::Select { name: KEY.into(), token: Some(token) },
            Intent::SetScope { value: "prod".into(), token: Some(token + 1) },
        ]
    );
    // nothing to open yet
    assert!(!s.open_schema());
    assert!(!s.trigger_row_action(0, 0));
}
