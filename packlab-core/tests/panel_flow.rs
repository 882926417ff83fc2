//! End-to-end panel flow: schema in, run action, chart and tables out.

use packlab_core::chart::DrawOp;
use packlab_core::compute::{ComputeError, ComputeResult, MetricRow};
use packlab_core::controls::{self, check_control, FormValues};
use packlab_core::layout::{selected_tabs, visible_views};
use packlab_core::node::Tag;
use packlab_core::orchestrator::PREVIEW_ID;
use packlab_core::schema::FieldValue;
use packlab_core::table::write_csv;
use packlab_core::{ActionOutcome, DemoCompute, PanelSchema, PanelScreen, ThemeContext};

const SCHEMA: &str = r#"{
  "pack": "smoke",
  "version": 1,
  "panels": [
    {
      "id": "config",
      "title": "Config",
      "layout": "form-2col",
      "fields": [
        {"id": "ticker", "type": "text", "label": "Ticker", "required": true},
        {"id": "riskPct", "type": "number", "label": "Risk", "min": 0, "max": 100, "value": 1}
      ],
      "actions": [{"id": "run", "label": "Run", "kind": "primary"}]
    },
    {
      "id": "results",
      "title": "Results",
      "layout": "tabs",
      "tabs": [
        {"id": "equity", "label": "Equity", "type": "chart"},
        {"id": "metrics", "label": "Metrics", "type": "table",
         "columns": [
           {"key": "metric", "label": "Metric"},
           {"key": "value", "label": "Value", "format": "float"}
         ]}
      ]
    }
  ]
}"#;

fn screen() -> PanelScreen {
    let schema = PanelSchema::from_json(SCHEMA).unwrap();
    assert!(schema.issues().is_empty());
    PanelScreen::new(schema, ThemeContext::new())
}

#[test]
fn run_draws_chart_and_fills_metrics() {
    let mut screen = screen();
    assert!(screen.bind_run("run"));

    let ticker = screen.control_mut("ticker").unwrap();
    assert!(controls::set_text(ticker, "SPY"));

    let applied = screen
        .run_with("run", &DemoCompute::default())
        .unwrap()
        .expect("run is bound");
    assert_eq!(applied.charts, 1);

    let canvas = screen.root().find_by_id("canvas-equity").unwrap();
    let surface = canvas.surface.as_ref().unwrap();
    let (points, _) = surface.polylines().next().expect("polyline drawn");
    assert!(!points.is_empty());
    assert!(points.iter().all(|p| p.is_finite()));

    let metrics = screen.last_result().unwrap().metrics.len();
    let body = screen.root().find_by_id("tbody-metrics").unwrap();
    assert_eq!(body.children.len(), metrics);
    assert_eq!(selected_tabs(screen.root()), vec!["equity"]);
    assert_eq!(visible_views(screen.root()), vec!["equity"]);
}

#[test]
fn required_and_range_checks_read_the_tree() {
    let mut screen = screen();
    let ticker = screen.control("ticker").unwrap();
    assert_eq!(check_control(ticker).as_deref(), Some("required"));

    let risk = screen.control_mut("riskPct").unwrap();
    assert!(controls::set_text(risk, "150"));
    assert!(!controls::set_text(risk, "abc"));
    let risk = screen.control("riskPct").unwrap();
    assert_eq!(check_control(risk).as_deref(), Some("above maximum 100"));
}

#[test]
fn latest_result_wins_regardless_of_arrival_order() {
    let mut screen = screen();
    screen.bind_run("run");
    let ActionOutcome::RunRequested(first) = screen.trigger("run") else {
        panic!("run should be bound");
    };
    let ActionOutcome::RunRequested(second) = screen.trigger("run") else {
        panic!("run should be bound");
    };
    assert!(second.ticket > first.ticket);

    let metric = |name: &str| MetricRow {
        metric: name.into(),
        value: 1.0,
        note: None,
    };
    let newer = ComputeResult {
        equity: vec![1.0, 2.0],
        metrics: vec![metric("a"), metric("b"), metric("c")],
        trades: Vec::new(),
    };
    let older = ComputeResult {
        equity: vec![3.0],
        metrics: vec![metric("z")],
        trades: Vec::new(),
    };
    screen.apply_result(second.ticket, newer);
    let summary = screen.apply_result(first.ticket, older);
    assert!(summary.stale);

    let body = screen.root().find_by_id("tbody-metrics").unwrap();
    assert_eq!(body.children.len(), 1);
}

#[test]
fn empty_equity_draws_placeholder() {
    let mut screen = screen();
    screen.bind_run("run");
    let empty = |_: &FormValues| -> Result<ComputeResult, ComputeError> { Ok(ComputeResult::default()) };
    screen.run_with("run", &empty).unwrap();

    let surface = screen
        .root()
        .find_by_id("canvas-equity")
        .and_then(|c| c.surface.as_ref())
        .unwrap();
    assert_eq!(surface.polylines().count(), 0);
    assert!(surface
        .ops()
        .iter()
        .any(|op| matches!(op, DrawOp::Label { text, .. } if text == "no data")));
}

#[test]
fn preview_block_describes_the_schema() {
    let screen = screen();
    let preview = screen.root().find_by_id(PREVIEW_ID).unwrap();
    let text = preview.text_content();
    assert!(text.contains("pack smoke v1"));
    let pre = preview.find(&|n| n.tag == Tag::Pre).unwrap();
    let json: serde_json::Value = serde_json::from_str(pre.text.as_deref().unwrap()).unwrap();
    assert_eq!(json["pack"], "smoke");
}

#[test]
fn metrics_export_to_csv() {
    let mut screen = screen();
    screen.bind_run("run");
    screen.run_with("run", &DemoCompute::default()).unwrap();

    let snapshot = screen.export_table("metrics").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrics.csv");
    write_csv(&snapshot, std::fs::File::create(&path).unwrap()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Metric,Value"));
    assert_eq!(lines.count(), snapshot.rows.len());
}

#[test]
fn form_values_reach_the_compute_boundary() {
    let mut screen = screen();
    screen.bind_run("run");
    controls::set_text(screen.control_mut("ticker").unwrap(), "QQQ");

    let echo = |inputs: &FormValues| -> Result<ComputeResult, ComputeError> {
        match inputs.get("ticker") {
            Some(FieldValue::Text(t)) if t == "QQQ" => Ok(ComputeResult {
                equity: vec![1.0],
                ..Default::default()
            }),
            other => Err(ComputeError::InvalidInput(format!("{other:?}"))),
        }
    };
    assert!(screen.run_with("run", &echo).is_ok());
    assert_eq!(
        screen.form_values().get("riskPct"),
        Some(&FieldValue::Number(1.0))
    );
}
