//! Wizard sessions driven purely through `transition`.

use std::time::{Duration, Instant};

use packlab_core::wizard::{
    BasicsField, Outcome, Rejection, WizardCatalog, WizardSettings, INCOMPLETE_PLACEHOLDER,
};
use packlab_core::{Wizard, WizardEvent, WizardStep};

fn quick_wizard() -> Wizard {
    let settings = WizardSettings {
        redirect_delay: Duration::from_millis(10),
        redirect_target: "strategies".into(),
        preview_points: 12,
        ..WizardSettings::default()
    };
    Wizard::new(WizardCatalog::builtin(), settings)
}

fn set(w: &mut Wizard, field: BasicsField, value: &str) -> Result<Outcome, Rejection> {
    w.transition(WizardEvent::SetBasics(field, value.into()))
}

#[test]
fn derived_id_for_a_complete_basics_step() {
    let mut w = quick_wizard();
    set(&mut w, BasicsField::Ticker, "SPY").unwrap();
    set(&mut w, BasicsField::AssetType, "OPT").unwrap();
    set(&mut w, BasicsField::Horizon, "0DTE").unwrap();
    assert_eq!(w.state().id_label(), INCOMPLETE_PLACEHOLDER);
    set(&mut w, BasicsField::Cadence, "hourly").unwrap();
    assert_eq!(w.state().derived_id.as_deref(), Some("spy_opt_0dte_hourly"));
}

#[test]
fn each_empty_field_unsets_the_id() {
    for cleared in BasicsField::ALL {
        let mut w = quick_wizard();
        set(&mut w, BasicsField::Ticker, "SPY").unwrap();
        set(&mut w, BasicsField::AssetType, "OPT").unwrap();
        set(&mut w, BasicsField::Horizon, "0DTE").unwrap();
        set(&mut w, BasicsField::Cadence, "hourly").unwrap();
        set(&mut w, cleared, "").unwrap();
        assert_eq!(w.state().derived_id, None, "clearing {cleared:?}");
    }
}

#[test]
fn next_from_indicators_without_a_set_stays_on_step_two() {
    let mut w = quick_wizard();
    set(&mut w, BasicsField::Ticker, "QQQ").unwrap();
    set(&mut w, BasicsField::AssetType, "ETF").unwrap();
    set(&mut w, BasicsField::Horizon, "Swing").unwrap();
    set(&mut w, BasicsField::Cadence, "daily").unwrap();
    w.transition(WizardEvent::Next).unwrap();
    assert_eq!(w.current().number(), 2);

    let before = w.state().clone();
    let err = w.transition(WizardEvent::Next).unwrap_err();
    assert!(matches!(err, Rejection::Incomplete { step: WizardStep::Indicators, .. }));
    assert_eq!(w.state(), &before);
}

#[test]
fn prev_from_basics_stays_on_step_one() {
    let mut w = quick_wizard();
    assert_eq!(w.transition(WizardEvent::Prev), Err(Rejection::AtFirstStep));
    assert_eq!(w.current().number(), 1);
}

#[test]
fn full_session_saves_and_redirects() {
    let mut w = quick_wizard();
    set(&mut w, BasicsField::Ticker, "IWM").unwrap();
    set(&mut w, BasicsField::AssetType, "ETF").unwrap();
    set(&mut w, BasicsField::Horizon, "Position").unwrap();
    set(&mut w, BasicsField::Cadence, "weekly").unwrap();
    w.transition(WizardEvent::Next).unwrap();
    w.transition(WizardEvent::SelectIndicatorSet("Volatility".into())).unwrap();
    w.transition(WizardEvent::Next).unwrap();
    w.transition(WizardEvent::SelectPolicy("Conservative".into())).unwrap();
    w.transition(WizardEvent::Next).unwrap();
    assert_eq!(w.transition(WizardEvent::GeneratePreview), Ok(Outcome::PreviewReady));
    let preview = w.state().accumulated.preview.clone().unwrap();
    assert_eq!(preview.sample_equity.len(), 12);
    assert_eq!(preview.policy["risk_pct"], "0.5");

    assert_eq!(
        w.transition(WizardEvent::Next),
        Ok(Outcome::Moved { from: WizardStep::Preview, to: WizardStep::Save })
    );
    let summary = w.state().summary.clone().unwrap();
    assert_eq!(summary.strategy_id.as_deref(), Some("iwm_etf_position_weekly"));

    let Ok(Outcome::Saved(report)) = w.transition(WizardEvent::Save) else {
        panic!("save should succeed on the Save step");
    };
    assert_eq!(
        report.acknowledgements,
        vec![
            "Step 1 complete: Basics (iwm_etf_position_weekly)",
            "Step 2 complete: Indicators (Volatility)",
            "Step 3 complete: Policy (Conservative)",
            "Step 4 complete: Preview (generated)",
            "Saved strategy iwm_etf_position_weekly",
        ]
    );
    assert_eq!(report.redirect_in, Duration::from_millis(10));

    let later = Instant::now() + Duration::from_secs(1);
    assert_eq!(w.poll_navigation(later).as_deref(), Some("strategies"));
    assert_eq!(w.transition(WizardEvent::Next), Err(Rejection::Finished));
}

#[test]
fn changing_basics_discards_stale_preview() {
    let mut w = quick_wizard();
    set(&mut w, BasicsField::Ticker, "SPY").unwrap();
    set(&mut w, BasicsField::AssetType, "EQ").unwrap();
    set(&mut w, BasicsField::Horizon, "Swing").unwrap();
    set(&mut w, BasicsField::Cadence, "daily").unwrap();
    w.transition(WizardEvent::Next).unwrap();
    w.transition(WizardEvent::SelectIndicatorSet("Trend".into())).unwrap();
    w.transition(WizardEvent::Next).unwrap();
    w.transition(WizardEvent::SelectPolicy("Balanced".into())).unwrap();
    w.transition(WizardEvent::Next).unwrap();
    w.transition(WizardEvent::GeneratePreview).unwrap();
    assert!(w.state().accumulated.preview.is_some());

    for _ in 0..3 {
        w.transition(WizardEvent::Prev).unwrap();
    }
    set(&mut w, BasicsField::Ticker, "AAPL").unwrap();
    assert!(w.state().accumulated.preview.is_none());
    assert!(w.state().accumulated.indicators.is_some());
}
