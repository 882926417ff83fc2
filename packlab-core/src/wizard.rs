//! Strategy wizard — a five-step state machine.
//!
//! Basics → Indicators → Policy → Preview → Save, linear, driven through
//! [`Wizard::transition`]. Each step has a gate that must pass before moving
//! forward; a refused event returns a [`Rejection`] and mutates nothing.
//! Saving produces ordered acknowledgements and schedules a cancellable
//! [`PendingNavigation`] away from the wizard.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compute::{ComputeBoundary, ComputeError, ComputeSettings, DemoCompute};
use crate::controls::FormValues;
use crate::schema::FieldValue;

/// Text shown wherever the derived id is not yet available.
pub const INCOMPLETE_PLACEHOLDER: &str = "incomplete";

// ─── Steps ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    Basics,
    Indicators,
    Policy,
    Preview,
    Save,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Basics,
        WizardStep::Indicators,
        WizardStep::Policy,
        WizardStep::Preview,
        WizardStep::Save,
    ];

    /// 1-based position.
    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn from_number(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Basics => "Basics",
            WizardStep::Indicators => "Indicators",
            WizardStep::Policy => "Policy",
            WizardStep::Preview => "Preview",
            WizardStep::Save => "Save",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn prev(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number(), self.label())
    }
}

/// The four selectors on the Basics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicsField {
    Ticker,
    AssetType,
    Horizon,
    Cadence,
}

impl BasicsField {
    pub const ALL: [BasicsField; 4] = [
        BasicsField::Ticker,
        BasicsField::AssetType,
        BasicsField::Horizon,
        BasicsField::Cadence,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BasicsField::Ticker => "Ticker",
            BasicsField::AssetType => "Asset type",
            BasicsField::Horizon => "Horizon",
            BasicsField::Cadence => "Cadence",
        }
    }
}

// ─── Catalog ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub name: String,
    #[serde(default)]
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTemplate {
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

/// Static choices the selectors are populated from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardCatalog {
    pub tickers: Vec<String>,
    pub asset_types: Vec<String>,
    pub horizons: Vec<String>,
    pub cadences: Vec<String>,
    pub indicator_sets: Vec<IndicatorSet>,
    pub policy_templates: Vec<PolicyTemplate>,
}

impl WizardCatalog {
    pub fn builtin() -> Self {
        let strings = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let set = |name: &str, xs: &[&str]| IndicatorSet {
            name: name.to_string(),
            indicators: strings(xs),
        };
        let policy = |name: &str, params: &[(&str, &str)]| PolicyTemplate {
            name: name.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        Self {
            tickers: strings(&["SPY", "QQQ", "IWM", "AAPL", "TSLA"]),
            asset_types: strings(&["ETF", "EQ", "OPT"]),
            horizons: strings(&["0DTE", "Swing", "Position"]),
            cadences: strings(&["hourly", "daily", "weekly"]),
            indicator_sets: vec![
                set("Trend", &["sma", "ema"]),
                set("Momentum", &["rsi", "macd"]),
                set("Volatility", &["atr", "bbands"]),
            ],
            policy_templates: vec![
                policy("Conservative", &[("risk_pct", "0.5"), ("stop", "2xATR")]),
                policy("Balanced", &[("risk_pct", "1.0"), ("stop", "1.5xATR")]),
                policy("Aggressive", &[("risk_pct", "2.0"), ("stop", "1xATR")]),
            ],
        }
    }

    /// Allowed values for one Basics selector.
    pub fn options(&self, field: BasicsField) -> &[String] {
        match field {
            BasicsField::Ticker => &self.tickers,
            BasicsField::AssetType => &self.asset_types,
            BasicsField::Horizon => &self.horizons,
            BasicsField::Cadence => &self.cadences,
        }
    }

    pub fn indicator_set(&self, name: &str) -> Option<&IndicatorSet> {
        self.indicator_sets.iter().find(|s| s.name == name)
    }

    pub fn policy_template(&self, name: &str) -> Option<&PolicyTemplate> {
        self.policy_templates.iter().find(|p| p.name == name)
    }
}

// ─── Accumulated state ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Basics {
    pub ticker: String,
    pub asset_type: String,
    pub horizon: String,
    pub cadence: String,
}

impl Basics {
    pub fn get(&self, field: BasicsField) -> &str {
        match field {
            BasicsField::Ticker => &self.ticker,
            BasicsField::AssetType => &self.asset_type,
            BasicsField::Horizon => &self.horizon,
            BasicsField::Cadence => &self.cadence,
        }
    }

    fn slot(&mut self, field: BasicsField) -> &mut String {
        match field {
            BasicsField::Ticker => &mut self.ticker,
            BasicsField::AssetType => &mut self.asset_type,
            BasicsField::Horizon => &mut self.horizon,
            BasicsField::Cadence => &mut self.cadence,
        }
    }

    pub fn missing(&self) -> Vec<BasicsField> {
        BasicsField::ALL
            .into_iter()
            .filter(|f| self.get(*f).trim().is_empty())
            .collect()
    }

    pub fn derived_id(&self) -> Option<String> {
        derive_id(&self.ticker, &self.asset_type, &self.horizon, &self.cadence)
    }
}

/// `ticker_assettype_horizon_cadence`, lowercased, only when all four parts
/// are non-empty.
pub fn derive_id(ticker: &str, asset_type: &str, horizon: &str, cadence: &str) -> Option<String> {
    let parts = [ticker, asset_type, horizon, cadence].map(str::trim);
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts.map(str::to_lowercase).join("_"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub strategy_id: String,
    pub indicators: Vec<String>,
    pub policy: BTreeMap<String, String>,
    pub sample_equity: Vec<f64>,
}

/// Per-step captured data. A sub-object stays `None` until its step's
/// inputs change.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Accumulated {
    pub basics: Option<Basics>,
    pub indicators: Option<IndicatorSet>,
    pub policy: Option<PolicyTemplate>,
    pub preview: Option<Preview>,
}

/// Read-only snapshot taken on entering the Save step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub strategy_id: Option<String>,
    pub accumulated: Accumulated,
}

/// Plain session state, separate from the engine that drives it.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub current: WizardStep,
    pub accumulated: Accumulated,
    pub derived_id: Option<String>,
    pub visited: BTreeSet<WizardStep>,
    pub summary: Option<Summary>,
    pub finished: bool,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current: WizardStep::Basics,
            accumulated: Accumulated::default(),
            derived_id: None,
            visited: BTreeSet::from([WizardStep::Basics]),
            summary: None,
            finished: false,
        }
    }
}

impl WizardState {
    /// The id, or the "incomplete" placeholder.
    pub fn id_label(&self) -> &str {
        self.derived_id.as_deref().unwrap_or(INCOMPLETE_PLACEHOLDER)
    }

    /// Fields the current step's gate is still waiting on.
    pub fn gate_missing(&self) -> Vec<String> {
        match self.current {
            WizardStep::Basics => {
                let basics = self.accumulated.basics.clone().unwrap_or_default();
                basics
                    .missing()
                    .into_iter()
                    .map(|f| f.label().to_string())
                    .collect()
            }
            WizardStep::Indicators if self.accumulated.indicators.is_none() => {
                vec!["Indicator set".to_string()]
            }
            WizardStep::Policy if self.accumulated.policy.is_none() => {
                vec!["Policy template".to_string()]
            }
            _ => Vec::new(),
        }
    }
}

// ─── Navigation ──────────────────────────────────────────────────────

/// One-shot navigation scheduled after save. Poll it from the UI loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingNavigation {
    target: String,
    due: Instant,
    cancelled: bool,
    fired: bool,
}

impl PendingNavigation {
    pub fn new(target: impl Into<String>, due: Instant) -> Self {
        Self {
            target: target.into(),
            due,
            cancelled: false,
            fired: false,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn due(&self) -> Instant {
        self.due
    }

    /// Returns the target once, at or after the due time, unless cancelled.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        if self.cancelled || self.fired || now < self.due {
            return None;
        }
        self.fired = true;
        Some(self.target.clone())
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_pending(&self) -> bool {
        !self.cancelled && !self.fired
    }
}

// ─── Events and outcomes ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    SetBasics(BasicsField, String),
    SelectIndicatorSet(String),
    SelectPolicy(String),
    GeneratePreview,
    Next,
    Prev,
    Save,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Captured data changed; the step did not.
    Updated,
    Moved { from: WizardStep, to: WizardStep },
    PreviewReady,
    Saved(SaveReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveReport {
    pub strategy_id: String,
    pub acknowledgements: Vec<String>,
    pub saved_at: DateTime<Utc>,
    pub summary: Summary,
    pub redirect_target: String,
    pub redirect_in: Duration,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Rejection {
    #[error("step {step} is incomplete: missing {}", missing.join(", "))]
    Incomplete { step: WizardStep, missing: Vec<String> },
    #[error("already at the first step")]
    AtFirstStep,
    #[error("already at the last step")]
    AtLastStep,
    #[error("'{value}' is not a known {field}")]
    UnknownOption { field: String, value: String },
    #[error("that input belongs to step {expected}, current step is {current}")]
    WrongStep { expected: WizardStep, current: WizardStep },
    #[error("strategy id is incomplete")]
    MissingDerivedId,
    #[error("preview failed: {0}")]
    Compute(#[from] ComputeError),
    #[error("wizard session is finished")]
    Finished,
}

// ─── Engine ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct WizardSettings {
    pub redirect_delay: Duration,
    pub redirect_target: String,
    /// Equity samples kept in the preview.
    pub preview_points: usize,
    /// Generator behind the preview; `bars` is overridden by `preview_points`.
    pub compute: ComputeSettings,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            redirect_delay: Duration::from_millis(1500),
            redirect_target: "strategies".to_string(),
            preview_points: 30,
            compute: ComputeSettings::default(),
        }
    }
}

/// Drives one wizard session against a catalog and a compute boundary.
pub struct Wizard {
    catalog: WizardCatalog,
    settings: WizardSettings,
    compute: Box<dyn ComputeBoundary + Send>,
    state: WizardState,
    navigation: Option<PendingNavigation>,
}

impl fmt::Debug for Wizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wizard")
            .field("state", &self.state)
            .field("navigation", &self.navigation)
            .finish_non_exhaustive()
    }
}

impl Wizard {
    pub fn new(catalog: WizardCatalog, settings: WizardSettings) -> Self {
        let demo = DemoCompute::new(ComputeSettings {
            bars: settings.preview_points.max(2),
            ..settings.compute.clone()
        });
        Self::with_compute(catalog, settings, Box::new(demo))
    }

    pub fn with_compute(
        catalog: WizardCatalog,
        settings: WizardSettings,
        compute: Box<dyn ComputeBoundary + Send>,
    ) -> Self {
        Self {
            catalog,
            settings,
            compute,
            state: WizardState::default(),
            navigation: None,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn catalog(&self) -> &WizardCatalog {
        &self.catalog
    }

    pub fn current(&self) -> WizardStep {
        self.state.current
    }

    /// Visibility per step; exactly one is visible.
    pub fn step_visibility(&self) -> [(WizardStep, bool); 5] {
        WizardStep::ALL.map(|s| (s, s == self.state.current))
    }

    pub fn navigation(&self) -> Option<&PendingNavigation> {
        self.navigation.as_ref()
    }

    /// Non-blocking check of the post-save navigation.
    pub fn poll_navigation(&mut self, now: Instant) -> Option<String> {
        self.navigation.as_mut().and_then(|nav| nav.poll(now))
    }

    /// Leave the wizard: cancel any scheduled navigation and discard the
    /// session.
    pub fn abandon(&mut self) {
        if let Some(nav) = self.navigation.as_mut() {
            if nav.is_pending() {
                tracing::info!(destination = nav.target(), "post-save navigation cancelled");
            }
            nav.cancel();
        }
        self.state = WizardState::default();
    }

    /// Start a fresh session. Any scheduled navigation is dropped.
    pub fn reset(&mut self) {
        self.navigation = None;
        self.state = WizardState::default();
    }

    /// Apply one event. Rejected events leave the session unchanged.
    pub fn transition(&mut self, event: WizardEvent) -> Result<Outcome, Rejection> {
        if self.state.finished {
            return Err(Rejection::Finished);
        }
        let outcome = match event {
            WizardEvent::SetBasics(field, value) => self.set_basics(field, value)?,
            WizardEvent::SelectIndicatorSet(name) => self.select_indicators(&name)?,
            WizardEvent::SelectPolicy(name) => self.select_policy(&name)?,
            WizardEvent::GeneratePreview => self.generate_preview()?,
            WizardEvent::Next => self.next()?,
            WizardEvent::Prev => self.prev()?,
            WizardEvent::Save => self.save()?,
        };
        Ok(outcome)
    }

    fn require_step(&self, expected: WizardStep) -> Result<(), Rejection> {
        if self.state.current == expected {
            Ok(())
        } else {
            Err(Rejection::WrongStep {
                expected,
                current: self.state.current,
            })
        }
    }

    fn set_basics(&mut self, field: BasicsField, value: String) -> Result<Outcome, Rejection> {
        self.require_step(WizardStep::Basics)?;
        let value = value.trim().to_string();
        if !value.is_empty() && !self.catalog.options(field).contains(&value) {
            return Err(Rejection::UnknownOption {
                field: field.label().to_lowercase(),
                value,
            });
        }

        let basics = self.state.accumulated.basics.get_or_insert_with(Basics::default);
        *basics.slot(field) = value;
        self.state.derived_id = basics.derived_id();
        self.state.accumulated.preview = None;
        tracing::debug!(field = field.label(), id = self.state.id_label(), "basics changed");
        Ok(Outcome::Updated)
    }

    fn select_indicators(&mut self, name: &str) -> Result<Outcome, Rejection> {
        self.require_step(WizardStep::Indicators)?;
        let set = self
            .catalog
            .indicator_set(name)
            .cloned()
            .ok_or_else(|| Rejection::UnknownOption {
                field: "indicator set".to_string(),
                value: name.to_string(),
            })?;
        self.state.accumulated.indicators = Some(set);
        self.state.accumulated.preview = None;
        Ok(Outcome::Updated)
    }

    fn select_policy(&mut self, name: &str) -> Result<Outcome, Rejection> {
        self.require_step(WizardStep::Policy)?;
        let template = self
            .catalog
            .policy_template(name)
            .cloned()
            .ok_or_else(|| Rejection::UnknownOption {
                field: "policy template".to_string(),
                value: name.to_string(),
            })?;
        self.state.accumulated.policy = Some(template);
        self.state.accumulated.preview = None;
        Ok(Outcome::Updated)
    }

    fn generate_preview(&mut self) -> Result<Outcome, Rejection> {
        self.require_step(WizardStep::Preview)?;
        let strategy_id = self
            .state
            .derived_id
            .clone()
            .ok_or(Rejection::MissingDerivedId)?;
        let acc = &self.state.accumulated;
        let basics = acc.basics.clone().unwrap_or_default();

        let mut inputs = FormValues::new();
        inputs.insert("ticker".into(), FieldValue::Text(basics.ticker));
        inputs.insert("cadence".into(), FieldValue::Text(basics.cadence));
        if let Some(risk) = acc
            .policy
            .as_ref()
            .and_then(|p| p.params.get("risk_pct"))
            .and_then(|r| r.parse::<f64>().ok())
        {
            inputs.insert("riskPct".into(), FieldValue::Number(risk));
        }

        let result = self.compute.compute(&inputs)?;
        let mut sample_equity = result.equity;
        sample_equity.truncate(self.settings.preview_points);

        let preview = Preview {
            strategy_id,
            indicators: acc
                .indicators
                .as_ref()
                .map(|s| s.indicators.clone())
                .unwrap_or_default(),
            policy: acc.policy.as_ref().map(|p| p.params.clone()).unwrap_or_default(),
            sample_equity,
        };
        self.state.accumulated.preview = Some(preview);
        Ok(Outcome::PreviewReady)
    }

    fn next(&mut self) -> Result<Outcome, Rejection> {
        let from = self.state.current;
        let to = from.next().ok_or(Rejection::AtLastStep)?;
        let missing = self.state.gate_missing();
        if !missing.is_empty() {
            return Err(Rejection::Incomplete { step: from, missing });
        }

        self.state.current = to;
        self.state.visited.insert(to);
        if to == WizardStep::Save {
            self.state.summary = Some(Summary {
                strategy_id: self.state.derived_id.clone(),
                accumulated: self.state.accumulated.clone(),
            });
        }
        tracing::info!(from = %from, to = %to, "wizard advanced");
        Ok(Outcome::Moved { from, to })
    }

    fn prev(&mut self) -> Result<Outcome, Rejection> {
        let from = self.state.current;
        let to = from.prev().ok_or(Rejection::AtFirstStep)?;
        self.state.current = to;
        tracing::info!(from = %from, to = %to, "wizard went back");
        Ok(Outcome::Moved { from, to })
    }

    fn save(&mut self) -> Result<Outcome, Rejection> {
        self.require_step(WizardStep::Save)?;
        let strategy_id = self
            .state
            .derived_id
            .clone()
            .ok_or(Rejection::MissingDerivedId)?;
        let summary = self.state.summary.clone().unwrap_or_else(|| Summary {
            strategy_id: Some(strategy_id.clone()),
            accumulated: self.state.accumulated.clone(),
        });

        let acc = &summary.accumulated;
        let mut acknowledgements = vec![format!(
            "Step 1 complete: Basics ({strategy_id})"
        )];
        acknowledgements.push(format!(
            "Step 2 complete: Indicators ({})",
            acc.indicators.as_ref().map_or("none", |s| s.name.as_str())
        ));
        acknowledgements.push(format!(
            "Step 3 complete: Policy ({})",
            acc.policy.as_ref().map_or("none", |p| p.name.as_str())
        ));
        acknowledgements.push(format!(
            "Step 4 complete: Preview ({})",
            if acc.preview.is_some() { "generated" } else { "skipped" }
        ));
        acknowledgements.push(format!("Saved strategy {strategy_id}"));

        let delay = self.settings.redirect_delay;
        self.navigation = Some(PendingNavigation::new(
            self.settings.redirect_target.clone(),
            Instant::now() + delay,
        ));
        self.state.finished = true;
        tracing::info!(strategy = %strategy_id, redirect = %self.settings.redirect_target, "strategy saved");

        Ok(Outcome::Saved(SaveReport {
            strategy_id,
            acknowledgements,
            saved_at: Utc::now(),
            summary,
            redirect_target: self.settings.redirect_target.clone(),
            redirect_in: delay,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::ComputeResult;

    fn wizard() -> Wizard {
        Wizard::new(WizardCatalog::builtin(), WizardSettings::default())
    }

    fn fill_basics(w: &mut Wizard) {
        for (field, value) in [
            (BasicsField::Ticker, "SPY"),
            (BasicsField::AssetType, "OPT"),
            (BasicsField::Horizon, "0DTE"),
            (BasicsField::Cadence, "hourly"),
        ] {
            w.transition(WizardEvent::SetBasics(field, value.into())).unwrap();
        }
    }

    #[test]
    fn step_numbers_round_trip() {
        for step in WizardStep::ALL {
            assert_eq!(WizardStep::from_number(step.number()), Some(step));
        }
        assert_eq!(WizardStep::from_number(0), None);
        assert_eq!(WizardStep::Save.next(), None);
        assert_eq!(WizardStep::Basics.prev(), None);
    }

    #[test]
    fn derived_id_needs_all_four() {
        let mut w = wizard();
        fill_basics(&mut w);
        assert_eq!(w.state().derived_id.as_deref(), Some("spy_opt_0dte_hourly"));

        w.transition(WizardEvent::SetBasics(BasicsField::Horizon, String::new()))
            .unwrap();
        assert_eq!(w.state().derived_id, None);
        assert_eq!(w.state().id_label(), INCOMPLETE_PLACEHOLDER);
    }

    #[test]
    fn unknown_catalog_values_are_rejected() {
        let mut w = wizard();
        let err = w
            .transition(WizardEvent::SetBasics(BasicsField::Ticker, "XYZ".into()))
            .unwrap_err();
        assert!(matches!(err, Rejection::UnknownOption { .. }));
        assert!(w.state().accumulated.basics.is_none());
    }

    #[test]
    fn gate_blocks_next() {
        let mut w = wizard();
        let err = w.transition(WizardEvent::Next).unwrap_err();
        assert!(matches!(err, Rejection::Incomplete { step: WizardStep::Basics, .. }));
        assert_eq!(w.current(), WizardStep::Basics);

        fill_basics(&mut w);
        w.transition(WizardEvent::Next).unwrap();
        assert_eq!(w.current().number(), 2);
        assert!(w.transition(WizardEvent::Next).is_err());
        assert_eq!(w.current().number(), 2);
    }

    #[test]
    fn prev_at_first_step_is_rejected() {
        let mut w = wizard();
        assert_eq!(w.transition(WizardEvent::Prev), Err(Rejection::AtFirstStep));
        assert_eq!(w.current().number(), 1);
    }

    #[test]
    fn prev_keeps_captured_data() {
        let mut w = wizard();
        fill_basics(&mut w);
        w.transition(WizardEvent::Next).unwrap();
        w.transition(WizardEvent::SelectIndicatorSet("Trend".into())).unwrap();
        w.transition(WizardEvent::Prev).unwrap();
        assert_eq!(w.current(), WizardStep::Basics);
        assert!(w.state().accumulated.indicators.is_some());
    }

    #[test]
    fn exactly_one_step_visible() {
        let mut w = wizard();
        fill_basics(&mut w);
        w.transition(WizardEvent::Next).unwrap();
        let visible: Vec<_> = w
            .step_visibility()
            .into_iter()
            .filter(|(_, v)| *v)
            .map(|(s, _)| s)
            .collect();
        assert_eq!(visible, vec![WizardStep::Indicators]);
    }

    #[test]
    fn inputs_for_other_steps_are_rejected() {
        let mut w = wizard();
        let err = w
            .transition(WizardEvent::SelectPolicy("Balanced".into()))
            .unwrap_err();
        assert!(matches!(err, Rejection::WrongStep { expected: WizardStep::Policy, .. }));
    }

    fn walk_to_save(w: &mut Wizard) {
        fill_basics(w);
        w.transition(WizardEvent::Next).unwrap();
        w.transition(WizardEvent::SelectIndicatorSet("Momentum".into())).unwrap();
        w.transition(WizardEvent::Next).unwrap();
        w.transition(WizardEvent::SelectPolicy("Balanced".into())).unwrap();
        w.transition(WizardEvent::Next).unwrap();
        w.transition(WizardEvent::GeneratePreview).unwrap();
        w.transition(WizardEvent::Next).unwrap();
    }

    #[test]
    fn preview_uses_compute_boundary() {
        let fixed = |_: &FormValues| -> Result<ComputeResult, ComputeError> {
            Ok(ComputeResult {
                equity: (0..100u32).map(f64::from).collect(),
                ..Default::default()
            })
        };
        let mut w = Wizard::with_compute(
            WizardCatalog::builtin(),
            WizardSettings::default(),
            Box::new(fixed),
        );
        walk_to_save(&mut w);
        let preview = w.state().accumulated.preview.clone().unwrap();
        assert_eq!(preview.strategy_id, "spy_opt_0dte_hourly");
        assert_eq!(preview.indicators, vec!["rsi", "macd"]);
        assert_eq!(preview.sample_equity.len(), 30);
        assert!(w.state().summary.is_some());
    }

    #[test]
    fn preview_follows_configured_seed() {
        let preview_with = |seed: u64| {
            let settings = WizardSettings {
                compute: ComputeSettings {
                    seed,
                    ..ComputeSettings::default()
                },
                ..WizardSettings::default()
            };
            let mut w = Wizard::new(WizardCatalog::builtin(), settings);
            walk_to_save(&mut w);
            w.state().accumulated.preview.clone().unwrap().sample_equity
        };
        let a = preview_with(7);
        assert_eq!(a.len(), 30);
        assert_eq!(a, preview_with(7));
        assert_ne!(a, preview_with(8));
    }

    #[test]
    fn save_acknowledges_each_step_then_finishes() {
        let mut w = wizard();
        walk_to_save(&mut w);
        let Ok(Outcome::Saved(report)) = w.transition(WizardEvent::Save) else {
            panic!("save failed");
        };
        assert_eq!(report.acknowledgements.len(), 5);
        assert!(report.acknowledgements[0].starts_with("Step 1"));
        assert_eq!(report.acknowledgements[4], "Saved strategy spy_opt_0dte_hourly");
        assert_eq!(w.transition(WizardEvent::Prev), Err(Rejection::Finished));
    }

    #[test]
    fn save_only_on_save_step() {
        let mut w = wizard();
        fill_basics(&mut w);
        assert!(matches!(
            w.transition(WizardEvent::Save),
            Err(Rejection::WrongStep { .. })
        ));
        assert!(w.navigation().is_none());
    }

    #[test]
    fn navigation_fires_once_after_delay() {
        let mut w = wizard();
        walk_to_save(&mut w);
        w.transition(WizardEvent::Save).unwrap();
        let due = w.navigation().unwrap().due();
        assert_eq!(w.poll_navigation(Instant::now()), None);
        assert_eq!(w.poll_navigation(due).as_deref(), Some("strategies"));
        assert_eq!(w.poll_navigation(due + Duration::from_secs(1)), None);
    }

    #[test]
    fn abandoning_cancels_navigation() {
        let mut w = wizard();
        walk_to_save(&mut w);
        w.transition(WizardEvent::Save).unwrap();
        let due = w.navigation().unwrap().due();
        w.abandon();
        assert!(w.navigation().unwrap().is_cancelled());
        assert_eq!(w.poll_navigation(due), None);
        assert_eq!(w.current(), WizardStep::Basics);
    }
}
