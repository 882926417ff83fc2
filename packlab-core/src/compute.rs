//! Compute boundary — the opaque operation that produces chart/table data.
//!
//! The renderer only consumes [`ComputeResult`]. [`DemoCompute`] is a
//! deterministic stand-in: a seeded random price path traded in fixed
//! windows, with a handful of summary metrics derived from it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::controls::FormValues;
use crate::schema::FieldValue;
use crate::table::Row;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComputeError {
    #[error("invalid compute input: {0}")]
    InvalidInput(String),
    #[error("compute failed: {0}")]
    Failed(String),
}

/// Shape returned by any compute boundary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComputeResult {
    pub equity: Vec<f64>,
    pub metrics: Vec<MetricRow>,
    pub trades: Vec<TradeRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub metric: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    pub id: u32,
    pub symbol: String,
    pub entry: f64,
    pub exit: f64,
    pub pnl: f64,
}

impl ComputeResult {
    /// Table rows for a results tab, by tab id. `None` for tabs this result
    /// has no data for.
    pub fn rows_for(&self, tab_id: &str) -> Option<Vec<Row>> {
        match tab_id {
            "metrics" => Some(to_rows(&self.metrics)),
            "trades" => Some(to_rows(&self.trades)),
            _ => None,
        }
    }
}

fn to_rows<T: Serialize>(items: &[T]) -> Vec<Row> {
    items
        .iter()
        .filter_map(|item| match serde_json::to_value(item) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        })
        .collect()
}

/// Anything that turns form inputs into a result.
pub trait ComputeBoundary {
    fn compute(&self, inputs: &FormValues) -> Result<ComputeResult, ComputeError>;
}

impl<F> ComputeBoundary for F
where
    F: Fn(&FormValues) -> Result<ComputeResult, ComputeError>,
{
    fn compute(&self, inputs: &FormValues) -> Result<ComputeResult, ComputeError> {
        self(inputs)
    }
}

/// Knobs for the demo generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeSettings {
    pub seed: u64,
    pub bars: usize,
    pub initial_equity: f64,
    /// Bars per trade window.
    pub window: usize,
}

impl Default for ComputeSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            bars: 120,
            initial_equity: 100_000.0,
            window: 10,
        }
    }
}

/// Deterministic demo backtest.
#[derive(Debug, Clone, Default)]
pub struct DemoCompute {
    pub settings: ComputeSettings,
}

impl DemoCompute {
    pub fn new(settings: ComputeSettings) -> Self {
        Self { settings }
    }

    /// Seed mixed from the configured seed and the inputs, so equal inputs
    /// always give equal results.
    fn seed_for(&self, inputs: &FormValues) -> u64 {
        let bytes = serde_json::to_vec(inputs).unwrap_or_default();
        let hash = blake3::hash(&bytes);
        let mut head = [0u8; 8];
        head.copy_from_slice(&hash.as_bytes()[..8]);
        self.settings.seed ^ u64::from_le_bytes(head)
    }
}

fn text_input(inputs: &FormValues, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| inputs.get(*k))
        .filter_map(FieldValue::as_text)
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

impl ComputeBoundary for DemoCompute {
    fn compute(&self, inputs: &FormValues) -> Result<ComputeResult, ComputeError> {
        let s = &self.settings;
        if s.bars < 2 {
            return Err(ComputeError::InvalidInput(format!(
                "need at least 2 bars, got {}",
                s.bars
            )));
        }
        if s.window == 0 {
            return Err(ComputeError::InvalidInput("trade window must be positive".into()));
        }

        let symbol = text_input(inputs, &["ticker", "symbol"])
            .unwrap_or_else(|| "SPY".to_string())
            .to_uppercase();
        let risk_pct = inputs
            .get("riskPct")
            .and_then(FieldValue::as_f64)
            .unwrap_or(1.0);
        if !(0.0..=100.0).contains(&risk_pct) {
            return Err(ComputeError::InvalidInput(format!(
                "riskPct {risk_pct} outside 0..100"
            )));
        }
        let capital = inputs
            .get("capital")
            .and_then(FieldValue::as_f64)
            .filter(|c| *c > 0.0)
            .unwrap_or(s.initial_equity);
        let exposure = (risk_pct / 100.0 * 50.0).clamp(0.1, 1.0);

        let mut rng = StdRng::seed_from_u64(self.seed_for(inputs));

        // Price path: small drift plus uniform noise.
        let mut prices = Vec::with_capacity(s.bars);
        let mut price = 100.0_f64;
        for _ in 0..s.bars {
            prices.push(price);
            let shock: f64 = rng.gen_range(-0.02..0.02);
            price *= 1.0 + 0.0006 + shock;
        }

        // Long in every other window, flat otherwise.
        let mut equity = Vec::with_capacity(s.bars);
        let mut trades = Vec::new();
        let mut value = capital;
        equity.push(value);
        for i in 1..s.bars {
            let in_trade = (i / s.window) % 2 == 0;
            if in_trade {
                let r = prices[i] / prices[i - 1] - 1.0;
                value *= 1.0 + exposure * r;
            }
            equity.push(value);
        }
        let mut start = 0;
        while start + 1 < s.bars {
            let end = (start + s.window - 1).min(s.bars - 1);
            if end > start {
                let (entry, exit) = (prices[start], prices[end]);
                trades.push(TradeRow {
                    id: trades.len() as u32 + 1,
                    symbol: symbol.clone(),
                    entry: round2(entry),
                    exit: round2(exit),
                    pnl: exit / entry - 1.0,
                });
            }
            start += 2 * s.window;
        }

        let metrics = summarize(&equity, &trades);
        tracing::debug!(%symbol, bars = s.bars, trades = trades.len(), "demo compute finished");
        Ok(ComputeResult {
            equity,
            metrics,
            trades,
        })
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn summarize(equity: &[f64], trades: &[TradeRow]) -> Vec<MetricRow> {
    let first = equity.first().copied().unwrap_or(0.0);
    let last = equity.last().copied().unwrap_or(0.0);
    let total_return = if first > 0.0 { last / first - 1.0 } else { 0.0 };

    let returns: Vec<f64> = equity.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    let n = returns.len() as f64;
    let sharpe = if returns.len() > 1 {
        let mean = returns.iter().sum::<f64>() / n;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let sd = var.sqrt();
        if sd > 0.0 {
            mean / sd * 252f64.sqrt()
        } else {
            0.0
        }
    } else {
        0.0
    };

    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &e in equity {
        peak = peak.max(e);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - e) / peak);
        }
    }

    let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
    let win_rate = if trades.is_empty() {
        0.0
    } else {
        wins as f64 / trades.len() as f64
    };

    vec![
        metric("Total return", total_return, Some("fraction")),
        metric("Sharpe", sharpe, Some("annualized, 252 bars")),
        metric("Max drawdown", max_dd, Some("fraction")),
        metric("Win rate", win_rate, Some("fraction")),
        metric("Trades", trades.len() as f64, None),
        metric("Final equity", last, None),
    ]
}

fn metric(name: &str, value: f64, note: Option<&str>) -> MetricRow {
    MetricRow {
        metric: name.to_string(),
        value,
        note: note.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(ticker: &str) -> FormValues {
        let mut v = FormValues::new();
        v.insert("ticker".into(), FieldValue::Text(ticker.into()));
        v
    }

    #[test]
    fn demo_is_deterministic_per_input() {
        let demo = DemoCompute::default();
        let a = demo.compute(&inputs("SPY")).unwrap();
        let b = demo.compute(&inputs("SPY")).unwrap();
        let c = demo.compute(&inputs("QQQ")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.equity, c.equity);
    }

    #[test]
    fn demo_shapes_are_consistent() {
        let demo = DemoCompute::default();
        let r = demo.compute(&inputs("spy")).unwrap();
        assert_eq!(r.equity.len(), 120);
        assert_eq!(r.equity[0], 100_000.0);
        assert!(r.equity.iter().all(|v| v.is_finite()));
        assert_eq!(r.trades.len(), 6);
        assert!(r.trades.iter().all(|t| t.symbol == "SPY"));
        assert_eq!(r.metrics.len(), 6);
    }

    #[test]
    fn rows_for_known_tabs_only() {
        let r = DemoCompute::default().compute(&FormValues::new()).unwrap();
        let metrics = r.rows_for("metrics").unwrap();
        assert_eq!(metrics.len(), r.metrics.len());
        assert!(metrics[0].contains_key("metric"));
        assert!(r.rows_for("trades").unwrap()[0].contains_key("pnl"));
        assert!(r.rows_for("equity").is_none());
    }

    #[test]
    fn out_of_range_risk_is_rejected() {
        let mut v = inputs("SPY");
        v.insert("riskPct".into(), FieldValue::Number(150.0));
        let err = DemoCompute::default().compute(&v).unwrap_err();
        assert!(matches!(err, ComputeError::InvalidInput(_)));
    }

    #[test]
    fn closures_are_compute_boundaries() {
        let fixed = |_: &FormValues| -> Result<ComputeResult, ComputeError> {
            Ok(ComputeResult {
                equity: vec![1.0, 2.0],
                ..Default::default()
            })
        };
        assert_eq!(fixed.compute(&FormValues::new()).unwrap().equity, vec![1.0, 2.0]);
    }
}
