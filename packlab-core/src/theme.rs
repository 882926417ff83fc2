//! Theme context — string variables injected into renderers at draw time.
//!
//! Renderers never read an ambient theme; callers pass a [`ThemeContext`].
//! A missing or blank variable is never an error: readers fall back to a
//! fixed default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Variable holding the chart line color.
pub const LINE_COLOR_VAR: &str = "--chart-line";
/// Used when [`LINE_COLOR_VAR`] is unset or blank.
pub const FALLBACK_LINE_COLOR: &str = "#3b82f6";
/// Grid line color.
pub const GRID_COLOR: &str = "#d1d5db";
/// Axis color.
pub const AXIS_COLOR: &str = "#6b7280";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeContext {
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

impl ThemeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Trimmed value of a variable; blank values read as unset.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Chart line color, or the fixed fallback.
    pub fn line_color(&self) -> &str {
        self.var(LINE_COLOR_VAR).unwrap_or(FALLBACK_LINE_COLOR)
    }
}

/// Parse `#rgb` or `#rrggbb` into components.
pub fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.trim().strip_prefix('#')?;
    let channel = |i: usize, len: usize| u8::from_str_radix(hex.get(i..i + len)?, 16).ok();
    match hex.len() {
        6 => Some((channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
        3 => {
            let (r, g, b) = (channel(0, 1)?, channel(1, 1)?, channel(2, 1)?);
            Some((r * 17, g * 17, b * 17))
        }
        _ => None,
    }
}
