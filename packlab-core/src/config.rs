//! Application configuration — TOML file, every field defaulted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compute::ComputeSettings;
use crate::theme::ThemeContext;
use crate::wizard::{WizardCatalog, WizardSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid catalog {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level config file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub panels: PanelsConfig,
    pub theme: ThemeContext,
    pub wizard: WizardConfig,
    pub compute: ComputeSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelsConfig {
    /// Action id bound to the compute-and-redraw cycle.
    pub run_action: String,
}

impl Default for PanelsConfig {
    fn default() -> Self {
        Self {
            run_action: "run".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    pub redirect_delay_ms: u64,
    pub redirect_target: String,
    /// Optional catalog file (`.toml` or `.json`); the built-in catalog
    /// is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            redirect_delay_ms: 1500,
            redirect_target: "strategies".to_string(),
            catalog: None,
        }
    }
}

impl WizardConfig {
    pub fn settings(&self) -> WizardSettings {
        WizardSettings {
            redirect_delay: Duration::from_millis(self.redirect_delay_ms),
            redirect_target: self.redirect_target.clone(),
            ..WizardSettings::default()
        }
    }

    /// The configured catalog, or the built-in one.
    pub fn load_catalog(&self) -> Result<WizardCatalog, ConfigError> {
        match &self.catalog {
            Some(path) => load_catalog(path),
            None => Ok(WizardCatalog::builtin()),
        }
    }
}

impl AppConfig {
    /// Wizard settings with the preview drawn from the `[compute]` section.
    pub fn wizard_settings(&self) -> WizardSettings {
        WizardSettings {
            compute: self.compute.clone(),
            ..self.wizard.settings()
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load from `path`. A malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = read(path)?;
        Self::from_toml(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`AppConfig::load`], but a missing file yields defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

/// Load a wizard catalog; JSON when the extension is `.json`, TOML otherwise.
pub fn load_catalog(path: &Path) -> Result<WizardCatalog, ConfigError> {
    let text = read(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    } else {
        toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::LINE_COLOR_VAR;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.panels.run_action, "run");
        assert_eq!(config.wizard.redirect_delay_ms, 1500);
        assert_eq!(config.compute.seed, 42);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let text = r##"
            [panels]
            run_action = "launch"

            [theme.vars]
            "--chart-line" = "#ff8800"

            [compute]
            bars = 60
        "##;
        let config = AppConfig::from_toml(text).unwrap();
        assert_eq!(config.panels.run_action, "launch");
        assert_eq!(config.theme.var(LINE_COLOR_VAR), Some("#ff8800"));
        assert_eq!(config.compute.bars, 60);
        assert_eq!(config.compute.initial_equity, 100_000.0);
        assert_eq!(config.wizard.redirect_target, "strategies");
    }

    #[test]
    fn wizard_settings_carry_compute_section() {
        let text = r#"
            [wizard]
            redirect_delay_ms = 250

            [compute]
            seed = 9
        "#;
        let settings = AppConfig::from_toml(text).unwrap().wizard_settings();
        assert_eq!(settings.redirect_delay, Duration::from_millis(250));
        assert_eq!(settings.compute.seed, 9);
        assert_eq!(settings.preview_points, 30);
    }

    #[test]
    fn missing_file_is_default_but_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert_eq!(AppConfig::load_or_default(&missing).unwrap(), AppConfig::default());

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[panels\nrun_action = ").unwrap();
        assert!(matches!(
            AppConfig::load_or_default(&bad),
            Err(ConfigError::Toml { .. })
        ));
    }

    #[test]
    fn catalog_loads_from_toml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("catalog.toml");
        let mut f = std::fs::File::create(&toml_path).unwrap();
        writeln!(
            f,
            r#"tickers = ["SPY"]
cadences = ["daily"]

[[indicator_sets]]
name = "Trend"
indicators = ["sma"]

[[policy_templates]]
name = "Flat"
params = {{ risk_pct = "1" }}"#
        )
        .unwrap();
        let catalog = load_catalog(&toml_path).unwrap();
        assert_eq!(catalog.tickers, vec!["SPY"]);
        assert!(catalog.horizons.is_empty());
        assert_eq!(catalog.policy_template("Flat").unwrap().params["risk_pct"], "1");

        let json_path = dir.path().join("catalog.json");
        std::fs::write(&json_path, r#"{"tickers": ["QQQ"], "indicator_sets": []}"#).unwrap();
        assert_eq!(load_catalog(&json_path).unwrap().tickers, vec!["QQQ"]);
    }

    #[test]
    fn wizard_settings_follow_config() {
        let wizard = WizardConfig {
            redirect_delay_ms: 250,
            redirect_target: "home".into(),
            catalog: None,
        };
        let settings = wizard.settings();
        assert_eq!(settings.redirect_delay, Duration::from_millis(250));
        assert_eq!(settings.redirect_target, "home");
        assert_eq!(wizard.load_catalog().unwrap(), WizardCatalog::builtin());
    }
}
