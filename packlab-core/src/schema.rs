//! Panel schema — the declarative JSON document the renderer consumes.
//!
//! A schema is `{ pack, version, panels, actions? }`. Type strings for
//! fields, tabs, actions and column formats are parsed into closed enums with
//! an explicit fallback, so unknown values never fail deserialization; they
//! surface later as visible placeholders and as [`SchemaIssue`] warnings.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Built-in demo pack shipped with the crate.
pub const BUILTIN_SCHEMA: &str = include_str!("../assets/backtest_pack.json");

/// Errors raised while loading a schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ─── Document ────────────────────────────────────────────────────────

/// A named, versioned collection of panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSchema {
    #[serde(default, deserialize_with = "loose_string")]
    pub pack: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub version: String,
    #[serde(default)]
    pub panels: Vec<Panel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionSpec>,
}

impl PanelSchema {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let json = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The demo pack bundled with the crate.
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_json(BUILTIN_SCHEMA)
    }

    /// The config panel: first panel whose layout begins with `form`.
    pub fn config_panel(&self) -> Option<&Panel> {
        self.panels.iter().find(|p| p.is_form())
    }

    /// The results panel: first panel whose layout is exactly `tabs`.
    pub fn results_panel(&self) -> Option<&Panel> {
        self.panels.iter().find(|p| p.is_tabs())
    }

    /// Every action declared anywhere in the document, in document order.
    pub fn all_actions(&self) -> impl Iterator<Item = &ActionSpec> {
        self.panels
            .iter()
            .flat_map(|p| p.actions.iter())
            .chain(self.actions.iter())
    }

    /// Content hash of the canonical JSON form (blake3, hex).
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&bytes).to_hex().to_string()
    }

    /// Lint the document. Issues are warnings: rendering still proceeds.
    pub fn issues(&self) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();

        let forms = self.panels.iter().filter(|p| p.is_form()).count();
        if forms > 1 {
            issues.push(SchemaIssue::MultipleFormPanels(forms));
        }
        let results = self.panels.iter().filter(|p| p.is_tabs()).count();
        if results > 1 {
            issues.push(SchemaIssue::MultipleResultsPanels(results));
        }

        for panel in &self.panels {
            let mut seen = HashSet::new();
            for field in &panel.fields {
                if field.id.trim().is_empty() {
                    issues.push(SchemaIssue::EmptyFieldId {
                        panel: panel.id.clone(),
                    });
                } else if !seen.insert(field.id.as_str()) {
                    issues.push(SchemaIssue::DuplicateFieldId {
                        panel: panel.id.clone(),
                        field: field.id.clone(),
                    });
                }
                match &field.kind {
                    FieldKind::Unsupported(kind) if kind.is_empty() => {
                        issues.push(SchemaIssue::MissingFieldType {
                            field: field.id.clone(),
                        });
                    }
                    FieldKind::Unsupported(kind) => {
                        issues.push(SchemaIssue::UnsupportedFieldType {
                            field: field.id.clone(),
                            kind: kind.clone(),
                        });
                    }
                    _ => {}
                }
                let mut values = HashSet::new();
                for opt in &field.options {
                    if !values.insert(opt.value.as_str()) {
                        issues.push(SchemaIssue::DuplicateOptionValue {
                            field: field.id.clone(),
                            value: opt.value.clone(),
                        });
                    }
                }
            }

            if panel.is_tabs() {
                if panel.tabs.is_empty() {
                    issues.push(SchemaIssue::EmptyTabs {
                        panel: panel.id.clone(),
                    });
                }
                let mut tab_ids = HashSet::new();
                for tab in &panel.tabs {
                    if !tab_ids.insert(tab.id.as_str()) {
                        issues.push(SchemaIssue::DuplicateTabId {
                            tab: tab.id.clone(),
                        });
                    }
                    match &tab.kind {
                        TabKind::Unsupported(kind) if kind.is_empty() => {
                            issues.push(SchemaIssue::MissingTabType {
                                tab: tab.id.clone(),
                            });
                        }
                        TabKind::Unsupported(kind) => {
                            issues.push(SchemaIssue::UnsupportedTabType {
                                tab: tab.id.clone(),
                                kind: kind.clone(),
                            });
                        }
                        TabKind::Table if tab.columns.is_empty() => {
                            issues.push(SchemaIssue::TableWithoutColumns {
                                tab: tab.id.clone(),
                            });
                        }
                        _ => {}
                    }
                }
            }
        }
        issues
    }
}

/// A non-fatal finding about a schema document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    MultipleFormPanels(usize),
    MultipleResultsPanels(usize),
    EmptyFieldId { panel: String },
    DuplicateFieldId { panel: String, field: String },
    DuplicateOptionValue { field: String, value: String },
    MissingFieldType { field: String },
    UnsupportedFieldType { field: String, kind: String },
    MissingTabType { tab: String },
    UnsupportedTabType { tab: String, kind: String },
    DuplicateTabId { tab: String },
    EmptyTabs { panel: String },
    TableWithoutColumns { tab: String },
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaIssue::MultipleFormPanels(n) => {
                write!(f, "{n} form panels declared; only the first is rendered")
            }
            SchemaIssue::MultipleResultsPanels(n) => {
                write!(f, "{n} tabs panels declared; only the first is rendered")
            }
            SchemaIssue::EmptyFieldId { panel } => write!(f, "panel '{panel}' has a field with an empty id"),
            SchemaIssue::DuplicateFieldId { panel, field } => {
                write!(f, "panel '{panel}' declares field '{field}' more than once")
            }
            SchemaIssue::DuplicateOptionValue { field, value } => {
                write!(f, "field '{field}' repeats option value '{value}'")
            }
            SchemaIssue::MissingFieldType { field } => write!(f, "field '{field}' has no type"),
            SchemaIssue::UnsupportedFieldType { field, kind } => {
                write!(f, "field '{field}' has unsupported type '{kind}'")
            }
            SchemaIssue::MissingTabType { tab } => write!(f, "tab '{tab}' has no type"),
            SchemaIssue::UnsupportedTabType { tab, kind } => {
                write!(f, "tab '{tab}' has unsupported type '{kind}'")
            }
            SchemaIssue::DuplicateTabId { tab } => write!(f, "tab id '{tab}' is not unique"),
            SchemaIssue::EmptyTabs { panel } => write!(f, "tabs panel '{panel}' has no tabs"),
            SchemaIssue::TableWithoutColumns { tab } => {
                write!(f, "table tab '{tab}' declares no columns")
            }
        }
    }
}

// ─── Panels ──────────────────────────────────────────────────────────

/// One schema-described region of the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub layout: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tabs: Vec<ResultTab>,
}

impl Panel {
    pub fn is_form(&self) -> bool {
        self.layout.starts_with("form")
    }

    pub fn is_tabs(&self) -> bool {
        self.layout == "tabs"
    }
}

// ─── Fields ──────────────────────────────────────────────────────────

/// Declarative description of one input control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adornment: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub full: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub inline: bool,
}

impl FieldDescriptor {
    /// Minimal descriptor; remaining modifiers default to off.
    pub fn new(id: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            kind,
            label: None,
            hint: None,
            placeholder: None,
            value: None,
            options: Vec::new(),
            min: None,
            max: None,
            step: None,
            required: false,
            adornment: None,
            full: false,
            inline: false,
        }
    }

    /// Label text, falling back to the id.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// Supported field control types, with an explicit fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    Text,
    Number,
    Search,
    Textarea,
    Select,
    Switch,
    CheckboxGroup,
    RadioGroup,
    Unsupported(String),
}

impl FieldKind {
    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Search => "search",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Switch => "switch",
            FieldKind::CheckboxGroup => "checkbox-group",
            FieldKind::RadioGroup => "radio-group",
            FieldKind::Unsupported(name) => name.as_str(),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, FieldKind::Unsupported(_))
    }

    /// Whether the type draws from `options`.
    pub fn has_options(&self) -> bool {
        matches!(
            self,
            FieldKind::Select | FieldKind::CheckboxGroup | FieldKind::RadioGroup
        )
    }
}

/// Display name for an unsupported kind; an absent `type` shows as `(missing)`.
pub fn shown_kind(name: &str) -> &str {
    if name.is_empty() { "(missing)" } else { name }
}

/// A missing `type` reads as an unsupported, unnamed kind.
impl Default for FieldKind {
    fn default() -> Self {
        FieldKind::Unsupported(String::new())
    }
}

impl From<String> for FieldKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "text" => FieldKind::Text,
            "number" => FieldKind::Number,
            "search" => FieldKind::Search,
            "textarea" => FieldKind::Textarea,
            "select" => FieldKind::Select,
            "switch" => FieldKind::Switch,
            "checkbox-group" => FieldKind::CheckboxGroup,
            "radio-group" => FieldKind::RadioGroup,
            _ => FieldKind::Unsupported(s),
        }
    }
}

impl From<&str> for FieldKind {
    fn from(s: &str) -> Self {
        FieldKind::from(s.to_string())
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A field's value: scalar for single-valued types, a list for checkbox groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Empty,
}

impl FieldValue {
    /// String form of a scalar value; `None` for lists and empties.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Number(n) => Some(format_number(*n)),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::List(_) | FieldValue::Empty => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Truthiness used for switches: `true`, non-zero numbers and
    /// `"true"`/`"on"`/`"1"` strings.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Number(n) => *n != 0.0,
            FieldValue::Text(s) => matches!(s.as_str(), "true" | "on" | "1" | "yes"),
            FieldValue::List(items) => !items.is_empty(),
            FieldValue::Empty => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Empty => true,
            _ => false,
        }
    }

    /// Whether `value` is selected (list membership, or scalar equality).
    pub fn selects(&self, value: &str) -> bool {
        match self {
            FieldValue::List(items) => items.iter().any(|v| v == value),
            other => other.as_text().as_deref() == Some(value),
        }
    }
}

/// Render a number the way a form input shows it: integers without a
/// trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One selectable option of a select, radio or checkbox group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOption")]
pub struct OptionItem {
    pub value: String,
    pub label: String,
}

impl OptionItem {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Full {
        value: serde_json::Value,
        #[serde(default)]
        label: Option<String>,
    },
    Bare(serde_json::Value),
}

impl From<RawOption> for OptionItem {
    fn from(raw: RawOption) -> Self {
        match raw {
            RawOption::Full { value, label } => {
                let value = json_to_plain(&value);
                let label = label.unwrap_or_else(|| value.clone());
                OptionItem { value, label }
            }
            RawOption::Bare(value) => {
                let value = json_to_plain(&value);
                OptionItem {
                    label: value.clone(),
                    value,
                }
            }
        }
    }
}

// ─── Actions ─────────────────────────────────────────────────────────

/// A button with no inherent behavior; bound externally by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: ActionKind,
}

/// Visual weight of an action button. Unknown kinds read as `Secondary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    Primary,
    Outline,
    #[default]
    Secondary,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Primary => "primary",
            ActionKind::Outline => "outline",
            ActionKind::Secondary => "secondary",
        }
    }
}

impl From<String> for ActionKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "primary" => ActionKind::Primary,
            "outline" => ActionKind::Outline,
            _ => ActionKind::Secondary,
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

// ─── Result tabs ─────────────────────────────────────────────────────

/// One mutually-exclusive view within a results panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTab {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: TabKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TabKind {
    Chart,
    Table,
    Unsupported(String),
}

impl TabKind {
    pub fn as_str(&self) -> &str {
        match self {
            TabKind::Chart => "chart",
            TabKind::Table => "table",
            TabKind::Unsupported(name) => name.as_str(),
        }
    }
}

impl Default for TabKind {
    fn default() -> Self {
        TabKind::Unsupported(String::new())
    }
}

impl From<String> for TabKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "chart" => TabKind::Chart,
            "table" => TabKind::Table,
            _ => TabKind::Unsupported(s),
        }
    }
}

impl From<TabKind> for String {
    fn from(kind: TabKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A table column: which row key to read and how to format it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub format: ColumnFormat,
}

impl ColumnSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>, format: ColumnFormat) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            format,
        }
    }

    /// Header text, falling back to the key.
    pub fn header(&self) -> &str {
        if self.label.is_empty() {
            &self.key
        } else {
            &self.label
        }
    }
}

/// Cell formatting rule. Unknown formats render the raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnFormat {
    Percent,
    Float,
    Int,
    #[default]
    Raw,
}

impl ColumnFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnFormat::Percent => "percent",
            ColumnFormat::Float => "float",
            ColumnFormat::Int => "int",
            ColumnFormat::Raw => "none",
        }
    }
}

impl From<String> for ColumnFormat {
    fn from(s: String) -> Self {
        match s.as_str() {
            "percent" => ColumnFormat::Percent,
            "float" => ColumnFormat::Float,
            "int" => ColumnFormat::Int,
            _ => ColumnFormat::Raw,
        }
    }
}

impl From<ColumnFormat> for String {
    fn from(format: ColumnFormat) -> Self {
        format.as_str().to_string()
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn is_false(b: &bool) -> bool {
    !*b
}

/// Plain string form of a JSON scalar (strings unquoted, null empty).
pub(crate) fn json_to_plain(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Accept `"1.0"`, `1` or `1.0` for string-typed header fields.
fn loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(json_to_plain(&value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_schema_parses() {
        let schema = PanelSchema::builtin().unwrap();
        assert!(schema.config_panel().is_some());
        assert!(schema.results_panel().is_some());
        assert!(schema.issues().is_empty(), "{:?}", schema.issues());
    }

    #[test]
    fn unknown_field_type_is_preserved() {
        let json = r#"{"pack":"p","version":1,"panels":[{"id":"c","layout":"form",
            "fields":[{"id":"x","type":"colorpicker"}]}]}"#;
        let schema = PanelSchema::from_json(json).unwrap();
        assert_eq!(schema.version, "1");
        let field = &schema.panels[0].fields[0];
        assert_eq!(field.kind, FieldKind::Unsupported("colorpicker".into()));
        assert_eq!(
            schema.issues(),
            vec![SchemaIssue::UnsupportedFieldType {
                field: "x".into(),
                kind: "colorpicker".into()
            }]
        );
    }

    #[test]
    fn missing_type_loads_as_placeholder() {
        let json = r#"{"panels":[
            {"id":"c","layout":"form","fields":[{"id":"a","type":"text"},{"id":"b"}]},
            {"id":"r","layout":"tabs","tabs":[{"id":"t","label":"T"}]}]}"#;
        let schema = PanelSchema::from_json(json).unwrap();
        let field = &schema.panels[0].fields[1];
        assert_eq!(field.kind, FieldKind::Unsupported(String::new()));
        assert_eq!(schema.panels[1].tabs[0].kind, TabKind::Unsupported(String::new()));
        assert_eq!(
            schema.issues(),
            vec![
                SchemaIssue::MissingFieldType { field: "b".into() },
                SchemaIssue::MissingTabType { tab: "t".into() },
            ]
        );

        let form = crate::layout::render_form(schema.config_panel().unwrap());
        assert_eq!(form.find_by_class("field").len(), 2);
        assert!(form.text_content().contains("Unsupported field type: (missing)"));
        let results = crate::layout::render_results(schema.results_panel().unwrap());
        assert!(results.text_content().contains("Unsupported tab type: (missing)"));
    }

    #[test]
    fn options_accept_bare_and_full_forms() {
        let json = r#"{"id":"f","type":"select","options":["SPY",{"value":1,"label":"One"},{"value":"x"}]}"#;
        let field: FieldDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(field.options[0], OptionItem::new("SPY", "SPY"));
        assert_eq!(field.options[1], OptionItem::new("1", "One"));
        assert_eq!(field.options[2], OptionItem::new("x", "x"));
    }

    #[test]
    fn field_values_deserialize_by_shape() {
        let v: FieldValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, FieldValue::Bool(true));
        let v: FieldValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(v, FieldValue::Number(2.5));
        let v: FieldValue = serde_json::from_str("\"a\"").unwrap();
        assert_eq!(v, FieldValue::Text("a".into()));
        let v: FieldValue = serde_json::from_str("[\"a\",\"b\"]").unwrap();
        assert_eq!(v, FieldValue::List(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn panels_found_by_layout_not_name() {
        let json = r#"{"panels":[
            {"id":"results","layout":"tabs","tabs":[]},
            {"id":"anything","layout":"form-2col"}]}"#;
        let schema = PanelSchema::from_json(json).unwrap();
        assert_eq!(schema.config_panel().unwrap().id, "anything");
        assert_eq!(schema.results_panel().unwrap().id, "results");
    }

    #[test]
    fn tabs_layout_must_match_exactly() {
        let json = r#"{"panels":[{"id":"r","layout":"tabs-vertical"}]}"#;
        let schema = PanelSchema::from_json(json).unwrap();
        assert!(schema.results_panel().is_none());
    }

    #[test]
    fn lint_reports_duplicates() {
        let json = r#"{"panels":[{"id":"c","layout":"form","fields":[
            {"id":"a","type":"text"},
            {"id":"a","type":"radio-group","options":["x","x"]}]}]}"#;
        let issues = PanelSchema::from_json(json).unwrap().issues();
        assert!(issues.contains(&SchemaIssue::DuplicateFieldId {
            panel: "c".into(),
            field: "a".into()
        }));
        assert!(issues.contains(&SchemaIssue::DuplicateOptionValue {
            field: "a".into(),
            value: "x".into()
        }));
    }

    #[test]
    fn unknown_column_format_reads_raw() {
        let col: ColumnSpec = serde_json::from_str(r#"{"key":"k","format":"bps"}"#).unwrap();
        assert_eq!(col.format, ColumnFormat::Raw);
        assert_eq!(col.header(), "k");
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = PanelSchema::builtin().unwrap();
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.version = "99".into();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = PanelSchema::load(Path::new("/nonexistent/pack.json")).unwrap_err();
        assert!(matches!(err, SchemaError::Io { .. }));
    }
}
