//! Panel orchestrator — wires a whole schema into one root node and binds
//! the run action to a compute-and-redraw cycle.
//!
//! Rendering is a full rebuild: the root is cleared and recreated from the
//! schema. [`PanelScreen`] keeps the inputs a rebuild needs (schema, theme,
//! latest compute result, selected tab) so the tree is always a function of
//! them.

use crate::chart::{draw_line_chart, Surface, CHART_HEIGHT, CHART_WIDTH};
use crate::compute::{ComputeBoundary, ComputeError, ComputeResult};
use crate::controls::{self, read_form, FormValues};
use crate::layout::{
    activate_tab, activate_tab_index, active_tab_index, render_actions, render_form, render_results,
};
use crate::node::{Node, Tag};
use crate::schema::{PanelSchema, TabKind};
use crate::table::{populate_table, read_table, ExportError, TableSnapshot};
use crate::theme::ThemeContext;

/// Id of the preview block appended after the panels.
pub const PREVIEW_ID: &str = "schema-preview";
/// Id of the toolbar holding top-level actions.
pub const TOOLBAR_ID: &str = "toolbar";

/// What a render produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderSummary {
    pub config_panel: Option<String>,
    pub results_panel: Option<String>,
    pub actions: Vec<String>,
}

/// Clear `root` and rebuild it from `schema`: config panel, results panel,
/// top-level actions and a preview block, each only if present.
pub fn render_ui_panels(root: &mut Node, schema: &PanelSchema) -> RenderSummary {
    root.clear();
    let mut summary = RenderSummary::default();

    if let Some(panel) = schema.config_panel() {
        root.children.push(render_form(panel));
        summary.config_panel = Some(panel.id.clone());
    }
    if let Some(panel) = schema.results_panel() {
        root.children.push(render_results(panel));
        summary.results_panel = Some(panel.id.clone());
    }
    if !schema.actions.is_empty() {
        root.children
            .push(render_actions(&schema.actions).with_id(TOOLBAR_ID));
    }
    root.children.push(render_preview(schema));

    summary.actions = root
        .find_all(&|n| n.tag == Tag::Button && n.has_attr("data-action"))
        .into_iter()
        .filter_map(|n| n.attr("data-action").map(str::to_string))
        .collect();

    tracing::debug!(
        pack = %schema.pack,
        config = ?summary.config_panel,
        results = ?summary.results_panel,
        nodes = root.count(),
        "panels rendered"
    );
    summary
}

fn render_preview(schema: &PanelSchema) -> Node {
    let fingerprint = schema.fingerprint();
    let json = serde_json::to_string_pretty(schema).unwrap_or_default();
    Node::new(Tag::Section)
        .with_id(PREVIEW_ID)
        .with_class("preview")
        .with_child(Node::new(Tag::H2).with_text("Preview"))
        .with_child(
            Node::new(Tag::Div)
                .with_class("meta")
                .with_text(format!("pack {} v{}", schema.pack, schema.version)),
        )
        .with_child(
            Node::new(Tag::Small)
                .with_class("fingerprint")
                .with_text(fingerprint.chars().take(12).collect::<String>()),
        )
        .with_child(Node::new(Tag::Pre).with_text(json))
}

// ─── Screen ──────────────────────────────────────────────────────────

/// Result of clicking an action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// No behavior is bound to this id (or the id is not on screen).
    Unbound,
    /// The run action fired; hand the request to a compute boundary.
    RunRequested(RunRequest),
}

/// A pending compute call.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub ticket: u64,
    pub inputs: FormValues,
}

/// What applying a result touched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplySummary {
    pub ticket: u64,
    /// A newer request had already been issued when this one landed.
    pub stale: bool,
    pub charts: usize,
    pub tables: Vec<(String, usize)>,
    pub selected: Option<String>,
}

/// A rendered schema plus the state needed to redraw it.
#[derive(Debug, Clone)]
pub struct PanelScreen {
    schema: PanelSchema,
    theme: ThemeContext,
    root: Node,
    summary: RenderSummary,
    run_binding: Option<String>,
    issued: u64,
    last_result: Option<ComputeResult>,
}

impl PanelScreen {
    pub fn new(schema: PanelSchema, theme: ThemeContext) -> Self {
        let mut screen = Self {
            schema,
            theme,
            root: Node::root(),
            summary: RenderSummary::default(),
            run_binding: None,
            issued: 0,
            last_result: None,
        };
        screen.render();
        screen
    }

    /// Full redraw. Control edits are discarded; the latest compute result
    /// and the selected tab are re-applied.
    pub fn render(&mut self) -> &RenderSummary {
        let selected = active_tab_index(&self.root);
        self.summary = render_ui_panels(&mut self.root, &self.schema);
        if self.last_result.is_some() {
            self.paint_result(false);
        }
        if let Some(index) = selected {
            self.select_tab_index(index);
        }
        &self.summary
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn schema(&self) -> &PanelSchema {
        &self.schema
    }

    pub fn theme(&self) -> &ThemeContext {
        &self.theme
    }

    pub fn summary(&self) -> &RenderSummary {
        &self.summary
    }

    pub fn last_result(&self) -> Option<&ComputeResult> {
        self.last_result.as_ref()
    }

    /// Current form values, read from the tree.
    pub fn form_values(&self) -> FormValues {
        read_form(&self.root)
    }

    /// Mutable access to one control root, for front-end edits.
    pub fn control_mut(&mut self, field_id: &str) -> Option<&mut Node> {
        controls::control_mut(&mut self.root, field_id)
    }

    pub fn control(&self, field_id: &str) -> Option<&Node> {
        controls::control(&self.root, field_id)
    }

    /// Bind the compute cycle to `action_id`. An id that is not on screen
    /// leaves the screen unbound; that is not an error.
    pub fn bind_run(&mut self, action_id: &str) -> bool {
        if self.summary.actions.iter().any(|a| a == action_id) {
            self.run_binding = Some(action_id.to_string());
            true
        } else {
            tracing::debug!(action = action_id, "run action not in schema; left unbound");
            self.run_binding = None;
            false
        }
    }

    pub fn run_binding(&self) -> Option<&str> {
        self.run_binding.as_deref()
    }

    /// Click an action. Only the bound run action does anything.
    pub fn trigger(&mut self, action_id: &str) -> ActionOutcome {
        if self.run_binding.as_deref() != Some(action_id) {
            return ActionOutcome::Unbound;
        }
        self.issued += 1;
        ActionOutcome::RunRequested(RunRequest {
            ticket: self.issued,
            inputs: self.form_values(),
        })
    }

    /// Push a compute result into the tree: redraw every chart canvas,
    /// force-select the first chart tab, repopulate every table the result
    /// has rows for. Targets are looked up in the current tree. Results are
    /// applied in arrival order; the last one to land wins.
    pub fn apply_result(&mut self, ticket: u64, result: ComputeResult) -> ApplySummary {
        let stale = ticket < self.issued;
        if stale {
            tracing::warn!(ticket, latest = self.issued, "applying out-of-order compute result");
        }
        self.last_result = Some(result);
        let mut summary = self.paint_result(true);
        summary.ticket = ticket;
        summary.stale = stale;
        summary
    }

    /// Trigger + compute + apply in one call. `Ok(None)` when the action is
    /// unbound. A compute failure leaves the tree untouched.
    pub fn run_with(
        &mut self,
        action_id: &str,
        compute: &dyn ComputeBoundary,
    ) -> Result<Option<ApplySummary>, ComputeError> {
        match self.trigger(action_id) {
            ActionOutcome::Unbound => Ok(None),
            ActionOutcome::RunRequested(request) => {
                let result = compute.compute(&request.inputs)?;
                Ok(Some(self.apply_result(request.ticket, result)))
            }
        }
    }

    /// Select a results tab by id; a repeated id selects its first occurrence.
    pub fn select_tab(&mut self, tab_id: &str) -> bool {
        self.results_mut()
            .is_some_and(|results| activate_tab(results, tab_id))
    }

    /// Select a results tab by its position in the tab bar.
    pub fn select_tab_index(&mut self, index: usize) -> bool {
        self.results_mut()
            .is_some_and(|results| activate_tab_index(results, index))
    }

    fn results_mut(&mut self) -> Option<&mut Node> {
        let panel = self.schema.results_panel()?;
        self.root.find_by_id_mut(&format!("panel-{}", panel.id))
    }

    /// Read a table view back out, e.g. for CSV export.
    pub fn export_table(&self, tab_id: &str) -> Result<TableSnapshot, ExportError> {
        self.root
            .find_by_id(&format!("view-{tab_id}"))
            .filter(|view| view.find(&|n| n.tag == Tag::Table).is_some())
            .map(read_table)
            .ok_or_else(|| ExportError::MissingTable(tab_id.to_string()))
    }

    fn paint_result(&mut self, force_chart: bool) -> ApplySummary {
        let mut summary = ApplySummary::default();
        let (Some(result), Some(panel)) = (self.last_result.as_ref(), self.schema.results_panel())
        else {
            return summary;
        };

        let mut first_chart = None;
        let charts = panel.tabs.iter().enumerate().filter(|(_, t)| t.kind == TabKind::Chart);
        for (index, tab) in charts {
            let Some(canvas) = self.root.find_by_id_mut(&format!("canvas-{}", tab.id)) else {
                continue;
            };
            let surface = canvas
                .surface
                .get_or_insert_with(|| Surface::new(CHART_WIDTH, CHART_HEIGHT));
            draw_line_chart(surface, &result.equity, &self.theme);
            summary.charts += 1;
            first_chart.get_or_insert((index, tab.id.clone()));
        }

        if force_chart {
            if let Some((index, _)) = first_chart {
                if let Some(results) = self.root.find_by_id_mut(&format!("panel-{}", panel.id)) {
                    activate_tab_index(results, index);
                }
            }
            summary.selected = first_chart.map(|(_, id)| id);
        }

        for tab in panel.tabs.iter().filter(|t| t.kind == TabKind::Table) {
            let Some(rows) = result.rows_for(&tab.id) else {
                continue;
            };
            if let Some(view) = self.root.find_by_id_mut(&format!("view-{}", tab.id)) {
                let written = populate_table(view, &rows, &tab.columns);
                summary.tables.push((tab.id.clone(), written));
            }
        }

        tracing::debug!(charts = summary.charts, tables = summary.tables.len(), "result painted");
        summary
    }
}
