//! Application state — single-owner, main-thread only.
//!
//! All TUI state lives here. The worker thread communicates via channels.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender};

use chrono::NaiveDateTime;

use packlab_core::config::AppConfig;
use packlab_core::layout::active_tab;
use packlab_core::schema::FieldDescriptor;
use packlab_core::table::write_csv;
use packlab_core::wizard::{SaveReport, WizardStep};
use packlab_core::{ActionOutcome, PanelScreen, Wizard};

use crate::worker::{WorkerCommand, WorkerResponse};

const ERROR_HISTORY_CAP: usize = 50;

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Form,
    Results,
    Wizard,
    Help,
}

impl Panel {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        match self {
            Panel::Form => 0,
            Panel::Results => 1,
            Panel::Wizard => 2,
            Panel::Help => 3,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Panel::Form),
            1 => Some(Panel::Results),
            2 => Some(Panel::Wizard),
            3 => Some(Panel::Help),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Form => "Form",
            Panel::Results => "Results",
            Panel::Wizard => "Wizard",
            Panel::Help => "Help",
        }
    }

    /// Panel named by a navigation target, case-insensitive.
    pub fn from_target(target: &str) -> Option<Self> {
        (0..Self::COUNT)
            .filter_map(Self::from_index)
            .find(|p| p.label().eq_ignore_ascii_case(target.trim()))
    }

    pub fn next(self) -> Panel {
        Panel::from_index((self.index() + 1) % Self::COUNT).unwrap_or(Panel::Form)
    }

    pub fn prev(self) -> Panel {
        Panel::from_index((self.index() + Self::COUNT - 1) % Self::COUNT).unwrap_or(Panel::Form)
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

/// Error category for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Schema,
    Compute,
    Wizard,
    Export,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Schema => "SCH",
            ErrorCategory::Compute => "CMP",
            ErrorCategory::Wizard => "WIZ",
            ErrorCategory::Export => "CSV",
        }
    }
}

/// Form panel state — field cursor and an in-progress text edit.
#[derive(Debug, Default)]
pub struct FormPanelState {
    pub cursor: usize,
    /// Highlighted option inside a checkbox group.
    pub option_cursor: usize,
    /// Edit buffer while a text-like field is being typed into.
    pub editing: Option<String>,
}

/// Results panel state.
#[derive(Debug, Default)]
pub struct ResultsPanelState {
    pub scroll: usize,
    /// Ticket of the newest run sent to the worker.
    pub in_flight: Option<u64>,
}

/// Wizard panel state — cursor over the Basics selectors.
#[derive(Debug, Default)]
pub struct WizardPanelState {
    pub cursor: usize,
    pub last_report: Option<SaveReport>,
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    ErrorHistory,
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub active_panel: Panel,
    pub running: bool,

    // Core
    pub screen: PanelScreen,
    pub wizard: Wizard,
    pub config: AppConfig,

    // Panel states
    pub form: FormPanelState,
    pub results: ResultsPanelState,
    pub wizard_ui: WizardPanelState,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,
}

impl AppState {
    pub fn new(
        screen: PanelScreen,
        wizard: Wizard,
        config: AppConfig,
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
    ) -> Self {
        let mut app = Self {
            active_panel: Panel::Form,
            running: true,
            screen,
            wizard,
            config,
            form: FormPanelState::default(),
            results: ResultsPanelState::default(),
            wizard_ui: WizardPanelState::default(),
            worker_tx,
            worker_rx,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            overlay: Overlay::None,
        };
        let action = app.config.panels.run_action.clone();
        if !app.screen.bind_run(&action) {
            app.set_warning(format!("No '{action}' action in schema; runs disabled"));
        }
        app
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    /// Set an info status message.
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    /// Set a warning status message.
    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    /// Switch panels. Leaving the wizard while a post-save redirect is
    /// pending abandons it.
    pub fn switch_panel(&mut self, panel: Panel) {
        if self.active_panel == Panel::Wizard && panel != Panel::Wizard {
            let pending = self.wizard.navigation().is_some_and(|n| n.is_pending());
            if pending {
                self.wizard.abandon();
                self.wizard_ui = WizardPanelState::default();
                self.set_warning("Left the wizard; redirect cancelled");
            }
        }
        self.form.editing = None;
        self.active_panel = panel;
    }

    /// Fields of the config panel, in schema order.
    pub fn form_fields(&self) -> Vec<FieldDescriptor> {
        self.screen
            .schema()
            .config_panel()
            .map(|p| p.fields.clone())
            .unwrap_or_default()
    }

    pub fn current_field(&self) -> Option<FieldDescriptor> {
        self.form_fields().into_iter().nth(self.form.cursor)
    }

    /// Click an action by id. The bound run action goes to the worker.
    pub fn trigger_action(&mut self, action_id: &str) {
        match self.screen.trigger(action_id) {
            ActionOutcome::RunRequested(request) => {
                let ticket = request.ticket;
                let sent = self.worker_tx.send(WorkerCommand::Run {
                    ticket,
                    inputs: request.inputs,
                });
                match sent {
                    Ok(()) => {
                        self.results.in_flight = Some(ticket);
                        self.set_status(format!("Run #{ticket} started..."));
                    }
                    Err(_) => self.push_error(
                        ErrorCategory::Compute,
                        "Worker is not running".into(),
                        format!("run #{ticket}"),
                    ),
                }
            }
            ActionOutcome::Unbound => {
                self.set_warning(format!("Action '{action_id}' has no behavior bound"));
            }
        }
    }

    /// Rebuild the screen from the schema, discarding form edits.
    pub fn reset_form(&mut self) {
        self.screen.render();
        self.form = FormPanelState::default();
        self.set_status("Form reset to schema defaults");
    }

    /// Write the selected table tab to `<dir>/<pack>-<tab>.csv`.
    pub fn export_active_table(&mut self, dir: &Path) -> Option<PathBuf> {
        let Some(tab) = active_tab(self.screen.root()) else {
            self.set_warning("No tab selected");
            return None;
        };
        let snapshot = match self.screen.export_table(&tab) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.set_warning(e.to_string());
                return None;
            }
        };
        let path = dir.join(format!("{}-{tab}.csv", self.screen.schema().pack));
        let written = std::fs::File::create(&path)
            .map_err(|e| e.to_string())
            .and_then(|file| write_csv(&snapshot, file).map_err(|e| e.to_string()));
        match written {
            Ok(()) => {
                self.set_status(format!("Exported {} rows to {}", snapshot.rows.len(), path.display()));
                Some(path)
            }
            Err(e) => {
                self.push_error(ErrorCategory::Export, e, path.display().to_string());
                None
            }
        }
    }

    /// Apply one worker response to the screen.
    pub fn handle_worker_response(&mut self, resp: WorkerResponse) {
        match resp {
            WorkerResponse::RunComplete { ticket, result } => {
                let bars = result.equity.len();
                let applied = self.screen.apply_result(ticket, *result);
                if self.results.in_flight == Some(ticket) {
                    self.results.in_flight = None;
                }
                self.results.scroll = 0;
                if applied.stale {
                    self.set_warning(format!("Run #{ticket} finished late; showing it anyway"));
                } else {
                    self.set_status(format!(
                        "Run #{ticket} complete: {bars} bars, {} tables",
                        applied.tables.len()
                    ));
                }
            }
            WorkerResponse::RunError { ticket, error } => {
                if self.results.in_flight == Some(ticket) {
                    self.results.in_flight = None;
                }
                self.push_error(ErrorCategory::Compute, error, format!("run #{ticket}"));
            }
        }
    }

    /// Fire the wizard's post-save navigation once it is due.
    pub fn tick_wizard(&mut self, now: std::time::Instant) {
        if let Some(target) = self.wizard.poll_navigation(now) {
            self.wizard.reset();
            self.wizard_ui = WizardPanelState::default();
            let panel = Panel::from_target(&target).unwrap_or(Panel::Form);
            self.active_panel = panel;
            self.set_status(format!("Strategy saved; moved to {target}"));
        }
    }

    pub fn wizard_step(&self) -> WizardStep {
        self.wizard.current()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::mpsc;

    use packlab_core::compute::{ComputeBoundary, ComputeResult};
    use packlab_core::wizard::{WizardCatalog, WizardSettings};
    use packlab_core::{PanelSchema, ThemeContext};

    pub(crate) fn test_app() -> (AppState, mpsc::Receiver<WorkerCommand>, mpsc::Sender<WorkerResponse>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let screen = PanelScreen::new(PanelSchema::builtin().unwrap(), ThemeContext::new());
        let wizard = Wizard::new(WizardCatalog::builtin(), WizardSettings::default());
        let app = AppState::new(screen, wizard, AppConfig::default(), cmd_tx, resp_rx);
        (app, cmd_rx, resp_tx)
    }

    #[test]
    fn panel_cycle() {
        assert_eq!(Panel::Form.next(), Panel::Results);
        assert_eq!(Panel::Help.next(), Panel::Form);
        assert_eq!(Panel::Form.prev(), Panel::Help);
        assert_eq!(Panel::Results.prev(), Panel::Form);
    }

    #[test]
    fn panel_from_index() {
        for i in 0..Panel::COUNT {
            let p = Panel::from_index(i).unwrap();
            assert_eq!(p.index(), i);
        }
        assert!(Panel::from_index(Panel::COUNT).is_none());
        assert_eq!(Panel::from_target("results"), Some(Panel::Results));
        assert_eq!(Panel::from_target("strategies"), None);
    }

    #[test]
    fn error_history_caps_at_50() {
        let (mut app, _rx, _tx) = test_app();
        for i in 0..60 {
            app.push_error(ErrorCategory::Compute, format!("error {i}"), String::new());
        }
        assert_eq!(app.error_history.len(), 50);
        assert!(app.error_history[0].message.contains("59"));
    }

    #[test]
    fn run_goes_through_worker_channel() {
        let (mut app, cmd_rx, _tx) = test_app();
        app.trigger_action("run");
        match cmd_rx.try_recv() {
            Ok(WorkerCommand::Run { ticket, inputs }) => {
                assert_eq!(ticket, 1);
                assert!(inputs.contains_key("ticker"));
            }
            other => panic!("expected run command, got {other:?}"),
        }
        assert_eq!(app.results.in_flight, Some(1));
    }

    #[test]
    fn unbound_action_only_warns() {
        let (mut app, cmd_rx, _tx) = test_app();
        app.trigger_action("reset");
        assert!(cmd_rx.try_recv().is_err());
        assert!(matches!(app.status_message, Some((_, StatusLevel::Warning))));
    }

    #[test]
    fn export_writes_selected_table() {
        let (mut app, _rx, _tx) = test_app();
        app.trigger_action("run");
        let result = packlab_core::DemoCompute::default()
            .compute(&app.screen.form_values())
            .unwrap();
        app.handle_worker_response(WorkerResponse::RunComplete {
            ticket: 1,
            result: Box::new(result),
        });
        assert!(app.screen.select_tab("metrics"));

        let dir = tempfile::tempdir().unwrap();
        let path = app.export_active_table(dir.path()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("Metric,Value,Note"));
    }

    #[test]
    fn completed_run_lands_on_screen() {
        let (mut app, _rx, _tx) = test_app();
        app.trigger_action("run");
        app.handle_worker_response(WorkerResponse::RunComplete {
            ticket: 1,
            result: Box::new(ComputeResult {
                equity: vec![1.0, 2.0, 4.0],
                ..Default::default()
            }),
        });
        assert_eq!(app.results.in_flight, None);
        assert_eq!(app.screen.last_result().unwrap().equity.len(), 3);
    }
}
