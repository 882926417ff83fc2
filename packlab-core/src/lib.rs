//! PackLab Core — schema-driven panels and the strategy wizard.
//!
//! This crate contains everything the front ends share:
//! - Panel schema model and lint
//! - Field control factory and form value access
//! - Layout engine (form grid, tabbed results)
//! - Line chart and table renderers
//! - Panel orchestrator with run binding
//! - Five-step wizard state machine
//! - Application config

pub mod chart;
pub mod compute;
pub mod config;
pub mod controls;
pub mod layout;
pub mod node;
pub mod orchestrator;
pub mod schema;
pub mod table;
pub mod theme;
pub mod wizard;

pub use compute::{ComputeBoundary, ComputeError, ComputeResult, DemoCompute};
pub use config::{AppConfig, ConfigError};
pub use node::{Node, Tag};
pub use orchestrator::{render_ui_panels, ActionOutcome, PanelScreen, RunRequest};
pub use schema::{PanelSchema, SchemaError};
pub use theme::ThemeContext;
pub use wizard::{Wizard, WizardCatalog, WizardEvent, WizardStep};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types handed to the TUI worker thread are Send.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<ComputeResult>();
        require_sync::<ComputeResult>();
        require_send::<controls::FormValues>();
        require_sync::<controls::FormValues>();
        require_send::<ComputeError>();
        require_send::<DemoCompute>();
        require_sync::<DemoCompute>();
        require_send::<PanelSchema>();
        require_sync::<PanelSchema>();
        require_send::<Wizard>();
    }
}
