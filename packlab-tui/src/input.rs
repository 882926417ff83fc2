//! Keyboard input dispatch — overlays → text edit → global keys → panel handlers.

use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use packlab_core::controls;
use packlab_core::layout::{active_tab_index, tab_ids};
use packlab_core::schema::{FieldKind, FieldValue, format_number, shown_kind};
use packlab_core::wizard::{BasicsField, Outcome, Rejection};
use packlab_core::{WizardEvent, WizardStep};

use crate::app::{AppState, ErrorCategory, Overlay, Panel};

/// Handle a key event.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    if app.overlay == Overlay::ErrorHistory {
        handle_error_overlay(app, key);
        return;
    }

    // 2. An open text edit captures every key.
    if app.form.editing.is_some() {
        handle_edit_key(app, key);
        return;
    }

    // 3. Global keys (always available).
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char(c @ '1'..='4') => {
            if let Some(panel) = c.to_digit(10).and_then(|d| Panel::from_index(d as usize - 1)) {
                app.switch_panel(panel);
            }
            return;
        }
        KeyCode::Tab => {
            app.switch_panel(app.active_panel.next());
            return;
        }
        KeyCode::BackTab => {
            app.switch_panel(app.active_panel.prev());
            return;
        }
        KeyCode::Char('e') => {
            app.overlay = Overlay::ErrorHistory;
            app.error_scroll = 0;
            return;
        }
        _ => {}
    }

    // 4. Panel-specific keys.
    match app.active_panel {
        Panel::Form => handle_form_key(app, key),
        Panel::Results => handle_results_key(app, key),
        Panel::Wizard => handle_wizard_key(app, key),
        Panel::Help => {} // display only
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

// ─── Form ────────────────────────────────────────────────────────────

fn handle_form_key(app: &mut AppState, key: KeyEvent) {
    let field_count = app.form_fields().len();
    let Some(field) = app.current_field() else {
        if key.code == KeyCode::Char('r') {
            run(app);
        }
        return;
    };

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if app.form.cursor + 1 < field_count {
                app.form.cursor += 1;
                app.form.option_cursor = 0;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.form.cursor = app.form.cursor.saturating_sub(1);
            app.form.option_cursor = 0;
        }
        KeyCode::Char('h') | KeyCode::Left => step_option(app, &field.id, &field.kind, -1),
        KeyCode::Char('l') | KeyCode::Right => step_option(app, &field.id, &field.kind, 1),
        KeyCode::Enter | KeyCode::Char(' ') => activate_field(app, &field.id, &field.kind),
        KeyCode::Char('r') => run(app),
        KeyCode::Char('x') => app.reset_form(),
        _ => {}
    }
}

fn run(app: &mut AppState) {
    let action = app.config.panels.run_action.clone();
    app.trigger_action(&action);
}

fn step_option(app: &mut AppState, field_id: &str, kind: &FieldKind, delta: i32) {
    match kind {
        FieldKind::Select | FieldKind::RadioGroup => {
            if let Some(root) = app.screen.control_mut(field_id) {
                controls::cycle_option(root, delta);
            }
        }
        FieldKind::CheckboxGroup => {
            let count = app
                .screen
                .control(field_id)
                .map(|root| controls::option_values(root).len())
                .unwrap_or(0);
            if count > 0 {
                let next = (app.form.option_cursor as i32 + delta).rem_euclid(count as i32);
                app.form.option_cursor = next as usize;
            }
        }
        _ => {}
    }
}

fn activate_field(app: &mut AppState, field_id: &str, kind: &FieldKind) {
    match kind {
        FieldKind::Text | FieldKind::Search | FieldKind::Number | FieldKind::Textarea => {
            let current = app
                .screen
                .control(field_id)
                .map(controls::read_value)
                .map(|v| value_text(&v))
                .unwrap_or_default();
            app.form.editing = Some(current);
        }
        FieldKind::Switch => {
            if let Some(root) = app.screen.control_mut(field_id) {
                controls::toggle_switch(root);
            }
        }
        FieldKind::CheckboxGroup => {
            let cursor = app.form.option_cursor;
            if let Some(root) = app.screen.control_mut(field_id) {
                if let Some(value) = controls::option_values(root).get(cursor).cloned() {
                    controls::toggle_option(root, &value);
                }
            }
        }
        FieldKind::Select | FieldKind::RadioGroup => step_option(app, field_id, kind, 1),
        FieldKind::Unsupported(name) => {
            app.set_warning(format!("'{}' fields cannot be edited", shown_kind(name)));
        }
    }
}

fn handle_edit_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.form.editing = None;
        }
        KeyCode::Enter => {
            let Some(text) = app.form.editing.take() else {
                return;
            };
            let Some(field) = app.current_field() else {
                return;
            };
            let applied = app
                .screen
                .control_mut(&field.id)
                .is_some_and(|root| controls::set_text(root, &text));
            if !applied {
                app.set_warning(format!("'{text}' is not a valid {}", field.kind.as_str()));
            }
        }
        KeyCode::Backspace => {
            if let Some(buf) = app.form.editing.as_mut() {
                buf.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(buf) = app.form.editing.as_mut() {
                buf.push(c);
            }
        }
        _ => {}
    }
}

/// Plain text of a form value, as shown and edited in the TUI.
pub fn value_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Bool(true) => "on".to_string(),
        FieldValue::Bool(false) => "off".to_string(),
        FieldValue::Number(n) => format_number(*n),
        FieldValue::Text(s) => s.clone(),
        FieldValue::List(items) => items.join(", "),
        FieldValue::Empty => String::new(),
    }
}

// ─── Results ─────────────────────────────────────────────────────────

fn handle_results_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => cycle_tab(app, -1),
        KeyCode::Char('l') | KeyCode::Right => cycle_tab(app, 1),
        KeyCode::Char('j') | KeyCode::Down => {
            app.results.scroll += 1;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.results.scroll = app.results.scroll.saturating_sub(1);
        }
        KeyCode::Char('r') => run(app),
        KeyCode::Char('w') => {
            app.export_active_table(Path::new("."));
        }
        _ => {}
    }
}

fn cycle_tab(app: &mut AppState, delta: i32) {
    let count = tab_ids(app.screen.root()).len();
    if count == 0 {
        return;
    }
    let current = active_tab_index(app.screen.root()).unwrap_or(0);
    let next = (current as i32 + delta).rem_euclid(count as i32) as usize;
    app.screen.select_tab_index(next);
    app.results.scroll = 0;
}

// ─── Wizard ──────────────────────────────────────────────────────────

fn handle_wizard_key(app: &mut AppState, key: KeyEvent) {
    let step = app.wizard_step();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down if step == WizardStep::Basics => {
            if app.wizard_ui.cursor + 1 < BasicsField::ALL.len() {
                app.wizard_ui.cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up if step == WizardStep::Basics => {
            app.wizard_ui.cursor = app.wizard_ui.cursor.saturating_sub(1);
        }
        KeyCode::Char('h') | KeyCode::Left => cycle_wizard_choice(app, -1),
        KeyCode::Char('l') | KeyCode::Right => cycle_wizard_choice(app, 1),
        KeyCode::Char('n') | KeyCode::Enter => wizard_event(app, WizardEvent::Next),
        KeyCode::Char('p') | KeyCode::Backspace => wizard_event(app, WizardEvent::Prev),
        KeyCode::Char('g') => wizard_event(app, WizardEvent::GeneratePreview),
        KeyCode::Char('s') => wizard_event(app, WizardEvent::Save),
        KeyCode::Esc => {
            app.wizard.abandon();
            app.wizard_ui = Default::default();
            app.set_warning("Wizard abandoned");
        }
        _ => {}
    }
}

/// Next value in `[""] + options`, wrapping.
fn cycle_value(options: &[String], current: &str, delta: i32) -> String {
    let len = options.len() as i32 + 1;
    let at = options
        .iter()
        .position(|o| o == current)
        .map_or(0, |i| i as i32 + 1);
    let next = (at + delta).rem_euclid(len);
    if next == 0 {
        String::new()
    } else {
        options[next as usize - 1].clone()
    }
}

fn cycle_wizard_choice(app: &mut AppState, delta: i32) {
    let catalog = app.wizard.catalog();
    let acc = &app.wizard.state().accumulated;
    let event = match app.wizard_step() {
        WizardStep::Basics => {
            let field = BasicsField::ALL[app.wizard_ui.cursor.min(BasicsField::ALL.len() - 1)];
            let current = acc.basics.as_ref().map(|b| b.get(field)).unwrap_or("");
            WizardEvent::SetBasics(field, cycle_value(catalog.options(field), current, delta))
        }
        WizardStep::Indicators => {
            let names: Vec<String> = catalog.indicator_sets.iter().map(|s| s.name.clone()).collect();
            let current = acc.indicators.as_ref().map_or("", |s| s.name.as_str());
            match non_empty(cycle_value(&names, current, delta), &names, delta) {
                Some(name) => WizardEvent::SelectIndicatorSet(name),
                None => return,
            }
        }
        WizardStep::Policy => {
            let names: Vec<String> = catalog.policy_templates.iter().map(|p| p.name.clone()).collect();
            let current = acc.policy.as_ref().map_or("", |p| p.name.as_str());
            match non_empty(cycle_value(&names, current, delta), &names, delta) {
                Some(name) => WizardEvent::SelectPolicy(name),
                None => return,
            }
        }
        WizardStep::Preview | WizardStep::Save => return,
    };
    wizard_event(app, event);
}

/// Skip the blank slot for selectors that cannot be cleared.
fn non_empty(value: String, names: &[String], delta: i32) -> Option<String> {
    if !value.is_empty() {
        return Some(value);
    }
    if delta > 0 {
        names.first().cloned()
    } else {
        names.last().cloned()
    }
}

fn wizard_event(app: &mut AppState, event: WizardEvent) {
    match app.wizard.transition(event) {
        Ok(Outcome::Moved { to, .. }) => {
            app.wizard_ui.cursor = 0;
            app.set_status(format!("Step {to}"));
        }
        Ok(Outcome::PreviewReady) => app.set_status("Preview generated"),
        Ok(Outcome::Saved(report)) => {
            app.set_status(format!(
                "Saved {}; redirecting to {} in {:.1}s",
                report.strategy_id,
                report.redirect_target,
                report.redirect_in.as_secs_f64()
            ));
            app.wizard_ui.last_report = Some(report);
        }
        Ok(Outcome::Updated) => {}
        Err(Rejection::Compute(e)) => {
            app.push_error(ErrorCategory::Wizard, e.to_string(), "preview".into());
        }
        Err(rejection) => app.set_warning(rejection.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use proptest::prelude::*;

    use packlab_core::layout::{selected_tabs, visible_views};

    use crate::app::tests::test_app;
    use crate::worker::WorkerResponse;

    fn press(app: &mut AppState, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut AppState, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn number_keys_switch_panels() {
        let (mut app, _rx, _tx) = test_app();
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.active_panel, Panel::Wizard);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.active_panel, Panel::Help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }

    #[test]
    fn editing_a_text_field_updates_the_tree() {
        let (mut app, _rx, _tx) = test_app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.form.editing.as_deref(), Some("SPY"));
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "qqq");
        press(&mut app, KeyCode::Enter);
        assert!(app.form.editing.is_none());
        assert_eq!(
            app.screen.form_values().get("ticker"),
            Some(&FieldValue::Text("qqq".into()))
        );
    }

    #[test]
    fn q_while_editing_is_text_not_quit() {
        let (mut app, _rx, _tx) = test_app();
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running);
        press(&mut app, KeyCode::Esc);
        assert!(app.form.editing.is_none());
    }

    #[test]
    fn select_cycles_with_h_and_l() {
        let (mut app, _rx, _tx) = test_app();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(
            app.screen.form_values().get("assetType"),
            Some(&FieldValue::Text("EQ".into()))
        );
        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(
            app.screen.form_values().get("assetType"),
            Some(&FieldValue::Text("OPT".into()))
        );
    }

    #[test]
    fn wizard_walkthrough_by_keys() {
        let (mut app, _rx, _tx) = test_app();
        press(&mut app, KeyCode::Char('3'));
        for _ in 0..4 {
            press(&mut app, KeyCode::Char('l'));
            press(&mut app, KeyCode::Char('j'));
        }
        assert_eq!(app.wizard.state().derived_id.as_deref(), Some("spy_etf_0dte_hourly"));
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.wizard_step(), WizardStep::Indicators);
        assert!(matches!(app.status_message, Some((_, crate::app::StatusLevel::Warning))));

        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('s'));
        let report = app.wizard_ui.last_report.as_ref().unwrap();
        assert_eq!(report.acknowledgements.len(), 5);

        press(&mut app, KeyCode::Char('1'));
        assert!(app.wizard.navigation().unwrap().is_cancelled());
    }

    #[test]
    fn cycle_value_includes_blank_slot() {
        let opts = vec!["a".to_string(), "b".to_string()];
        assert_eq!(cycle_value(&opts, "", 1), "a");
        assert_eq!(cycle_value(&opts, "b", 1), "");
        assert_eq!(cycle_value(&opts, "", -1), "b");
    }

    fn results_app() -> AppState {
        let (mut app, _rx, _tx) = test_app();
        app.trigger_action("run");
        app.handle_worker_response(WorkerResponse::RunComplete {
            ticket: 1,
            result: Box::new(Default::default()),
        });
        app.switch_panel(Panel::Results);
        app
    }

    proptest! {
        #[test]
        fn tab_keys_keep_one_tab_selected(keys in prop::collection::vec(prop_oneof![
            Just(KeyCode::Char('h')),
            Just(KeyCode::Char('l')),
            Just(KeyCode::Char('j')),
            Just(KeyCode::Left),
            Just(KeyCode::Right),
        ], 0..30)) {
            let mut app = results_app();
            for code in keys {
                press(&mut app, code);
                prop_assert_eq!(selected_tabs(app.screen.root()).len(), 1);
                prop_assert_eq!(visible_views(app.screen.root()).len(), 1);
            }
        }
    }
}
