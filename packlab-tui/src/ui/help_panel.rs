//! Panel 4 — Help: keyboard shortcuts.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Global Navigation");
    key(&mut lines, "1-4", "Switch to panel by number");
    key(&mut lines, "Tab / Shift+Tab", "Cycle panels forward / back");
    key(&mut lines, "e", "Open error history overlay");
    key(&mut lines, "q", "Quit");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 1: Form");
    key(&mut lines, "j / k", "Move between fields");
    key(&mut lines, "Enter", "Edit text and number fields (Enter commits, Esc cancels)");
    key(&mut lines, "h / l", "Cycle select / radio, move inside checkbox groups");
    key(&mut lines, "Space", "Toggle switch or checkbox option");
    key(&mut lines, "r", "Run the bound action");
    key(&mut lines, "x", "Reset the form to schema defaults");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 2: Results");
    key(&mut lines, "h / l", "Previous / next tab");
    key(&mut lines, "j / k", "Scroll table rows");
    key(&mut lines, "w", "Export the selected table to CSV");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 3: Wizard");
    key(&mut lines, "j / k", "Move between Basics selectors");
    key(&mut lines, "h / l", "Cycle the selected value");
    key(&mut lines, "n / Enter", "Next step (blocked until the step is complete)");
    key(&mut lines, "p / Backspace", "Previous step");
    key(&mut lines, "g", "Generate preview");
    key(&mut lines, "s", "Save on the final step");
    key(&mut lines, "Esc", "Abandon the wizard");
    lines.push(Line::from(""));

    section(&mut lines, "Schema");
    key(&mut lines, "pack", &format!(
        "{} v{} ({})",
        app.screen.schema().pack,
        app.screen.schema().version,
        app.screen.schema().fingerprint().chars().take(12).collect::<String>()
    ));

    f.render_widget(Paragraph::new(lines), area);
}

fn section(lines: &mut Vec<Line<'_>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key(lines: &mut Vec<Line<'_>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>20}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
