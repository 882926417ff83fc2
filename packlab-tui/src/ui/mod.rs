//! Top-level UI layout — one panel at a time with a status bar.

pub mod form_panel;
pub mod help_panel;
pub mod overlays;
pub mod results_panel;
pub mod status_bar;
pub mod wizard_panel;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders};

use crate::app::{AppState, Overlay, Panel};
use crate::theme;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    // Split: main area + 1-line status bar.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    let main_area = chunks[0];
    let status_area = chunks[1];

    draw_panel(f, main_area, app);
    status_bar::render(f, status_area, app);

    match &app.overlay {
        Overlay::ErrorHistory => overlays::render_error_history(f, main_area, app),
        Overlay::None => {}
    }
}

/// Draw the active panel inside its border.
fn draw_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let panel = app.active_panel;

    let title = match panel {
        Panel::Form | Panel::Results => format!(
            " {} [{}] · {} v{} ",
            panel.label(),
            panel.index() + 1,
            app.screen.schema().pack,
            app.screen.schema().version
        ),
        Panel::Wizard | Panel::Help => format!(" {} [{}] ", panel.label(), panel.index() + 1),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(title)
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    match panel {
        Panel::Form => form_panel::render(f, inner, app),
        Panel::Results => results_panel::render(f, inner, app),
        Panel::Wizard => wizard_panel::render(f, inner, app),
        Panel::Help => help_panel::render(f, inner, app),
    }
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::app::tests::test_app;

    fn screen_text(app: &AppState) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn every_panel_draws() {
        let (mut app, _rx, _tx) = test_app();
        for i in 0..Panel::COUNT {
            app.switch_panel(Panel::from_index(i).unwrap());
            let text = screen_text(&app);
            assert!(text.contains(app.active_panel.label()));
        }
    }

    #[test]
    fn error_overlay_draws_on_top() {
        let (mut app, _rx, _tx) = test_app();
        app.overlay = Overlay::ErrorHistory;
        assert!(screen_text(&app).contains("Error History"));
    }

    #[test]
    fn centered_rect_is_inside() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(80, 70, area);
        assert!(popup.width <= 80 && popup.height <= 28);
        assert!(popup.x >= 10 && popup.y >= 6);
    }
}
