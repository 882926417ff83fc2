//! Panel 2 — Results: tab bar over the chart and table views.
//!
//! Chart tabs replay the recorded ops of the tab's canvas surface; table
//! tabs show the rows currently in the table body.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};

use packlab_core::chart::{Canvas as _, DrawOp, Surface};
use packlab_core::layout::{active_tab_index, tab_ids, tab_view_at};
use packlab_core::node::{Node, Tag};
use packlab_core::table::{read_table, TableSnapshot};

use crate::app::AppState;
use crate::theme::{self, Theme, hex_color};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(area);

    let root = app.screen.root();
    let tabs = tab_ids(root);
    if tabs.is_empty() {
        let para = Paragraph::new(Span::styled(
            "This schema has no results panel.",
            theme::muted(),
        ));
        f.render_widget(para, area);
        return;
    }

    let active = active_tab_index(root);
    f.render_widget(Paragraph::new(tab_bar(root, &tabs, active, app)), chunks[0]);

    let body = chunks[1];
    if app.screen.last_result().is_none() {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "No result yet. Press r to run with the current form values.",
                theme::muted(),
            )),
        ];
        f.render_widget(Paragraph::new(lines), body);
        return;
    }

    let Some(view) = active.and_then(|index| tab_view_at(root, index)) else {
        return;
    };
    match view.attr("data-tab-kind") {
        Some("chart") => {
            let surface = view
                .find(&|n| n.tag == Tag::Canvas)
                .and_then(|c| c.surface.as_ref());
            if let Some(surface) = surface {
                render_surface(f, body, surface);
            }
        }
        Some("table") => render_table(f, body, &read_table(view), app.results.scroll),
        _ => {
            let para = Paragraph::new(Span::styled(view.text_content(), theme::warning()));
            f.render_widget(para, body);
        }
    }
}

fn tab_bar(root: &Node, tabs: &[String], active: Option<usize>, app: &AppState) -> Vec<Line<'static>> {
    let buttons = root.find_all(&|n| n.tag == Tag::Button && n.has_class("tab"));
    let mut spans = Vec::new();
    for (index, id) in tabs.iter().enumerate() {
        let label = buttons
            .get(index)
            .map(|b| b.text_content())
            .unwrap_or_else(|| id.clone());
        let style = if active == Some(index) {
            theme::accent_bold().add_modifier(Modifier::REVERSED)
        } else {
            theme::muted()
        };
        spans.push(Span::styled(format!(" {label} "), style));
        spans.push(Span::raw(" "));
    }
    if let Some(ticket) = app.results.in_flight {
        spans.push(Span::styled(format!(" run #{ticket} in flight"), theme::warning()));
    }
    vec![
        Line::from(spans),
        Line::from(Span::styled(
            "[h/l]tab [j/k]scroll [r]run [w]export csv",
            theme::muted(),
        )),
    ]
}

/// Replay a recorded surface. Surface y grows downward; the terminal canvas
/// grows upward, so every y is flipped.
fn render_surface(f: &mut Frame, area: Rect, surface: &Surface) {
    let (width, height) = surface.size();
    let flip = |y: f64| height - y;

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            for op in surface.ops() {
                match op {
                    DrawOp::Clear => {}
                    DrawOp::Line { from, to, stroke } => {
                        ctx.draw(&CanvasLine {
                            x1: from.x,
                            y1: flip(from.y),
                            x2: to.x,
                            y2: flip(to.y),
                            color: hex_color(&stroke.color, theme::MUTED),
                        });
                    }
                    DrawOp::Polyline { points, stroke } => {
                        let color = hex_color(&stroke.color, theme::ACCENT);
                        for pair in points.windows(2) {
                            ctx.draw(&CanvasLine {
                                x1: pair[0].x,
                                y1: flip(pair[0].y),
                                x2: pair[1].x,
                                y2: flip(pair[1].y),
                                color,
                            });
                        }
                    }
                    DrawOp::Label { at, text, color } => {
                        let style = ratatui::style::Style::default().fg(hex_color(color, theme::MUTED));
                        ctx.print(at.x, flip(at.y), Span::styled(text.clone(), style));
                    }
                }
            }
        });
    f.render_widget(canvas, area);
}

fn render_table(f: &mut Frame, area: Rect, table: &TableSnapshot, scroll: usize) {
    let palette = Theme::default();
    let width = column_width(table);
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(
        table
            .headers
            .iter()
            .map(|h| Span::styled(format!("{h:>width$} "), theme::accent_bold()))
            .collect::<Vec<_>>(),
    ));

    if table.rows.is_empty() {
        lines.push(Line::from(Span::styled("(no rows)", theme::muted())));
    }

    let visible = area.height.saturating_sub(1) as usize;
    let start = scroll.min(table.rows.len().saturating_sub(1));
    for row in table.rows.iter().skip(start).take(visible) {
        let spans: Vec<Span> = row
            .iter()
            .map(|cell| {
                let style = match cell.numeric.then(|| numeric_value(&cell.text)).flatten() {
                    Some(v) => ratatui::style::Style::default().fg(palette.pnl_color(v)),
                    None => theme::text(),
                };
                Span::styled(format!("{:>width$} ", cell.text), style)
            })
            .collect();
        lines.push(Line::from(spans));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn column_width(table: &TableSnapshot) -> usize {
    let widest_header = table.headers.iter().map(|h| h.chars().count());
    let widest_cell = table.rows.iter().flatten().map(|c| c.text.chars().count());
    widest_header.chain(widest_cell).max().unwrap_or(8).clamp(6, 24)
}

/// Parse a formatted numeric cell back to a number (`12.50%` → 12.5).
fn numeric_value(text: &str) -> Option<f64> {
    text.trim().trim_end_matches('%').replace(',', "").parse().ok()
}
