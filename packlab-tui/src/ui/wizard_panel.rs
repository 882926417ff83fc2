//! Panel 3 — Wizard: five-step strategy builder.

use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Sparkline, Wrap};

use packlab_core::wizard::{BasicsField, WizardState, INCOMPLETE_PLACEHOLDER};
use packlab_core::WizardStep;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(4),
            Constraint::Length(2),
        ])
        .split(area);

    let state = app.wizard.state();
    f.render_widget(Paragraph::new(step_bar(app)), chunks[0]);

    let body = chunks[1];
    match state.current {
        WizardStep::Basics => render_basics(f, body, app),
        WizardStep::Indicators => render_indicators(f, body, app),
        WizardStep::Policy => render_policy(f, body, app),
        WizardStep::Preview => render_preview(f, body, state),
        WizardStep::Save => render_save(f, body, app),
    }

    f.render_widget(Paragraph::new(footer(state)), chunks[2]);
}

fn step_bar(app: &AppState) -> Vec<Line<'static>> {
    let state = app.wizard.state();
    let mut spans = Vec::new();
    for (step, visible) in app.wizard.step_visibility() {
        let style = if visible {
            theme::accent_bold().add_modifier(Modifier::REVERSED)
        } else if state.visited.contains(&step) {
            theme::neutral()
        } else {
            theme::muted()
        };
        spans.push(Span::styled(format!(" {step} "), style));
        spans.push(Span::styled(" › ", theme::muted()));
    }
    spans.pop();
    vec![
        Line::from(spans),
        Line::from(vec![
            Span::styled("Strategy id: ", theme::muted()),
            Span::styled(
                state.id_label().to_string(),
                if state.derived_id.is_some() { theme::positive() } else { theme::warning() },
            ),
        ]),
    ]
}

fn render_basics(f: &mut Frame, area: Rect, app: &AppState) {
    let state = app.wizard.state();
    let catalog = app.wizard.catalog();
    let basics = state.accumulated.basics.clone().unwrap_or_default();

    let mut lines: Vec<Line> = vec![Line::from("")];
    for (i, field) in BasicsField::ALL.into_iter().enumerate() {
        let selected = i == app.wizard_ui.cursor;
        let marker = if selected { "▸ " } else { "  " };
        let label_style = if selected { theme::accent_bold() } else { theme::text() };
        let current = basics.get(field);

        let mut spans = vec![
            Span::styled(marker, theme::accent()),
            Span::styled(format!("{:<12}", field.label()), label_style),
        ];
        if current.is_empty() {
            spans.push(Span::styled("(choose)", theme::warning()));
        }
        for option in catalog.options(field) {
            let style = if option == current { theme::cursor() } else { theme::muted() };
            spans.push(Span::styled(format!(" {option} "), style));
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[j/k]field [h/l]value [n]ext",
        theme::muted(),
    )));
    f.render_widget(Paragraph::new(lines), area);
}

fn render_indicators(f: &mut Frame, area: Rect, app: &AppState) {
    let chosen = app.wizard.state().accumulated.indicators.as_ref().map(|s| s.name.as_str());
    let mut lines: Vec<Line> = vec![Line::from("")];
    for set in &app.wizard.catalog().indicator_sets {
        let on = chosen == Some(set.name.as_str());
        lines.push(choice_line(on, &set.name, &set.indicators.join(", ")));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("[h/l]choose [n]ext [p]rev", theme::muted())));
    f.render_widget(Paragraph::new(lines), area);
}

fn render_policy(f: &mut Frame, area: Rect, app: &AppState) {
    let chosen = app.wizard.state().accumulated.policy.as_ref().map(|p| p.name.as_str());
    let mut lines: Vec<Line> = vec![Line::from("")];
    for template in &app.wizard.catalog().policy_templates {
        let on = chosen == Some(template.name.as_str());
        let params = template
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(choice_line(on, &template.name, &params));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("[h/l]choose [n]ext [p]rev", theme::muted())));
    f.render_widget(Paragraph::new(lines), area);
}

fn choice_line(on: bool, name: &str, detail: &str) -> Line<'static> {
    let (mark, style) = if on {
        ("(•)", theme::accent_bold())
    } else {
        ("( )", theme::text())
    };
    Line::from(vec![
        Span::styled(format!("  {mark} {name:<14}"), style),
        Span::styled(detail.to_string(), theme::muted()),
    ])
}

fn render_preview(f: &mut Frame, area: Rect, state: &WizardState) {
    let Some(preview) = &state.accumulated.preview else {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled("No preview yet. Press g to generate one.", theme::muted())),
        ];
        f.render_widget(Paragraph::new(lines), area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(2)])
        .split(area);

    let first = preview.sample_equity.first().copied().unwrap_or_default();
    let last = preview.sample_equity.last().copied().unwrap_or_default();
    let lines = vec![
        Line::from(vec![
            Span::styled("Indicators: ", theme::muted()),
            Span::styled(preview.indicators.join(", "), theme::text()),
        ]),
        Line::from(vec![
            Span::styled("Policy:     ", theme::muted()),
            Span::styled(
                preview
                    .policy
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(" "),
                theme::text(),
            ),
        ]),
        Line::from(vec![
            Span::styled(format!("Equity:     {} points, ", preview.sample_equity.len()), theme::muted()),
            Span::styled(format!("{first:.2} → {last:.2}"), Style::default().fg(theme::Theme::default().pnl_color(last - first))),
        ]),
    ];
    f.render_widget(Paragraph::new(lines), chunks[0]);

    let data = sparkline_data(&preview.sample_equity);
    let spark = Sparkline::default().data(&data).style(theme::accent());
    f.render_widget(spark, chunks[1]);
}

/// Shift a series so its minimum sits at zero, scaled to integer bars.
fn sparkline_data(series: &[f64]) -> Vec<u64> {
    let finite = series.iter().copied().filter(|v| v.is_finite());
    let min = finite.clone().fold(f64::INFINITY, f64::min);
    let max = finite.fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    series
        .iter()
        .map(|v| {
            if !v.is_finite() || span.is_nan() || span <= 0.0 {
                1
            } else {
                ((v - min) / span * 100.0).round() as u64 + 1
            }
        })
        .collect()
}

fn render_save(f: &mut Frame, area: Rect, app: &AppState) {
    let state = app.wizard.state();
    let mut lines: Vec<Line> = vec![Line::from("")];

    if let Some(summary) = &state.summary {
        let acc = &summary.accumulated;
        lines.push(Line::from(Span::styled("Summary", theme::accent_bold())));
        let id = summary.strategy_id.as_deref().unwrap_or(INCOMPLETE_PLACEHOLDER);
        summary_line(&mut lines, "Strategy", id);
        if let Some(b) = &acc.basics {
            summary_line(&mut lines, "Basics", &format!("{} {} {} {}", b.ticker, b.asset_type, b.horizon, b.cadence));
        }
        if let Some(set) = &acc.indicators {
            summary_line(&mut lines, "Indicators", &set.name);
        }
        if let Some(policy) = &acc.policy {
            summary_line(&mut lines, "Policy", &policy.name);
        }
        let preview = if acc.preview.is_some() { "generated" } else { "skipped" };
        summary_line(&mut lines, "Preview", preview);
        lines.push(Line::from(""));
    }

    match &app.wizard_ui.last_report {
        Some(report) if state.finished => {
            for ack in &report.acknowledgements {
                lines.push(Line::from(Span::styled(format!("✓ {ack}"), theme::positive())));
            }
            if let Some(nav) = app.wizard.navigation().filter(|n| n.is_pending()) {
                let left = nav.due().saturating_duration_since(Instant::now());
                lines.push(Line::from(Span::styled(
                    format!(
                        "Opening {} in {:.1}s (Esc to stay)",
                        nav.target(),
                        left.as_secs_f64()
                    ),
                    theme::neutral(),
                )));
            }
        }
        _ => lines.push(Line::from(Span::styled(
            "[s]ave [p]rev",
            theme::muted(),
        ))),
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn summary_line(lines: &mut Vec<Line<'_>>, label: &str, value: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {label:<12}"), theme::muted()),
        Span::styled(value.to_string(), theme::text()),
    ]));
}

fn footer(state: &WizardState) -> Vec<Line<'static>> {
    let missing = state.gate_missing();
    if missing.is_empty() {
        return vec![Line::from(Span::styled(
            "[n]ext [p]rev [g]enerate preview [Esc]abandon",
            theme::muted(),
        ))];
    }
    vec![Line::from(vec![
        Span::styled("Still needed: ", theme::warning()),
        Span::styled(missing.join(", "), theme::warning().add_modifier(Modifier::BOLD)),
    ])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparkline_handles_flat_and_nan() {
        assert_eq!(sparkline_data(&[5.0, 5.0]), vec![1, 1]);
        assert_eq!(sparkline_data(&[0.0, f64::NAN, 10.0]), vec![1, 1, 101]);
    }
}
