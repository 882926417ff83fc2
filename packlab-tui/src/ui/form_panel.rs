//! Panel 1 — Form: the schema's config fields as editable controls.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use packlab_core::controls::{check_control, read_value};
use packlab_core::schema::{shown_kind, FieldDescriptor, FieldKind, FieldValue};

use crate::app::AppState;
use crate::input::value_text;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let fields = app.form_fields();
    if fields.is_empty() {
        let para = Paragraph::new(Span::styled(
            "This schema has no form panel.",
            theme::muted(),
        ));
        f.render_widget(para, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for (i, field) in fields.iter().enumerate() {
        let selected = i == app.form.cursor;
        field_lines(&mut lines, app, field, selected);
    }

    lines.push(Line::from(""));
    lines.push(actions_line(app));
    lines.push(Line::from(Span::styled(
        "[j/k]field [Enter]edit [h/l]option [Space]toggle [r]run [x]reset",
        theme::muted(),
    )));

    // Keep the cursor row in view.
    let cursor_row = app.form.cursor as u16;
    let scroll = cursor_row.saturating_sub(area.height.saturating_sub(4));
    f.render_widget(Paragraph::new(lines).scroll((scroll, 0)), area);
}

fn field_lines(lines: &mut Vec<Line>, app: &AppState, field: &FieldDescriptor, selected: bool) {
    let marker = if selected { "▸ " } else { "  " };
    let label_style = if selected { theme::accent_bold() } else { theme::text() };
    let required = if field.required { "*" } else { "" };

    let control = app.screen.control(&field.id);
    let value = control.map(read_value).unwrap_or(FieldValue::Empty);

    let mut spans = vec![
        Span::styled(marker, theme::accent()),
        Span::styled(format!("{:<18}", format!("{}{required}", field.display_label())), label_style),
    ];

    match &field.kind {
        FieldKind::Unsupported(kind) => {
            spans.push(Span::styled(format!("Unsupported field type: {}", shown_kind(kind)), theme::warning()));
        }
        FieldKind::Switch => {
            let on = value.is_truthy();
            let style = if on { theme::positive() } else { theme::muted() };
            spans.push(Span::styled(if on { "[on ]" } else { "[off]" }, style));
        }
        kind if kind.has_options() => {
            let (open, close) = if *kind == FieldKind::CheckboxGroup { ("[", "]") } else { ("(", ")") };
            for (j, option) in field.options.iter().enumerate() {
                let mark = if value.selects(&option.value) { "x" } else { " " };
                let focused = selected
                    && *kind == FieldKind::CheckboxGroup
                    && j == app.form.option_cursor;
                let style = if focused {
                    theme::cursor()
                } else if value.selects(&option.value) {
                    theme::accent()
                } else {
                    theme::muted()
                };
                spans.push(Span::styled(format!("{open}{mark}{close} {}", option.label), style));
                spans.push(Span::raw("  "));
            }
        }
        _ => {
            let editing = if selected { app.form.editing.as_deref() } else { None };
            match editing {
                Some(buf) => {
                    spans.push(Span::styled(buf.to_string(), theme::text()));
                    spans.push(Span::styled("▏", theme::accent()));
                }
                None => {
                    let text = value_text(&value);
                    if text.is_empty() {
                        let placeholder = field.placeholder.clone().unwrap_or_default();
                        spans.push(Span::styled(placeholder, theme::muted()));
                    } else {
                        spans.push(Span::styled(text, theme::text()));
                    }
                }
            }
            if let Some(unit) = &field.adornment {
                spans.push(Span::styled(format!(" {unit}"), theme::neutral()));
            }
        }
    }

    if let Some(problem) = control.and_then(check_control) {
        spans.push(Span::styled(format!("  ! {problem}"), theme::negative()));
    }
    lines.push(Line::from(spans));

    if selected {
        if let Some(hint) = &field.hint {
            lines.push(Line::from(Span::styled(format!("    {hint}"), theme::muted())));
        }
    }
}

fn actions_line(app: &AppState) -> Line<'static> {
    let bound = app.screen.run_binding().map(str::to_string);
    let mut spans = vec![Span::styled("Actions: ", theme::muted())];
    for action in &app.screen.summary().actions {
        let style = if bound.as_deref() == Some(action.as_str()) {
            theme::accent_bold()
        } else {
            theme::muted()
        };
        spans.push(Span::styled(format!("[{action}] "), style));
    }
    if app.results.in_flight.is_some() {
        spans.push(Span::styled("running...", theme::warning()));
    }
    Line::from(spans)
}
