//! Panel layout engine — form grid and tabbed results panel.

use crate::chart::{Surface, CHART_HEIGHT, CHART_WIDTH};
use crate::controls::make_control;
use crate::node::{Node, Tag};
use crate::schema::{shown_kind, ActionSpec, Panel, ResultTab, TabKind};

/// Grid width of the form layout.
pub const GRID_COLUMNS: u8 = 12;

/// Bar position carried by each tab button and its view.
pub const TAB_INDEX_ATTR: &str = "data-tab-index";

/// Compose a form panel: one grid cell per field, in schema order.
pub fn render_form(panel: &Panel) -> Node {
    let mut grid = Node::new(Tag::Form)
        .with_id(format!("form-{}", panel.id))
        .with_class("grid-12");

    for field in &panel.fields {
        let span = if field.full { GRID_COLUMNS } else { GRID_COLUMNS / 2 };
        let control = make_control(field);

        let mut label_text = field.display_label().to_string();
        if field.required {
            label_text.push_str(" *");
        }

        let mut cell = Node::new(Tag::Div)
            .with_class("field")
            .with_class(format!("col-{span}"))
            .with_attr("data-span", span.to_string())
            .with_child(
                Node::new(Tag::Label)
                    .with_attr("for", field.id.clone())
                    .with_text(label_text),
            )
            .with_child(control.node);
        if let Some(hint) = &field.hint {
            cell.children
                .push(Node::new(Tag::Small).with_class("hint").with_text(hint.clone()));
        }
        grid.children.push(cell);
    }

    let mut section = panel_shell(panel, "form-panel").with_child(grid);
    if !panel.actions.is_empty() {
        section.children.push(render_actions(&panel.actions));
    }
    section
}

/// Compose a results panel: a tab bar plus one content view per tab. The
/// first tab starts selected and visible.
pub fn render_results(panel: &Panel) -> Node {
    let mut bar = Node::new(Tag::Nav)
        .with_class("tabs")
        .with_attr("role", "tablist");
    let mut views = Node::new(Tag::Div).with_class("tab-views");

    for (i, tab) in panel.tabs.iter().enumerate() {
        let first = i == 0;
        bar.children.push(
            Node::new(Tag::Button)
                .with_id(format!("tab-{}", tab.id))
                .with_class("tab")
                .with_attr("role", "tab")
                .with_attr("data-tab", tab.id.clone())
                .with_attr(TAB_INDEX_ATTR, i.to_string())
                .with_attr("aria-selected", first.to_string())
                .with_text(tab_label(tab)),
        );
        let mut view = tab_view(tab);
        view.set_attr(TAB_INDEX_ATTR, i.to_string());
        view.hidden = !first;
        views.children.push(view);
    }

    let mut section = panel_shell(panel, "results-panel")
        .with_child(bar)
        .with_child(views);
    if !panel.actions.is_empty() {
        section.children.push(render_actions(&panel.actions));
    }
    section
}

/// A row of action buttons. Buttons carry no behavior of their own.
pub fn render_actions(actions: &[ActionSpec]) -> Node {
    Node::new(Tag::Div)
        .with_class("actions")
        .with_children(actions.iter().map(|a| {
            let label = if a.label.is_empty() { a.id.clone() } else { a.label.clone() };
            Node::new(Tag::Button)
                .with_id(format!("action-{}", a.id))
                .with_class("btn")
                .with_class(format!("btn-{}", a.kind.as_str()))
                .with_attr("data-action", a.id.clone())
                .with_text(label)
        }))
}

fn panel_shell(panel: &Panel, class: &str) -> Node {
    let mut section = Node::new(Tag::Section)
        .with_id(format!("panel-{}", panel.id))
        .with_class("panel")
        .with_class(class)
        .with_attr("data-layout", panel.layout.clone());
    if !panel.title.is_empty() {
        section
            .children
            .push(Node::new(Tag::H2).with_text(panel.title.clone()));
    }
    section
}

fn tab_label(tab: &ResultTab) -> String {
    if tab.label.is_empty() {
        tab.id.clone()
    } else {
        tab.label.clone()
    }
}

fn tab_view(tab: &ResultTab) -> Node {
    let view = Node::new(Tag::Div)
        .with_id(format!("view-{}", tab.id))
        .with_class("tab-view")
        .with_attr("data-tab", tab.id.clone())
        .with_attr("data-tab-kind", tab.kind.as_str());

    match &tab.kind {
        TabKind::Chart => {
            let mut canvas = Node::new(Tag::Canvas)
                .with_id(format!("canvas-{}", tab.id))
                .with_attr("width", CHART_WIDTH.to_string())
                .with_attr("height", CHART_HEIGHT.to_string());
            canvas.surface = Some(Surface::new(CHART_WIDTH, CHART_HEIGHT));
            view.with_child(canvas)
        }
        TabKind::Table => {
            let header = Node::new(Tag::Tr).with_children(tab.columns.iter().map(|c| {
                Node::new(Tag::Th)
                    .with_attr("data-key", c.key.clone())
                    .with_attr("data-format", c.format.as_str())
                    .with_text(c.header().to_string())
            }));
            view.with_child(
                Node::new(Tag::Table)
                    .with_id(format!("table-{}", tab.id))
                    .with_class("data-table")
                    .with_child(Node::new(Tag::Thead).with_child(header))
                    .with_child(Node::new(Tag::Tbody).with_id(format!("tbody-{}", tab.id))),
            )
        }
        TabKind::Unsupported(kind) => {
            tracing::warn!(tab = %tab.id, kind = %kind, "unsupported tab type");
            view.with_child(
                Node::new(Tag::Div)
                    .with_class("unsupported")
                    .with_text(format!("Unsupported tab type: {}", shown_kind(kind))),
            )
        }
    }
}

// ─── Tab selection ───────────────────────────────────────────────────

/// Select `tab_id`: exactly its button is marked selected and exactly its
/// view is visible. A repeated id selects its first occurrence. Unknown ids
/// leave the panel untouched and return false.
pub fn activate_tab(results: &mut Node, tab_id: &str) -> bool {
    let index = results
        .find(&|n| n.tag == Tag::Button && n.attr("data-tab") == Some(tab_id))
        .and_then(tab_index);
    match index {
        Some(index) => activate_tab_index(results, index),
        None => false,
    }
}

/// Select the tab at bar position `index`. Out-of-range positions leave the
/// panel untouched and return false.
pub fn activate_tab_index(results: &mut Node, index: usize) -> bool {
    let known = results
        .find(&|n| n.tag == Tag::Button && tab_index(n) == Some(index))
        .is_some();
    if !known {
        return false;
    }
    results.walk_mut(&mut |n| {
        let Some(at) = tab_index(n) else {
            return;
        };
        let hit = at == index;
        if n.tag == Tag::Button {
            n.set_attr("aria-selected", hit.to_string());
        } else if n.has_class("tab-view") {
            n.hidden = !hit;
        }
    });
    true
}

fn tab_index(node: &Node) -> Option<usize> {
    node.attr(TAB_INDEX_ATTR).and_then(|v| v.parse().ok())
}

/// Tab ids whose button is marked selected.
pub fn selected_tabs(tree: &Node) -> Vec<String> {
    tree.find_all(&|n| n.tag == Tag::Button && n.attr("aria-selected") == Some("true"))
        .into_iter()
        .filter_map(|n| n.attr("data-tab").map(str::to_string))
        .collect()
}

/// Tab ids whose content view is visible.
pub fn visible_views(tree: &Node) -> Vec<String> {
    tree.find_all(&|n| n.has_class("tab-view") && !n.hidden)
        .into_iter()
        .filter_map(|n| n.attr("data-tab").map(str::to_string))
        .collect()
}

/// The selected tab id, if exactly one is selected.
pub fn active_tab(tree: &Node) -> Option<String> {
    let mut selected = selected_tabs(tree);
    if selected.len() == 1 {
        selected.pop()
    } else {
        None
    }
}

/// Bar position of the selected tab, if exactly one is selected.
pub fn active_tab_index(tree: &Node) -> Option<usize> {
    let selected =
        tree.find_all(&|n| n.tag == Tag::Button && n.attr("aria-selected") == Some("true"));
    match selected.as_slice() {
        [only] => tab_index(only),
        _ => None,
    }
}

/// The view at bar position `index`.
pub fn tab_view_at(tree: &Node, index: usize) -> Option<&Node> {
    tree.find(&|n| n.has_class("tab-view") && tab_index(n) == Some(index))
}

/// Tab ids in bar order.
pub fn tab_ids(tree: &Node) -> Vec<String> {
    tree.find_all(&|n| n.tag == Tag::Button && n.has_class("tab"))
        .into_iter()
        .filter_map(|n| n.attr("data-tab").map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnFormat, ColumnSpec, FieldDescriptor, FieldKind};

    fn form_panel() -> Panel {
        let mut full = FieldDescriptor::new("notes", FieldKind::Textarea);
        full.full = true;
        Panel {
            id: "config".into(),
            title: "Config".into(),
            layout: "form".into(),
            fields: vec![
                FieldDescriptor::new("b", FieldKind::Text),
                full,
                FieldDescriptor::new("a", FieldKind::Number),
            ],
            actions: vec![],
            tabs: vec![],
        }
    }

    fn tabs_panel(n: usize) -> Panel {
        Panel {
            id: "results".into(),
            title: String::new(),
            layout: "tabs".into(),
            fields: vec![],
            actions: vec![],
            tabs: (0..n)
                .map(|i| ResultTab {
                    id: format!("t{i}"),
                    label: format!("Tab {i}"),
                    kind: if i == 0 { TabKind::Chart } else { TabKind::Table },
                    columns: vec![ColumnSpec::new("k", "K", ColumnFormat::Raw)],
                })
                .collect(),
        }
    }

    #[test]
    fn form_preserves_order_and_spans() {
        let node = render_form(&form_panel());
        let cells = node.find_by_class("field");
        let spans: Vec<_> = cells.iter().map(|c| c.attr("data-span").unwrap()).collect();
        assert_eq!(spans, vec!["6", "12", "6"]);
        let ids: Vec<_> = cells
            .iter()
            .map(|c| c.children[1].attr("data-field").unwrap())
            .collect();
        assert_eq!(ids, vec!["b", "notes", "a"]);
    }

    #[test]
    fn first_tab_selected_by_default() {
        let node = render_results(&tabs_panel(3));
        assert_eq!(selected_tabs(&node), vec!["t0"]);
        assert_eq!(visible_views(&node), vec!["t0"]);
    }

    #[test]
    fn activation_is_mutually_exclusive() {
        let mut node = render_results(&tabs_panel(3));
        assert!(activate_tab(&mut node, "t2"));
        assert_eq!(selected_tabs(&node), vec!["t2"]);
        assert_eq!(visible_views(&node), vec!["t2"]);
        assert_eq!(active_tab(&node).as_deref(), Some("t2"));
    }

    #[test]
    fn unknown_tab_is_a_no_op() {
        let mut node = render_results(&tabs_panel(2));
        assert!(!activate_tab(&mut node, "nope"));
        assert_eq!(selected_tabs(&node), vec!["t0"]);
    }

    #[test]
    fn repeated_tab_ids_still_select_one_tab() {
        let mut panel = tabs_panel(3);
        panel.tabs[1].id = "dup".into();
        panel.tabs[2].id = "dup".into();
        let mut node = render_results(&panel);

        assert!(activate_tab(&mut node, "dup"));
        assert_eq!(selected_tabs(&node), vec!["dup"]);
        assert_eq!(visible_views(&node), vec!["dup"]);
        assert_eq!(active_tab_index(&node), Some(1));

        assert!(activate_tab_index(&mut node, 2));
        assert_eq!(selected_tabs(&node).len(), 1);
        assert_eq!(visible_views(&node).len(), 1);
        assert_eq!(active_tab_index(&node), Some(2));
        assert_eq!(active_tab(&node).as_deref(), Some("dup"));

        assert!(!activate_tab_index(&mut node, 3));
        assert_eq!(active_tab_index(&node), Some(2));
    }

    #[test]
    fn table_view_has_header_and_empty_body() {
        let node = render_results(&tabs_panel(2));
        let body = node.find_by_id("tbody-t1").unwrap();
        assert!(body.children.is_empty());
        let th = node.find(&|n| n.tag == Tag::Th).unwrap();
        assert_eq!(th.text.as_deref(), Some("K"));
    }

    #[test]
    fn chart_view_owns_a_surface() {
        let node = render_results(&tabs_panel(1));
        let canvas = node.find_by_id("canvas-t0").unwrap();
        assert!(canvas.surface.is_some());
    }

    #[test]
    fn unsupported_tab_gets_placeholder() {
        let mut panel = tabs_panel(1);
        panel.tabs[0].kind = TabKind::from("heatmap".to_string());
        let node = render_results(&panel);
        assert!(node.text_content().contains("Unsupported tab type: heatmap"));
    }
}
