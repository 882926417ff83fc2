//! Field control factory — one [`FieldDescriptor`] in, one control subtree out.
//!
//! Every control root carries `data-field` (the field id) and `data-kind`
//! (the type string). The element holding the value carries
//! `data-primitive`; group sub-inputs carry `data-option`. A control's value
//! is always read back from these nodes, never from a side copy, so the
//! mutation helpers below are the only way control state changes.

use std::collections::BTreeMap;

use crate::node::{Node, Tag};
use crate::schema::{format_number, shown_kind, FieldDescriptor, FieldKind, FieldValue};

/// Current values of every supported control in a tree, keyed by field id.
pub type FormValues = BTreeMap<String, FieldValue>;

/// A rendered control: the subtree plus the identity it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub field_id: String,
    pub kind: FieldKind,
    pub node: Node,
}

impl Control {
    /// Current value, derived from the node state.
    pub fn value(&self) -> FieldValue {
        read_value(&self.node)
    }

    /// True for the diagnostic stand-in of an unsupported type.
    pub fn is_placeholder(&self) -> bool {
        !self.kind.is_supported()
    }
}

/// Build the control for one field descriptor. Never fails: unsupported
/// types produce a visible placeholder naming the type.
pub fn make_control(desc: &FieldDescriptor) -> Control {
    let node = match &desc.kind {
        FieldKind::Text => text_input(desc, "text"),
        FieldKind::Search => text_input(desc, "search"),
        FieldKind::Number => number_input(desc),
        FieldKind::Textarea => textarea(desc),
        FieldKind::Select => select(desc),
        FieldKind::Switch => switch(desc),
        FieldKind::CheckboxGroup => option_group(desc, "checkbox"),
        FieldKind::RadioGroup => option_group(desc, "radio"),
        FieldKind::Unsupported(name) => {
            tracing::warn!(field = %desc.id, kind = %name, "unsupported field type");
            Node::new(Tag::Div)
                .with_class("unsupported")
                .with_text(format!("Unsupported field type: {}", shown_kind(name)))
        }
    };

    let node = wrap_adornment(desc, node)
        .with_attr("data-field", desc.id.clone())
        .with_attr("data-kind", desc.kind.as_str());

    Control {
        field_id: desc.id.clone(),
        kind: desc.kind.clone(),
        node,
    }
}

// ─── Builders ────────────────────────────────────────────────────────

fn primitive(tag: Tag, desc: &FieldDescriptor) -> Node {
    let mut node = Node::new(tag)
        .with_id(desc.id.clone())
        .with_attr("name", desc.id.clone())
        .with_attr("data-primitive", "");
    if let Some(placeholder) = &desc.placeholder {
        node.set_attr("placeholder", placeholder.clone());
    }
    node.set_flag("required", desc.required);
    node
}

fn scalar_text(desc: &FieldDescriptor) -> String {
    desc.value
        .as_ref()
        .and_then(FieldValue::as_text)
        .unwrap_or_default()
}

fn text_input(desc: &FieldDescriptor, input_type: &str) -> Node {
    primitive(Tag::Input, desc)
        .with_attr("type", input_type)
        .with_attr("value", scalar_text(desc))
}

fn number_input(desc: &FieldDescriptor) -> Node {
    let mut node = primitive(Tag::Input, desc)
        .with_attr("type", "number")
        .with_attr("value", scalar_text(desc));
    if let Some(min) = desc.min {
        node.set_attr("min", format_number(min));
    }
    if let Some(max) = desc.max {
        node.set_attr("max", format_number(max));
    }
    if let Some(step) = desc.step {
        node.set_attr("step", format_number(step));
    }
    node
}

fn textarea(desc: &FieldDescriptor) -> Node {
    primitive(Tag::Textarea, desc).with_text(scalar_text(desc))
}

fn select(desc: &FieldDescriptor) -> Node {
    let mut node = primitive(Tag::Select, desc);
    let wanted = desc.value.as_ref();
    // A select always has a selection once it has options: the first one
    // when the descriptor names none.
    let matched = desc
        .options
        .iter()
        .position(|o| wanted.is_some_and(|v| v.selects(&o.value)))
        .unwrap_or(0);
    for (i, opt) in desc.options.iter().enumerate() {
        let mut option = Node::new(Tag::Option)
            .with_attr("value", opt.value.clone())
            .with_text(opt.label.clone());
        option.set_flag("selected", i == matched);
        node.children.push(option);
    }
    node
}

fn switch(desc: &FieldDescriptor) -> Node {
    let mut node = primitive(Tag::Input, desc)
        .with_class("switch")
        .with_attr("type", "checkbox")
        .with_attr("role", "switch");
    let on = desc.value.as_ref().is_some_and(FieldValue::is_truthy);
    node.set_flag("checked", on);
    node
}

fn option_group(desc: &FieldDescriptor, input_type: &str) -> Node {
    let mut group = Node::new(Tag::Fieldset)
        .with_id(desc.id.clone())
        .with_class(format!("{input_type}-group"));
    if desc.inline {
        group.add_class("inline");
    }
    let wanted = desc.value.as_ref();
    let mut radio_taken = false;
    for opt in &desc.options {
        let mut input = Node::new(Tag::Input)
            .with_id(format!("{}-{}", desc.id, opt.value))
            .with_attr("type", input_type)
            .with_attr("name", desc.id.clone())
            .with_attr("value", opt.value.clone())
            .with_attr("data-option", "");
        let mut checked = wanted.is_some_and(|v| v.selects(&opt.value));
        if input_type == "radio" {
            checked = checked && !radio_taken;
            radio_taken |= checked;
        }
        input.set_flag("checked", checked);
        group.children.push(
            Node::new(Tag::Label)
                .with_class("option")
                .with_attr("for", format!("{}-{}", desc.id, opt.value))
                .with_child(input)
                .with_child(Node::new(Tag::Span).with_text(opt.label.clone())),
        );
    }
    group.set_flag("required", desc.required);
    group
}

fn wrap_adornment(desc: &FieldDescriptor, node: Node) -> Node {
    match &desc.adornment {
        Some(text) if desc.kind.is_supported() => Node::new(Tag::Div)
            .with_class("input-group")
            .with_child(node)
            .with_child(Node::new(Tag::Span).with_class("adornment").with_text(text.clone())),
        _ => node,
    }
}

// ─── Reading ─────────────────────────────────────────────────────────

/// The kind recorded on a control root.
pub fn kind_of(root: &Node) -> Option<FieldKind> {
    root.attr("data-kind").map(FieldKind::from)
}

fn primitive_of(root: &Node) -> Option<&Node> {
    root.find(&|n| n.has_attr("data-primitive"))
}

fn primitive_of_mut(root: &mut Node) -> Option<&mut Node> {
    root.find_mut(&|n| n.has_attr("data-primitive"))
}

fn option_inputs(root: &Node) -> Vec<&Node> {
    root.find_all(&|n| n.has_attr("data-option"))
}

/// Read the value of a control from its root node.
pub fn read_value(root: &Node) -> FieldValue {
    let Some(kind) = kind_of(root) else {
        return FieldValue::Empty;
    };
    match kind {
        FieldKind::Text | FieldKind::Search => primitive_of(root)
            .and_then(|p| p.attr("value"))
            .map(|v| FieldValue::Text(v.to_string()))
            .unwrap_or(FieldValue::Empty),
        FieldKind::Number => match primitive_of(root).and_then(|p| p.attr("value")) {
            Some(v) => v
                .trim()
                .parse::<f64>()
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Empty),
            None => FieldValue::Empty,
        },
        FieldKind::Textarea => FieldValue::Text(
            primitive_of(root)
                .and_then(|p| p.text.clone())
                .unwrap_or_default(),
        ),
        FieldKind::Select => primitive_of(root)
            .and_then(|p| p.children.iter().find(|o| o.has_attr("selected")))
            .and_then(|o| o.attr("value"))
            .map(|v| FieldValue::Text(v.to_string()))
            .unwrap_or(FieldValue::Empty),
        FieldKind::Switch => {
            FieldValue::Bool(primitive_of(root).is_some_and(|p| p.has_attr("checked")))
        }
        FieldKind::CheckboxGroup => FieldValue::List(
            option_inputs(root)
                .into_iter()
                .filter(|n| n.has_attr("checked"))
                .filter_map(|n| n.attr("value").map(str::to_string))
                .collect(),
        ),
        FieldKind::RadioGroup => option_inputs(root)
            .into_iter()
            .find(|n| n.has_attr("checked"))
            .and_then(|n| n.attr("value"))
            .map(|v| FieldValue::Text(v.to_string()))
            .unwrap_or(FieldValue::Empty),
        FieldKind::Unsupported(_) => FieldValue::Empty,
    }
}

/// Values of every supported control under `tree`, keyed by field id.
pub fn read_form(tree: &Node) -> FormValues {
    let mut values = FormValues::new();
    for root in tree.find_all(&|n| n.has_attr("data-field")) {
        let supported = kind_of(root).is_some_and(|k| k.is_supported());
        if let (true, Some(id)) = (supported, root.attr("data-field")) {
            values.insert(id.to_string(), read_value(root));
        }
    }
    values
}

/// Locate a control root by field id.
pub fn control<'a>(tree: &'a Node, field_id: &str) -> Option<&'a Node> {
    tree.find(&|n| n.attr("data-field") == Some(field_id))
}

pub fn control_mut<'a>(tree: &'a mut Node, field_id: &str) -> Option<&'a mut Node> {
    tree.find_mut(&|n| n.attr("data-field") == Some(field_id))
}

/// Required-ness and range problems of one control, if any.
pub fn check_control(root: &Node) -> Option<String> {
    let kind = kind_of(root)?;
    let required = root.has_attr("required") || primitive_of(root).is_some_and(|p| p.has_attr("required"));
    let value = read_value(root);
    if required && value.is_empty() {
        return Some("required".to_string());
    }
    if kind == FieldKind::Number {
        let prim = primitive_of(root)?;
        let raw = prim.attr("value").unwrap_or_default();
        if !raw.trim().is_empty() && value == FieldValue::Empty {
            return Some("not a number".to_string());
        }
        if let FieldValue::Number(n) = value {
            let bound = |key: &str| prim.attr(key).and_then(|v| v.parse::<f64>().ok());
            if let Some(min) = bound("min") {
                if n < min {
                    return Some(format!("below minimum {}", format_number(min)));
                }
            }
            if let Some(max) = bound("max") {
                if n > max {
                    return Some(format!("above maximum {}", format_number(max)));
                }
            }
        }
    }
    None
}

// ─── Mutation ────────────────────────────────────────────────────────

/// Replace the text of a text-like control. Number controls refuse input
/// that does not parse (empty is allowed). Returns whether it applied.
pub fn set_text(root: &mut Node, text: &str) -> bool {
    let Some(kind) = kind_of(root) else {
        return false;
    };
    if kind == FieldKind::Number && !text.trim().is_empty() && text.trim().parse::<f64>().is_err() {
        return false;
    }
    let Some(prim) = primitive_of_mut(root) else {
        return false;
    };
    match kind {
        FieldKind::Text | FieldKind::Search | FieldKind::Number => {
            prim.set_attr("value", text);
            true
        }
        FieldKind::Textarea => {
            prim.text = Some(text.to_string());
            true
        }
        _ => false,
    }
}

/// Flip a switch. Returns whether it applied.
pub fn toggle_switch(root: &mut Node) -> bool {
    if kind_of(root) != Some(FieldKind::Switch) {
        return false;
    }
    match primitive_of_mut(root) {
        Some(prim) => {
            let on = prim.has_attr("checked");
            prim.set_flag("checked", !on);
            true
        }
        None => false,
    }
}

/// Make `value` the single selection of a select or radio group.
pub fn choose_option(root: &mut Node, value: &str) -> bool {
    match kind_of(root) {
        Some(FieldKind::Select) => {
            let Some(prim) = primitive_of_mut(root) else {
                return false;
            };
            if !prim.children.iter().any(|o| o.attr("value") == Some(value)) {
                return false;
            }
            for option in &mut prim.children {
                let hit = option.attr("value") == Some(value);
                option.set_flag("selected", hit);
            }
            true
        }
        Some(FieldKind::RadioGroup) => {
            if !option_inputs(root).iter().any(|n| n.attr("value") == Some(value)) {
                return false;
            }
            root.walk_mut(&mut |n| {
                if n.has_attr("data-option") {
                    let hit = n.attr("value") == Some(value);
                    n.set_flag("checked", hit);
                }
            });
            true
        }
        _ => false,
    }
}

/// Toggle one option of a checkbox group; the others are untouched.
pub fn toggle_option(root: &mut Node, value: &str) -> bool {
    if kind_of(root) != Some(FieldKind::CheckboxGroup) {
        return false;
    }
    let mut applied = false;
    root.walk_mut(&mut |n| {
        if n.has_attr("data-option") && n.attr("value") == Some(value) {
            let on = n.has_attr("checked");
            n.set_flag("checked", !on);
            applied = true;
        }
    });
    applied
}

/// Option values of a select or group control, in order.
pub fn option_values(root: &Node) -> Vec<String> {
    match kind_of(root) {
        Some(FieldKind::Select) => primitive_of(root)
            .map(|p| {
                p.children
                    .iter()
                    .filter_map(|o| o.attr("value").map(str::to_string))
                    .collect()
            })
            .unwrap_or_default(),
        Some(FieldKind::CheckboxGroup | FieldKind::RadioGroup) => option_inputs(root)
            .into_iter()
            .filter_map(|n| n.attr("value").map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Move the single selection of a select or radio group by `delta`,
/// wrapping around. A radio group with nothing checked starts at the first
/// option.
pub fn cycle_option(root: &mut Node, delta: i32) -> bool {
    let values = option_values(root);
    if values.is_empty() {
        return false;
    }
    let current = read_value(root).as_text();
    let len = values.len() as i32;
    let next = match current.and_then(|c| values.iter().position(|v| *v == c)) {
        Some(i) => (i as i32 + delta).rem_euclid(len),
        None => 0,
    };
    choose_option(root, &values[next as usize])
}
