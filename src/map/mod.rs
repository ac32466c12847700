//! Canonical mapper: translates each platform's raw attributes into the
//! canonical role/state/action vocabulary and reassembles the flat capture
//! stream into a tree, assigning `e<N>` identifiers in pre-order.

mod aria;
mod atspi;
mod ax;
mod cdp;
mod uia;

use std::collections::{BTreeSet, HashMap};

use crate::model::{
    truncate, Action, Bounds, Node, NodeAttributes, Role, State, MAX_TEXT_LEN,
};
use crate::platform::{CaptureOutput, CaptureStats, NativeRef, RawAttrs, RawNode};

pub use atspi::{has_bit, state_bits};

/// Output of one per-platform mapping, before the shared refinements.
#[derive(Debug, Clone, Default)]
pub struct Mapped {
    pub role: Role,
    pub name: String,
    pub description: Option<String>,
    pub value: Option<String>,
    pub bounds: Option<Bounds>,
    pub states: BTreeSet<State>,
    pub actions: Vec<Action>,
    pub attributes: NodeAttributes,
    pub platform: HashMap<String, serde_json::Value>,
}

/// Roles whose value accepts typed text.
pub fn is_text_input(role: Role) -> bool {
    matches!(
        role,
        Role::Textbox | Role::SearchBox | Role::Combobox | Role::SpinButton
    )
}

/// Non-interactive text-like roles; action enumeration on these is skipped
/// entirely.
pub fn is_static_text(role: Role) -> bool {
    matches!(
        role,
        Role::Text
            | Role::Heading
            | Role::Paragraph
            | Role::Blockquote
            | Role::Caption
            | Role::Code
            | Role::Emphasis
            | Role::Strong
            | Role::Subscript
            | Role::Superscript
            | Role::Deletion
            | Role::Insertion
    )
}

/// Roles that carry valueMin/valueMax/valueNow.
pub fn is_range_role(role: Role) -> bool {
    matches!(
        role,
        Role::ProgressBar | Role::Slider | Role::SpinButton | Role::Scrollbar
    )
}

/// Roles that carry an orientation attribute.
pub fn is_oriented_role(role: Role) -> bool {
    matches!(
        role,
        Role::Scrollbar | Role::Slider | Role::Separator | Role::Toolbar | Role::TabList
    )
}

/// The mapped tree plus the session artifacts produced alongside it.
#[derive(Debug, Default)]
pub struct MappedCapture {
    pub roots: Vec<Node>,
    pub refs: HashMap<String, NativeRef>,
    pub stats: CaptureStats,
}

/// Map a flat capture and rebuild the hierarchy. IDs are assigned in stream
/// order (which is pre-order over roots in input order); the id-to-native-ref
/// map is populated in the same pass.
pub fn map_capture(output: CaptureOutput) -> MappedCapture {
    let CaptureOutput { nodes, stats } = output;

    let mut refs = HashMap::with_capacity(nodes.len());
    let mut roots: Vec<Node> = Vec::new();
    let mut stack: Vec<(u32, Node)> = Vec::new();

    for (index, raw) in nodes.into_iter().enumerate() {
        let id = format!("e{}", index);
        refs.insert(id.clone(), raw.native.clone());
        let node = map_one(id, &raw);

        while let Some((depth, _)) = stack.last() {
            if *depth < raw.depth {
                break;
            }
            let (_, done) = stack.pop().expect("stack entry");
            attach(&mut stack, &mut roots, done);
        }
        stack.push((raw.depth, node));
    }
    while let Some((_, done)) = stack.pop() {
        attach(&mut stack, &mut roots, done);
    }

    tracing::debug!(
        nodes = stats.nodes,
        max_depth = stats.max_depth,
        roots = roots.len(),
        "mapped capture"
    );

    MappedCapture { roots, refs, stats }
}

fn attach(stack: &mut Vec<(u32, Node)>, roots: &mut Vec<Node>, done: Node) {
    match stack.last_mut() {
        Some((_, parent)) => parent.children.push(done),
        None => roots.push(done),
    }
}

fn map_one(id: String, raw: &RawNode) -> Node {
    let mut mapped = match &raw.attrs {
        RawAttrs::Uia(u) => uia::map_node(u),
        RawAttrs::Ax(a) => ax::map_node(a),
        RawAttrs::Atspi(a) => atspi::map_node(a),
        RawAttrs::Cdp(c) => cdp::map_node(c),
    };

    // A nameless-role container that is clickable and labeled is a button in
    // everything but the platform's eyes.
    if mapped.role == Role::Generic
        && mapped.actions.contains(&Action::Click)
        && !mapped.name.trim().is_empty()
    {
        mapped.role = Role::Button;
    }

    if raw.offscreen_by_screen {
        mapped.states.insert(State::Offscreen);
    }

    mapped.attributes.truncate_strings();

    Node {
        id,
        role: mapped.role,
        name: truncate(&mapped.name, MAX_TEXT_LEN),
        description: mapped.description.map(|d| truncate(&d, MAX_TEXT_LEN)),
        value: mapped.value.map(|v| truncate(&v, MAX_TEXT_LEN)),
        bounds: mapped.bounds,
        states: mapped.states,
        actions: mapped.actions,
        attributes: mapped.attributes,
        children: Vec::new(),
        platform: mapped.platform,
        clipped: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::AtspiRaw;

    fn raw_at(depth: u32, role: &str, name: &str) -> RawNode {
        RawNode {
            depth,
            attrs: RawAttrs::Atspi(AtspiRaw {
                role: role.to_string(),
                name: name.to_string(),
                state_bits: (1 << state_bits::ENABLED)
                    | (1 << state_bits::VISIBLE)
                    | (1 << state_bits::SHOWING),
                ..AtspiRaw::default()
            }),
            native: NativeRef::Atspi {
                bus_name: ":1.42".to_string(),
                object_path: format!("/org/a11y/atspi/accessible/{}", name),
            },
            offscreen_by_screen: false,
        }
    }

    #[test]
    fn test_reassembly_preserves_structure() {
        // frame > (panel > button, button), frame
        let stream = vec![
            raw_at(0, "frame", "w1"),
            raw_at(1, "panel", "p"),
            raw_at(2, "push-button", "a"),
            raw_at(1, "push-button", "b"),
            raw_at(0, "frame", "w2"),
        ];
        let out = map_capture(CaptureOutput {
            nodes: stream,
            stats: CaptureStats::default(),
        });

        assert_eq!(out.roots.len(), 2);
        let w1 = &out.roots[0];
        assert_eq!(w1.id, "e0");
        assert_eq!(w1.children.len(), 2);
        assert_eq!(w1.children[0].children[0].name, "a");
        assert_eq!(w1.children[1].name, "b");
        assert_eq!(out.roots[1].id, "e4");
    }

    #[test]
    fn test_ids_contiguous_in_preorder() {
        let stream = vec![
            raw_at(0, "frame", "w"),
            raw_at(1, "panel", "p"),
            raw_at(2, "push-button", "x"),
            raw_at(1, "label", "y"),
        ];
        let out = map_capture(CaptureOutput {
            nodes: stream,
            stats: CaptureStats::default(),
        });

        let mut ids = Vec::new();
        fn walk(node: &Node, ids: &mut Vec<String>) {
            ids.push(node.id.clone());
            for child in &node.children {
                walk(child, ids);
            }
        }
        for root in &out.roots {
            walk(root, &mut ids);
        }
        assert_eq!(ids, vec!["e0", "e1", "e2", "e3"]);
        for id in &ids {
            assert!(out.refs.contains_key(id));
        }
    }

    #[test]
    fn test_depth_gap_still_attaches() {
        // A malformed stream that jumps two levels still nests under the
        // nearest shallower ancestor.
        let stream = vec![raw_at(0, "frame", "w"), raw_at(3, "push-button", "deep")];
        let out = map_capture(CaptureOutput {
            nodes: stream,
            stats: CaptureStats::default(),
        });
        assert_eq!(out.roots.len(), 1);
        assert_eq!(out.roots[0].children[0].name, "deep");
    }

    #[test]
    fn test_generic_with_click_and_name_is_button() {
        let mut node = raw_at(0, "section", "Save changes");
        if let RawAttrs::Atspi(ref mut a) = node.attrs {
            a.actions = vec!["click".to_string()];
        }
        let out = map_capture(CaptureOutput {
            nodes: vec![node],
            stats: CaptureStats::default(),
        });
        assert_eq!(out.roots[0].role, Role::Button);
    }

    #[test]
    fn test_offscreen_by_screen_marks_state() {
        let mut node = raw_at(0, "push-button", "hidden");
        node.offscreen_by_screen = true;
        let out = map_capture(CaptureOutput {
            nodes: vec![node],
            stats: CaptureStats::default(),
        });
        assert!(out.roots[0].states.contains(&State::Offscreen));
    }

    #[test]
    fn test_name_truncated_to_cap() {
        let long = "x".repeat(400);
        let node = raw_at(0, "push-button", &long);
        let out = map_capture(CaptureOutput {
            nodes: vec![node],
            stats: CaptureStats::default(),
        });
        assert_eq!(out.roots[0].name.chars().count(), MAX_TEXT_LEN);
    }
}
