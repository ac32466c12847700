use std::fmt::Write as _;

use crate::model::{Action, Envelope, Node, WindowInfo};

/// Appended verbatim when the rendered text exceeds the byte budget.
pub const TRUNCATION_NOTICE: &str = "\
# OUTPUT TRUNCATED — exceeded character limit.
# Use find(name=...) to locate specific elements instead.
# Or use snapshot_app(app='<title>') to target a specific window.
";

const NAME_LIMIT: usize = 80;
const VALUE_LIMIT: usize = 120;

/// Render the envelope as the byte-budgeted compact text format.
/// `nodes_before_pruning` is the node count of the unpruned tree, reported
/// in the header next to the rendered count.
pub fn serialize_compact(
    envelope: &Envelope,
    nodes_before_pruning: usize,
    max_chars: usize,
) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "# CUP {} | {} | {}x{}",
        envelope.version, envelope.platform, envelope.screen.w, envelope.screen.h
    );
    if let Some(app) = envelope.app.as_ref().and_then(|a| a.name.clone()) {
        let _ = writeln!(out, "# app: {}", app);
    }
    let _ = writeln!(
        out,
        "# {} nodes ({} before pruning)",
        envelope.node_count(),
        nodes_before_pruning
    );
    if let Some(tools) = &envelope.tools {
        if !tools.is_empty() {
            let _ = writeln!(out, "# {} WebMCP tool(s) available", tools.len());
        }
    }
    if let Some(windows) = &envelope.windows {
        if !windows.is_empty() {
            let _ = writeln!(out, "# --- {} open windows ---", windows.len());
            for window in windows {
                if window.foreground == Some(true) {
                    let _ = writeln!(out, "#   {} [fg]", window.title);
                } else {
                    let _ = writeln!(out, "#   {}", window.title);
                }
            }
        }
    }

    for root in &envelope.tree {
        emit_node(&mut out, root, 0);
    }

    enforce_budget(out, max_chars)
}

fn emit_node(out: &mut String, node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    out.push_str(&indent);
    out.push_str(&node_line(node));
    out.push('\n');

    for child in &node.children {
        emit_node(out, child, depth + 1);
    }

    if let Some(clipped) = &node.clipped {
        if !clipped.is_empty() {
            let mut dirs = Vec::new();
            if clipped.above > 0 {
                dirs.push("up");
            }
            if clipped.below > 0 {
                dirs.push("down");
            }
            if clipped.left > 0 {
                dirs.push("left");
            }
            if clipped.right > 0 {
                dirs.push("right");
            }
            let _ = writeln!(
                out,
                "{}  # {} more items — scroll {} to see",
                indent,
                clipped.total(),
                dirs.join("/")
            );
        }
    }
}

/// One node as a single line:
/// `[id] role "name" [@x,y wxh] [{states}] [[actions]] [val="…"] [(attrs)]`.
fn node_line(node: &Node) -> String {
    let mut parts = Vec::new();

    parts.push(format!("[{}]", node.id));
    parts.push(node.role.to_string());
    parts.push(format!("\"{}\"", escape(&clip(&node.name, NAME_LIMIT))));

    let meaningful = node.has_meaningful_action();
    if meaningful {
        if let Some(b) = &node.bounds {
            parts.push(format!("@{},{} {}x{}", b.x, b.y, b.w, b.h));
        }
    }

    if !node.states.is_empty() {
        let states: Vec<&str> = node.states.iter().map(|s| s.as_str()).collect();
        parts.push(format!("{{{}}}", states.join(",")));
    }

    // `focus` is elided from the printed list.
    let actions: Vec<&str> = node
        .actions
        .iter()
        .filter(|a| a.is_meaningful())
        .map(Action::as_str)
        .collect();
    if !actions.is_empty() {
        parts.push(format!("[{}]", actions.join(",")));
    }

    if let Some(value) = &node.value {
        parts.push(format!("val=\"{}\"", escape(&clip(value, VALUE_LIMIT))));
    }

    let attrs = compact_attrs(node);
    if !attrs.is_empty() {
        parts.push(format!("({})", attrs.join(" ")));
    }

    parts.join(" ")
}

fn compact_attrs(node: &Node) -> Vec<String> {
    let a = &node.attributes;
    let mut out = Vec::new();
    if let Some(level) = a.level {
        out.push(format!("level={}", level));
    }
    if let Some(now) = a.value_now {
        match (a.value_min, a.value_max) {
            (Some(min), Some(max)) => out.push(format!("value={} [{}..{}]", now, min, max)),
            _ => out.push(format!("value={}", now)),
        }
    }
    if let Some(orientation) = a.orientation {
        out.push(format!("{:?}", orientation).to_lowercase());
    }
    if let (Some(pos), Some(size)) = (a.pos_in_set, a.set_size) {
        out.push(format!("{}/{}", pos, size));
    }
    if let Some(placeholder) = &a.placeholder {
        out.push(format!("placeholder=\"{}\"", escape(&clip(placeholder, 40))));
    }
    if let Some(url) = &a.url {
        out.push(format!("url={}", clip(url, 80)));
    }
    if let Some(shortcut) = &a.key_shortcut {
        out.push(format!("keys={}", shortcut));
    }
    out
}

/// Truncate to `limit` characters, appending an ellipsis when anything was
/// cut.
fn clip(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(limit).collect();
        out.push('…');
        out
    }
}

/// JSON-string escaping without the surrounding quotes.
fn escape(s: &str) -> String {
    match serde_json::to_string(s) {
        Ok(quoted) if quoted.len() >= 2 => quoted[1..quoted.len() - 1].to_string(),
        _ => s.to_string(),
    }
}

/// Cut at the last newline inside the budget and append the fixed notice.
fn enforce_budget(text: String, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text;
    }
    let cut = text[..max_chars].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let mut out = text[..cut].to_string();
    out.push_str(TRUNCATION_NOTICE);
    out
}

/// Window overview text: header plus one line per window, foreground first
/// by marker rather than by reordering.
pub fn serialize_overview(envelope: &Envelope, windows: &[WindowInfo]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "# CUP {} | {} | {}x{}",
        envelope.version, envelope.platform, envelope.screen.w, envelope.screen.h
    );
    let _ = writeln!(out, "# overview | {} windows", windows.len());

    for window in windows {
        let mut line = if window.foreground == Some(true) {
            format!("* [fg] {}", window.title)
        } else {
            format!("  {}", window.title)
        };
        if let Some(pid) = window.pid {
            let _ = write!(line, " (pid:{})", pid);
        }
        if let Some(b) = &window.bounds {
            let _ = write!(line, " @{},{} {}x{}", b.x, b.y, b.w, b.h);
        }
        if let Some(url) = &window.url {
            let _ = write!(line, " url:{}", clip(url, 80));
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bounds, Node, Platform, Role, ScreenInfo, State};

    fn envelope(tree: Vec<Node>) -> Envelope {
        Envelope::new(Platform::Linux, ScreenInfo::new(1920, 1080, 1.0), tree)
    }

    #[test]
    fn test_node_line_shape() {
        let mut node = Node::new("e14", Role::Button, "Submit");
        node.bounds = Some(Bounds::new(100, 50, 80, 30));
        node.actions.push(Action::Click);
        assert_eq!(node_line(&node), "[e14] button \"Submit\" @100,50 80x30 [click]");
    }

    #[test]
    fn test_bounds_only_for_meaningful_actions() {
        let mut node = Node::new("e3", Role::Text, "label");
        node.bounds = Some(Bounds::new(1, 2, 3, 4));
        assert_eq!(node_line(&node), "[e3] text \"label\"");

        node.actions.push(Action::Focus);
        // focus alone is elided and does not unlock bounds either
        assert_eq!(node_line(&node), "[e3] text \"label\"");
    }

    #[test]
    fn test_states_and_value_rendering() {
        let mut node = Node::new("e5", Role::Textbox, "Email");
        node.states.insert(State::Focused);
        node.states.insert(State::Editable);
        node.actions.push(Action::Type);
        node.value = Some("user@example.com".to_string());
        let line = node_line(&node);
        assert!(line.contains("{editable,focused}"));
        assert!(line.contains("[type]"));
        assert!(line.contains("val=\"user@example.com\""));
    }

    #[test]
    fn test_name_escaping_and_clipping() {
        let mut node = Node::new("e0", Role::Button, "say \"hi\"\n");
        node.actions.push(Action::Click);
        let line = node_line(&node);
        assert!(line.contains("\"say \\\"hi\\\"\\n\""));

        let long = Node::new("e1", Role::Text, "x".repeat(300));
        let line = node_line(&long);
        assert!(line.contains(&format!("\"{}…\"", "x".repeat(80))));
    }

    #[test]
    fn test_header_and_indentation() {
        let mut root = Node::new("e0", Role::Window, "Main");
        let mut child = Node::new("e1", Role::Button, "Go");
        child.actions.push(Action::Click);
        root.children.push(child);

        let text = serialize_compact(&envelope(vec![root]), 5, 40_000);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# CUP 0.1.0 | linux | 1920x1080");
        assert_eq!(lines[1], "# 2 nodes (5 before pruning)");
        assert!(lines[2].starts_with("[e0] window"));
        assert!(lines[3].starts_with("  [e1] button"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_clipped_hint_line() {
        let mut container = Node::new("e0", Role::Group, "list");
        container.actions.push(Action::Scroll);
        container.clipped = Some(crate::model::ClippedCounts {
            below: 1,
            ..Default::default()
        });
        let text = serialize_compact(&envelope(vec![container]), 2, 40_000);
        assert!(text.contains("  # 1 more items — scroll down to see\n"));
    }

    #[test]
    fn test_clipped_hint_multiple_directions() {
        let mut container = Node::new("e0", Role::Group, "grid");
        container.actions.push(Action::Scroll);
        container.clipped = Some(crate::model::ClippedCounts {
            above: 2,
            below: 3,
            ..Default::default()
        });
        let text = serialize_compact(&envelope(vec![container]), 5, 40_000);
        assert!(text.contains("# 5 more items — scroll up/down to see"));
    }

    #[test]
    fn test_budget_truncates_at_newline() {
        let mut roots = Vec::new();
        for i in 0..200 {
            let mut node = Node::new(format!("e{}", i), Role::Button, format!("Button {}", i));
            node.actions.push(Action::Click);
            roots.push(node);
        }
        let budget = 2000;
        let text = serialize_compact(&envelope(roots), 200, budget);
        assert!(text.len() <= budget + TRUNCATION_NOTICE.len());
        assert!(text.ends_with(TRUNCATION_NOTICE));
        // The cut lands on a line boundary: strip the notice and the rest
        // still ends with a newline.
        let body = &text[..text.len() - TRUNCATION_NOTICE.len()];
        assert!(body.ends_with('\n'));
        assert!(body.lines().all(|l| l.starts_with('#') || l.trim_start().starts_with('[')));
    }

    #[test]
    fn test_overview_format() {
        let env = envelope(Vec::new());
        let windows = vec![
            WindowInfo {
                title: "Editor".to_string(),
                pid: Some(1200),
                foreground: Some(true),
                bounds: Some(Bounds::new(0, 0, 1920, 1080)),
                ..WindowInfo::default()
            },
            WindowInfo {
                title: "Terminal".to_string(),
                pid: Some(1300),
                ..WindowInfo::default()
            },
        ];
        let text = serialize_overview(&env, &windows);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "# overview | 2 windows");
        assert_eq!(lines[2], "* [fg] Editor (pid:1200) @0,0 1920x1080");
        assert_eq!(lines[3], "  Terminal (pid:1300)");
    }
}
