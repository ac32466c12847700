//! Tree transformation: detail levels, skip and hoist rules, single-child
//! structural collapse, and viewport clipping of scrollable containers.

use crate::model::{Action, Bounds, ClippedCounts, DetailLevel, Node, Role, State};

/// Produce the display tree for the requested detail level. `screen` is the
/// root viewport for clipping. The input is never mutated; `full` returns a
/// deep copy.
pub fn prune_tree(roots: &[Node], detail: DetailLevel, screen: Bounds) -> Vec<Node> {
    match detail {
        DetailLevel::Full => roots.to_vec(),
        DetailLevel::Minimal => roots.iter().filter_map(prune_minimal).collect(),
        DetailLevel::Standard => {
            let ctx = ParentCtx {
                parent_name_nonempty: false,
                original_sibling_count: roots.len(),
            };
            let mut out = Vec::new();
            for root in roots {
                match prune_standard(root, &screen, ctx) {
                    Outcome::Removed => {}
                    Outcome::Kept(node) => out.push(node),
                    Outcome::Hoisted(children) => out.extend(children),
                }
            }
            out
        }
    }
}

/// Minimal detail: keep a node only if it has a meaningful action or a kept
/// descendant.
fn prune_minimal(node: &Node) -> Option<Node> {
    let children: Vec<Node> = node.children.iter().filter_map(prune_minimal).collect();
    if node.has_meaningful_action() || !children.is_empty() {
        let mut kept = node.without_children();
        kept.children = children;
        Some(kept)
    } else {
        None
    }
}

#[derive(Clone, Copy)]
struct ParentCtx {
    parent_name_nonempty: bool,
    /// The parent's child count before any earlier siblings were dropped.
    original_sibling_count: usize,
}

enum Outcome {
    Removed,
    Kept(Node),
    Hoisted(Vec<Node>),
}

fn prune_standard(node: &Node, viewport: &Bounds, ctx: ParentCtx) -> Outcome {
    if should_skip(node, ctx) {
        return Outcome::Removed;
    }

    // A scrollable container narrows the viewport for its subtree and clips
    // children that fall entirely outside it.
    let scrollable = node.actions.contains(&Action::Scroll) && node.bounds.is_some();
    let child_viewport = if scrollable {
        node.bounds.as_ref().map(|b| b.intersect(viewport)).unwrap_or(*viewport)
    } else {
        *viewport
    };

    let child_ctx = ParentCtx {
        parent_name_nonempty: !node.name.trim().is_empty(),
        original_sibling_count: node.children.len(),
    };

    let mut clipped = ClippedCounts::default();
    let mut children = Vec::new();
    for child in &node.children {
        if scrollable {
            if let Some(child_bounds) = &child.bounds {
                if child_bounds.outside(&child_viewport) {
                    let count = child.subtree_size();
                    match clip_direction(child_bounds, &child_viewport) {
                        ClipDirection::Above => clipped.above += count,
                        ClipDirection::Below => clipped.below += count,
                        ClipDirection::Left => clipped.left += count,
                        ClipDirection::Right => clipped.right += count,
                    }
                    continue;
                }
            }
        }
        match prune_standard(child, &child_viewport, child_ctx) {
            Outcome::Removed => {}
            Outcome::Kept(kept) => children.push(kept),
            Outcome::Hoisted(grandchildren) => children.extend(grandchildren),
        }
    }

    if should_hoist(node) {
        return Outcome::Hoisted(children);
    }

    // Structural wrappers around a single survivor collapse away.
    if children.len() == 1
        && clipped.is_empty()
        && is_collapsible_role(node.role)
        && node.name.trim().is_empty()
        && !node.has_meaningful_action()
    {
        return Outcome::Kept(children.remove(0));
    }

    let mut kept = node.without_children();
    kept.children = children;
    kept.clipped = if clipped.is_empty() { None } else { Some(clipped) };
    Outcome::Kept(kept)
}

fn should_skip(node: &Node, ctx: ParentCtx) -> bool {
    if matches!(
        node.role,
        Role::Scrollbar | Role::Separator | Role::TitleBar | Role::Tooltip | Role::Status
    ) {
        return true;
    }
    if let Some(bounds) = &node.bounds {
        if bounds.w == 0 || bounds.h == 0 {
            return true;
        }
    }
    let unnamed = node.name.trim().is_empty();
    if node.role == Role::Img && unnamed {
        return true;
    }
    if node.role == Role::Text && unnamed {
        return true;
    }
    if node.role == Role::Text && ctx.parent_name_nonempty && ctx.original_sibling_count == 1 {
        return true;
    }
    if node.has_state(State::Offscreen) && !node.has_meaningful_action() {
        return true;
    }
    false
}

fn should_hoist(node: &Node) -> bool {
    let unnamed = node.name.trim().is_empty();
    match node.role {
        Role::Generic | Role::Region => unnamed,
        Role::Group => unnamed && !node.has_meaningful_action(),
        _ => false,
    }
}

fn is_collapsible_role(role: Role) -> bool {
    matches!(
        role,
        Role::Region
            | Role::Document
            | Role::Main
            | Role::Complementary
            | Role::Navigation
            | Role::Search
            | Role::Banner
            | Role::ContentInfo
            | Role::Form
    )
}

enum ClipDirection {
    Above,
    Below,
    Left,
    Right,
}

/// Direction of a clipped child relative to the viewport. When both axes
/// qualify the vertical one wins.
fn clip_direction(child: &Bounds, viewport: &Bounds) -> ClipDirection {
    if child.bottom() <= viewport.y {
        ClipDirection::Above
    } else if child.y >= viewport.bottom() {
        ClipDirection::Below
    } else if child.right() <= viewport.x {
        ClipDirection::Left
    } else {
        ClipDirection::Right
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    fn node(id: &str, role: Role, name: &str) -> Node {
        Node::new(id, role, name)
    }

    fn screen() -> Bounds {
        Bounds::new(0, 0, 1920, 1080)
    }

    #[test]
    fn test_full_is_deep_copy() {
        let mut root = node("e0", Role::Window, "Win");
        root.children.push(node("e1", Role::Scrollbar, ""));
        let roots = vec![root];
        let out = prune_tree(&roots, DetailLevel::Full, screen());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].children.len(), 1);
        // Deep equality without shared identity: mutating the copy leaves
        // the original untouched.
        let mut out = out;
        out[0].children.clear();
        assert_eq!(roots[0].children.len(), 1);
    }

    #[test]
    fn test_hoist_unnamed_generic() {
        let mut root = node("e0", Role::Window, "Win");
        let mut wrapper = node("e1", Role::Generic, "");
        wrapper.children.push({
            let mut b = node("e2", Role::Button, "Click");
            b.actions.push(Action::Click);
            b
        });
        root.children.push(wrapper);

        let out = prune_tree(&[root], DetailLevel::Standard, screen());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].children.len(), 1);
        assert_eq!(out[0].children[0].role, Role::Button);
        assert_eq!(out[0].children[0].name, "Click");
    }

    #[test]
    fn test_skip_decorative_image() {
        let mut root = node("e0", Role::Window, "Win");
        root.children.push(node("e1", Role::Img, ""));
        let out = prune_tree(&[root], DetailLevel::Standard, screen());
        assert!(out[0].children.is_empty());
    }

    #[test]
    fn test_named_image_survives() {
        let mut root = node("e0", Role::Window, "Win");
        root.children.push(node("e1", Role::Img, "Logo"));
        let out = prune_tree(&[root], DetailLevel::Standard, screen());
        assert_eq!(out[0].children.len(), 1);
    }

    #[test]
    fn test_skip_sole_text_child_of_named_parent() {
        let mut parent = node("e0", Role::Button, "Save");
        parent.actions.push(Action::Click);
        parent.children.push(node("e1", Role::Text, "Save"));
        let out = prune_tree(&[parent], DetailLevel::Standard, screen());
        assert!(out[0].children.is_empty());
    }

    #[test]
    fn test_sole_text_rule_uses_original_child_count() {
        // The img sibling is dropped first, leaving the text alone, but the
        // rule sees the original count of 2 and keeps it.
        let mut parent = node("e0", Role::Button, "Save");
        parent.actions.push(Action::Click);
        parent.children.push(node("e1", Role::Img, ""));
        parent.children.push(node("e2", Role::Text, "Save"));
        let out = prune_tree(&[parent], DetailLevel::Standard, screen());
        assert_eq!(out[0].children.len(), 1);
        assert_eq!(out[0].children[0].role, Role::Text);
    }

    #[test]
    fn test_offscreen_without_actions_skipped() {
        let mut root = node("e0", Role::Window, "Win");
        let mut gone = node("e1", Role::Text, "faded");
        gone.states.insert(State::Offscreen);
        root.children.push(gone);
        let mut stays = node("e2", Role::Button, "Go");
        stays.states.insert(State::Offscreen);
        stays.actions.push(Action::Click);
        root.children.push(stays);

        let out = prune_tree(&[root], DetailLevel::Standard, screen());
        assert_eq!(out[0].children.len(), 1);
        assert_eq!(out[0].children[0].name, "Go");
    }

    #[test]
    fn test_viewport_clipping_counts_below() {
        let mut container = node("e0", Role::Group, "list");
        container.bounds = Some(Bounds::new(0, 0, 200, 100));
        container.actions.push(Action::Scroll);

        let mut a = node("e1", Role::Button, "A");
        a.bounds = Some(Bounds::new(0, 0, 200, 30));
        a.actions.push(Action::Click);
        let mut b = node("e2", Role::Button, "B");
        b.bounds = Some(Bounds::new(0, 200, 200, 30));
        b.actions.push(Action::Click);
        container.children.push(a);
        container.children.push(b);

        let out = prune_tree(&[container], DetailLevel::Standard, screen());
        assert_eq!(out[0].children.len(), 1);
        assert_eq!(out[0].children[0].name, "A");
        let clipped = out[0].clipped.expect("clip counters");
        assert_eq!(clipped.below, 1);
        assert_eq!(clipped.total(), 1);
    }

    #[test]
    fn test_clip_counts_whole_subtree() {
        let mut container = node("e0", Role::Group, "list");
        container.bounds = Some(Bounds::new(0, 0, 200, 100));
        container.actions.push(Action::Scroll);

        let mut row = node("e1", Role::ListItem, "row");
        row.bounds = Some(Bounds::new(0, 300, 200, 30));
        row.children.push(node("e2", Role::Text, "cell"));
        row.children.push(node("e3", Role::Text, "cell"));
        container.children.push(row);

        let out = prune_tree(&[container], DetailLevel::Standard, screen());
        assert_eq!(out[0].clipped.unwrap().below, 3);
    }

    #[test]
    fn test_clip_vertical_wins_on_corner() {
        // Entirely below AND to the right; vertical axis takes precedence.
        let mut container = node("e0", Role::Group, "grid");
        container.bounds = Some(Bounds::new(0, 0, 100, 100));
        container.actions.push(Action::Scroll);
        let mut corner = node("e1", Role::Button, "corner");
        corner.bounds = Some(Bounds::new(200, 200, 10, 10));
        corner.actions.push(Action::Click);
        container.children.push(corner);

        let out = prune_tree(&[container], DetailLevel::Standard, screen());
        let clipped = out[0].clipped.unwrap();
        assert_eq!(clipped.below, 1);
        assert_eq!(clipped.right, 0);
    }

    #[test]
    fn test_single_child_collapse() {
        let mut region = node("e0", Role::Navigation, "");
        let mut link = node("e1", Role::Link, "Home");
        link.actions.push(Action::Click);
        region.children.push(link);

        let out = prune_tree(&[region], DetailLevel::Standard, screen());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].role, Role::Link);
    }

    #[test]
    fn test_named_region_does_not_collapse() {
        let mut region = node("e0", Role::Navigation, "Site nav");
        let mut link = node("e1", Role::Link, "Home");
        link.actions.push(Action::Click);
        region.children.push(link);

        let out = prune_tree(&[region], DetailLevel::Standard, screen());
        assert_eq!(out[0].role, Role::Navigation);
        assert_eq!(out[0].children.len(), 1);
    }

    #[test]
    fn test_minimal_keeps_interactables_and_ancestors() {
        let mut root = node("e0", Role::Window, "Win");
        let mut group = node("e1", Role::Group, "toolbar");
        let mut button = node("e2", Role::Button, "Run");
        button.actions.push(Action::Click);
        group.children.push(button);
        root.children.push(group);
        root.children.push(node("e3", Role::Text, "status line"));

        let out = prune_tree(&[root], DetailLevel::Minimal, screen());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].children.len(), 1);
        assert_eq!(out[0].children[0].children[0].name, "Run");
    }

    #[test]
    fn test_minimal_drops_focus_only_nodes() {
        let mut root = node("e0", Role::Window, "Win");
        let mut focusable = node("e1", Role::Generic, "pane");
        focusable.actions.push(Action::Focus);
        root.children.push(focusable);
        let out = prune_tree(&[root], DetailLevel::Minimal, screen());
        assert!(out.is_empty());
    }

    #[test]
    fn test_sibling_order_preserved() {
        let mut root = node("e0", Role::Window, "Win");
        for (i, label) in ["one", "two", "three"].iter().enumerate() {
            let mut b = node(&format!("e{}", i + 1), Role::Button, *label);
            b.actions.push(Action::Click);
            root.children.push(b);
        }
        let out = prune_tree(&[root], DetailLevel::Standard, screen());
        let names: Vec<&str> = out[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_zero_size_bounds_skipped() {
        let mut root = node("e0", Role::Window, "Win");
        let mut flat = node("e1", Role::Button, "ghost");
        flat.bounds = Some(Bounds::new(10, 10, 0, 20));
        flat.actions.push(Action::Click);
        root.children.push(flat);
        let out = prune_tree(&[root], DetailLevel::Standard, screen());
        assert!(out[0].children.is_empty());
    }
}
