use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::vocab::{Action, Role, State};

pub const MAX_TEXT_LEN: usize = 200;
pub const MAX_URL_LEN: usize = 500;

/// Screen-pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn intersect(&self, other: &Bounds) -> Bounds {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Bounds {
            x,
            y,
            w: (right - x).max(0),
            h: (bottom - y).max(0),
        }
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Entirely outside `other`, touching edges included.
    pub fn outside(&self, other: &Bounds) -> bool {
        !self.intersects(other)
    }
}

/// Slider/scrollbar/toolbar orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// ARIA live-region politeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveSetting {
    Polite,
    Assertive,
    Off,
}

/// ARIA autocomplete behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Autocomplete {
    Inline,
    List,
    Both,
    None,
}

/// Recognized per-node attributes. Everything optional; the whole block is
/// omitted from JSON when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_now: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos_in_set: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live: Option<LiveSetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<Autocomplete>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_shortcut: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roledescription: Option<String>,
}

impl NodeAttributes {
    pub fn is_empty(&self) -> bool {
        *self == NodeAttributes::default()
    }

    /// Enforce the string-field length caps (200, url 500).
    pub fn truncate_strings(&mut self) {
        if let Some(p) = self.placeholder.take() {
            self.placeholder = Some(truncate(&p, MAX_TEXT_LEN));
        }
        if let Some(u) = self.url.take() {
            self.url = Some(truncate(&u, MAX_URL_LEN));
        }
        if let Some(k) = self.key_shortcut.take() {
            self.key_shortcut = Some(truncate(&k, MAX_TEXT_LEN));
        }
        if let Some(r) = self.roledescription.take() {
            self.roledescription = Some(truncate(&r, MAX_TEXT_LEN));
        }
    }
}

/// Counters attached to a scrollable container whose out-of-viewport children
/// were clipped. Transient: never serialized to the JSON envelope, only read
/// by the compact text emitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClippedCounts {
    pub above: usize,
    pub below: usize,
    pub left: usize,
    pub right: usize,
}

impl ClippedCounts {
    pub fn total(&self) -> usize {
        self.above + self.below + self.left + self.right
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// A semantic UI element. IDs are `e<N>`, assigned in pre-order and valid
/// only within the snapshot that produced them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Node {
    pub id: String,
    pub role: Role,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub states: BTreeSet<State>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub actions: Vec<Action>,
    #[serde(skip_serializing_if = "NodeAttributes::is_empty", default)]
    pub attributes: NodeAttributes,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<Node>,
    /// Opaque platform attributes, carried through but never consumed after
    /// mapping.
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub platform: HashMap<String, serde_json::Value>,
    #[serde(skip)]
    pub clipped: Option<ClippedCounts>,
}

impl Node {
    pub fn new(id: impl Into<String>, role: Role, name: impl Into<String>) -> Self {
        Node {
            id: id.into(),
            role,
            name: truncate(&name.into(), MAX_TEXT_LEN),
            ..Node::default()
        }
    }

    pub fn has_meaningful_action(&self) -> bool {
        self.actions.iter().any(Action::is_meaningful)
    }

    pub fn has_state(&self, state: State) -> bool {
        self.states.contains(&state)
    }

    /// Node count of the subtree rooted here, self included.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(Node::subtree_size).sum::<usize>()
    }

    /// Clone without children, for search results.
    pub fn without_children(&self) -> Node {
        let mut n = self.clone();
        n.children = Vec::new();
        n
    }
}

/// Truncate on a char boundary to at most `max` characters.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
