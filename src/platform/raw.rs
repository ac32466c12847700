use serde::Deserialize;
use std::collections::HashMap;

use crate::model::Bounds;

/// One captured element, flat and depth-annotated. Adapters emit these in
/// pre-order; the canonical mapper rebuilds the tree from the depths.
#[derive(Debug, Clone)]
pub struct RawNode {
    pub depth: u32,
    pub attrs: RawAttrs,
    pub native: NativeRef,
    /// Bounds entirely outside the screen rectangle (computed by the
    /// adapter; independent of the platform's own offscreen signal).
    pub offscreen_by_screen: bool,
}

/// Platform-specific captured attributes, one variant per ingestion source.
#[derive(Debug, Clone)]
pub enum RawAttrs {
    Uia(UiaRaw),
    Ax(AxRaw),
    Atspi(AtspiRaw),
    Cdp(CdpRaw),
}

impl RawAttrs {
    /// Native role string for the stats multiset.
    pub fn native_role(&self) -> String {
        match self {
            RawAttrs::Uia(u) => format!("ControlType.{}", u.control_type),
            RawAttrs::Ax(a) => a.role.clone(),
            RawAttrs::Atspi(a) => a.role.clone(),
            RawAttrs::Cdp(c) => c.role.clone(),
        }
    }
}

/// Platform-native reference used to re-identify an element for action
/// dispatch. May go stale between snapshot and action.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeRef {
    Uia {
        hwnd: isize,
        node_index: u32,
    },
    Ax {
        pid: i32,
        /// Child-index path from the application element.
        path: Vec<u32>,
    },
    Atspi {
        bus_name: String,
        object_path: String,
    },
    Cdp {
        ws_url: String,
        backend_id: i64,
    },
}

fn default_true() -> bool {
    true
}

/// UIA cached-property record as emitted by the PowerShell helper.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiaRaw {
    pub depth: u32,
    pub control_type: i32,
    pub name: String,
    pub automation_id: String,
    pub class_name: String,
    pub help_text: String,
    pub value: Option<String>,
    /// x, y, w, h in screen pixels.
    pub bounds: Option<[f64; 4]>,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    pub has_keyboard_focus: bool,
    pub is_keyboard_focusable: bool,
    pub is_offscreen: bool,
    /// 0 = none, 1 = horizontal, 2 = vertical.
    pub orientation: i32,
    pub is_required: bool,
    pub is_modal: bool,
    pub has_invoke: bool,
    pub has_toggle: bool,
    pub has_expand_collapse: bool,
    pub has_value: bool,
    pub has_selection_item: bool,
    pub has_scroll: bool,
    pub has_range_value: bool,
    /// 0 = off, 1 = on, 2 = indeterminate.
    pub toggle_state: Option<i32>,
    /// 0 = collapsed, 1 = expanded, 2 = partially, 3 = leaf.
    pub expand_state: Option<i32>,
    pub is_selected: Option<bool>,
    pub is_readonly: Option<bool>,
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
    pub range_value: Option<f64>,
    pub aria_role: String,
    /// `key=value;key=value` pairs as UIA reports them.
    pub aria_properties: String,
}

/// Batch-fetched AXUIElement attributes as emitted by the Swift helper.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AxRaw {
    pub depth: u32,
    pub role: String,
    pub subrole: String,
    pub title: String,
    pub description: String,
    pub help: String,
    pub identifier: String,
    pub value: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub focused: bool,
    pub selected: bool,
    pub expanded: Option<bool>,
    pub modal: bool,
    pub required: bool,
    pub busy: bool,
    pub editable: bool,
    pub bounds: Option<[f64; 4]>,
    pub actions: Vec<String>,
    pub path: Vec<u32>,
}

/// AT-SPI node assembled from the per-interface D-Bus calls.
#[derive(Debug, Clone, Default)]
pub struct AtspiRaw {
    pub role: String,
    pub name: String,
    pub description: String,
    /// The two 32-bit state masks joined into one word, low word first.
    pub state_bits: u64,
    pub bounds: Option<Bounds>,
    pub actions: Vec<String>,
    pub attributes: HashMap<String, String>,
    pub value_min: Option<f64>,
    pub value_max: Option<f64>,
    pub value_now: Option<f64>,
    pub text: Option<String>,
}

/// CDP accessibility node from `Accessibility.getFullAXTree`.
#[derive(Debug, Clone, Default)]
pub struct CdpRaw {
    pub role: String,
    pub name: String,
    pub description: String,
    pub value: Option<String>,
    pub properties: HashMap<String, serde_json::Value>,
    pub bounds: Option<Bounds>,
    pub backend_id: i64,
}
