use std::collections::HashMap;

use crate::model::{Action, NodeAttributes, Orientation, Role, State};
use crate::platform::AtspiRaw;

use super::{aria, Mapped};

/// AT-SPI state enum bit positions (atspi_state_type).
pub mod state_bits {
    pub const ACTIVE: u64 = 1;
    pub const BUSY: u64 = 3;
    pub const CHECKED: u64 = 4;
    pub const EDITABLE: u64 = 7;
    pub const ENABLED: u64 = 8;
    pub const EXPANDABLE: u64 = 9;
    pub const EXPANDED: u64 = 10;
    pub const FOCUSABLE: u64 = 11;
    pub const FOCUSED: u64 = 12;
    pub const HORIZONTAL: u64 = 14;
    pub const MODAL: u64 = 16;
    pub const MULTISELECTABLE: u64 = 18;
    pub const PRESSED: u64 = 20;
    pub const SELECTABLE: u64 = 22;
    pub const SELECTED: u64 = 23;
    pub const SHOWING: u64 = 25;
    pub const VERTICAL: u64 = 29;
    pub const VISIBLE: u64 = 30;
    pub const INDETERMINATE: u64 = 32;
    pub const REQUIRED: u64 = 33;
    pub const READ_ONLY: u64 = 43;
}

pub fn has_bit(bits: u64, bit: u64) -> bool {
    bits & (1u64 << bit) != 0
}

fn atspi_role(role: &str) -> Role {
    match role {
        "push-button" | "button" => Role::Button,
        "toggle-button" => Role::Button,
        "check-box" => Role::Checkbox,
        "radio-button" => Role::Radio,
        "combo-box" => Role::Combobox,
        "entry" | "text" | "password-text" | "editbar" => Role::Textbox,
        "label" | "static" => Role::Text,
        "heading" => Role::Heading,
        "link" => Role::Link,
        "image" | "icon" | "drawing-area" | "canvas" => Role::Img,
        "panel" | "filler" | "section" | "viewport" | "embedded" | "glass-pane"
        | "layered-pane" | "split-pane" | "unknown" => Role::Generic,
        "frame" | "window" | "desktop-frame" => Role::Window,
        "dialog" | "file-chooser" | "color-chooser" | "font-chooser" => Role::Dialog,
        "alert" => Role::Alert,
        "notification" => Role::Alert,
        "menu" => Role::Menu,
        "menu-bar" => Role::MenuBar,
        "popup-menu" => Role::Menu,
        "menu-item" => Role::MenuItem,
        "check-menu-item" => Role::MenuItemCheckbox,
        "radio-menu-item" => Role::MenuItemRadio,
        "page-tab" => Role::Tab,
        "page-tab-list" => Role::TabList,
        "list" | "list-box" => Role::List,
        "list-item" => Role::ListItem,
        "table" => Role::Table,
        "table-row" => Role::Row,
        "table-cell" => Role::Cell,
        "table-column-header" => Role::ColumnHeader,
        "table-row-header" => Role::RowHeader,
        "tree" => Role::Tree,
        "tree-item" => Role::TreeItem,
        "tree-table" => Role::Tree,
        "tool-bar" => Role::Toolbar,
        "tool-tip" => Role::Tooltip,
        "status-bar" | "statusbar" => Role::Status,
        "progress-bar" => Role::ProgressBar,
        "scroll-bar" => Role::Scrollbar,
        "scroll-pane" => Role::Group,
        "slider" => Role::Slider,
        "spin-button" => Role::SpinButton,
        "separator" => Role::Separator,
        "document-frame" | "document-web" | "document-text" | "document-presentation"
        | "document-spreadsheet" | "document-email" => Role::Document,
        "form" => Role::Form,
        "application" => Role::Application,
        "paragraph" => Role::Paragraph,
        "block-quote" => Role::Blockquote,
        "caption" => Role::Caption,
        "footer" => Role::ContentInfo,
        "header" => Role::Banner,
        "grouping" => Role::Group,
        "radio-group" => Role::Group,
        "article" => Role::Document,
        "landmark" => Role::Region,
        "description-list" => Role::List,
        "description-term" | "description-value" => Role::ListItem,
        "math" => Role::Math,
        "timer" => Role::Timer,
        "marquee" => Role::Marquee,
        "log" => Role::Log,
        "title-bar" => Role::TitleBar,
        _ => Role::Generic,
    }
}

pub fn map_node(raw: &AtspiRaw) -> Mapped {
    let bits = raw.state_bits;
    let mut role = atspi_role(&raw.role);

    // Named panels carry real structure.
    if raw.role == "panel" && !raw.name.trim().is_empty() {
        role = Role::Region;
    }
    // Web content exposed through AT-SPI carries its ARIA role in the
    // xml-roles object attribute.
    if aria::is_refinable(role) {
        if let Some(xml_roles) = raw.attributes.get("xml-roles") {
            if let Some(refined) = xml_roles.split_whitespace().find_map(aria::map_aria_role) {
                role = refined;
            }
        }
    }

    let editable = has_bit(bits, state_bits::EDITABLE);
    let readonly = has_bit(bits, state_bits::READ_ONLY);

    let mut states = std::collections::BTreeSet::new();
    if !has_bit(bits, state_bits::ENABLED) {
        states.insert(State::Disabled);
    }
    if has_bit(bits, state_bits::CHECKED) {
        if role == Role::Button {
            states.insert(State::Pressed);
        } else {
            states.insert(State::Checked);
        }
    }
    if has_bit(bits, state_bits::INDETERMINATE) {
        states.insert(State::Mixed);
    }
    if has_bit(bits, state_bits::PRESSED) {
        states.insert(State::Pressed);
    }
    if has_bit(bits, state_bits::EXPANDED) {
        states.insert(State::Expanded);
    } else if has_bit(bits, state_bits::EXPANDABLE) {
        states.insert(State::Collapsed);
    }
    if has_bit(bits, state_bits::FOCUSED) {
        states.insert(State::Focused);
    }
    if has_bit(bits, state_bits::MODAL) {
        states.insert(State::Modal);
    }
    if has_bit(bits, state_bits::MULTISELECTABLE) {
        states.insert(State::Multiselectable);
    }
    if has_bit(bits, state_bits::REQUIRED) {
        states.insert(State::Required);
    }
    if has_bit(bits, state_bits::SELECTED) {
        states.insert(State::Selected);
    }
    if has_bit(bits, state_bits::BUSY) {
        states.insert(State::Busy);
    }
    if !has_bit(bits, state_bits::VISIBLE) {
        states.insert(State::Hidden);
    } else if !has_bit(bits, state_bits::SHOWING) {
        // Visible but not showing: scrolled out or on another desktop.
        states.insert(State::Offscreen);
    }
    if readonly {
        states.insert(State::Readonly);
    }
    if super::is_text_input(role) {
        if editable && !readonly {
            states.insert(State::Editable);
        } else {
            states.insert(State::Readonly);
        }
    }

    let mut actions = Vec::new();
    if !super::is_static_text(role) {
        for name in &raw.actions {
            let mapped = match name.as_str() {
                "click" | "press" | "activate" | "jump" => Some(Action::Click),
                "toggle" => Some(Action::Toggle),
                "expand or contract" | "expand" => Some(Action::Expand),
                "select" => Some(Action::Select),
                _ => None,
            };
            if let Some(action) = mapped {
                if !actions.contains(&action) {
                    actions.push(action);
                }
                if action == Action::Expand && !actions.contains(&Action::Collapse) {
                    actions.push(Action::Collapse);
                }
            }
        }
        if editable && !readonly && super::is_text_input(role) {
            if !actions.contains(&Action::Type) {
                actions.push(Action::Type);
            }
            if !actions.contains(&Action::SetValue) {
                actions.push(Action::SetValue);
            }
        }
        if raw.value_now.is_some() && !readonly {
            for action in [Action::Increment, Action::Decrement, Action::SetValue] {
                if !actions.contains(&action) {
                    actions.push(action);
                }
            }
        }
        if raw.role == "scroll-pane" || raw.role == "viewport" {
            actions.push(Action::Scroll);
        }
        if actions.is_empty() && has_bit(bits, state_bits::FOCUSABLE) {
            actions.push(Action::Focus);
        }
    }

    let mut attributes = NodeAttributes::default();
    if role == Role::Heading {
        attributes.level = raw.attributes.get("level").and_then(|v| v.parse().ok());
    }
    if role == Role::Link {
        attributes.url = raw.attributes.get("uri").or(raw.attributes.get("href")).cloned();
    }
    if super::is_text_input(role) {
        attributes.placeholder = raw.attributes.get("placeholder-text").cloned();
    }
    if super::is_range_role(role) {
        attributes.value_min = raw.value_min;
        attributes.value_max = raw.value_max;
        attributes.value_now = raw.value_now;
    }
    if super::is_oriented_role(role) {
        if has_bit(bits, state_bits::HORIZONTAL) {
            attributes.orientation = Some(Orientation::Horizontal);
        } else if has_bit(bits, state_bits::VERTICAL) {
            attributes.orientation = Some(Orientation::Vertical);
        }
    }
    attributes.pos_in_set = raw.attributes.get("posinset").and_then(|v| v.parse().ok());
    attributes.set_size = raw.attributes.get("setsize").and_then(|v| v.parse().ok());

    let mut platform = HashMap::new();
    platform.insert(
        "atspiRole".to_string(),
        serde_json::Value::from(raw.role.clone()),
    );

    Mapped {
        role,
        name: raw.name.clone(),
        description: Some(raw.description.clone()).filter(|s| !s.is_empty()),
        value: raw.text.clone().filter(|s| !s.is_empty()),
        bounds: raw.bounds,
        states,
        actions,
        attributes,
        platform,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(positions: &[u64]) -> u64 {
        positions.iter().fold(0, |acc, bit| acc | (1u64 << bit))
    }

    fn raw(role: &str, state_positions: &[u64]) -> AtspiRaw {
        AtspiRaw {
            role: role.to_string(),
            state_bits: bits(state_positions),
            ..AtspiRaw::default()
        }
    }

    #[test]
    fn test_dashed_role_decoding() {
        assert_eq!(atspi_role("push-button"), Role::Button);
        assert_eq!(atspi_role("check-menu-item"), Role::MenuItemCheckbox);
        assert_eq!(atspi_role("page-tab-list"), Role::TabList);
        assert_eq!(atspi_role("no-such-role"), Role::Generic);
    }

    #[test]
    fn test_checked_state() {
        use state_bits::*;
        let node = raw("check-box", &[ENABLED, VISIBLE, SHOWING, CHECKED]);
        assert!(map_node(&node).states.contains(&State::Checked));

        let node = raw("toggle-button", &[ENABLED, VISIBLE, SHOWING, CHECKED]);
        assert!(map_node(&node).states.contains(&State::Pressed));
    }

    #[test]
    fn test_visible_not_showing_is_offscreen() {
        use state_bits::*;
        let node = raw("push-button", &[ENABLED, VISIBLE]);
        let mapped = map_node(&node);
        assert!(mapped.states.contains(&State::Offscreen));
        assert!(!mapped.states.contains(&State::Hidden));
    }

    #[test]
    fn test_named_panel_becomes_region() {
        use state_bits::*;
        let mut node = raw("panel", &[ENABLED, VISIBLE, SHOWING]);
        node.name = "Results".to_string();
        assert_eq!(map_node(&node).role, Role::Region);
    }

    #[test]
    fn test_click_action_from_names() {
        use state_bits::*;
        let mut node = raw("push-button", &[ENABLED, VISIBLE, SHOWING]);
        node.actions = vec!["click".to_string()];
        assert_eq!(map_node(&node).actions, vec![Action::Click]);
    }

    #[test]
    fn test_value_interface_yields_range_actions() {
        use state_bits::*;
        let mut node = raw("slider", &[ENABLED, VISIBLE, SHOWING]);
        node.value_min = Some(0.0);
        node.value_max = Some(100.0);
        node.value_now = Some(25.0);
        let mapped = map_node(&node);
        assert!(mapped.actions.contains(&Action::Increment));
        assert!(mapped.actions.contains(&Action::Decrement));
        assert!(mapped.actions.contains(&Action::SetValue));
        assert_eq!(mapped.attributes.value_now, Some(25.0));
    }

    #[test]
    fn test_focusable_fallback() {
        use state_bits::*;
        let node = raw("panel", &[ENABLED, VISIBLE, SHOWING, FOCUSABLE]);
        assert_eq!(map_node(&node).actions, vec![Action::Focus]);
    }

    #[test]
    fn test_xml_roles_refinement() {
        use state_bits::*;
        let mut node = raw("section", &[ENABLED, VISIBLE, SHOWING]);
        node.attributes
            .insert("xml-roles".to_string(), "search".to_string());
        assert_eq!(map_node(&node).role, Role::Search);
    }
}
