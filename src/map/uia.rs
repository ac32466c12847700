use std::collections::HashMap;

use crate::model::{Action, Bounds, NodeAttributes, Orientation, Role, State};
use crate::platform::UiaRaw;

use super::{aria, Mapped};

// UIA control type IDs, UIA_ButtonControlTypeId onward.
const CT_BUTTON: i32 = 50000;
const CT_CALENDAR: i32 = 50001;
const CT_CHECKBOX: i32 = 50002;
const CT_COMBOBOX: i32 = 50003;
const CT_EDIT: i32 = 50004;
const CT_HYPERLINK: i32 = 50005;
const CT_IMAGE: i32 = 50006;
const CT_LISTITEM: i32 = 50007;
const CT_LIST: i32 = 50008;
const CT_MENU: i32 = 50009;
const CT_MENUBAR: i32 = 50010;
const CT_MENUITEM: i32 = 50011;
const CT_PROGRESSBAR: i32 = 50012;
const CT_RADIOBUTTON: i32 = 50013;
const CT_SCROLLBAR: i32 = 50014;
const CT_SLIDER: i32 = 50015;
const CT_SPINNER: i32 = 50016;
const CT_STATUSBAR: i32 = 50017;
const CT_TAB: i32 = 50018;
const CT_TABITEM: i32 = 50019;
const CT_TEXT: i32 = 50020;
const CT_TOOLBAR: i32 = 50021;
const CT_TOOLTIP: i32 = 50022;
const CT_TREE: i32 = 50023;
const CT_TREEITEM: i32 = 50024;
const CT_CUSTOM: i32 = 50025;
const CT_GROUP: i32 = 50026;
const CT_THUMB: i32 = 50027;
const CT_DATAGRID: i32 = 50028;
const CT_DATAITEM: i32 = 50029;
const CT_DOCUMENT: i32 = 50030;
const CT_SPLITBUTTON: i32 = 50031;
const CT_WINDOW: i32 = 50032;
const CT_PANE: i32 = 50033;
const CT_HEADER: i32 = 50034;
const CT_HEADERITEM: i32 = 50035;
const CT_TABLE: i32 = 50036;
const CT_TITLEBAR: i32 = 50037;
const CT_SEPARATOR: i32 = 50038;
const CT_SEMANTICZOOM: i32 = 50039;
const CT_APPBAR: i32 = 50040;

// ToggleState / ExpandCollapseState values, per the UIA enums.
const TOGGLE_ON: i32 = 1;
const TOGGLE_INDETERMINATE: i32 = 2;
const EXPAND_COLLAPSED: i32 = 0;
const EXPAND_EXPANDED: i32 = 1;
const EXPAND_PARTIAL: i32 = 2;
const EXPAND_LEAF: i32 = 3;

fn control_type_role(control_type: i32) -> Role {
    match control_type {
        CT_BUTTON => Role::Button,
        CT_CALENDAR => Role::Grid,
        CT_CHECKBOX => Role::Checkbox,
        CT_COMBOBOX => Role::Combobox,
        CT_EDIT => Role::Textbox,
        CT_HYPERLINK => Role::Link,
        CT_IMAGE => Role::Img,
        CT_LISTITEM => Role::ListItem,
        CT_LIST => Role::List,
        CT_MENU => Role::Menu,
        CT_MENUBAR => Role::MenuBar,
        CT_MENUITEM => Role::MenuItem,
        CT_PROGRESSBAR => Role::ProgressBar,
        CT_RADIOBUTTON => Role::Radio,
        CT_SCROLLBAR => Role::Scrollbar,
        CT_SLIDER => Role::Slider,
        CT_SPINNER => Role::SpinButton,
        CT_STATUSBAR => Role::Status,
        CT_TAB => Role::TabList,
        CT_TABITEM => Role::Tab,
        CT_TEXT => Role::Text,
        CT_TOOLBAR => Role::Toolbar,
        CT_TOOLTIP => Role::Tooltip,
        CT_TREE => Role::Tree,
        CT_TREEITEM => Role::TreeItem,
        CT_CUSTOM => Role::Generic,
        CT_GROUP => Role::Group,
        CT_THUMB => Role::Generic,
        CT_DATAGRID => Role::Grid,
        CT_DATAITEM => Role::Row,
        CT_DOCUMENT => Role::Document,
        CT_SPLITBUTTON => Role::Button,
        CT_WINDOW => Role::Window,
        CT_PANE => Role::Generic,
        CT_HEADER => Role::Group,
        CT_HEADERITEM => Role::ColumnHeader,
        CT_TABLE => Role::Table,
        CT_TITLEBAR => Role::TitleBar,
        CT_SEPARATOR => Role::Separator,
        CT_SEMANTICZOOM => Role::Generic,
        CT_APPBAR => Role::Toolbar,
        _ => Role::Generic,
    }
}

/// Parse the UIA AriaProperties blob (`key=value;key=value`).
fn parse_aria_properties(raw: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for pair in raw.split(';') {
        if let Some((key, value)) = pair.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                out.insert(key.to_lowercase(), value.trim().to_string());
            }
        }
    }
    out
}

pub fn map_node(raw: &UiaRaw) -> Mapped {
    let mut role = control_type_role(raw.control_type);

    // Named panes carry real structure.
    if raw.control_type == CT_PANE && !raw.name.trim().is_empty() {
        role = Role::Region;
    }
    // MenuItem with a toggle or selection pattern is really a check/radio item.
    if raw.control_type == CT_MENUITEM {
        if raw.has_toggle {
            role = Role::MenuItemCheckbox;
        } else if raw.has_selection_item {
            role = Role::MenuItemRadio;
        }
    }

    let aria_props = parse_aria_properties(&raw.aria_properties);
    if aria::is_refinable(role) {
        if let Some(refined) = aria::map_aria_role(&raw.aria_role) {
            role = refined;
        }
    }

    let readonly = raw.is_readonly.unwrap_or(false);
    let writable_value = raw.has_value && !readonly;

    let mut states = std::collections::BTreeSet::new();
    if !raw.is_enabled {
        states.insert(State::Disabled);
    }
    if raw.has_keyboard_focus {
        states.insert(State::Focused);
    }
    if raw.is_offscreen {
        states.insert(State::Offscreen);
    }
    match raw.toggle_state {
        Some(TOGGLE_ON) => {
            if role == Role::Button {
                states.insert(State::Pressed);
            } else {
                states.insert(State::Checked);
            }
        }
        Some(TOGGLE_INDETERMINATE) => {
            states.insert(State::Mixed);
        }
        _ => {}
    }
    match raw.expand_state {
        Some(EXPAND_EXPANDED) | Some(EXPAND_PARTIAL) => {
            states.insert(State::Expanded);
        }
        Some(EXPAND_COLLAPSED) => {
            states.insert(State::Collapsed);
        }
        _ => {}
    }
    if raw.is_selected == Some(true) {
        states.insert(State::Selected);
    }
    if raw.is_required {
        states.insert(State::Required);
    }
    if raw.is_modal {
        states.insert(State::Modal);
    }
    if raw.has_value && super::is_text_input(role) {
        if writable_value {
            states.insert(State::Editable);
        } else {
            states.insert(State::Readonly);
        }
    } else if readonly {
        states.insert(State::Readonly);
    }

    let mut actions = Vec::new();
    if !super::is_static_text(role) {
        if raw.has_invoke {
            actions.push(Action::Click);
        }
        if raw.has_toggle {
            actions.push(Action::Toggle);
        }
        if raw.has_expand_collapse && raw.expand_state != Some(EXPAND_LEAF) {
            actions.push(Action::Expand);
            actions.push(Action::Collapse);
        }
        if writable_value {
            if super::is_text_input(role) {
                actions.push(Action::Type);
            }
            actions.push(Action::SetValue);
        }
        if raw.has_selection_item {
            actions.push(Action::Select);
        }
        if raw.has_scroll {
            actions.push(Action::Scroll);
        }
        if raw.has_range_value && !readonly {
            actions.push(Action::Increment);
            actions.push(Action::Decrement);
        }
        if actions.is_empty() && raw.is_keyboard_focusable {
            actions.push(Action::Focus);
        }
    }

    let mut attributes = NodeAttributes::default();
    if role == Role::Heading {
        attributes.level = aria_props.get("level").and_then(|v| v.parse().ok());
    }
    if super::is_range_role(role) {
        attributes.value_min = raw.range_min;
        attributes.value_max = raw.range_max;
        attributes.value_now = raw.range_value;
    }
    if super::is_oriented_role(role) {
        attributes.orientation = match raw.orientation {
            1 => Some(Orientation::Horizontal),
            2 => Some(Orientation::Vertical),
            _ => None,
        };
    }
    if super::is_text_input(role) {
        attributes.placeholder = aria_props.get("placeholder").cloned();
    }

    let mut platform = HashMap::new();
    platform.insert(
        "controlType".to_string(),
        serde_json::Value::from(raw.control_type),
    );
    if !raw.class_name.is_empty() {
        platform.insert(
            "className".to_string(),
            serde_json::Value::from(raw.class_name.clone()),
        );
    }
    if !raw.automation_id.is_empty() {
        platform.insert(
            "automationId".to_string(),
            serde_json::Value::from(raw.automation_id.clone()),
        );
    }

    Mapped {
        role,
        name: raw.name.clone(),
        description: Some(raw.help_text.clone()).filter(|s| !s.is_empty()),
        value: raw.value.clone().filter(|s| !s.is_empty()),
        bounds: raw.bounds.map(|[x, y, w, h]| {
            Bounds::new(x as i32, y as i32, w as i32, h as i32)
        }),
        states,
        actions,
        attributes,
        platform,
    }
}
