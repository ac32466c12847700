use std::collections::HashMap;

use crate::model::{
    Action, Autocomplete, LiveSetting, NodeAttributes, Orientation, Role, State,
};
use crate::platform::CdpRaw;

use super::{aria, Mapped};

/// Chromium-internal role names that do not match the ARIA vocabulary.
fn cdp_internal_role(role: &str) -> Option<Role> {
    match role {
        "RootWebArea" | "WebArea" => Some(Role::Document),
        "StaticText" | "InlineTextBox" | "LineBreak" | "ListMarker" | "Legend" => Some(Role::Text),
        "GenericContainer" => Some(Role::Generic),
        "LayoutTable" => Some(Role::Table),
        "LayoutTableRow" => Some(Role::Row),
        "LayoutTableCell" => Some(Role::Cell),
        "Iframe" => Some(Role::Generic),
        "IframePresentational" => Some(Role::None),
        "Canvas" | "SvgRoot" => Some(Role::Img),
        "DescriptionList" => Some(Role::List),
        "DescriptionListDetail" | "DescriptionListTerm" => Some(Role::ListItem),
        "DisclosureTriangle" => Some(Role::Button),
        "PopUpButton" => Some(Role::Combobox),
        "ToggleButton" => Some(Role::Button),
        "MenuListPopup" => Some(Role::Menu),
        "MenuListOption" => Some(Role::Option),
        "Pre" => Some(Role::Code),
        "Ignored" => Some(Role::None),
        _ => None,
    }
}

fn cdp_role(role: &str) -> Role {
    if let Some(internal) = cdp_internal_role(role) {
        return internal;
    }
    aria::map_aria_role(role).unwrap_or(Role::Generic)
}

/// Roles that take the full pointer action set over CDP input injection.
fn is_clickable_role(role: Role) -> bool {
    matches!(
        role,
        Role::Button
            | Role::Link
            | Role::MenuItem
            | Role::MenuItemCheckbox
            | Role::MenuItemRadio
            | Role::Tab
            | Role::Checkbox
            | Role::Radio
            | Role::Switch
            | Role::Option
    )
}

fn prop_bool(props: &HashMap<String, serde_json::Value>, key: &str) -> Option<bool> {
    props.get(key).and_then(|v| v.as_bool())
}

fn prop_str<'a>(props: &'a HashMap<String, serde_json::Value>, key: &str) -> Option<&'a str> {
    props.get(key).and_then(|v| v.as_str())
}

fn prop_f64(props: &HashMap<String, serde_json::Value>, key: &str) -> Option<f64> {
    props.get(key).and_then(|v| v.as_f64())
}

pub fn map_node(raw: &CdpRaw) -> Mapped {
    let role = cdp_role(&raw.role);
    let props = &raw.properties;

    let readonly = prop_bool(props, "readonly").unwrap_or(false);
    let editable = prop_str(props, "editable").is_some()
        || prop_bool(props, "settable").unwrap_or(false);

    let mut states = std::collections::BTreeSet::new();
    if prop_bool(props, "disabled").unwrap_or(false) {
        states.insert(State::Disabled);
    }
    match prop_str(props, "checked") {
        Some("true") => {
            if role == Role::Button {
                states.insert(State::Pressed);
            } else {
                states.insert(State::Checked);
            }
        }
        Some("mixed") => {
            states.insert(State::Mixed);
        }
        _ => {}
    }
    match prop_str(props, "pressed") {
        Some("true") => {
            states.insert(State::Pressed);
        }
        Some("mixed") => {
            states.insert(State::Mixed);
        }
        _ => {}
    }
    match prop_bool(props, "expanded") {
        Some(true) => {
            states.insert(State::Expanded);
        }
        Some(false) => {
            states.insert(State::Collapsed);
        }
        None => {}
    }
    if prop_bool(props, "focused").unwrap_or(false) {
        states.insert(State::Focused);
    }
    if prop_bool(props, "modal").unwrap_or(false) {
        states.insert(State::Modal);
    }
    if prop_bool(props, "multiselectable").unwrap_or(false) {
        states.insert(State::Multiselectable);
    }
    if prop_bool(props, "required").unwrap_or(false) {
        states.insert(State::Required);
    }
    if prop_bool(props, "selected").unwrap_or(false) {
        states.insert(State::Selected);
    }
    if prop_bool(props, "busy").unwrap_or(false) {
        states.insert(State::Busy);
    }
    if prop_bool(props, "hidden").unwrap_or(false) {
        states.insert(State::Hidden);
    }
    if super::is_text_input(role) {
        if editable && !readonly {
            states.insert(State::Editable);
        } else {
            states.insert(State::Readonly);
        }
    } else if readonly {
        states.insert(State::Readonly);
    }

    let focusable = prop_bool(props, "focusable").unwrap_or(false);
    let mut actions = Vec::new();
    if !super::is_static_text(role) {
        if is_clickable_role(role) {
            actions.push(Action::Click);
            actions.push(Action::RightClick);
            actions.push(Action::DoubleClick);
        }
        if matches!(role, Role::Checkbox | Role::Switch | Role::MenuItemCheckbox) {
            actions.push(Action::Toggle);
        }
        if prop_bool(props, "expanded").is_some() {
            actions.push(Action::Expand);
            actions.push(Action::Collapse);
        }
        if super::is_text_input(role) && !readonly {
            actions.push(Action::Type);
            actions.push(Action::SetValue);
            if !actions.contains(&Action::Click) {
                actions.push(Action::Click);
            }
        }
        if matches!(role, Role::Slider | Role::SpinButton) && !readonly {
            actions.push(Action::Increment);
            actions.push(Action::Decrement);
            if !actions.contains(&Action::SetValue) {
                actions.push(Action::SetValue);
            }
        }
        // The page itself scrolls; clipping treats the document as the
        // scrollable container.
        if role == Role::Document {
            actions.push(Action::Scroll);
        }
        if matches!(role, Role::Option | Role::ListItem | Role::Row | Role::TreeItem | Role::Cell)
            && prop_bool(props, "selected").is_some()
        {
            actions.push(Action::Select);
        }
        if actions.is_empty() && focusable {
            actions.push(Action::Focus);
        }
    }

    let mut attributes = NodeAttributes::default();
    if role == Role::Heading {
        attributes.level = prop_f64(props, "level").map(|l| l as u32);
    }
    if role == Role::Link {
        attributes.url = prop_str(props, "url").map(str::to_string);
    }
    if super::is_range_role(role) {
        attributes.value_min = prop_f64(props, "valuemin");
        attributes.value_max = prop_f64(props, "valuemax");
        attributes.value_now = prop_f64(props, "valuetext")
            .or_else(|| raw.value.as_deref().and_then(|v| v.parse().ok()));
    }
    if super::is_oriented_role(role) {
        attributes.orientation = match prop_str(props, "orientation") {
            Some("horizontal") => Some(Orientation::Horizontal),
            Some("vertical") => Some(Orientation::Vertical),
            _ => None,
        };
    }
    attributes.live = match prop_str(props, "live") {
        Some("polite") => Some(LiveSetting::Polite),
        Some("assertive") => Some(LiveSetting::Assertive),
        Some("off") => Some(LiveSetting::Off),
        _ => None,
    };
    attributes.autocomplete = match prop_str(props, "autocomplete") {
        Some("inline") => Some(Autocomplete::Inline),
        Some("list") => Some(Autocomplete::List),
        Some("both") => Some(Autocomplete::Both),
        Some("none") => Some(Autocomplete::None),
        _ => None,
    };
    attributes.key_shortcut = prop_str(props, "keyshortcuts").map(str::to_string);
    attributes.roledescription = prop_str(props, "roledescription").map(str::to_string);

    let mut platform = HashMap::new();
    platform.insert(
        "cdpRole".to_string(),
        serde_json::Value::from(raw.role.clone()),
    );
    platform.insert(
        "backendDOMNodeId".to_string(),
        serde_json::Value::from(raw.backend_id),
    );

    Mapped {
        role,
        name: raw.name.clone(),
        description: Some(raw.description.clone()).filter(|s| !s.is_empty()),
        value: raw.value.clone().filter(|s| !s.is_empty()),
        bounds: raw.bounds,
        states,
        actions,
        attributes,
        platform,
    }
}
