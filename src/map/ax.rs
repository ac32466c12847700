use std::collections::HashMap;

use crate::model::{Action, Bounds, NodeAttributes, Role, State};
use crate::platform::AxRaw;

use super::Mapped;

fn ax_role(role: &str) -> Role {
    match role {
        "AXButton" => Role::Button,
        "AXPopUpButton" => Role::Combobox,
        "AXMenuButton" => Role::Button,
        "AXCheckBox" => Role::Checkbox,
        "AXRadioButton" => Role::Radio,
        "AXRadioGroup" => Role::Group,
        "AXTextField" => Role::Textbox,
        "AXTextArea" => Role::Textbox,
        "AXStaticText" => Role::Text,
        "AXHeading" => Role::Heading,
        "AXLink" => Role::Link,
        "AXImage" => Role::Img,
        "AXGroup" => Role::Group,
        "AXScrollArea" => Role::Group,
        "AXWindow" => Role::Window,
        "AXSheet" => Role::Dialog,
        "AXDrawer" => Role::Complementary,
        "AXList" => Role::List,
        "AXTable" => Role::Table,
        "AXOutline" => Role::Tree,
        "AXRow" => Role::Row,
        "AXCell" => Role::Cell,
        "AXColumn" => Role::Generic,
        "AXMenu" => Role::Menu,
        "AXMenuBar" => Role::MenuBar,
        "AXMenuItem" => Role::MenuItem,
        "AXMenuBarItem" => Role::MenuItem,
        "AXToolbar" => Role::Toolbar,
        "AXTabGroup" => Role::TabList,
        "AXSlider" => Role::Slider,
        "AXIncrementor" => Role::SpinButton,
        "AXProgressIndicator" => Role::ProgressBar,
        "AXBusyIndicator" => Role::ProgressBar,
        "AXComboBox" => Role::Combobox,
        "AXDisclosureTriangle" => Role::Button,
        "AXScrollBar" => Role::Scrollbar,
        "AXSplitter" => Role::Separator,
        "AXSplitGroup" => Role::Group,
        "AXWebArea" => Role::Document,
        "AXApplication" => Role::Application,
        "AXHelpTag" => Role::Tooltip,
        "AXGrid" => Role::Grid,
        "AXLevelIndicator" => Role::ProgressBar,
        "AXDateField" => Role::Textbox,
        "AXTimeField" => Role::Textbox,
        _ => Role::Generic,
    }
}

/// Subrole refinements take priority over the base role.
fn ax_subrole(subrole: &str) -> Option<Role> {
    match subrole {
        "AXSearchField" => Some(Role::SearchBox),
        "AXSecureTextField" => Some(Role::Textbox),
        "AXSwitch" => Some(Role::Switch),
        "AXToggle" => Some(Role::Switch),
        "AXTabButton" => Some(Role::Tab),
        "AXCloseButton" | "AXMinimizeButton" | "AXZoomButton" | "AXFullScreenButton" => {
            Some(Role::Button)
        }
        "AXDialog" => Some(Role::Dialog),
        "AXSystemDialog" => Some(Role::AlertDialog),
        "AXFloatingWindow" | "AXStandardWindow" => Some(Role::Window),
        "AXContentList" | "AXDescriptionList" => Some(Role::List),
        "AXOutlineRow" => Some(Role::TreeItem),
        "AXTableRow" => Some(Role::Row),
        "AXTimeline" => Some(Role::Slider),
        _ => None,
    }
}

fn is_toggle_role(role: Role) -> bool {
    matches!(
        role,
        Role::Checkbox | Role::Switch | Role::MenuItemCheckbox
    )
}

fn is_selectable_role(role: Role) -> bool {
    matches!(
        role,
        Role::Radio
            | Role::Tab
            | Role::Option
            | Role::ListItem
            | Role::MenuItemRadio
            | Role::Row
            | Role::Cell
            | Role::TreeItem
    )
}

pub fn map_node(raw: &AxRaw) -> Mapped {
    let role = ax_subrole(&raw.subrole).unwrap_or_else(|| ax_role(&raw.role));
    let scrollable = raw.role == "AXScrollArea";

    let mut states = std::collections::BTreeSet::new();
    if !raw.enabled {
        states.insert(State::Disabled);
    }
    if raw.focused {
        states.insert(State::Focused);
    }
    if raw.selected {
        states.insert(State::Selected);
    }
    match raw.expanded {
        Some(true) => {
            states.insert(State::Expanded);
        }
        Some(false) => {
            states.insert(State::Collapsed);
        }
        None => {}
    }
    if raw.modal {
        states.insert(State::Modal);
    }
    if raw.required {
        states.insert(State::Required);
    }
    if raw.busy {
        states.insert(State::Busy);
    }
    if super::is_text_input(role) {
        if raw.editable {
            states.insert(State::Editable);
        } else {
            states.insert(State::Readonly);
        }
    }
    // Toggle-role value "1" means checked on macOS.
    if is_toggle_role(role) && raw.value.as_deref() == Some("1") {
        states.insert(State::Checked);
    }

    let mut actions = Vec::new();
    if !super::is_static_text(role) {
        for name in &raw.actions {
            let mapped = match name.as_str() {
                // The walk already skips AXScrollToVisible and AXShowMenu;
                // anything else unknown is dropped here.
                "AXPress" => {
                    if is_toggle_role(role) {
                        Some(Action::Toggle)
                    } else if is_selectable_role(role) {
                        Some(Action::Select)
                    } else {
                        Some(Action::Click)
                    }
                }
                "AXConfirm" | "AXOpen" => Some(Action::Click),
                "AXCancel" => Some(Action::Dismiss),
                "AXIncrement" => Some(Action::Increment),
                "AXDecrement" => Some(Action::Decrement),
                "AXPick" => Some(Action::Select),
                _ => None,
            };
            if let Some(action) = mapped {
                if !actions.contains(&action) {
                    actions.push(action);
                }
            }
        }
        if raw.editable && super::is_text_input(role) {
            if !actions.contains(&Action::Type) {
                actions.push(Action::Type);
            }
            if !actions.contains(&Action::SetValue) {
                actions.push(Action::SetValue);
            }
        }
        if scrollable {
            actions.push(Action::Scroll);
        }
        if super::is_range_role(role) && !actions.contains(&Action::SetValue) {
            actions.push(Action::SetValue);
        }
    }

    let mut attributes = NodeAttributes::default();
    if role == Role::Heading {
        // AXHeading reports its level through AXValue.
        attributes.level = raw.value.as_deref().and_then(|v| v.parse().ok());
    }

    let mut platform = HashMap::new();
    platform.insert(
        "axRole".to_string(),
        serde_json::Value::from(raw.role.clone()),
    );
    if !raw.subrole.is_empty() {
        platform.insert(
            "axSubrole".to_string(),
            serde_json::Value::from(raw.subrole.clone()),
        );
    }

    let name = if raw.title.is_empty() {
        raw.description.clone()
    } else {
        raw.title.clone()
    };
    let description = if raw.title.is_empty() {
        Some(raw.help.clone()).filter(|s| !s.is_empty())
    } else {
        Some(raw.description.clone())
            .filter(|s| !s.is_empty())
            .or_else(|| Some(raw.help.clone()).filter(|s| !s.is_empty()))
    };

    Mapped {
        role,
        name,
        description,
        value: raw
            .value
            .clone()
            .filter(|s| !s.is_empty())
            .filter(|_| role != Role::Heading),
        bounds: raw
            .bounds
            .map(|[x, y, w, h]| Bounds::new(x as i32, y as i32, w as i32, h as i32)),
        states,
        actions,
        attributes,
        platform,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(role: &str) -> AxRaw {
        AxRaw {
            role: role.to_string(),
            enabled: true,
            ..AxRaw::default()
        }
    }

    #[test]
    fn test_subrole_overrides_role() {
        let mut node = raw("AXTextField");
        node.subrole = "AXSearchField".to_string();
        assert_eq!(map_node(&node).role, Role::SearchBox);
    }

    #[test]
    fn test_press_on_toggle_role() {
        let mut node = raw("AXCheckBox");
        node.actions = vec!["AXPress".to_string()];
        assert_eq!(map_node(&node).actions, vec![Action::Toggle]);
    }

    #[test]
    fn test_press_on_selectable_role() {
        let mut node = raw("AXRadioButton");
        node.actions = vec!["AXPress".to_string()];
        assert_eq!(map_node(&node).actions, vec![Action::Select]);
    }

    #[test]
    fn test_press_defaults_to_click() {
        let mut node = raw("AXButton");
        node.actions = vec!["AXPress".to_string()];
        assert_eq!(map_node(&node).actions, vec![Action::Click]);
    }

    #[test]
    fn test_static_text_skips_actions() {
        let mut node = raw("AXStaticText");
        node.actions = vec!["AXPress".to_string()];
        assert!(map_node(&node).actions.is_empty());
    }

    #[test]
    fn test_scroll_area_gets_scroll() {
        let node = raw("AXScrollArea");
        let mapped = map_node(&node);
        assert_eq!(mapped.role, Role::Group);
        assert!(mapped.actions.contains(&Action::Scroll));
    }

    #[test]
    fn test_heading_level_from_value() {
        let mut node = raw("AXHeading");
        node.value = Some("2".to_string());
        let mapped = map_node(&node);
        assert_eq!(mapped.attributes.level, Some(2));
        assert!(mapped.value.is_none());
    }

    #[test]
    fn test_editable_text_field() {
        let mut node = raw("AXTextField");
        node.editable = true;
        let mapped = map_node(&node);
        assert!(mapped.states.contains(&State::Editable));
        assert!(mapped.actions.contains(&Action::Type));
    }
}
