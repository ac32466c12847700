use std::collections::BTreeSet;

use crate::model::Role;

/// Look up a normalized phrase (tokens joined with single spaces) in the
/// synonym table. Every canonical role name maps to the singleton of itself;
/// natural phrases fan out to the roles an agent plausibly means.
pub fn lookup(phrase: &str) -> Option<BTreeSet<Role>> {
    if let Some(role) = Role::parse(phrase) {
        return Some(BTreeSet::from([role]));
    }

    let roles: &[Role] = match phrase {
        "btn" | "push button" => &[Role::Button],
        "input" | "field" | "text field" | "text box" | "textfield" | "text input"
        | "input field" | "edit" | "edit box" => {
            &[Role::Textbox, Role::SearchBox, Role::Combobox]
        }
        "search bar" | "search box" | "search field" | "search input" => {
            &[Role::Search, Role::SearchBox, Role::Textbox, Role::Combobox]
        }
        "check box" | "tick box" | "tickbox" => &[Role::Checkbox],
        "radio button" | "option button" => &[Role::Radio],
        "dropdown" | "drop down" | "select" | "picker" | "combo" | "combo box" => {
            &[Role::Combobox]
        }
        "menu item" | "menu entry" => {
            &[Role::MenuItem, Role::MenuItemCheckbox, Role::MenuItemRadio]
        }
        "menu bar" => &[Role::MenuBar],
        "tab bar" | "tab strip" | "tabs" => &[Role::TabList],
        "image" | "picture" | "icon" | "photo" => &[Role::Img],
        "popup" | "modal" | "prompt" => &[Role::Dialog, Role::AlertDialog, Role::Window],
        "item" | "entry" => &[Role::ListItem, Role::MenuItem, Role::Option, Role::TreeItem],
        "list item" => &[Role::ListItem],
        "list box" | "listbox" => &[Role::List],
        "editor" | "text area" | "textarea" => &[Role::Textbox, Role::Document],
        "spinner" => &[Role::SpinButton, Role::ProgressBar],
        "progress" | "progress bar" | "loading bar" => &[Role::ProgressBar],
        "toggle" | "switch button" => &[Role::Switch, Role::Checkbox],
        "title" | "header text" => &[Role::Heading],
        "label" | "caption text" => &[Role::Text],
        "nav" | "navbar" | "navigation bar" | "breadcrumb" => &[Role::Navigation],
        "sidebar" | "side panel" => &[Role::Complementary],
        "footer" => &[Role::ContentInfo],
        "header" => &[Role::Banner, Role::Heading],
        "hyperlink" | "url link" | "anchor" => &[Role::Link],
        "tree view" | "treeview" => &[Role::Tree],
        "grid view" | "data grid" | "datagrid" => &[Role::Grid],
        "scroll bar" => &[Role::Scrollbar],
        "spin button" => &[Role::SpinButton],
        "tab panel" => &[Role::TabPanel],
        "tool bar" => &[Role::Toolbar],
        "tool tip" => &[Role::Tooltip],
        "status bar" => &[Role::Status],
        "title bar" => &[Role::TitleBar],
        "message" | "notification" => &[Role::Alert, Role::Status, Role::Log],
        "pane" | "panel" | "container" => &[Role::Region, Role::Group, Role::Generic],
        _ => return None,
    };
    Some(roles.iter().copied().collect())
}

/// Resolve a free-form role string: literal table hit first, then each
/// token, then (3+ characters) substring match over the canonical names.
pub fn resolve(query: &str) -> BTreeSet<Role> {
    let normalized = super::tokenize(query).join(" ");
    if normalized.is_empty() {
        return BTreeSet::new();
    }
    if let Some(roles) = lookup(&normalized) {
        return roles;
    }

    let mut union = BTreeSet::new();
    for token in normalized.split(' ') {
        if let Some(roles) = lookup(token) {
            union.extend(roles);
        }
    }
    if !union.is_empty() {
        return union;
    }

    if normalized.len() >= 3 {
        return Role::ALL
            .iter()
            .copied()
            .filter(|r| r.as_str().contains(&normalized))
            .collect();
    }
    BTreeSet::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names_are_singletons() {
        assert_eq!(lookup("button"), Some(BTreeSet::from([Role::Button])));
        assert_eq!(lookup("treeitem"), Some(BTreeSet::from([Role::TreeItem])));
    }

    #[test]
    fn test_search_bar_fans_out() {
        let roles = lookup("search bar").unwrap();
        assert!(roles.contains(&Role::SearchBox));
        assert!(roles.contains(&Role::Textbox));
        assert!(roles.contains(&Role::Combobox));
        assert!(roles.contains(&Role::Search));
    }

    #[test]
    fn test_resolve_by_token() {
        // "big button" is not a phrase entry, but the "button" token hits.
        let roles = resolve("big button");
        assert_eq!(roles, BTreeSet::from([Role::Button]));
    }

    #[test]
    fn test_resolve_by_substring() {
        // "menuitem" prefix matches the three menuitem roles.
        let roles = resolve("menuitem");
        assert!(roles.contains(&Role::MenuItem));

        let roles = resolve("box");
        assert!(roles.contains(&Role::Checkbox));
        assert!(roles.contains(&Role::Combobox));
        assert!(roles.contains(&Role::Textbox));
        assert!(roles.contains(&Role::SearchBox));
    }

    #[test]
    fn test_resolve_short_unknown_is_empty() {
        assert!(resolve("zz").is_empty());
        assert!(resolve("").is_empty());
    }
}
