use crate::model::Role;

/// Resolve an ARIA role string to a canonical role. Canonical names map to
/// themselves; a fixed table covers the non-schema ARIA roles the canonical
/// vocabulary folds together.
pub fn map_aria_role(raw: &str) -> Option<Role> {
    let lower = raw.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    if let Some(role) = Role::parse(&lower) {
        return Some(role);
    }
    match lower.as_str() {
        "presentation" => Some(Role::None),
        "image" => Some(Role::Img),
        "article" => Some(Role::Document),
        "directory" => Some(Role::List),
        "listbox" => Some(Role::List),
        "radiogroup" => Some(Role::Group),
        "gridcell" => Some(Role::Cell),
        "treegrid" => Some(Role::Grid),
        "feed" => Some(Role::List),
        "meter" => Some(Role::ProgressBar),
        "term" => Some(Role::ListItem),
        "definition" => Some(Role::ListItem),
        "graphics-document" => Some(Role::Document),
        "graphics-object" => Some(Role::Group),
        "graphics-symbol" => Some(Role::Img),
        "doc-subtitle" => Some(Role::Heading),
        _ => None,
    }
}

/// Roles eligible for ARIA refinement: when the platform mapped one of
/// these and the node carries a recognized ARIA role, the ARIA role wins.
pub fn is_refinable(role: Role) -> bool {
    matches!(role, Role::Generic | Role::Group | Role::Text | Role::Region)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_roles_map_to_themselves() {
        assert_eq!(map_aria_role("button"), Some(Role::Button));
        assert_eq!(map_aria_role("searchbox"), Some(Role::SearchBox));
    }

    #[test]
    fn test_non_schema_aria_roles() {
        assert_eq!(map_aria_role("presentation"), Some(Role::None));
        assert_eq!(map_aria_role("gridcell"), Some(Role::Cell));
        assert_eq!(map_aria_role("treegrid"), Some(Role::Grid));
        assert_eq!(map_aria_role("made-up-role"), None);
    }

    #[test]
    fn test_refinable_roles() {
        assert!(is_refinable(Role::Generic));
        assert!(is_refinable(Role::Region));
        assert!(!is_refinable(Role::Button));
    }
}
