/// A parsed key combination: modifier names plus main keys, all lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    pub modifiers: Vec<String>,
    pub keys: Vec<String>,
}

impl KeyCombo {
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty() && self.keys.is_empty()
    }
}

const MODIFIERS: [&str; 4] = ["ctrl", "alt", "shift", "meta"];

fn alias(part: &str) -> &str {
    match part {
        "return" => "enter",
        "esc" => "escape",
        "del" => "delete",
        "bs" => "backspace",
        "cmd" | "super" | "win" => "meta",
        "pgup" => "pageup",
        "pgdn" => "pagedown",
        other => other,
    }
}

/// Parse a `ctrl+shift+p` style combo. Case and surrounding whitespace are
/// ignored. When only modifiers are present they become the main keys and no
/// modifier mask is applied (so `"meta"` presses the meta key itself).
pub fn parse_combo(input: &str) -> KeyCombo {
    let mut modifiers = Vec::new();
    let mut keys = Vec::new();

    for part in input.split('+') {
        let part = part.trim().to_lowercase();
        if part.is_empty() {
            continue;
        }
        let part = alias(&part).to_string();
        if MODIFIERS.contains(&part.as_str()) {
            if !modifiers.contains(&part) {
                modifiers.push(part);
            }
        } else {
            keys.push(part);
        }
    }

    if keys.is_empty() && !modifiers.is_empty() {
        keys = std::mem::take(&mut modifiers);
    }

    KeyCombo { modifiers, keys }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_combo_case_and_spacing() {
        let a = parse_combo("Ctrl+Shift+P");
        let b = parse_combo("ctrl + shift + p");
        assert_eq!(a, b);
        assert_eq!(a.modifiers, vec!["ctrl", "shift"]);
        assert_eq!(a.keys, vec!["p"]);
    }

    #[test]
    fn test_parse_combo_aliases() {
        let combo = parse_combo("cmd+return");
        assert_eq!(combo.modifiers, vec!["meta"]);
        assert_eq!(combo.keys, vec!["enter"]);

        assert_eq!(parse_combo("pgdn").keys, vec!["pagedown"]);
        assert_eq!(parse_combo("esc").keys, vec!["escape"]);
        assert_eq!(parse_combo("win+del").modifiers, vec!["meta"]);
    }

    #[test]
    fn test_modifiers_only_become_keys() {
        let combo = parse_combo("ctrl");
        assert!(combo.modifiers.is_empty());
        assert_eq!(combo.keys, vec!["ctrl"]);

        let combo = parse_combo("ctrl+alt");
        assert!(combo.modifiers.is_empty());
        assert_eq!(combo.keys, vec!["ctrl", "alt"]);
    }

    #[test]
    fn test_empty_and_junk_parts() {
        let combo = parse_combo(" + ");
        assert!(combo.is_empty());

        let combo = parse_combo("ctrl++s");
        assert_eq!(combo.modifiers, vec!["ctrl"]);
        assert_eq!(combo.keys, vec!["s"]);
    }
}
