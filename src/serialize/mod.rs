//! Output emitters. The JSON envelope is plain serde over [`Envelope`];
//! the compact text format and the window overview live in [`compact`].

mod compact;

pub use compact::{serialize_compact, serialize_overview, TRUNCATION_NOTICE};

use crate::error::{CupError, Result};
use crate::model::Envelope;

/// Pretty-printed envelope JSON, UTF-8, field order per the struct.
pub fn serialize_json(envelope: &Envelope) -> Result<String> {
    serde_json::to_string_pretty(envelope)
        .map_err(|e| CupError::PlatformFailure(format!("envelope serialization failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, Platform, Role, ScreenInfo};

    #[test]
    fn test_json_round_trip() {
        let env = Envelope::new(
            Platform::Web,
            ScreenInfo::new(1280, 720, 2.0),
            vec![Node::new("e0", Role::Document, "Page")],
        );
        let json = serialize_json(&env).unwrap();
        let back: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back.version, env.version);
        assert_eq!(back.tree[0].id, "e0");
    }
}
