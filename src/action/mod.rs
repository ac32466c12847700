//! Action dispatch: request validation, key-combo parsing, and the result
//! record actions report through.

mod keys;

use serde::Serialize;

use crate::error::{CupError, Result};
use crate::model::Action;
use crate::platform::{ActionInvocation, ScrollDirection};
use crate::requests::ExecuteRequest;

pub use keys::{parse_combo, KeyCombo};

/// Minimum and maximum for a batch `wait` step, milliseconds.
pub const WAIT_CLAMP_MS: (u64, u64) = (50, 5000);

/// What actions return instead of raising: either a short imperative message
/// or a human-readable error.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

impl From<CupError> for ActionResult {
    fn from(err: CupError) -> Self {
        ActionResult::fail(err.to_string())
    }
}

/// A request that survived validation, ready for ref resolution and the
/// platform handler.
#[derive(Debug, Clone)]
pub enum ValidatedAction {
    PressKeys(KeyCombo),
    Element {
        element_id: String,
        invocation: ActionInvocation,
    },
}

/// Validate an `ExecuteRequest` against the dispatcher rules: the action
/// must be in the fixed vocabulary, `press_keys` needs `keys`, everything
/// else needs an element ID, `type`/`setvalue` need `value`, and `scroll`
/// needs a valid `direction`.
pub fn validate(request: &ExecuteRequest) -> Result<ValidatedAction> {
    if request.action == "press_keys" {
        let keys = request
            .keys
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                CupError::InvalidParams("press_keys requires 'keys'".to_string())
            })?;
        let combo = parse_combo(keys);
        if combo.is_empty() {
            return Err(CupError::InvalidParams(format!(
                "could not parse keys: '{}'",
                keys
            )));
        }
        return Ok(ValidatedAction::PressKeys(combo));
    }

    let action = Action::parse(&request.action)
        .ok_or_else(|| CupError::UnknownAction(request.action.clone()))?;

    let element_id = request
        .element_id
        .clone()
        .ok_or_else(|| {
            CupError::InvalidParams(format!("action '{}' requires an element_id", action))
        })?;

    let mut value = None;
    let mut direction = None;

    match action {
        Action::Type | Action::SetValue => {
            value = Some(request.value.clone().ok_or_else(|| {
                CupError::InvalidParams(format!("action '{}' requires a value", action))
            })?);
        }
        Action::Scroll => {
            let raw = request.direction.as_deref().ok_or_else(|| {
                CupError::InvalidParams("scroll requires a direction".to_string())
            })?;
            direction = Some(ScrollDirection::parse(raw).ok_or_else(|| {
                CupError::InvalidParams(format!(
                    "invalid scroll direction '{}' (expected up/down/left/right)",
                    raw
                ))
            })?);
        }
        _ => {}
    }

    Ok(ValidatedAction::Element {
        element_id,
        invocation: ActionInvocation {
            action,
            value,
            direction,
        },
    })
}

/// Clamp a batch wait to the allowed window.
pub fn clamp_wait(ms: u64) -> u64 {
    ms.clamp(WAIT_CLAMP_MS.0, WAIT_CLAMP_MS.1)
}

/// Short imperative message for a successful element action.
pub fn success_message(invocation: &ActionInvocation) -> String {
    match invocation.action {
        Action::Click => "Clicked".to_string(),
        Action::DoubleClick => "Double-clicked".to_string(),
        Action::RightClick => "Right-clicked".to_string(),
        Action::LongPress => "Long-pressed".to_string(),
        Action::Toggle => "Toggled".to_string(),
        Action::Expand => "Expanded".to_string(),
        Action::Collapse => "Collapsed".to_string(),
        Action::Select => "Selected".to_string(),
        Action::Focus => "Focused".to_string(),
        Action::Dismiss => "Dismissed".to_string(),
        Action::Increment => "Incremented".to_string(),
        Action::Decrement => "Decremented".to_string(),
        Action::Type => format!("Typed: {}", invocation.value.as_deref().unwrap_or_default()),
        Action::SetValue => format!(
            "Set value: {}",
            invocation.value.as_deref().unwrap_or_default()
        ),
        Action::Scroll => format!(
            "Scrolled {}",
            invocation
                .direction
                .map(|d| d.as_str())
                .unwrap_or("down")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_action_rejected() {
        let req = ExecuteRequest::element("e14", "fly");
        match validate(&req) {
            Err(CupError::UnknownAction(name)) => assert_eq!(name, "fly"),
            other => panic!("expected UnknownAction, got {:?}", other),
        }
    }

    #[test]
    fn test_type_requires_value() {
        let req = ExecuteRequest::element("e14", "type");
        match validate(&req) {
            Err(CupError::InvalidParams(msg)) => assert!(msg.contains("value")),
            other => panic!("expected InvalidParams, got {:?}", other),
        }

        let req = ExecuteRequest::element("e14", "type").with_value("hello");
        assert!(validate(&req).is_ok());
    }

    #[test]
    fn test_scroll_direction_validation() {
        let req = ExecuteRequest::element("e2", "scroll");
        assert!(validate(&req).is_err());

        let req = ExecuteRequest::element("e2", "scroll").with_direction("diagonal");
        assert!(validate(&req).is_err());

        let req = ExecuteRequest::element("e2", "scroll").with_direction("down");
        match validate(&req).unwrap() {
            ValidatedAction::Element { invocation, .. } => {
                assert_eq!(invocation.direction, Some(ScrollDirection::Down));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_press_keys_skips_element_lookup() {
        let req = ExecuteRequest {
            action: "press_keys".to_string(),
            keys: Some("ctrl+s".to_string()),
            ..ExecuteRequest::default()
        };
        match validate(&req).unwrap() {
            ValidatedAction::PressKeys(combo) => {
                assert_eq!(combo.modifiers, vec!["ctrl"]);
                assert_eq!(combo.keys, vec!["s"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_element_action_requires_id() {
        let req = ExecuteRequest {
            action: "click".to_string(),
            ..ExecuteRequest::default()
        };
        assert!(matches!(validate(&req), Err(CupError::InvalidParams(_))));
    }

    #[test]
    fn test_clamp_wait() {
        assert_eq!(clamp_wait(0), 50);
        assert_eq!(clamp_wait(300), 300);
        assert_eq!(clamp_wait(60_000), 5000);
    }
}
