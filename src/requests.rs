use serde::Deserialize;

use crate::model::{DetailLevel, Scope};

/// Default byte budget for the compact serializer.
pub const DEFAULT_MAX_CHARS: usize = 40_000;

/// Parameters for one capture. Mirrors the front-end flag surface
/// (`--scope`, `--depth`, `--app`, output options) as a structured request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotRequest {
    pub scope: Scope,
    /// Substring filter over window titles; `full` scope only walks matches.
    pub app_filter: Option<String>,
    /// 0 means unlimited.
    pub max_depth: u32,
    pub detail: DetailLevel,
    pub max_chars: usize,
}

impl Default for SnapshotRequest {
    fn default() -> Self {
        Self {
            scope: Scope::default(),
            app_filter: None,
            max_depth: 0,
            detail: DetailLevel::default(),
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

/// Parameters for a semantic search over the unpruned tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FindRequest {
    pub query: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
    pub state: Option<String>,
    pub limit: usize,
    pub threshold: f32,
}

impl Default for FindRequest {
    fn default() -> Self {
        Self {
            query: None,
            role: None,
            name: None,
            state: None,
            limit: 5,
            threshold: 0.15,
        }
    }
}

impl FindRequest {
    pub fn query(q: impl Into<String>) -> Self {
        Self {
            query: Some(q.into()),
            ..Self::default()
        }
    }
}

/// One dispatcher invocation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExecuteRequest {
    pub element_id: Option<String>,
    pub action: String,
    pub value: Option<String>,
    pub direction: Option<String>,
    pub keys: Option<String>,
}

impl ExecuteRequest {
    pub fn element(element_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            element_id: Some(element_id.into()),
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }
}

/// One step in a batch. `wait` is clamped to [50, 5000] ms at execution.
/// Untagged because the element shape carries its action name in the same
/// `action` field the other shapes use as a marker; variants are told apart
/// by their required fields, most specific first.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BatchStep {
    Wait { ms: u64 },
    PressKeys { keys: String },
    Element(ExecuteRequest),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_defaults() {
        let req = SnapshotRequest::default();
        assert_eq!(req.scope, Scope::Foreground);
        assert_eq!(req.detail, DetailLevel::Standard);
        assert_eq!(req.max_chars, 40_000);
        assert_eq!(req.max_depth, 0);
    }

    #[test]
    fn test_find_defaults() {
        let req = FindRequest::default();
        assert_eq!(req.limit, 5);
        assert!((req.threshold - 0.15).abs() < f32::EPSILON);
    }

    #[test]
    fn test_batch_step_parsing() {
        let wait: BatchStep = serde_json::from_str(r#"{"action":"wait","ms":100}"#).unwrap();
        assert!(matches!(wait, BatchStep::Wait { ms: 100 }));

        let keys: BatchStep =
            serde_json::from_str(r#"{"action":"press_keys","keys":"ctrl+s"}"#).unwrap();
        assert!(matches!(keys, BatchStep::PressKeys { .. }));

        let click: BatchStep =
            serde_json::from_str(r#"{"action":"click","element_id":"e4"}"#).unwrap();
        match click {
            BatchStep::Element(req) => {
                assert_eq!(req.action, "click");
                assert_eq!(req.element_id.as_deref(), Some("e4"));
            }
            other => panic!("unexpected step: {:?}", other),
        }
    }
}
