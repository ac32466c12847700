use serde::{Deserialize, Serialize};

use super::node::Node;
use super::vocab::{Platform, Scope};

pub const ENVELOPE_VERSION: &str = "0.1.0";

/// Screen geometry. `scale` is omitted when it is 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenInfo {
    pub w: i32,
    pub h: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl ScreenInfo {
    pub fn new(w: i32, h: i32, scale: f64) -> Self {
        Self {
            w,
            h,
            scale: if scale == 1.0 { None } else { Some(scale) },
        }
    }

    pub fn bounds(&self) -> super::node::Bounds {
        super::node::Bounds::new(0, 0, self.w, self.h)
    }
}

/// The application a foreground-scoped snapshot targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
}

impl AppInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.pid.is_none() && self.bundle_id.is_none()
    }
}

/// Lightweight window record for overviews.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<super::node::Bounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A page-exposed tool (web `navigator.modelContext`), attached at envelope
/// level, never per node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// The canonical snapshot document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    pub version: String,
    pub platform: Platform,
    pub timestamp: i64,
    pub screen: ScreenInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<AppInfo>,
    pub tree: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows: Option<Vec<WindowInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDescriptor>>,
}

impl Envelope {
    pub fn new(platform: Platform, screen: ScreenInfo, tree: Vec<Node>) -> Self {
        Envelope {
            version: ENVELOPE_VERSION.to_string(),
            platform,
            timestamp: chrono::Utc::now().timestamp_millis(),
            screen,
            scope: None,
            app: None,
            tree,
            windows: None,
            tools: None,
        }
    }

    /// Total node count across all roots.
    pub fn node_count(&self) -> usize {
        self.tree.iter().map(Node::subtree_size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vocab::Role;

    #[test]
    fn test_scale_omitted_when_one() {
        let screen = ScreenInfo::new(1920, 1080, 1.0);
        let json = serde_json::to_value(screen).unwrap();
        assert!(json.get("scale").is_none());

        let hidpi = ScreenInfo::new(1920, 1080, 2.0);
        let json = serde_json::to_value(hidpi).unwrap();
        assert_eq!(json.get("scale").unwrap().as_f64(), Some(2.0));
    }

    #[test]
    fn test_envelope_json_shape() {
        let screen = ScreenInfo::new(800, 600, 1.0);
        let tree = vec![Node::new("e0", Role::Window, "Main")];
        let env = Envelope::new(Platform::Linux, screen, tree);
        let json = serde_json::to_value(&env).unwrap();

        assert_eq!(json.get("version").unwrap(), "0.1.0");
        assert_eq!(json.get("platform").unwrap(), "linux");
        assert!(json.get("timestamp").unwrap().as_i64().unwrap() > 0);
        assert!(json.get("scope").is_none());
        assert!(json.get("windows").is_none());
        assert_eq!(json["tree"][0]["id"], "e0");
    }

    #[test]
    fn test_envelope_rejects_unknown_fields() {
        let raw = r#"{"version":"0.1.0","platform":"web","timestamp":1,
                      "screen":{"w":1,"h":1},"tree":[],"bogus":true}"#;
        assert!(serde_json::from_str::<Envelope>(raw).is_err());
    }

    #[test]
    fn test_node_count() {
        let screen = ScreenInfo::new(800, 600, 1.0);
        let mut root = Node::new("e0", Role::Window, "w");
        root.children.push(Node::new("e1", Role::Button, "b"));
        let env = Envelope::new(Platform::Web, screen, vec![root]);
        assert_eq!(env.node_count(), 2);
    }
}
