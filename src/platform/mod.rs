//! Platform adapters: window enumeration, screen geometry, accessibility
//! tree capture, and native action dispatch for each supported backend.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::action::KeyCombo;
use crate::config::CdpConfig;
use crate::error::{CupError, Result};
use crate::model::{Action, Platform, ScreenInfo, ToolDescriptor, WindowInfo};

pub mod helpers;
pub mod linux;
pub mod macos;
mod raw;
pub mod web;
pub mod windows;

pub use raw::{AtspiRaw, AxRaw, CdpRaw, NativeRef, RawAttrs, RawNode, UiaRaw};

/// Default deadline for one-shot subprocess calls.
pub const SUBPROCESS_TIMEOUT_SECS: u64 = 10;
/// Deadline for full-tree capture calls.
pub const CAPTURE_TIMEOUT_SECS: u64 = 30;
/// Deadline for the one-time helper compilation.
pub const COMPILE_TIMEOUT_SECS: u64 = 60;

/// A window the adapter can walk, with its platform-opaque handle.
#[derive(Debug, Clone)]
pub struct WindowMetadata {
    pub handle: WindowHandle,
    pub title: String,
    pub pid: Option<u32>,
    pub bundle_id: Option<String>,
    pub url: Option<String>,
}

/// Platform-opaque window handle.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowHandle {
    Hwnd(isize),
    AxWindow { pid: i32, index: u32 },
    Atspi { bus_name: String, object_path: String },
    CdpTarget { ws_url: String, target_id: String },
    Desktop,
}

/// Walk statistics, accumulated during capture and merged across windows.
#[derive(Debug, Clone, Default)]
pub struct CaptureStats {
    pub nodes: usize,
    pub max_depth: u32,
    pub roles: HashMap<String, usize>,
}

impl CaptureStats {
    pub fn record(&mut self, depth: u32, native_role: String) {
        self.nodes += 1;
        self.max_depth = self.max_depth.max(depth);
        *self.roles.entry(native_role).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: CaptureStats) {
        self.nodes += other.nodes;
        self.max_depth = self.max_depth.max(other.max_depth);
        for (role, count) in other.roles {
            *self.roles.entry(role).or_insert(0) += count;
        }
    }
}

/// The flat pre-order stream a capture produces.
#[derive(Debug, Default)]
pub struct CaptureOutput {
    pub nodes: Vec<RawNode>,
    pub stats: CaptureStats,
}

/// Scroll direction for the `scroll` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "up" => Some(ScrollDirection::Up),
            "down" => Some(ScrollDirection::Down),
            "left" => Some(ScrollDirection::Left),
            "right" => Some(ScrollDirection::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
        }
    }
}

/// A validated element action ready for the platform handler.
#[derive(Debug, Clone)]
pub struct ActionInvocation {
    pub action: Action,
    pub value: Option<String>,
    pub direction: Option<ScrollDirection>,
}

/// Common contract every backend implements. Capture failures for a single
/// window are swallowed inside `capture_tree`; errors from `initialize` and
/// `screen_info` propagate.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    /// Idempotent setup: permission probing, helper compilation, endpoint
    /// discovery.
    async fn initialize(&self) -> Result<()>;

    async fn screen_info(&self) -> Result<ScreenInfo>;

    async fn foreground_window(&self) -> Result<WindowMetadata>;

    async fn all_windows(&self) -> Result<Vec<WindowMetadata>>;

    /// Near-instant window listing without any tree walking.
    async fn window_list(&self) -> Result<Vec<WindowInfo>>;

    async fn desktop_window(&self) -> Result<Option<WindowMetadata>> {
        Ok(None)
    }

    /// Walk the given windows to `max_depth` (0 = unlimited) and emit the
    /// flat node stream. A window that has died or denies access contributes
    /// no nodes; the capture still succeeds.
    async fn capture_tree(&self, windows: &[WindowMetadata], max_depth: u32)
        -> Result<CaptureOutput>;

    async fn focus_window(&self, window: &WindowMetadata) -> Result<()>;

    /// Invoke a validated action against a native reference. Returns the
    /// short imperative success message.
    async fn perform(&self, target: &NativeRef, invocation: &ActionInvocation) -> Result<String>;

    /// Session-level key combo injection.
    async fn press_keys(&self, combo: &KeyCombo) -> Result<()>;

    /// Page-exposed tools; only the web adapter returns any.
    async fn page_tools(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(Vec::new())
    }
}

/// Pick the adapter for the current host, or for an explicitly requested
/// platform (`web` is never auto-detected).
pub fn create_adapter(
    requested: Option<Platform>,
    cdp: CdpConfig,
) -> Result<Box<dyn PlatformAdapter>> {
    let platform = match requested {
        Some(p) => p,
        None => detect_platform()?,
    };

    match platform {
        Platform::Windows => Ok(Box::new(windows::WindowsAdapter::new())),
        Platform::Macos => Ok(Box::new(macos::MacosAdapter::new())),
        Platform::Linux => Ok(Box::new(linux::LinuxAdapter::new())),
        Platform::Web => Ok(Box::new(web::WebAdapter::new(cdp))),
        other => Err(CupError::PlatformUnsupported(other.to_string())),
    }
}

/// Host OS detection.
pub fn detect_platform() -> Result<Platform> {
    if cfg!(target_os = "windows") {
        Ok(Platform::Windows)
    } else if cfg!(target_os = "macos") {
        Ok(Platform::Macos)
    } else if cfg!(target_os = "linux") {
        Ok(Platform::Linux)
    } else {
        Err(CupError::PlatformUnsupported(std::env::consts::OS.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_merge() {
        let mut a = CaptureStats::default();
        a.record(0, "push-button".to_string());
        a.record(1, "label".to_string());

        let mut b = CaptureStats::default();
        b.record(4, "push-button".to_string());

        a.merge(b);
        assert_eq!(a.nodes, 3);
        assert_eq!(a.max_depth, 4);
        assert_eq!(a.roles["push-button"], 2);
    }

    #[test]
    fn test_scroll_direction_parse() {
        assert_eq!(ScrollDirection::parse("down"), Some(ScrollDirection::Down));
        assert_eq!(ScrollDirection::parse("sideways"), None);
    }
}
