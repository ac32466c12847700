//! Web adapter: Chrome DevTools Protocol via chromiumoxide against an
//! already-running browser (`CUP_CDP_HOST`/`CUP_CDP_PORT`). One
//! `Accessibility.getFullAXTree` per page supplies the node list; a
//! `DOMSnapshot.captureSnapshot` supplies bounds, correlated by backend
//! node id. Actions are injected with `Input.dispatch*` events.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::accessibility::{
    EnableParams as AxEnableParams, GetFullAxTreeParams,
};
use chromiumoxide::cdp::browser_protocol::dom::{
    BackendNodeId, DescribeNodeParams, FocusParams, GetBoxModelParams, ResolveNodeParams,
    ScrollIntoViewIfNeededParams,
};
use chromiumoxide::cdp::browser_protocol::dom_snapshot::CaptureSnapshotParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton,
};
use chromiumoxide::cdp::js_protocol::runtime::{CallArgument, CallFunctionOnParams};
use chromiumoxide::Page;
use futures_util::StreamExt;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::action::KeyCombo;
use crate::config::CdpConfig;
use crate::error::{CupError, Result};
use crate::model::{Action, Bounds, Platform, ScreenInfo, ToolDescriptor, WindowInfo};

use super::{
    ActionInvocation, CaptureOutput, CdpRaw, NativeRef, PlatformAdapter, RawAttrs, RawNode,
    ScrollDirection, WindowHandle, WindowMetadata,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

pub struct WebAdapter {
    cdp: CdpConfig,
    browser: Arc<Mutex<Option<Browser>>>,
    ws_url: Mutex<Option<String>>,
}

impl WebAdapter {
    pub fn new(cdp: CdpConfig) -> Self {
        Self {
            cdp,
            browser: Arc::new(Mutex::new(None)),
            ws_url: Mutex::new(None),
        }
    }

    /// Resolve the browser's WebSocket endpoint from the HTTP version
    /// endpoint and connect once; later calls reuse the connection.
    async fn connect(&self) -> Result<()> {
        let mut guard = self.browser.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        let version_url = self.cdp.version_url();
        let response = reqwest::get(&version_url).await.map_err(|e| {
            CupError::PlatformUnavailable(format!(
                "Chrome with CDP at {}:{} ({})",
                self.cdp.host, self.cdp.port, e
            ))
        })?;
        let info: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CupError::PlatformFailure(format!("CDP version payload: {}", e)))?;
        let ws_url = info
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                CupError::PlatformFailure("CDP version payload lacks webSocketDebuggerUrl".into())
            })?
            .to_string();

        let (browser, mut handler) = timeout(CONNECT_TIMEOUT, Browser::connect(ws_url.clone()))
            .await
            .map_err(|_| CupError::PlatformTimeout("CDP WebSocket handshake".to_string()))?
            .map_err(|e| CupError::PlatformFailure(format!("CDP connect: {}", e)))?;

        // Drive the connection in the background for the adapter's lifetime.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                tracing::trace!("cdp event: {:?}", event);
            }
        });

        *self.ws_url.lock().await = Some(ws_url);
        *guard = Some(browser);
        Ok(())
    }

    async fn pages(&self) -> Result<Vec<Page>> {
        self.connect().await?;
        let guard = self.browser.lock().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| CupError::PlatformFailure("browser not connected".to_string()))?;
        browser
            .pages()
            .await
            .map_err(|e| CupError::PlatformFailure(format!("listing pages: {}", e)))
    }

    async fn current_ws_url(&self) -> String {
        self.ws_url.lock().await.clone().unwrap_or_default()
    }

    async fn page_for_target(&self, target_id: &str) -> Result<Page> {
        for page in self.pages().await? {
            if page.target_id().as_ref() == target_id {
                return Ok(page);
            }
        }
        Err(CupError::StaleSnapshot(format!(
            "page target {} is gone",
            target_id
        )))
    }

    /// Find the page that still knows this backend node.
    async fn page_for_backend(&self, backend_id: i64) -> Result<Page> {
        for page in self.pages().await? {
            let probe = page
                .execute(
                    DescribeNodeParams::builder()
                        .backend_node_id(BackendNodeId::new(backend_id))
                        .build(),
                )
                .await;
            if probe.is_ok() {
                return Ok(page);
            }
        }
        Err(CupError::StaleSnapshot(format!(
            "backend node {} no longer resolves in any page",
            backend_id
        )))
    }

    async fn page_info(&self, page: &Page) -> (String, String) {
        let url = page.url().await.ok().flatten().unwrap_or_default();
        // No direct CDP method for the title; evaluate it.
        let title = page
            .evaluate("document.title")
            .await
            .ok()
            .and_then(|v| v.into_value::<String>().ok())
            .unwrap_or_default();
        (url, title)
    }

    async fn element_center(&self, page: &Page, backend_id: i64) -> Result<(f64, f64)> {
        let _ = page
            .execute(
                ScrollIntoViewIfNeededParams::builder()
                    .backend_node_id(BackendNodeId::new(backend_id))
                    .build(),
            )
            .await;
        let model = page
            .execute(
                GetBoxModelParams::builder()
                    .backend_node_id(BackendNodeId::new(backend_id))
                    .build(),
            )
            .await
            .map_err(|e| CupError::StaleSnapshot(format!("box model: {}", e)))?;
        let value = serde_json::to_value(&model.result)
            .map_err(|e| CupError::PlatformFailure(format!("box model payload: {}", e)))?;
        let quad = value
            .pointer("/model/content")
            .and_then(|q| q.as_array())
            .map(|q| q.iter().filter_map(|n| n.as_f64()).collect::<Vec<_>>())
            .unwrap_or_default();
        if quad.len() < 8 {
            return Err(CupError::PlatformFailure(
                "element has no content quad".to_string(),
            ));
        }
        let cx = (quad[0] + quad[2] + quad[4] + quad[6]) / 4.0;
        let cy = (quad[1] + quad[3] + quad[5] + quad[7]) / 4.0;
        Ok((cx, cy))
    }

    async fn click_at(&self, page: &Page, x: f64, y: f64, button: MouseButton, count: i64) -> Result<()> {
        for click in 1..=count {
            let pressed = DispatchMouseEventParams::builder()
                .r#type(DispatchMouseEventType::MousePressed)
                .x(x)
                .y(y)
                .button(button.clone())
                .click_count(click)
                .build()
                .map_err(CupError::PlatformFailure)?;
            let released = DispatchMouseEventParams::builder()
                .r#type(DispatchMouseEventType::MouseReleased)
                .x(x)
                .y(y)
                .button(button.clone())
                .click_count(click)
                .build()
                .map_err(CupError::PlatformFailure)?;
            page.execute(pressed)
                .await
                .map_err(|e| CupError::PlatformFailure(format!("mouse press: {}", e)))?;
            page.execute(released)
                .await
                .map_err(|e| CupError::PlatformFailure(format!("mouse release: {}", e)))?;
        }
        Ok(())
    }

    async fn focus_backend(&self, page: &Page, backend_id: i64) -> Result<()> {
        page.execute(
            FocusParams::builder()
                .backend_node_id(BackendNodeId::new(backend_id))
                .build(),
        )
        .await
        .map_err(|e| CupError::StaleSnapshot(format!("focus: {}", e)))?;
        Ok(())
    }

    async fn press_key(&self, page: &Page, key: &str, modifiers: i64) -> Result<()> {
        let (key_name, code, vk, text) = key_descriptor(key);
        let mut down = DispatchKeyEventParams::builder()
            .r#type(if text.is_some() {
                DispatchKeyEventType::KeyDown
            } else {
                DispatchKeyEventType::RawKeyDown
            })
            .key(key_name.clone())
            .code(code.clone())
            .windows_virtual_key_code(vk)
            .modifiers(modifiers);
        if let Some(text) = &text {
            down = down.text(text.clone());
        }
        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key(key_name)
            .code(code)
            .windows_virtual_key_code(vk)
            .modifiers(modifiers)
            .build()
            .map_err(CupError::PlatformFailure)?;
        page.execute(down.build().map_err(CupError::PlatformFailure)?)
            .await
            .map_err(|e| CupError::PlatformFailure(format!("key down: {}", e)))?;
        page.execute(up)
            .await
            .map_err(|e| CupError::PlatformFailure(format!("key up: {}", e)))?;
        Ok(())
    }

    async fn first_page(&self) -> Result<Page> {
        self.pages()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CupError::PlatformFailure("browser has no pages".to_string()))
    }
}

#[async_trait]
impl PlatformAdapter for WebAdapter {
    fn platform(&self) -> Platform {
        Platform::Web
    }

    async fn initialize(&self) -> Result<()> {
        self.connect().await
    }

    async fn screen_info(&self) -> Result<ScreenInfo> {
        let page = self.first_page().await?;
        let value = page
            .evaluate(
                "JSON.stringify({w: window.innerWidth, h: window.innerHeight, scale: window.devicePixelRatio})",
            )
            .await
            .map_err(|e| CupError::PlatformFailure(format!("viewport query: {}", e)))?
            .into_value::<String>()
            .map_err(|e| CupError::PlatformFailure(format!("viewport payload: {}", e)))?;
        let parsed: serde_json::Value = serde_json::from_str(&value)
            .map_err(|e| CupError::PlatformFailure(format!("viewport payload: {}", e)))?;
        Ok(ScreenInfo::new(
            parsed["w"].as_i64().unwrap_or(0) as i32,
            parsed["h"].as_i64().unwrap_or(0) as i32,
            parsed["scale"].as_f64().unwrap_or(1.0),
        ))
    }

    async fn foreground_window(&self) -> Result<WindowMetadata> {
        let ws_url = {
            self.connect().await?;
            self.current_ws_url().await
        };
        // Prefer the visible page, as only one tab renders at a time.
        for page in self.pages().await? {
            let visible = page
                .evaluate("document.visibilityState === 'visible'")
                .await
                .ok()
                .and_then(|v| v.into_value::<bool>().ok())
                .unwrap_or(false);
            if visible {
                let (url, title) = self.page_info(&page).await;
                return Ok(WindowMetadata {
                    handle: WindowHandle::CdpTarget {
                        ws_url,
                        target_id: page.target_id().as_ref().to_string(),
                    },
                    title,
                    pid: None,
                    bundle_id: None,
                    url: Some(url),
                });
            }
        }
        let page = self.first_page().await?;
        let (url, title) = self.page_info(&page).await;
        Ok(WindowMetadata {
            handle: WindowHandle::CdpTarget {
                ws_url: self.current_ws_url().await,
                target_id: page.target_id().as_ref().to_string(),
            },
            title,
            pid: None,
            bundle_id: None,
            url: Some(url),
        })
    }

    async fn all_windows(&self) -> Result<Vec<WindowMetadata>> {
        self.connect().await?;
        let ws_url = self.current_ws_url().await;
        let mut out = Vec::new();
        for page in self.pages().await? {
            let (url, title) = self.page_info(&page).await;
            out.push(WindowMetadata {
                handle: WindowHandle::CdpTarget {
                    ws_url: ws_url.clone(),
                    target_id: page.target_id().as_ref().to_string(),
                },
                title,
                pid: None,
                bundle_id: None,
                url: Some(url),
            });
        }
        Ok(out)
    }

    async fn window_list(&self) -> Result<Vec<WindowInfo>> {
        let mut out = Vec::new();
        for (index, page) in self.pages().await?.into_iter().enumerate() {
            let (url, title) = self.page_info(&page).await;
            out.push(WindowInfo {
                title,
                pid: None,
                bundle_id: None,
                foreground: Some(index == 0).filter(|f| *f),
                bounds: None,
                url: Some(url),
            });
        }
        Ok(out)
    }

    async fn capture_tree(
        &self,
        windows: &[WindowMetadata],
        _max_depth: u32,
    ) -> Result<CaptureOutput> {
        let ws_url = {
            self.connect().await?;
            self.current_ws_url().await
        };
        let screen = self.screen_info().await?.bounds();
        let mut merged = CaptureOutput::default();

        for window in windows {
            let target_id = match &window.handle {
                WindowHandle::CdpTarget { target_id, .. } => target_id,
                _ => continue,
            };
            let page = match self.page_for_target(target_id).await {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(window = %window.title, error = %err, "page gone, skipping");
                    continue;
                }
            };

            let _ = page.execute(AxEnableParams::default()).await;
            let tree = timeout(
                COMMAND_TIMEOUT,
                page.execute(GetFullAxTreeParams {
                    depth: Some(-1),
                    frame_id: None,
                }),
            )
            .await;
            let tree = match tree {
                Err(_) => {
                    tracing::warn!(window = %window.title, "Accessibility.getFullAXTree timeout");
                    continue;
                }
                Ok(Err(err)) => {
                    tracing::warn!(window = %window.title, error = %err, "AX tree fetch failed");
                    continue;
                }
                Ok(Ok(tree)) => tree,
            };
            let ax_nodes: Vec<serde_json::Value> = tree
                .result
                .nodes
                .iter()
                .filter_map(|n| serde_json::to_value(n).ok())
                .collect();

            // Bounds come from the snapshot, correlated by backend node id.
            let bounds_lookup = match page
                .execute(CaptureSnapshotParams {
                    computed_styles: Vec::new(),
                    include_paint_order: None,
                    include_dom_rects: None,
                    include_blended_background_colors: None,
                    include_text_color_opacities: None,
                })
                .await
            {
                Ok(snapshot) => serde_json::to_value(&snapshot.result)
                    .map(|v| build_bounds_lookup(&v))
                    .unwrap_or_default(),
                Err(_) => HashMap::new(),
            };

            let flat = flatten_ax_tree(&ax_nodes, &bounds_lookup, &screen, &ws_url);
            for node in &flat {
                merged.stats.record(node.depth, node.attrs.native_role());
            }
            merged.nodes.extend(flat);
        }
        Ok(merged)
    }

    async fn focus_window(&self, window: &WindowMetadata) -> Result<()> {
        if let WindowHandle::CdpTarget { target_id, .. } = &window.handle {
            let page = self.page_for_target(target_id).await?;
            page.bring_to_front()
                .await
                .map_err(|e| CupError::PlatformFailure(format!("bring to front: {}", e)))?;
        }
        Ok(())
    }

    async fn perform(&self, target: &NativeRef, invocation: &ActionInvocation) -> Result<String> {
        let backend_id = match target {
            NativeRef::Cdp { backend_id, .. } => *backend_id,
            other => {
                return Err(CupError::InvalidParams(format!(
                    "not a CDP reference: {:?}",
                    other
                )))
            }
        };
        let page = self.page_for_backend(backend_id).await?;

        match invocation.action {
            Action::Click | Action::Toggle | Action::Select | Action::Expand | Action::Collapse => {
                let (x, y) = self.element_center(&page, backend_id).await?;
                self.click_at(&page, x, y, MouseButton::Left, 1).await?;
            }
            Action::DoubleClick => {
                let (x, y) = self.element_center(&page, backend_id).await?;
                self.click_at(&page, x, y, MouseButton::Left, 2).await?;
            }
            Action::RightClick => {
                let (x, y) = self.element_center(&page, backend_id).await?;
                self.click_at(&page, x, y, MouseButton::Right, 1).await?;
            }
            Action::LongPress => {
                let (x, y) = self.element_center(&page, backend_id).await?;
                let pressed = DispatchMouseEventParams::builder()
                    .r#type(DispatchMouseEventType::MousePressed)
                    .x(x)
                    .y(y)
                    .button(MouseButton::Left)
                    .click_count(1)
                    .build()
                    .map_err(CupError::PlatformFailure)?;
                page.execute(pressed)
                    .await
                    .map_err(|e| CupError::PlatformFailure(format!("mouse press: {}", e)))?;
                tokio::time::sleep(Duration::from_millis(600)).await;
                let released = DispatchMouseEventParams::builder()
                    .r#type(DispatchMouseEventType::MouseReleased)
                    .x(x)
                    .y(y)
                    .button(MouseButton::Left)
                    .click_count(1)
                    .build()
                    .map_err(CupError::PlatformFailure)?;
                page.execute(released)
                    .await
                    .map_err(|e| CupError::PlatformFailure(format!("mouse release: {}", e)))?;
            }
            Action::Type => {
                let value = invocation.value.clone().unwrap_or_default();
                self.focus_backend(&page, backend_id).await?;
                page.execute(InsertTextParams::new(value))
                    .await
                    .map_err(|e| CupError::PlatformFailure(format!("insert text: {}", e)))?;
            }
            Action::SetValue => {
                let value = invocation.value.clone().unwrap_or_default();
                let resolved = page
                    .execute(
                        ResolveNodeParams::builder()
                            .backend_node_id(BackendNodeId::new(backend_id))
                            .build(),
                    )
                    .await
                    .map_err(|e| CupError::StaleSnapshot(format!("resolve node: {}", e)))?;
                let object_id = resolved
                    .result
                    .object
                    .object_id
                    .clone()
                    .ok_or_else(|| CupError::PlatformFailure("node has no object id".into()))?;
                let call = CallFunctionOnParams::builder()
                    .object_id(object_id)
                    .function_declaration(
                        "function(v) { this.value = v; \
                         this.dispatchEvent(new Event('input', {bubbles: true})); \
                         this.dispatchEvent(new Event('change', {bubbles: true})); }",
                    )
                    .argument(
                        CallArgument::builder()
                            .value(serde_json::Value::String(value))
                            .build(),
                    )
                    .build()
                    .map_err(CupError::PlatformFailure)?;
                page.execute(call)
                    .await
                    .map_err(|e| CupError::PlatformFailure(format!("set value: {}", e)))?;
            }
            Action::Scroll => {
                let direction = invocation.direction.unwrap_or(ScrollDirection::Down);
                let (x, y) = self.element_center(&page, backend_id).await?;
                let (dx, dy) = match direction {
                    ScrollDirection::Up => (0.0, -600.0),
                    ScrollDirection::Down => (0.0, 600.0),
                    ScrollDirection::Left => (-600.0, 0.0),
                    ScrollDirection::Right => (600.0, 0.0),
                };
                let wheel = DispatchMouseEventParams::builder()
                    .r#type(DispatchMouseEventType::MouseWheel)
                    .x(x)
                    .y(y)
                    .delta_x(dx)
                    .delta_y(dy)
                    .build()
                    .map_err(CupError::PlatformFailure)?;
                page.execute(wheel)
                    .await
                    .map_err(|e| CupError::PlatformFailure(format!("wheel: {}", e)))?;
            }
            Action::Focus => {
                self.focus_backend(&page, backend_id).await?;
            }
            Action::Dismiss => {
                self.press_key(&page, "escape", 0).await?;
            }
            Action::Increment | Action::Decrement => {
                self.focus_backend(&page, backend_id).await?;
                let key = if invocation.action == Action::Increment {
                    "up"
                } else {
                    "down"
                };
                self.press_key(&page, key, 0).await?;
            }
        }
        Ok(crate::action::success_message(invocation))
    }

    async fn press_keys(&self, combo: &KeyCombo) -> Result<()> {
        let page = self.first_page().await?;
        let modifiers = modifier_mask(&combo.modifiers);
        for key in &combo.keys {
            self.press_key(&page, key, modifiers).await?;
        }
        Ok(())
    }

    async fn page_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let page = match self.first_page().await {
            Ok(page) => page,
            Err(_) => return Ok(Vec::new()),
        };
        let script = r#"
            (() => {
                const mc = navigator.modelContext;
                if (!mc || !mc.tools) return "[]";
                return JSON.stringify([...mc.tools].map(t => ({
                    name: t.name, description: t.description || null,
                    parameters: t.inputSchema || null
                })));
            })()
        "#;
        let tools = page
            .evaluate(script)
            .await
            .ok()
            .and_then(|v| v.into_value::<String>().ok())
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default();
        Ok(tools)
    }
}

/// CDP modifier bitmask: Alt=1, Ctrl=2, Meta=4, Shift=8.
fn modifier_mask(modifiers: &[String]) -> i64 {
    modifiers
        .iter()
        .map(|m| match m.as_str() {
            "alt" => 1,
            "ctrl" => 2,
            "meta" => 4,
            "shift" => 8,
            _ => 0,
        })
        .sum()
}

/// (key, code, windowsVirtualKeyCode, text) for a canonical key name.
fn key_descriptor(key: &str) -> (String, String, i64, Option<String>) {
    match key {
        "enter" => ("Enter".into(), "Enter".into(), 13, Some("\r".into())),
        "escape" => ("Escape".into(), "Escape".into(), 27, None),
        "tab" => ("Tab".into(), "Tab".into(), 9, None),
        "backspace" => ("Backspace".into(), "Backspace".into(), 8, None),
        "delete" => ("Delete".into(), "Delete".into(), 46, None),
        "up" => ("ArrowUp".into(), "ArrowUp".into(), 38, None),
        "down" => ("ArrowDown".into(), "ArrowDown".into(), 40, None),
        "left" => ("ArrowLeft".into(), "ArrowLeft".into(), 37, None),
        "right" => ("ArrowRight".into(), "ArrowRight".into(), 39, None),
        "home" => ("Home".into(), "Home".into(), 36, None),
        "end" => ("End".into(), "End".into(), 35, None),
        "pageup" => ("PageUp".into(), "PageUp".into(), 33, None),
        "pagedown" => ("PageDown".into(), "PageDown".into(), 34, None),
        "space" => (" ".into(), "Space".into(), 32, Some(" ".into())),
        single if single.chars().count() == 1 => {
            let ch = single.chars().next().expect("single char");
            let upper = ch.to_ascii_uppercase();
            (
                single.to_string(),
                format!("Key{}", upper),
                upper as i64,
                Some(single.to_string()),
            )
        }
        other => (other.to_string(), other.to_string(), 0, None),
    }
}

/// Correlate `DOMSnapshot.captureSnapshot` arrays into backend-id → bounds.
/// Layout bounds come in document coordinates as `[x, y, w, h]` runs indexed
/// by `layout.nodeIndex`.
fn build_bounds_lookup(snapshot: &serde_json::Value) -> HashMap<i64, Bounds> {
    let mut lookup = HashMap::new();
    let documents = match snapshot.get("documents").and_then(|d| d.as_array()) {
        Some(documents) => documents,
        None => return lookup,
    };

    for doc in documents {
        let backend_ids = doc
            .pointer("/nodes/backendNodeId")
            .and_then(|v| v.as_array());
        let layout_node_index = doc.pointer("/layout/nodeIndex").and_then(|v| v.as_array());
        let layout_bounds = doc.pointer("/layout/bounds").and_then(|v| v.as_array());
        let (backend_ids, layout_node_index, layout_bounds) =
            match (backend_ids, layout_node_index, layout_bounds) {
                (Some(a), Some(b), Some(c)) => (a, b, c),
                _ => continue,
            };

        for (layout_index, node_index) in layout_node_index.iter().enumerate() {
            let node_index = match node_index.as_i64() {
                Some(i) if i >= 0 => i as usize,
                _ => continue,
            };
            let backend_id = match backend_ids.get(node_index).and_then(|v| v.as_i64()) {
                Some(id) if id > 0 => id,
                _ => continue,
            };
            let rect = match layout_bounds.get(layout_index).and_then(|v| v.as_array()) {
                Some(rect) if rect.len() >= 4 => rect,
                _ => continue,
            };
            let vals: Vec<f64> = rect.iter().filter_map(|v| v.as_f64()).collect();
            if vals.len() < 4 {
                continue;
            }
            lookup.insert(
                backend_id,
                Bounds::new(
                    vals[0] as i32,
                    vals[1] as i32,
                    vals[2] as i32,
                    vals[3] as i32,
                ),
            );
        }
    }
    lookup
}

fn ax_value_str(node: &serde_json::Value, field: &str) -> Option<String> {
    node.get(field)
        .and_then(|f| f.get("value"))
        .map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .filter(|s| !s.is_empty())
}

/// Turn the flat-by-id `getFullAXTree` node list into a depth-annotated
/// pre-order stream. Ignored nodes are transparent: skipped, with their
/// children spliced in at the same depth.
fn flatten_ax_tree(
    ax_nodes: &[serde_json::Value],
    bounds_lookup: &HashMap<i64, Bounds>,
    screen: &Bounds,
    ws_url: &str,
) -> Vec<RawNode> {
    let by_id: HashMap<&str, &serde_json::Value> = ax_nodes
        .iter()
        .filter_map(|n| n.get("nodeId").and_then(|v| v.as_str()).map(|id| (id, n)))
        .collect();

    // The root is the node nothing references as a child.
    let mut referenced: std::collections::HashSet<&str> = std::collections::HashSet::new();
    for node in ax_nodes {
        if let Some(children) = node.get("childIds").and_then(|v| v.as_array()) {
            for child in children {
                if let Some(id) = child.as_str() {
                    referenced.insert(id);
                }
            }
        }
    }
    let root_id = ax_nodes
        .iter()
        .filter_map(|n| n.get("nodeId").and_then(|v| v.as_str()))
        .find(|id| !referenced.contains(id));

    let mut out = Vec::new();
    let root_id = match root_id {
        Some(id) => id,
        None => return out,
    };

    // Iterative pre-order; reversed child pushes keep document order.
    let mut stack: Vec<(&str, u32)> = vec![(root_id, 0)];
    while let Some((id, depth)) = stack.pop() {
        let node = match by_id.get(id) {
            Some(node) => *node,
            None => continue,
        };
        let ignored = node
            .get("ignored")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let child_ids: Vec<&str> = node
            .get("childIds")
            .and_then(|v| v.as_array())
            .map(|c| c.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        if ignored {
            for child in child_ids.into_iter().rev() {
                stack.push((child, depth));
            }
            continue;
        }

        let backend_id = node
            .get("backendDOMNodeId")
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        let mut properties = HashMap::new();
        if let Some(props) = node.get("properties").and_then(|v| v.as_array()) {
            for prop in props {
                let name = prop.get("name").and_then(|v| v.as_str()).unwrap_or("");
                if name.is_empty() {
                    continue;
                }
                if let Some(value) = prop.pointer("/value/value") {
                    properties.insert(name.to_string(), value.clone());
                }
            }
        }
        let bounds = bounds_lookup
            .get(&backend_id)
            .copied()
            .filter(|b| b.w > 0 && b.h > 0);
        let offscreen_by_screen = bounds.map(|b| b.outside(screen)).unwrap_or(false);

        let raw = CdpRaw {
            role: ax_value_str(node, "role").unwrap_or_else(|| "GenericContainer".to_string()),
            name: ax_value_str(node, "name").unwrap_or_default(),
            description: ax_value_str(node, "description").unwrap_or_default(),
            value: ax_value_str(node, "value"),
            properties,
            bounds,
            backend_id,
        };
        out.push(RawNode {
            depth,
            attrs: RawAttrs::Cdp(raw),
            native: NativeRef::Cdp {
                ws_url: ws_url.to_string(),
                backend_id,
            },
            offscreen_by_screen,
        });

        for child in child_ids.into_iter().rev() {
            stack.push((child, depth + 1));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_modifier_mask() {
        assert_eq!(modifier_mask(&["ctrl".into(), "shift".into()]), 10);
        assert_eq!(modifier_mask(&["meta".into()]), 4);
        assert_eq!(modifier_mask(&[]), 0);
    }

    #[test]
    fn test_key_descriptor() {
        let (key, code, vk, text) = key_descriptor("enter");
        assert_eq!((key.as_str(), code.as_str(), vk), ("Enter", "Enter", 13));
        assert_eq!(text.as_deref(), Some("\r"));

        let (key, code, vk, text) = key_descriptor("a");
        assert_eq!((key.as_str(), code.as_str(), vk), ("a", "KeyA", 65));
        assert_eq!(text.as_deref(), Some("a"));
    }

    #[test]
    fn test_build_bounds_lookup() {
        let snapshot = json!({
            "documents": [{
                "nodes": { "backendNodeId": [11, 22, 33] },
                "layout": {
                    "nodeIndex": [0, 2],
                    "bounds": [[0.0, 0.0, 100.0, 50.0], [10.0, 60.0, 200.0, 20.0]]
                }
            }],
            "strings": []
        });
        let lookup = build_bounds_lookup(&snapshot);
        assert_eq!(lookup[&11], Bounds::new(0, 0, 100, 50));
        assert_eq!(lookup[&33], Bounds::new(10, 60, 200, 20));
        assert!(!lookup.contains_key(&22));
    }

    fn ax(id: &str, role: &str, name: &str, children: &[&str], backend: i64) -> serde_json::Value {
        json!({
            "nodeId": id,
            "ignored": false,
            "role": {"type": "role", "value": role},
            "name": {"type": "computedString", "value": name},
            "childIds": children,
            "backendDOMNodeId": backend,
            "properties": []
        })
    }

    #[test]
    fn test_flatten_preorder_and_depth() {
        let nodes = vec![
            ax("1", "RootWebArea", "Page", &["2", "4"], 100),
            ax("2", "GenericContainer", "", &["3"], 101),
            ax("3", "button", "Go", &[], 102),
            ax("4", "StaticText", "Footer", &[], 103),
        ];
        let flat = flatten_ax_tree(
            &nodes,
            &HashMap::new(),
            &Bounds::new(0, 0, 1280, 720),
            "ws://x",
        );
        let shape: Vec<(u32, String)> = flat
            .iter()
            .map(|n| (n.depth, n.attrs.native_role()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (0, "RootWebArea".to_string()),
                (1, "GenericContainer".to_string()),
                (2, "button".to_string()),
                (1, "StaticText".to_string()),
            ]
        );
    }

    #[test]
    fn test_flatten_skips_ignored_transparently() {
        let mut wrapper = ax("2", "GenericContainer", "", &["3"], 101);
        wrapper["ignored"] = json!(true);
        let nodes = vec![
            ax("1", "RootWebArea", "Page", &["2"], 100),
            wrapper,
            ax("3", "button", "Go", &[], 102),
        ];
        let flat = flatten_ax_tree(
            &nodes,
            &HashMap::new(),
            &Bounds::new(0, 0, 1280, 720),
            "ws://x",
        );
        assert_eq!(flat.len(), 2);
        // The button takes the ignored wrapper's depth.
        assert_eq!(flat[1].depth, 1);
        assert_eq!(flat[1].attrs.native_role(), "button");
    }

    #[test]
    fn test_flatten_properties_and_bounds() {
        let mut button = ax("2", "button", "Go", &[], 102);
        button["properties"] = json!([
            {"name": "focusable", "value": {"type": "booleanOrUndefined", "value": true}},
            {"name": "disabled", "value": {"type": "booleanOrUndefined", "value": false}}
        ]);
        let nodes = vec![ax("1", "RootWebArea", "Page", &["2"], 100), button];
        let mut bounds = HashMap::new();
        bounds.insert(102, Bounds::new(5, 5, 50, 20));

        let flat = flatten_ax_tree(&nodes, &bounds, &Bounds::new(0, 0, 1280, 720), "ws://x");
        if let RawAttrs::Cdp(raw) = &flat[1].attrs {
            assert_eq!(raw.properties["focusable"], json!(true));
            assert_eq!(raw.bounds, Some(Bounds::new(5, 5, 50, 20)));
        } else {
            panic!("expected CDP attrs");
        }
    }
}
