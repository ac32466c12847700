//! Windows adapter: UI Automation through a PowerShell-hosted C# helper.
//! Each call encodes a wrapper script (`Add-Type` of the helper source plus
//! one command line) as `-EncodedCommand` and parses either a JSON payload
//! or an `OK:` / `ERROR:` / `BOUNDS:` / `FALLBACK:` status line.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use tokio::process::Command;

use crate::action::KeyCombo;
use crate::error::{CupError, Result};
use crate::model::{Action, Bounds, Platform, ScreenInfo, WindowInfo};

use super::helpers::run_for_stdout;
use super::{
    ActionInvocation, CaptureOutput, NativeRef, PlatformAdapter, RawAttrs, RawNode, UiaRaw,
    WindowHandle, WindowMetadata, CAPTURE_TIMEOUT_SECS, SUBPROCESS_TIMEOUT_SECS,
};

/// UIA ControlType id for Document, used by the lazy-tree heuristic.
const CONTROL_TYPE_DOCUMENT: i32 = 50030;
/// Captures smaller than this are treated as lazily-initialized trees.
const LAZY_TREE_NODE_FLOOR: usize = 30;

pub struct WindowsAdapter;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HelperWindow {
    hwnd: isize,
    title: String,
    pid: u32,
    #[serde(default)]
    foreground: bool,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

#[derive(Debug, Deserialize)]
struct HelperScreen {
    w: i32,
    h: i32,
    scale: f64,
}

/// Status line grammar shared with the helper.
#[derive(Debug, PartialEq)]
enum HelperStatus {
    Ok(String),
    Error(String),
    /// The helper wants a pointer click at these screen coordinates.
    Bounds(i32, i32),
    /// The helper wants the host to focus the element and press Enter.
    FallbackFocusEnter,
}

fn classify_status(line: &str) -> Result<HelperStatus> {
    if let Some(msg) = line.strip_prefix("OK:") {
        return Ok(HelperStatus::Ok(msg.trim().to_string()));
    }
    if let Some(msg) = line.strip_prefix("ERROR:") {
        return Ok(HelperStatus::Error(msg.trim().to_string()));
    }
    if let Some(coords) = line.strip_prefix("BOUNDS:") {
        let mut parts = coords.trim().split(',');
        let x = parts.next().and_then(|p| p.trim().parse().ok());
        let y = parts.next().and_then(|p| p.trim().parse().ok());
        if let (Some(x), Some(y)) = (x, y) {
            return Ok(HelperStatus::Bounds(x, y));
        }
        return Err(CupError::PlatformFailure(format!(
            "malformed BOUNDS line: {}",
            line
        )));
    }
    if line.trim() == "FALLBACK:focus+enter" {
        return Ok(HelperStatus::FallbackFocusEnter);
    }
    Err(CupError::PlatformFailure(format!(
        "unrecognized helper output: {}",
        line
    )))
}

impl WindowsAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Wrap one helper invocation in the `Add-Type` boilerplate and encode
    /// it the way `powershell -EncodedCommand` expects (UTF-16LE, base64).
    fn encoded_command(args: &[&str]) -> String {
        let quoted: Vec<String> = args
            .iter()
            .map(|a| format!("'{}'", a.replace('\'', "''")))
            .collect();
        let script = format!(
            "$ErrorActionPreference='Stop';\n\
             Add-Type -TypeDefinition @'\n{}\n'@ -ReferenceAssemblies UIAutomationClient,UIAutomationTypes,System.Windows.Forms,System.Drawing;\n\
             [CupUia.Program]::Run(@({}))",
            UIA_HELPER_SOURCE,
            quoted.join(",")
        );
        let utf16: Vec<u8> = script
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect();
        base64::engine::general_purpose::STANDARD.encode(utf16)
    }

    async fn run_helper(&self, args: &[&str], timeout_secs: u64) -> Result<String> {
        let mut cmd = Command::new("powershell");
        cmd.args([
            "-NoProfile",
            "-OutputFormat",
            "Text",
            "-EncodedCommand",
            &Self::encoded_command(args),
        ]);
        run_for_stdout(cmd, timeout_secs, "powershell")
            .await
            .map_err(|err| match err {
                CupError::PlatformUnavailable(_) => {
                    CupError::PlatformUnavailable("powershell".to_string())
                }
                other => other,
            })
    }

    async fn run_status(&self, args: &[&str]) -> Result<HelperStatus> {
        let out = self.run_helper(args, SUBPROCESS_TIMEOUT_SECS).await?;
        let line = out
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or_default();
        let status = classify_status(line)?;
        if let HelperStatus::Error(msg) = &status {
            let lower = msg.to_lowercase();
            if lower.contains("stale") || lower.contains("no longer") || lower.contains("not found")
            {
                return Err(CupError::StaleSnapshot(msg.clone()));
            }
            return Err(CupError::PlatformFailure(msg.clone()));
        }
        Ok(status)
    }

    fn hwnd_of(window: &WindowMetadata) -> Result<isize> {
        match window.handle {
            WindowHandle::Hwnd(hwnd) => Ok(hwnd),
            _ => Err(CupError::InvalidParams("not an HWND handle".to_string())),
        }
    }

    async fn capture_window(
        &self,
        hwnd: isize,
        max_depth: u32,
        screen: Bounds,
    ) -> Result<Vec<RawNode>> {
        let out = self
            .run_helper(
                &["tree", &hwnd.to_string(), &max_depth.to_string()],
                CAPTURE_TIMEOUT_SECS,
            )
            .await?;
        let parsed: Vec<UiaRaw> = serde_json::from_str(json_payload(&out))
            .map_err(|e| CupError::PlatformFailure(format!("helper tree payload: {}", e)))?;

        Ok(parsed
            .into_iter()
            .enumerate()
            .map(|(index, mut raw)| {
                // Degenerate rectangles are dropped at the adapter boundary.
                if let Some([_, _, w, h]) = raw.bounds {
                    if w <= 0.0 || h <= 0.0 {
                        raw.bounds = None;
                    }
                }
                let offscreen_by_screen = raw
                    .bounds
                    .map(|[x, y, w, h]| {
                        Bounds::new(x as i32, y as i32, w as i32, h as i32).outside(&screen)
                    })
                    .unwrap_or(false);
                RawNode {
                    depth: raw.depth,
                    native: NativeRef::Uia {
                        hwnd,
                        node_index: index as u32,
                    },
                    offscreen_by_screen,
                    attrs: RawAttrs::Uia(raw),
                }
            })
            .collect())
    }
}

impl Default for WindowsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// True when the capture looks like a lazily-initialized Chromium/Electron
/// accessibility tree: tiny, or browser chrome with no document.
fn needs_foreground_recapture(nodes: &[RawNode]) -> bool {
    if nodes.is_empty() {
        return false;
    }
    if nodes.len() < LAZY_TREE_NODE_FLOOR {
        return true;
    }
    let mut chromium = false;
    let mut has_document = false;
    for node in nodes {
        if let RawAttrs::Uia(raw) = &node.attrs {
            if raw.class_name.contains("Chrome_WidgetWin")
                || raw.class_name.contains("Chrome_RenderWidgetHostHWND")
            {
                chromium = true;
            }
            if raw.control_type == CONTROL_TYPE_DOCUMENT {
                has_document = true;
            }
        }
    }
    chromium && !has_document
}

/// The helper may emit progress noise before the JSON payload; take the
/// first line that starts an array or object.
fn json_payload(out: &str) -> &str {
    let start = out.find(['[', '{']).unwrap_or(0);
    &out[start..]
}

#[async_trait]
impl PlatformAdapter for WindowsAdapter {
    fn platform(&self) -> Platform {
        Platform::Windows
    }

    async fn initialize(&self) -> Result<()> {
        // Compiles the helper types once per PowerShell process and proves
        // UIA is reachable.
        let out = self.run_helper(&["screen"], SUBPROCESS_TIMEOUT_SECS).await?;
        serde_json::from_str::<HelperScreen>(json_payload(&out))
            .map_err(|e| CupError::PlatformFailure(format!("helper screen payload: {}", e)))?;
        Ok(())
    }

    async fn screen_info(&self) -> Result<ScreenInfo> {
        let out = self.run_helper(&["screen"], SUBPROCESS_TIMEOUT_SECS).await?;
        let screen: HelperScreen = serde_json::from_str(json_payload(&out))
            .map_err(|e| CupError::PlatformFailure(format!("helper screen payload: {}", e)))?;
        Ok(ScreenInfo::new(screen.w, screen.h, screen.scale))
    }

    async fn foreground_window(&self) -> Result<WindowMetadata> {
        let out = self
            .run_helper(&["foreground"], SUBPROCESS_TIMEOUT_SECS)
            .await?;
        let window: HelperWindow = serde_json::from_str(json_payload(&out))
            .map_err(|e| CupError::PlatformFailure(format!("helper window payload: {}", e)))?;
        Ok(WindowMetadata {
            handle: WindowHandle::Hwnd(window.hwnd),
            title: window.title,
            pid: Some(window.pid),
            bundle_id: None,
            url: None,
        })
    }

    async fn all_windows(&self) -> Result<Vec<WindowMetadata>> {
        let out = self.run_helper(&["windows"], SUBPROCESS_TIMEOUT_SECS).await?;
        let windows: Vec<HelperWindow> = serde_json::from_str(json_payload(&out))
            .map_err(|e| CupError::PlatformFailure(format!("helper windows payload: {}", e)))?;
        Ok(windows
            .into_iter()
            .map(|w| WindowMetadata {
                handle: WindowHandle::Hwnd(w.hwnd),
                title: w.title,
                pid: Some(w.pid),
                bundle_id: None,
                url: None,
            })
            .collect())
    }

    async fn window_list(&self) -> Result<Vec<WindowInfo>> {
        let out = self.run_helper(&["windows"], SUBPROCESS_TIMEOUT_SECS).await?;
        let windows: Vec<HelperWindow> = serde_json::from_str(json_payload(&out))
            .map_err(|e| CupError::PlatformFailure(format!("helper windows payload: {}", e)))?;
        Ok(windows
            .into_iter()
            .map(|w| WindowInfo {
                title: w.title,
                pid: Some(w.pid),
                bundle_id: None,
                foreground: Some(w.foreground).filter(|f| *f),
                bounds: Some(Bounds::new(w.x, w.y, w.w, w.h)),
                url: None,
            })
            .collect())
    }

    async fn desktop_window(&self) -> Result<Option<WindowMetadata>> {
        // HWND 0 addresses the root UIA element in the helper.
        Ok(Some(WindowMetadata {
            handle: WindowHandle::Hwnd(0),
            title: "Desktop".to_string(),
            pid: None,
            bundle_id: None,
            url: None,
        }))
    }

    async fn capture_tree(
        &self,
        windows: &[WindowMetadata],
        max_depth: u32,
    ) -> Result<CaptureOutput> {
        let screen = self.screen_info().await?.bounds();
        let mut merged = CaptureOutput::default();

        for window in windows {
            let hwnd = match Self::hwnd_of(window) {
                Ok(hwnd) => hwnd,
                Err(_) => continue,
            };
            let mut nodes = match self.capture_window(hwnd, max_depth, screen).await {
                Ok(nodes) => nodes,
                Err(err) => {
                    tracing::warn!(window = %window.title, error = %err, "window capture failed");
                    continue;
                }
            };

            // Chromium and Electron only populate their UIA tree once some
            // client focuses the window; recapture once after foregrounding.
            if needs_foreground_recapture(&nodes) {
                tracing::debug!(window = %window.title, "lazy accessibility tree, recapturing after focus");
                if self.focus_window(window).await.is_ok() {
                    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
                    if let Ok(again) = self.capture_window(hwnd, max_depth, screen).await {
                        if again.len() > nodes.len() {
                            nodes = again;
                        }
                    }
                }
            }

            for node in &nodes {
                merged.stats.record(node.depth, node.attrs.native_role());
            }
            merged.nodes.extend(nodes);
        }
        Ok(merged)
    }

    async fn focus_window(&self, window: &WindowMetadata) -> Result<()> {
        let hwnd = Self::hwnd_of(window)?;
        self.run_status(&["focus", &hwnd.to_string()]).await?;
        Ok(())
    }

    async fn perform(&self, target: &NativeRef, invocation: &ActionInvocation) -> Result<String> {
        let (hwnd, node_index) = match target {
            NativeRef::Uia { hwnd, node_index } => (*hwnd, *node_index),
            other => {
                return Err(CupError::InvalidParams(format!(
                    "not a UIA reference: {:?}",
                    other
                )))
            }
        };

        let mut args: Vec<String> = vec![
            "action".to_string(),
            hwnd.to_string(),
            node_index.to_string(),
            invocation.action.as_str().to_string(),
        ];
        if let Some(value) = &invocation.value {
            args.push(value.clone());
        }
        if let Some(direction) = invocation.direction {
            args.push(direction.as_str().to_string());
        }
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        match self.run_status(&arg_refs).await? {
            HelperStatus::Ok(_) => Ok(crate::action::success_message(invocation)),
            HelperStatus::Bounds(x, y) => {
                // The element has no usable pattern; click its center.
                let (button, count) = match invocation.action {
                    Action::RightClick => ("right", 1),
                    Action::DoubleClick => ("left", 2),
                    _ => ("left", 1),
                };
                self.run_status(&[
                    "click",
                    &x.to_string(),
                    &y.to_string(),
                    button,
                    &count.to_string(),
                ])
                .await?;
                Ok(crate::action::success_message(invocation))
            }
            HelperStatus::FallbackFocusEnter => {
                self.run_status(&["action", &hwnd.to_string(), &node_index.to_string(), "focus"])
                    .await?;
                self.press_keys(&crate::action::parse_combo("enter")).await?;
                Ok(crate::action::success_message(invocation))
            }
            HelperStatus::Error(msg) => Err(CupError::PlatformFailure(msg)),
        }
    }

    async fn press_keys(&self, combo: &KeyCombo) -> Result<()> {
        let modifiers = combo.modifiers.join(",");
        let keys = combo.keys.join(",");
        self.run_status(&["keys", &modifiers, &keys]).await?;
        Ok(())
    }
}

/// The inline C# program PowerShell compiles with `Add-Type`. Uses the
/// managed UIA client: one CacheRequest carrying the 29 downstream
/// properties, `TreeScope.Subtree`, a single `GetUpdatedCache` per window.
/// Emits JSON on stdout for query commands and the status-line grammar for
/// actions.
const UIA_HELPER_SOURCE: &str = r#"
using System;
using System.Collections.Generic;
using System.Runtime.InteropServices;
using System.Text;
using System.Windows.Automation;
using System.Windows.Forms;

namespace CupUia {
public static class Program {
    [DllImport("user32.dll")] static extern IntPtr GetForegroundWindow();
    [DllImport("user32.dll")] static extern bool SetForegroundWindow(IntPtr hWnd);
    [DllImport("user32.dll")] static extern bool IsWindowVisible(IntPtr hWnd);
    [DllImport("user32.dll")] static extern bool EnumWindows(EnumProc proc, IntPtr lParam);
    [DllImport("user32.dll")] static extern int GetWindowTextW(IntPtr hWnd, StringBuilder buf, int max);
    [DllImport("user32.dll")] static extern uint GetWindowThreadProcessId(IntPtr hWnd, out uint pid);
    [DllImport("user32.dll")] static extern bool GetWindowRect(IntPtr hWnd, out RECT rect);
    [DllImport("user32.dll")] static extern bool SetCursorPos(int x, int y);
    [DllImport("user32.dll")] static extern void mouse_event(uint flags, uint dx, uint dy, uint data, UIntPtr extra);
    [DllImport("user32.dll")] static extern void keybd_event(byte vk, byte scan, uint flags, UIntPtr extra);
    [DllImport("user32.dll")] static extern int GetSystemMetrics(int index);
    [DllImport("gdi32.dll")] static extern int GetDeviceCaps(IntPtr hdc, int index);
    [DllImport("user32.dll")] static extern IntPtr GetDC(IntPtr hWnd);

    delegate bool EnumProc(IntPtr hWnd, IntPtr lParam);
    [StructLayout(LayoutKind.Sequential)] struct RECT { public int Left, Top, Right, Bottom; }

    const uint LEFTDOWN = 0x02, LEFTUP = 0x04, RIGHTDOWN = 0x08, RIGHTUP = 0x10;
    const uint WHEEL = 0x0800, HWHEEL = 0x1000;
    const uint KEYUP = 0x02;

    public static void Run(string[] args) {
        try {
            switch (args[0]) {
                case "screen": Screen(); break;
                case "windows": Windows(); break;
                case "foreground": Foreground(); break;
                case "focus": Focus(long.Parse(args[1])); break;
                case "tree": Tree(long.Parse(args[1]), int.Parse(args[2])); break;
                case "action": DoAction(args); break;
                case "click": Click(args); break;
                case "keys": Keys(args[1], args[2]); break;
                default: Console.WriteLine("ERROR:unknown command " + args[0]); break;
            }
        } catch (ElementNotAvailableException e) {
            Console.WriteLine("ERROR:stale element: " + e.Message);
        } catch (Exception e) {
            Console.WriteLine("ERROR:" + e.Message);
        }
    }

    static void Screen() {
        int w = GetSystemMetrics(0), h = GetSystemMetrics(1);
        int dpi = GetDeviceCaps(GetDC(IntPtr.Zero), 88);
        Console.WriteLine("{\"w\":" + w + ",\"h\":" + h + ",\"scale\":" + (dpi / 96.0).ToString(System.Globalization.CultureInfo.InvariantCulture) + "}");
    }

    static string WindowJson(IntPtr hwnd, bool foreground) {
        var buf = new StringBuilder(512);
        GetWindowTextW(hwnd, buf, buf.Capacity);
        uint pid; GetWindowThreadProcessId(hwnd, out pid);
        RECT r; GetWindowRect(hwnd, out r);
        return "{\"hwnd\":" + hwnd.ToInt64() + ",\"title\":" + Quote(buf.ToString()) +
               ",\"pid\":" + pid + ",\"foreground\":" + (foreground ? "true" : "false") +
               ",\"x\":" + r.Left + ",\"y\":" + r.Top +
               ",\"w\":" + (r.Right - r.Left) + ",\"h\":" + (r.Bottom - r.Top) + "}";
    }

    static void Windows() {
        var fg = GetForegroundWindow();
        var parts = new List<string>();
        EnumWindows((hwnd, l) => {
            if (!IsWindowVisible(hwnd)) return true;
            var buf = new StringBuilder(512);
            if (GetWindowTextW(hwnd, buf, buf.Capacity) == 0) return true;
            if (buf.ToString().Trim().Length == 0) return true;
            parts.Add(WindowJson(hwnd, hwnd == fg));
            return true;
        }, IntPtr.Zero);
        Console.WriteLine("[" + string.Join(",", parts) + "]");
    }

    static void Foreground() {
        var hwnd = GetForegroundWindow();
        if (hwnd == IntPtr.Zero) { Console.WriteLine("ERROR:no foreground window"); return; }
        Console.WriteLine(WindowJson(hwnd, true));
    }

    static void Focus(long hwnd) {
        if (!SetForegroundWindow(new IntPtr(hwnd))) { Console.WriteLine("ERROR:SetForegroundWindow failed"); return; }
        Console.WriteLine("OK:focused");
    }

    static CacheRequest BuildCache() {
        var cache = new CacheRequest();
        cache.TreeScope = TreeScope.Element | TreeScope.Subtree;
        AutomationProperty[] props = {
            AutomationElement.ControlTypeProperty,
            AutomationElement.NameProperty,
            AutomationElement.BoundingRectangleProperty,
            AutomationElement.IsEnabledProperty,
            AutomationElement.HasKeyboardFocusProperty,
            AutomationElement.IsKeyboardFocusableProperty,
            AutomationElement.IsOffscreenProperty,
            AutomationElement.AutomationIdProperty,
            AutomationElement.ClassNameProperty,
            AutomationElement.HelpTextProperty,
            AutomationElement.OrientationProperty,
            AutomationElement.IsRequiredForFormProperty,
            AutomationElement.IsInvokePatternAvailableProperty,
            AutomationElement.IsTogglePatternAvailableProperty,
            AutomationElement.IsExpandCollapsePatternAvailableProperty,
            AutomationElement.IsValuePatternAvailableProperty,
            AutomationElement.IsSelectionItemPatternAvailableProperty,
            AutomationElement.IsScrollPatternAvailableProperty,
            AutomationElement.IsRangeValuePatternAvailableProperty,
            TogglePattern.ToggleStateProperty,
            ExpandCollapsePattern.ExpandCollapseStateProperty,
            SelectionItemPattern.IsSelectedProperty,
            ValuePattern.IsReadOnlyProperty,
            ValuePattern.ValueProperty,
            RangeValuePattern.MinimumProperty,
            RangeValuePattern.MaximumProperty,
            RangeValuePattern.ValueProperty,
            WindowPattern.IsModalProperty,
            AutomationElement.AriaRoleProperty,
            AutomationElement.AriaPropertiesProperty,
        };
        foreach (var p in props) cache.Add(p);
        return cache;
    }

    static AutomationElement RootFor(long hwnd, CacheRequest cache) {
        using (cache.Activate()) {
            return hwnd == 0
                ? AutomationElement.RootElement.GetUpdatedCache(cache)
                : AutomationElement.FromHandle(new IntPtr(hwnd)).GetUpdatedCache(cache);
        }
    }

    static void Tree(long hwnd, int maxDepth) {
        var cache = BuildCache();
        var root = RootFor(hwnd, cache);
        var sb = new StringBuilder("[");
        bool first = true;
        Walk(root, 0, maxDepth, sb, ref first);
        sb.Append("]");
        Console.WriteLine(sb.ToString());
    }

    static void Walk(AutomationElement el, int depth, int maxDepth, StringBuilder sb, ref bool first) {
        if (maxDepth > 0 && depth > maxDepth) return;
        if (!first) sb.Append(",");
        first = false;
        Emit(el, depth, sb);
        var children = el.CachedChildren;
        for (int i = 0; i < children.Count; i++) Walk(children[i], depth + 1, maxDepth, sb, ref first);
    }

    static object Cached(AutomationElement el, AutomationProperty p) {
        return el.GetCachedPropertyValue(p, true);
    }

    static bool CachedBool(AutomationElement el, AutomationProperty p) {
        var v = Cached(el, p);
        return v != AutomationElement.NotSupported && v is bool && (bool)v;
    }

    static void Emit(AutomationElement el, int depth, StringBuilder sb) {
        var ct = (ControlType)el.GetCachedPropertyValue(AutomationElement.ControlTypeProperty);
        sb.Append("{\"depth\":").Append(depth);
        sb.Append(",\"controlType\":").Append(ct.Id);
        sb.Append(",\"name\":").Append(Quote(el.Cached.Name ?? ""));
        sb.Append(",\"automationId\":").Append(Quote(el.Cached.AutomationId ?? ""));
        sb.Append(",\"className\":").Append(Quote(el.Cached.ClassName ?? ""));
        sb.Append(",\"helpText\":").Append(Quote(el.Cached.HelpText ?? ""));
        var rect = el.Cached.BoundingRectangle;
        if (!rect.IsEmpty && !double.IsInfinity(rect.Width))
            sb.Append(",\"bounds\":[").Append((long)rect.X).Append(",").Append((long)rect.Y)
              .Append(",").Append((long)rect.Width).Append(",").Append((long)rect.Height).Append("]");
        sb.Append(",\"isEnabled\":").Append(el.Cached.IsEnabled ? "true" : "false");
        sb.Append(",\"hasKeyboardFocus\":").Append(el.Cached.HasKeyboardFocus ? "true" : "false");
        sb.Append(",\"isKeyboardFocusable\":").Append(el.Cached.IsKeyboardFocusable ? "true" : "false");
        sb.Append(",\"isOffscreen\":").Append(el.Cached.IsOffscreen ? "true" : "false");
        sb.Append(",\"orientation\":").Append((int)el.Cached.Orientation);
        sb.Append(",\"isRequired\":").Append(el.Cached.IsRequiredForForm ? "true" : "false");
        sb.Append(",\"hasInvoke\":").Append(CachedBool(el, AutomationElement.IsInvokePatternAvailableProperty) ? "true" : "false");
        sb.Append(",\"hasToggle\":").Append(CachedBool(el, AutomationElement.IsTogglePatternAvailableProperty) ? "true" : "false");
        sb.Append(",\"hasExpandCollapse\":").Append(CachedBool(el, AutomationElement.IsExpandCollapsePatternAvailableProperty) ? "true" : "false");
        sb.Append(",\"hasValue\":").Append(CachedBool(el, AutomationElement.IsValuePatternAvailableProperty) ? "true" : "false");
        sb.Append(",\"hasSelectionItem\":").Append(CachedBool(el, AutomationElement.IsSelectionItemPatternAvailableProperty) ? "true" : "false");
        sb.Append(",\"hasScroll\":").Append(CachedBool(el, AutomationElement.IsScrollPatternAvailableProperty) ? "true" : "false");
        sb.Append(",\"hasRangeValue\":").Append(CachedBool(el, AutomationElement.IsRangeValuePatternAvailableProperty) ? "true" : "false");
        var toggle = Cached(el, TogglePattern.ToggleStateProperty);
        if (toggle != AutomationElement.NotSupported && toggle != null) sb.Append(",\"toggleState\":").Append((int)(ToggleState)toggle);
        var expand = Cached(el, ExpandCollapsePattern.ExpandCollapseStateProperty);
        if (expand != AutomationElement.NotSupported && expand != null) sb.Append(",\"expandState\":").Append((int)(ExpandCollapseState)expand);
        var selected = Cached(el, SelectionItemPattern.IsSelectedProperty);
        if (selected != AutomationElement.NotSupported && selected is bool) sb.Append(",\"isSelected\":").Append((bool)selected ? "true" : "false");
        var ro = Cached(el, ValuePattern.IsReadOnlyProperty);
        if (ro != AutomationElement.NotSupported && ro is bool) sb.Append(",\"isReadonly\":").Append((bool)ro ? "true" : "false");
        var val = Cached(el, ValuePattern.ValueProperty);
        if (val != AutomationElement.NotSupported && val is string) sb.Append(",\"value\":").Append(Quote((string)val));
        var min = Cached(el, RangeValuePattern.MinimumProperty);
        if (min != AutomationElement.NotSupported && min is double) sb.Append(",\"rangeMin\":").Append(((double)min).ToString(System.Globalization.CultureInfo.InvariantCulture));
        var max = Cached(el, RangeValuePattern.MaximumProperty);
        if (max != AutomationElement.NotSupported && max is double) sb.Append(",\"rangeMax\":").Append(((double)max).ToString(System.Globalization.CultureInfo.InvariantCulture));
        var rv = Cached(el, RangeValuePattern.ValueProperty);
        if (rv != AutomationElement.NotSupported && rv is double) sb.Append(",\"rangeValue\":").Append(((double)rv).ToString(System.Globalization.CultureInfo.InvariantCulture));
        var modal = Cached(el, WindowPattern.IsModalProperty);
        if (modal != AutomationElement.NotSupported && modal is bool && (bool)modal) sb.Append(",\"isModal\":true");
        sb.Append(",\"ariaRole\":").Append(Quote((Cached(el, AutomationElement.AriaRoleProperty) as string) ?? ""));
        sb.Append(",\"ariaProperties\":").Append(Quote((Cached(el, AutomationElement.AriaPropertiesProperty) as string) ?? ""));
        sb.Append("}");
    }

    static AutomationElement NodeAt(long hwnd, int index) {
        var cache = BuildCache();
        var root = RootFor(hwnd, cache);
        int seen = 0;
        var found = Find(root, index, ref seen);
        if (found == null) throw new ElementNotAvailableException("node index " + index + " not found");
        return found;
    }

    static AutomationElement Find(AutomationElement el, int index, ref int seen) {
        if (seen == index) return el;
        seen++;
        var children = el.CachedChildren;
        for (int i = 0; i < children.Count; i++) {
            var hit = Find(children[i], index, ref seen);
            if (hit != null) return hit;
        }
        return null;
    }

    static void DoAction(string[] args) {
        long hwnd = long.Parse(args[1]);
        int index = int.Parse(args[2]);
        string action = args[3];
        string value = args.Length > 4 ? args[4] : "";
        var el = NodeAt(hwnd, index);
        object pattern;
        switch (action) {
            case "click":
                if (el.TryGetCurrentPattern(InvokePattern.Pattern, out pattern)) { ((InvokePattern)pattern).Invoke(); Console.WriteLine("OK:clicked"); return; }
                EmitBoundsOrFallback(el); return;
            case "toggle":
                if (el.TryGetCurrentPattern(TogglePattern.Pattern, out pattern)) { ((TogglePattern)pattern).Toggle(); Console.WriteLine("OK:toggled"); return; }
                Console.WriteLine("ERROR:no toggle pattern"); return;
            case "expand":
                if (el.TryGetCurrentPattern(ExpandCollapsePattern.Pattern, out pattern)) { ((ExpandCollapsePattern)pattern).Expand(); Console.WriteLine("OK:expanded"); return; }
                Console.WriteLine("ERROR:no expandcollapse pattern"); return;
            case "collapse":
                if (el.TryGetCurrentPattern(ExpandCollapsePattern.Pattern, out pattern)) { ((ExpandCollapsePattern)pattern).Collapse(); Console.WriteLine("OK:collapsed"); return; }
                Console.WriteLine("ERROR:no expandcollapse pattern"); return;
            case "select":
                if (el.TryGetCurrentPattern(SelectionItemPattern.Pattern, out pattern)) { ((SelectionItemPattern)pattern).Select(); Console.WriteLine("OK:selected"); return; }
                EmitBoundsOrFallback(el); return;
            case "type":
            case "setvalue":
                if (el.TryGetCurrentPattern(ValuePattern.Pattern, out pattern)) { ((ValuePattern)pattern).SetValue(value); Console.WriteLine("OK:value set"); return; }
                el.SetFocus(); SendKeys.SendWait(EscapeSendKeys(value)); Console.WriteLine("OK:typed"); return;
            case "increment":
            case "decrement":
                if (el.TryGetCurrentPattern(RangeValuePattern.Pattern, out pattern)) {
                    var range = (RangeValuePattern)pattern;
                    double step = range.Current.SmallChange > 0 ? range.Current.SmallChange : 1;
                    range.SetValue(range.Current.Value + (action == "increment" ? step : -step));
                    Console.WriteLine("OK:" + action); return;
                }
                Console.WriteLine("ERROR:no rangevalue pattern"); return;
            case "scroll":
                Scroll(el, args.Length > 4 ? args[args.Length - 1] : "down"); return;
            case "focus":
                el.SetFocus(); Console.WriteLine("OK:focused"); return;
            case "dismiss":
                SendKeys.SendWait("{ESC}"); Console.WriteLine("OK:dismissed"); return;
            case "doubleclick":
            case "rightclick":
            case "longpress":
                EmitBoundsOrFallback(el); return;
            default:
                Console.WriteLine("ERROR:unsupported action " + action); return;
        }
    }

    static void Scroll(AutomationElement el, string direction) {
        object pattern;
        if (el.TryGetCurrentPattern(ScrollPattern.Pattern, out pattern)) {
            var scroll = (ScrollPattern)pattern;
            switch (direction) {
                case "up": scroll.Scroll(ScrollAmount.NoAmount, ScrollAmount.LargeDecrement); break;
                case "down": scroll.Scroll(ScrollAmount.NoAmount, ScrollAmount.LargeIncrement); break;
                case "left": scroll.Scroll(ScrollAmount.LargeDecrement, ScrollAmount.NoAmount); break;
                default: scroll.Scroll(ScrollAmount.LargeIncrement, ScrollAmount.NoAmount); break;
            }
            Console.WriteLine("OK:scrolled"); return;
        }
        var r = el.Current.BoundingRectangle;
        SetCursorPos((int)(r.X + r.Width / 2), (int)(r.Y + r.Height / 2));
        uint flags = (direction == "left" || direction == "right") ? HWHEEL : WHEEL;
        int delta = (direction == "down" || direction == "right") ? -360 : 360;
        mouse_event(flags, 0, 0, unchecked((uint)delta), UIntPtr.Zero);
        Console.WriteLine("OK:scrolled");
    }

    static void EmitBoundsOrFallback(AutomationElement el) {
        var r = el.Current.BoundingRectangle;
        if (!r.IsEmpty && r.Width > 0 && r.Height > 0) {
            Console.WriteLine("BOUNDS:" + (int)(r.X + r.Width / 2) + "," + (int)(r.Y + r.Height / 2));
        } else {
            Console.WriteLine("FALLBACK:focus+enter");
        }
    }

    static void Click(string[] args) {
        int x = int.Parse(args[1]), y = int.Parse(args[2]);
        bool right = args.Length > 3 && args[3] == "right";
        int count = args.Length > 4 ? int.Parse(args[4]) : 1;
        SetCursorPos(x, y);
        for (int i = 0; i < count; i++) {
            mouse_event(right ? RIGHTDOWN : LEFTDOWN, 0, 0, 0, UIntPtr.Zero);
            mouse_event(right ? RIGHTUP : LEFTUP, 0, 0, 0, UIntPtr.Zero);
            if (count > 1) System.Threading.Thread.Sleep(120);
        }
        Console.WriteLine("OK:clicked at " + x + "," + y);
    }

    static void Keys(string modifiers, string keys) {
        var mods = modifiers.Length > 0 ? modifiers.Split(',') : new string[0];
        var keyNames = keys.Length > 0 ? keys.Split(',') : new string[0];
        bool meta = Array.IndexOf(mods, "meta") >= 0;
        if (meta) {
            // SendKeys has no Windows-key syntax; synthesize the chord.
            keybd_event(0x5B, 0, 0, UIntPtr.Zero);
            foreach (var k in keyNames) { byte vk = VkFor(k); keybd_event(vk, 0, 0, UIntPtr.Zero); keybd_event(vk, 0, KEYUP, UIntPtr.Zero); }
            keybd_event(0x5B, 0, KEYUP, UIntPtr.Zero);
        } else {
            var sb = new StringBuilder();
            foreach (var m in mods) sb.Append(m == "ctrl" ? "^" : m == "alt" ? "%" : m == "shift" ? "+" : "");
            foreach (var k in keyNames) sb.Append(SendKeysFor(k));
            SendKeys.SendWait(sb.ToString());
        }
        Console.WriteLine("OK:keys sent");
    }

    static string SendKeysFor(string key) {
        switch (key) {
            case "enter": return "{ENTER}";
            case "escape": return "{ESC}";
            case "tab": return "{TAB}";
            case "delete": return "{DEL}";
            case "backspace": return "{BS}";
            case "space": return " ";
            case "up": return "{UP}"; case "down": return "{DOWN}";
            case "left": return "{LEFT}"; case "right": return "{RIGHT}";
            case "home": return "{HOME}"; case "end": return "{END}";
            case "pageup": return "{PGUP}"; case "pagedown": return "{PGDN}";
            default:
                if (key.Length > 1 && key[0] == 'f') return "{" + key.ToUpper() + "}";
                return EscapeSendKeys(key);
        }
    }

    static byte VkFor(string key) {
        if (key.Length == 1) {
            char c = char.ToUpper(key[0]);
            return (byte)c;
        }
        switch (key) {
            case "enter": return 0x0D; case "escape": return 0x1B; case "tab": return 0x09;
            case "up": return 0x26; case "down": return 0x28; case "left": return 0x25; case "right": return 0x27;
            default: return 0;
        }
    }

    static string EscapeSendKeys(string s) {
        var sb = new StringBuilder();
        foreach (var c in s) {
            if ("+^%~(){}[]".IndexOf(c) >= 0) sb.Append('{').Append(c).Append('}');
            else sb.Append(c);
        }
        return sb.ToString();
    }

    static string Quote(string s) {
        var sb = new StringBuilder("\"");
        foreach (var c in s) {
            switch (c) {
                case '"': sb.Append("\\\""); break;
                case '\\': sb.Append("\\\\"); break;
                case '\n': sb.Append("\\n"); break;
                case '\r': sb.Append("\\r"); break;
                case '\t': sb.Append("\\t"); break;
                default:
                    if (c < ' ') sb.Append("\\u").Append(((int)c).ToString("x4"));
                    else sb.Append(c);
                    break;
            }
        }
        sb.Append("\"");
        return sb.ToString();
    }
}
}
"#;
