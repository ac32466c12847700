//! macOS adapter: AXUIElement through a compiled Swift helper (lazy,
//! cached, crash-safe install; see [`helpers::ensure_compiled`]), with
//! `osascript -l JavaScript` for the near-instant window listing and app
//! activation. Native references are `{pid, child-index path}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;

use crate::action::KeyCombo;
use crate::error::{CupError, Result};
use crate::model::{Bounds, Platform, ScreenInfo, WindowInfo};

use super::helpers::{self, run_for_stdout};
use super::{
    ActionInvocation, AxRaw, CaptureOutput, NativeRef, PlatformAdapter, RawAttrs, RawNode,
    ScrollDirection, WindowHandle, WindowMetadata, CAPTURE_TIMEOUT_SECS, SUBPROCESS_TIMEOUT_SECS,
};

const HELPER_NAME: &str = "cup-ax-helper";

pub struct MacosAdapter {
    helper: tokio::sync::OnceCell<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HelperWindow {
    pid: i32,
    index: u32,
    title: String,
    #[serde(default)]
    bundle_id: Option<String>,
    #[serde(default)]
    focused: bool,
    #[serde(default)]
    bounds: Option<[f64; 4]>,
}

#[derive(Debug, Deserialize)]
struct HelperScreen {
    w: i32,
    h: i32,
    scale: f64,
}

impl MacosAdapter {
    pub fn new() -> Self {
        Self {
            helper: tokio::sync::OnceCell::new(),
        }
    }

    async fn helper_path(&self) -> Result<&PathBuf> {
        self.helper
            .get_or_try_init(|| async {
                helpers::ensure_compiled(HELPER_NAME, AX_HELPER_SOURCE, ".swift", |src, out| {
                    let mut cmd = Command::new("swiftc");
                    cmd.arg("-O").arg("-o").arg(out).arg(src);
                    cmd
                })
                .await
                .map_err(|err| match err {
                    CupError::PlatformUnavailable(_) => {
                        CupError::PlatformUnavailable("swiftc".to_string())
                    }
                    other => other,
                })
            })
            .await
    }

    async fn run_helper(&self, args: &[&str], timeout_secs: u64) -> Result<String> {
        let path = self.helper_path().await?;
        let mut cmd = Command::new(path);
        cmd.args(args);
        run_for_stdout(cmd, timeout_secs, "ax helper").await.map_err(|err| {
            if let CupError::PlatformFailure(msg) = &err {
                let lower = msg.to_lowercase();
                if lower.contains("not trusted") || lower.contains("permission") {
                    return CupError::PlatformPermission(
                        "macOS Accessibility permission (System Settings > Privacy & Security)"
                            .to_string(),
                    );
                }
                if lower.contains("invalid element") || lower.contains("stale") {
                    return CupError::StaleSnapshot(msg.clone());
                }
            }
            err
        })
    }

    async fn osascript(&self, program: &str) -> Result<String> {
        let mut cmd = Command::new("osascript");
        cmd.args(["-l", "JavaScript", "-e", program]);
        run_for_stdout(cmd, SUBPROCESS_TIMEOUT_SECS, "osascript").await
    }

    async fn helper_windows(&self) -> Result<Vec<HelperWindow>> {
        let out = self.run_helper(&["windows"], SUBPROCESS_TIMEOUT_SECS).await?;
        serde_json::from_str(&out)
            .map_err(|e| CupError::PlatformFailure(format!("helper windows payload: {}", e)))
    }

    fn window_meta(w: HelperWindow) -> WindowMetadata {
        WindowMetadata {
            handle: WindowHandle::AxWindow {
                pid: w.pid,
                index: w.index,
            },
            title: w.title,
            pid: Some(w.pid as u32),
            bundle_id: w.bundle_id,
            url: None,
        }
    }

    fn path_arg(path: &[u32]) -> String {
        path.iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl Default for MacosAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformAdapter for MacosAdapter {
    fn platform(&self) -> Platform {
        Platform::Macos
    }

    async fn initialize(&self) -> Result<()> {
        let out = self
            .run_helper(&["permission"], SUBPROCESS_TIMEOUT_SECS)
            .await?;
        if out.trim() != "ok" {
            return Err(CupError::PlatformPermission(
                "macOS Accessibility permission (System Settings > Privacy & Security)".to_string(),
            ));
        }
        Ok(())
    }

    async fn screen_info(&self) -> Result<ScreenInfo> {
        let out = self.run_helper(&["screen"], SUBPROCESS_TIMEOUT_SECS).await?;
        let screen: HelperScreen = serde_json::from_str(&out)
            .map_err(|e| CupError::PlatformFailure(format!("helper screen payload: {}", e)))?;
        Ok(ScreenInfo::new(screen.w, screen.h, screen.scale))
    }

    async fn foreground_window(&self) -> Result<WindowMetadata> {
        let out = self
            .run_helper(&["foreground"], SUBPROCESS_TIMEOUT_SECS)
            .await?;
        let window: HelperWindow = serde_json::from_str(&out)
            .map_err(|e| CupError::PlatformFailure(format!("helper window payload: {}", e)))?;
        Ok(Self::window_meta(window))
    }

    async fn all_windows(&self) -> Result<Vec<WindowMetadata>> {
        Ok(self
            .helper_windows()
            .await?
            .into_iter()
            .map(Self::window_meta)
            .collect())
    }

    async fn window_list(&self) -> Result<Vec<WindowInfo>> {
        // System Events answers this without touching any AX tree.
        let script = r#"
            const se = Application('System Events');
            const out = [];
            se.processes.whose({visible: true})().forEach(p => {
                const front = p.frontmost();
                p.windows().forEach(w => {
                    out.push({title: w.name() || '', pid: p.unixId(), foreground: front});
                });
            });
            JSON.stringify(out);
        "#;
        let out = self.osascript(script).await?;

        #[derive(Deserialize)]
        struct Entry {
            title: String,
            pid: u32,
            foreground: bool,
        }
        let entries: Vec<Entry> = serde_json::from_str(out.trim())
            .map_err(|e| CupError::PlatformFailure(format!("osascript window list: {}", e)))?;
        Ok(entries
            .into_iter()
            .map(|e| WindowInfo {
                title: e.title,
                pid: Some(e.pid),
                bundle_id: None,
                foreground: Some(e.foreground).filter(|f| *f),
                bounds: None,
                url: None,
            })
            .collect())
    }

    async fn capture_tree(
        &self,
        windows: &[WindowMetadata],
        max_depth: u32,
    ) -> Result<CaptureOutput> {
        let screen = self.screen_info().await?.bounds();
        let mut merged = CaptureOutput::default();

        for window in windows {
            let (pid, index) = match window.handle {
                WindowHandle::AxWindow { pid, index } => (pid, index),
                _ => continue,
            };
            let out = match self
                .run_helper(
                    &[
                        "tree",
                        &pid.to_string(),
                        &index.to_string(),
                        &max_depth.to_string(),
                    ],
                    CAPTURE_TIMEOUT_SECS,
                )
                .await
            {
                Ok(out) => out,
                Err(err) => {
                    tracing::warn!(window = %window.title, error = %err, "window capture failed");
                    continue;
                }
            };
            let parsed: Vec<AxRaw> = match serde_json::from_str(&out) {
                Ok(parsed) => parsed,
                Err(err) => {
                    tracing::warn!(window = %window.title, error = %err, "helper tree payload unreadable");
                    continue;
                }
            };

            for mut raw in parsed {
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
                merged.stats.record(raw.depth, raw.role.clone());
                merged.nodes.push(RawNode {
                    depth: raw.depth,
                    native: NativeRef::Ax {
                        pid,
                        path: raw.path.clone(),
                    },
                    offscreen_by_screen,
                    attrs: RawAttrs::Ax(raw),
                });
            }
        }
        Ok(merged)
    }

    async fn focus_window(&self, window: &WindowMetadata) -> Result<()> {
        let pid = match window.handle {
            WindowHandle::AxWindow { pid, .. } => pid,
            _ => return Err(CupError::InvalidParams("not an AX handle".to_string())),
        };
        let script = format!(
            "const app = Application.currentApplication(); app.includeStandardAdditions = true; \
             const se = Application('System Events'); \
             se.processes.whose({{unixId: {}}})()[0].frontmost = true; 'ok';",
            pid
        );
        self.osascript(&script).await?;
        Ok(())
    }

    async fn perform(&self, target: &NativeRef, invocation: &ActionInvocation) -> Result<String> {
        let (pid, path) = match target {
            NativeRef::Ax { pid, path } => (*pid, path),
            other => {
                return Err(CupError::InvalidParams(format!(
                    "not an AX reference: {:?}",
                    other
                )))
            }
        };
        let path_arg = Self::path_arg(path);
        let pid_arg = pid.to_string();
        let value = invocation.value.clone();

        let mut args: Vec<&str> = vec!["action", &pid_arg, &path_arg, invocation.action.as_str()];
        if let Some(v) = &value {
            args.push(v);
        }
        if let Some(direction) = invocation.direction {
            args.push(match direction {
                ScrollDirection::Up => "up",
                ScrollDirection::Down => "down",
                ScrollDirection::Left => "left",
                ScrollDirection::Right => "right",
            });
        }

        let out = self.run_helper(&args, SUBPROCESS_TIMEOUT_SECS).await?;
        if out.trim() == "ok" {
            Ok(crate::action::success_message(invocation))
        } else {
            Err(CupError::PlatformFailure(out))
        }
    }

    async fn press_keys(&self, combo: &KeyCombo) -> Result<()> {
        let modifiers = combo.modifiers.join(",");
        let keys = combo.keys.join(",");
        let out = self
            .run_helper(&["keys", &modifiers, &keys], SUBPROCESS_TIMEOUT_SECS)
            .await?;
        if out.trim() == "ok" {
            Ok(())
        } else {
            Err(CupError::PlatformFailure(out))
        }
    }
}

/// The Swift helper compiled on first use. Walks with the batch attribute
/// API (`AXUIElementCopyMultipleAttributeValues`), one call per element, and
/// resolves action targets by child-index path from the application element.
/// Protocol: positional `(command, args...)`, one `ok` line or JSON on
/// stdout, errors on stderr with exit 1.
const AX_HELPER_SOURCE: &str = r#"
import AppKit
import ApplicationServices
import Foundation

func fail(_ message: String) -> Never {
    FileHandle.standardError.write((message + "\n").data(using: .utf8)!)
    exit(1)
}

func jsonString(_ s: String) -> String {
    let data = try! JSONSerialization.data(withJSONObject: [s])
    let text = String(data: data, encoding: .utf8)!
    return String(text.dropFirst().dropLast())
}

let batchAttributes: [String] = [
    kAXRoleAttribute as String, kAXSubroleAttribute as String,
    kAXTitleAttribute as String, kAXDescriptionAttribute as String,
    kAXHelpAttribute as String, kAXIdentifierAttribute as String,
    kAXValueAttribute as String, kAXEnabledAttribute as String,
    kAXFocusedAttribute as String, kAXSelectedAttribute as String,
    kAXExpandedAttribute as String, kAXModalAttribute as String,
    "AXRequired", "AXElementBusy",
    kAXPositionAttribute as String, kAXSizeAttribute as String,
    "AXEditableAncestor", kAXChildrenAttribute as String,
]

struct Fetched {
    var role = ""; var subrole = ""; var title = ""; var desc = ""
    var help = ""; var identifier = ""; var value: String? = nil
    var enabled = true; var focused = false; var selected = false
    var expanded: Bool? = nil; var modal = false; var required = false
    var busy = false; var editable = false
    var bounds: (Double, Double, Double, Double)? = nil
    var children: [AXUIElement] = []
}

func fetch(_ element: AXUIElement) -> Fetched {
    var out = Fetched()
    var values: CFArray?
    let status = AXUIElementCopyMultipleAttributeValues(
        element, batchAttributes as CFArray, AXCopyMultipleAttributeOptions(), &values)
    guard status == .success, let list = values as? [AnyObject] else { return out }

    func str(_ i: Int) -> String { (list[i] as? String) ?? "" }
    func boolAt(_ i: Int) -> Bool { (list[i] as? Bool) ?? false }

    out.role = str(0); out.subrole = str(1); out.title = str(2)
    out.desc = str(3); out.help = str(4); out.identifier = str(5)
    if let v = list[6] as? String { out.value = v }
    else if let n = list[6] as? NSNumber { out.value = n.stringValue }
    out.enabled = (list[7] as? Bool) ?? true
    out.focused = boolAt(8); out.selected = boolAt(9)
    if let e = list[10] as? Bool { out.expanded = e }
    out.modal = boolAt(11); out.required = boolAt(12); out.busy = boolAt(13)
    var point = CGPoint.zero; var size = CGSize.zero
    if let pv = list[14] as! AXValue?, AXValueGetType(pv) == .cgPoint {
        AXValueGetValue(pv, .cgPoint, &point)
    }
    if let sv = list[15] as! AXValue?, AXValueGetType(sv) == .cgSize {
        AXValueGetValue(sv, .cgSize, &size)
        out.bounds = (Double(point.x), Double(point.y), Double(size.width), Double(size.height))
    }
    out.editable = list[16] is AXUIElement
    if let kids = list[17] as? [AXUIElement] { out.children = kids }
    return out
}

func actionNames(_ element: AXUIElement) -> [String] {
    var names: CFArray?
    guard AXUIElementCopyActionNames(element, &names) == .success,
          let list = names as? [String] else { return [] }
    // Universal noise: present on nearly every element, useful on none.
    return list.filter { $0 != "AXScrollToVisible" && $0 != "AXShowMenu" }
}

func emit(_ f: Fetched, depth: UInt32, path: [UInt32], actions: [String], into out: inout [String]) {
    var fields = [
        "\"depth\":\(depth)",
        "\"role\":\(jsonString(f.role))",
        "\"subrole\":\(jsonString(f.subrole))",
        "\"title\":\(jsonString(f.title))",
        "\"description\":\(jsonString(f.desc))",
        "\"help\":\(jsonString(f.help))",
        "\"identifier\":\(jsonString(f.identifier))",
        "\"enabled\":\(f.enabled)",
        "\"focused\":\(f.focused)",
        "\"selected\":\(f.selected)",
        "\"modal\":\(f.modal)",
        "\"required\":\(f.required)",
        "\"busy\":\(f.busy)",
        "\"editable\":\(f.editable)",
        "\"actions\":[\(actions.map(jsonString).joined(separator: ","))]",
        "\"path\":[\(path.map(String.init).joined(separator: ","))]",
    ]
    if let v = f.value { fields.append("\"value\":\(jsonString(v))") }
    if let e = f.expanded { fields.append("\"expanded\":\(e)") }
    if let b = f.bounds {
        fields.append("\"bounds\":[\(Int(b.0)),\(Int(b.1)),\(Int(b.2)),\(Int(b.3))]")
    }
    out.append("{" + fields.joined(separator: ",") + "}")
}

func walk(_ element: AXUIElement, depth: UInt32, maxDepth: UInt32, path: [UInt32], into out: inout [String]) {
    if maxDepth > 0 && depth > maxDepth { return }
    let f = fetch(element)
    emit(f, depth: depth, path: path, actions: actionNames(element), into: &out)
    for (i, child) in f.children.enumerated() {
        walk(child, depth: depth + 1, maxDepth: maxDepth, path: path + [UInt32(i)], into: &out)
    }
}

func appElement(_ pid: Int32) -> AXUIElement { AXUIElementCreateApplication(pid) }

func windowsOf(_ pid: Int32) -> [AXUIElement] {
    var value: AnyObject?
    let app = appElement(pid)
    if AXUIElementCopyAttributeValue(app, kAXWindowsAttribute as CFString, &value) == .success,
       let windows = value as? [AXUIElement], !windows.isEmpty {
        return windows
    }
    // Fall back to focused, then main, then first child window.
    for attr in [kAXFocusedWindowAttribute, kAXMainWindowAttribute] {
        var w: AnyObject?
        if AXUIElementCopyAttributeValue(app, attr as CFString, &w) == .success, w != nil {
            return [w as! AXUIElement]
        }
    }
    return []
}

// The first path segment indexes into the window list, the rest into
// AXChildren, mirroring how the walk assigns paths.
func resolve(_ pid: Int32, _ path: [UInt32]) -> AXUIElement {
    guard let first = path.first else { return appElement(pid) }
    let windows = windowsOf(pid)
    guard Int(first) < windows.count else { fail("stale: window index out of range") }
    var element = windows[Int(first)]
    for index in path.dropFirst() {
        let f = fetch(element)
        guard Int(index) < f.children.count else { fail("stale: child path no longer valid") }
        element = f.children[Int(index)]
    }
    return element
}

func keyCode(_ name: String) -> CGKeyCode? {
    let map: [String: CGKeyCode] = [
        "a": 0, "b": 11, "c": 8, "d": 2, "e": 14, "f": 3, "g": 5, "h": 4, "i": 34,
        "j": 38, "k": 40, "l": 37, "m": 46, "n": 45, "o": 31, "p": 35, "q": 12,
        "r": 15, "s": 1, "t": 17, "u": 32, "v": 9, "w": 13, "x": 7, "y": 16, "z": 6,
        "0": 29, "1": 18, "2": 19, "3": 20, "4": 21, "5": 23, "6": 22, "7": 26,
        "8": 28, "9": 25,
        "enter": 36, "tab": 48, "space": 49, "escape": 53, "backspace": 51,
        "delete": 117, "home": 115, "end": 119, "pageup": 116, "pagedown": 121,
        "up": 126, "down": 125, "left": 123, "right": 124,
        "f1": 122, "f2": 120, "f3": 99, "f4": 118, "f5": 96, "f6": 97, "f7": 98,
        "f8": 100, "f9": 101, "f10": 109, "f11": 103, "f12": 111,
        "ctrl": 59, "alt": 58, "shift": 56, "meta": 55,
    ]
    return map[name]
}

func pressKeys(_ modifiers: [String], _ keys: [String]) {
    var flags = CGEventFlags()
    for m in modifiers {
        switch m {
        case "ctrl": flags.insert(.maskControl)
        case "alt": flags.insert(.maskAlternate)
        case "shift": flags.insert(.maskShift)
        case "meta": flags.insert(.maskCommand)
        default: break
        }
    }
    for key in keys {
        guard let code = keyCode(key) else { fail("unknown key: " + key) }
        let down = CGEvent(keyboardEventSource: nil, virtualKey: code, keyDown: true)
        let up = CGEvent(keyboardEventSource: nil, virtualKey: code, keyDown: false)
        down?.flags = flags; up?.flags = flags
        down?.post(tap: .cghidEventTap)
        usleep(20_000)
        up?.post(tap: .cghidEventTap)
    }
}

let args = CommandLine.arguments
guard args.count > 1 else { fail("usage: cup-ax-helper <command> [args...]") }

switch args[1] {
case "version":
    print("ok")
case "permission":
    print(AXIsProcessTrusted() ? "ok" : "denied")
case "screen":
    guard let screen = NSScreen.main else { fail("no main screen") }
    let f = screen.frame
    print("{\"w\":\(Int(f.width)),\"h\":\(Int(f.height)),\"scale\":\(screen.backingScaleFactor)}")
case "windows", "foreground":
    var rows: [String] = []
    let frontPid = NSWorkspace.shared.frontmostApplication?.processIdentifier ?? -1
    for app in NSWorkspace.shared.runningApplications where app.activationPolicy == .regular {
        let pid = app.processIdentifier
        for (i, window) in windowsOf(pid).enumerated() {
            let f = fetch(window)
            var fields = [
                "\"pid\":\(pid)", "\"index\":\(i)",
                "\"title\":\(jsonString(f.title))",
                "\"focused\":\(pid == frontPid && i == 0)",
            ]
            if let bid = app.bundleIdentifier { fields.append("\"bundleId\":\(jsonString(bid))") }
            if let b = f.bounds {
                fields.append("\"bounds\":[\(Int(b.0)),\(Int(b.1)),\(Int(b.2)),\(Int(b.3))]")
            }
            rows.append("{" + fields.joined(separator: ",") + "}")
        }
    }
    if args[1] == "foreground" {
        guard let front = rows.first(where: { $0.contains("\"focused\":true") }) ?? rows.first
        else { fail("no windows") }
        print(front)
    } else {
        print("[" + rows.joined(separator: ",") + "]")
    }
case "tree":
    guard args.count >= 5, let pid = Int32(args[2]), let index = Int(args[3]),
          let maxDepth = UInt32(args[4]) else { fail("usage: tree <pid> <window> <maxDepth>") }
    let windows = windowsOf(pid)
    guard index < windows.count else { fail("stale: window index out of range") }
    var out: [String] = []
    walk(windows[index], depth: 0, maxDepth: maxDepth, path: [UInt32(index)], into: &out)
    print("[" + out.joined(separator: ",") + "]")
case "action":
    guard args.count >= 5, let pid = Int32(args[2]) else { fail("usage: action <pid> <path> <name> [value]") }
    let path = args[3].split(separator: ".").compactMap { UInt32($0) }
    let element = resolve(pid, Array(path))
    let name = args[4]
    let value = args.count > 5 ? args[5] : ""
    switch name {
    case "click", "toggle", "expand", "collapse", "select":
        let available = actionNames(element)
        let pick = available.contains("AXPress") ? "AXPress"
            : available.contains("AXOpen") ? "AXOpen"
            : available.contains("AXConfirm") ? "AXConfirm" : nil
        guard let action = pick else { fail("element exposes no press action") }
        guard AXUIElementPerformAction(element, action as CFString) == .success else {
            fail("action \(action) failed")
        }
    case "type", "setvalue":
        guard AXUIElementSetAttributeValue(element, kAXValueAttribute as CFString, value as CFString) == .success else {
            fail("value not settable")
        }
    case "increment":
        guard AXUIElementPerformAction(element, kAXIncrementAction as CFString) == .success else { fail("increment failed") }
    case "decrement":
        guard AXUIElementPerformAction(element, kAXDecrementAction as CFString) == .success else { fail("decrement failed") }
    case "focus":
        _ = AXUIElementSetAttributeValue(element, kAXFocusedAttribute as CFString, kCFBooleanTrue)
    case "dismiss":
        pressKeys([], ["escape"])
    case "scroll":
        let direction = args.count > 5 ? args[5] : "down"
        let key = direction == "up" ? "pageup" : direction == "down" ? "pagedown"
            : direction == "left" ? "left" : "right"
        _ = AXUIElementSetAttributeValue(element, kAXFocusedAttribute as CFString, kCFBooleanTrue)
        pressKeys([], [key])
    case "doubleclick", "rightclick", "longpress":
        let f = fetch(element)
        guard let b = f.bounds else { fail("element reports no bounds") }
        let center = CGPoint(x: b.0 + b.2 / 2, y: b.1 + b.3 / 2)
        let button: CGMouseButton = name == "rightclick" ? .right : .left
        let downType: CGEventType = name == "rightclick" ? .rightMouseDown : .leftMouseDown
        let upType: CGEventType = name == "rightclick" ? .rightMouseUp : .leftMouseUp
        let clicks = name == "doubleclick" ? 2 : 1
        for i in 1...clicks {
            let down = CGEvent(mouseEventSource: nil, mouseType: downType, mouseCursorPosition: center, mouseButton: button)
            down?.setIntegerValueField(.mouseEventClickState, value: Int64(i))
            down?.post(tap: .cghidEventTap)
            if name == "longpress" { usleep(600_000) }
            let up = CGEvent(mouseEventSource: nil, mouseType: upType, mouseCursorPosition: center, mouseButton: button)
            up?.setIntegerValueField(.mouseEventClickState, value: Int64(i))
            up?.post(tap: .cghidEventTap)
        }
    default:
        fail("unsupported action: " + name)
    }
    print("ok")
case "keys":
    let modifiers = args.count > 2 && !args[2].isEmpty ? args[2].split(separator: ",").map(String.init) : []
    let keys = args.count > 3 && !args[3].isEmpty ? args[3].split(separator: ",").map(String.init) : []
    pressKeys(modifiers, keys)
    print("ok")
default:
    fail("unknown command: " + args[1])
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_arg_format() {
        assert_eq!(MacosAdapter::path_arg(&[0, 3, 12]), "0.3.12");
        assert_eq!(MacosAdapter::path_arg(&[]), "");
    }

    #[test]
    fn test_helper_window_payload() {
        let payload = r#"{"pid":501,"index":0,"title":"Untitled","bundleId":"com.apple.TextEdit","focused":true}"#;
        let window: HelperWindow = serde_json::from_str(payload).unwrap();
        assert_eq!(window.pid, 501);
        assert_eq!(window.bundle_id.as_deref(), Some("com.apple.TextEdit"));
        assert!(window.focused);
    }

    #[test]
    fn test_tree_payload_parses_into_ax_raw() {
        let payload = r#"[
            {"depth":0,"role":"AXWindow","subrole":"AXStandardWindow","title":"Doc",
             "description":"","help":"","identifier":"","enabled":true,"focused":false,
             "selected":false,"modal":false,"required":false,"busy":false,"editable":false,
             "actions":[],"path":[0],"bounds":[0,0,1024,768]},
            {"depth":1,"role":"AXButton","subrole":"","title":"OK","description":"",
             "help":"","identifier":"","enabled":true,"focused":false,"selected":false,
             "modal":false,"required":false,"busy":false,"editable":false,
             "actions":["AXPress"],"path":[0,0]}
        ]"#;
        let nodes: Vec<AxRaw> = serde_json::from_str(payload).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].role, "AXButton");
        assert_eq!(nodes[1].actions, vec!["AXPress"]);
        assert_eq!(nodes[1].path, vec![0, 0]);
    }
}
