//! Linux adapter: AT-SPI2 over the session D-Bus, one `gdbus call` per
//! property group, `xdotool` for raw input. Multi-window captures walk each
//! window in parallel and merge stats in input order.

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::process::Command;

use crate::action::KeyCombo;
use crate::error::{CupError, Result};
use crate::map::{has_bit, state_bits};
use crate::model::{Action, Bounds, Platform, ScreenInfo, WindowInfo};

use super::helpers::{run_command, run_for_stdout};
use super::{
    ActionInvocation, AtspiRaw, CaptureOutput, NativeRef, PlatformAdapter, RawAttrs,
    RawNode, ScrollDirection, WindowHandle, WindowMetadata, CAPTURE_TIMEOUT_SECS,
    SUBPROCESS_TIMEOUT_SECS,
};

const REGISTRY_BUS: &str = "org.a11y.atspi.Registry";
const ROOT_PATH: &str = "/org/a11y/atspi/accessible/root";

const IFACE_ACCESSIBLE: &str = "org.a11y.atspi.Accessible";
const IFACE_COMPONENT: &str = "org.a11y.atspi.Component";
const IFACE_ACTION: &str = "org.a11y.atspi.Action";
const IFACE_VALUE: &str = "org.a11y.atspi.Value";
const IFACE_TEXT: &str = "org.a11y.atspi.Text";
const IFACE_EDITABLE_TEXT: &str = "org.a11y.atspi.EditableText";
const IFACE_PROPERTIES: &str = "org.freedesktop.DBus.Properties";

pub struct LinuxAdapter;

impl LinuxAdapter {
    pub fn new() -> Self {
        Self
    }

    fn gdbus(&self, dest: &str, path: &str, method: &str, args: &[&str]) -> Command {
        let mut cmd = Command::new("gdbus");
        cmd.args(["call", "--session", "--dest", dest, "--object-path", path, "--method", method]);
        cmd.args(args);
        cmd
    }

    async fn call(
        &self,
        dest: &str,
        path: &str,
        method: &str,
        args: &[&str],
    ) -> Result<String> {
        let cmd = self.gdbus(dest, path, method, args);
        run_for_stdout(cmd, SUBPROCESS_TIMEOUT_SECS, "gdbus")
            .await
            .map_err(map_stale)
    }

    async fn get_property(&self, dest: &str, path: &str, iface: &str, name: &str) -> Result<String> {
        self.call(
            dest,
            path,
            &format!("{}.Get", IFACE_PROPERTIES),
            &[iface, name],
        )
        .await
    }

    async fn children_of(&self, dest: &str, path: &str) -> Result<Vec<(String, String)>> {
        let out = self
            .call(dest, path, &format!("{}.GetChildren", IFACE_ACCESSIBLE), &[])
            .await?;
        Ok(gvariant::parse_object_pairs(&out))
    }

    /// Fetch one node's property groups, issuing the D-Bus calls in parallel.
    async fn fetch_node(&self, dest: &str, path: &str) -> Result<AtspiRaw> {
        let role_name_method = format!("{}.GetRoleName", IFACE_ACCESSIBLE);
        let state_method = format!("{}.GetState", IFACE_ACCESSIBLE);
        let extents_method = format!("{}.GetExtents", IFACE_COMPONENT);
        let actions_method = format!("{}.GetActions", IFACE_ACTION);
        let attributes_method = format!("{}.GetAttributes", IFACE_ACCESSIBLE);
        let (role, name, description, state, extents, actions, attributes) = tokio::join!(
            self.call(dest, path, &role_name_method, &[]),
            self.get_property(dest, path, IFACE_ACCESSIBLE, "Name"),
            self.get_property(dest, path, IFACE_ACCESSIBLE, "Description"),
            self.call(dest, path, &state_method, &[]),
            self.call(dest, path, &extents_method, &["0"]),
            self.call(dest, path, &actions_method, &[]),
            self.call(dest, path, &attributes_method, &[]),
        );

        let role = gvariant::first_string(&role?)
            .map(|r| decode_role_name(&r))
            .unwrap_or_default();
        let state_bits = gvariant::parse_state_bits(&state.unwrap_or_default());

        let mut raw = AtspiRaw {
            role,
            name: name.ok().and_then(|s| gvariant::first_string(&s)).unwrap_or_default(),
            description: description
                .ok()
                .and_then(|s| gvariant::first_string(&s))
                .unwrap_or_default(),
            state_bits,
            bounds: extents.ok().and_then(|s| gvariant::parse_extents(&s)),
            actions: actions
                .ok()
                .map(|s| gvariant::parse_action_names(&s))
                .unwrap_or_default(),
            attributes: attributes
                .ok()
                .map(|s| gvariant::parse_dict(&s))
                .unwrap_or_default(),
            ..AtspiRaw::default()
        };

        // Interfaces worth a round-trip only for the roles that carry them.
        if matches!(
            raw.role.as_str(),
            "slider" | "progress-bar" | "spin-button" | "scroll-bar"
        ) {
            let (min, max, now) = tokio::join!(
                self.get_property(dest, path, IFACE_VALUE, "MinimumValue"),
                self.get_property(dest, path, IFACE_VALUE, "MaximumValue"),
                self.get_property(dest, path, IFACE_VALUE, "CurrentValue"),
            );
            raw.value_min = min.ok().and_then(|s| gvariant::first_number(&s));
            raw.value_max = max.ok().and_then(|s| gvariant::first_number(&s));
            raw.value_now = now.ok().and_then(|s| gvariant::first_number(&s));
        } else if matches!(raw.role.as_str(), "entry" | "text" | "password-text" | "terminal") {
            if let Ok(count) = self.get_property(dest, path, IFACE_TEXT, "CharacterCount").await {
                let count = gvariant::first_number(&count).unwrap_or(0.0) as i64;
                if count > 0 {
                    let text = self
                        .call(
                            dest,
                            path,
                            &format!("{}.GetText", IFACE_TEXT),
                            &["0", &count.to_string()],
                        )
                        .await;
                    raw.text = text.ok().and_then(|s| gvariant::first_string(&s));
                }
            }
        }

        Ok(raw)
    }

    /// Pre-order walk of one window, depth-annotated.
    async fn walk_window(
        &self,
        bus: &str,
        root_path: &str,
        max_depth: u32,
        screen: Bounds,
    ) -> Result<CaptureOutput> {
        let mut output = CaptureOutput::default();
        // Explicit stack; children pushed in reverse keep pre-order.
        let mut stack: Vec<(String, u32)> = vec![(root_path.to_string(), 0)];

        while let Some((path, depth)) = stack.pop() {
            if max_depth > 0 && depth > max_depth {
                continue;
            }
            let raw = match self.fetch_node(bus, &path).await {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::debug!(path = %path, error = %err, "node fetch failed, skipping subtree");
                    continue;
                }
            };

            let bounds = raw.bounds.filter(|b| b.w > 0 && b.h > 0);
            let offscreen_by_screen = bounds.map(|b| b.outside(&screen)).unwrap_or(false);
            let node = AtspiRaw { bounds, ..raw };

            output.stats.record(depth, node.role.clone());
            output.nodes.push(RawNode {
                depth,
                attrs: RawAttrs::Atspi(node),
                native: NativeRef::Atspi {
                    bus_name: bus.to_string(),
                    object_path: path.clone(),
                },
                offscreen_by_screen,
            });

            if let Ok(children) = self.children_of(bus, &path).await {
                for (_, child_path) in children.into_iter().rev() {
                    stack.push((child_path, depth + 1));
                }
            }
        }
        Ok(output)
    }

    /// All top-level windows: registry root children are applications, their
    /// children the frames.
    async fn enumerate_windows(&self) -> Result<Vec<(WindowMetadata, u64)>> {
        let apps = self.children_of(REGISTRY_BUS, ROOT_PATH).await?;
        let mut windows = Vec::new();
        for (app_bus, app_path) in apps {
            let children = match self.children_of(&app_bus, &app_path).await {
                Ok(children) => children,
                Err(_) => continue,
            };
            let pid = self.connection_pid(&app_bus).await;
            for (win_bus, win_path) in children {
                let win_role_name_method = format!("{}.GetRoleName", IFACE_ACCESSIBLE);
                let win_state_method = format!("{}.GetState", IFACE_ACCESSIBLE);
                let (role, name, state) = tokio::join!(
                    self.call(&win_bus, &win_path, &win_role_name_method, &[]),
                    self.get_property(&win_bus, &win_path, IFACE_ACCESSIBLE, "Name"),
                    self.call(&win_bus, &win_path, &win_state_method, &[]),
                );
                let role = role
                    .ok()
                    .and_then(|s| gvariant::first_string(&s))
                    .map(|r| decode_role_name(&r))
                    .unwrap_or_default();
                if !matches!(role.as_str(), "frame" | "window" | "dialog") {
                    continue;
                }
                let bits = gvariant::parse_state_bits(&state.unwrap_or_default());
                if !has_bit(bits, state_bits::SHOWING) {
                    continue;
                }
                windows.push((
                    WindowMetadata {
                        handle: WindowHandle::Atspi {
                            bus_name: win_bus.clone(),
                            object_path: win_path.clone(),
                        },
                        title: name
                            .ok()
                            .and_then(|s| gvariant::first_string(&s))
                            .unwrap_or_default(),
                        pid,
                        bundle_id: None,
                        url: None,
                    },
                    bits,
                ));
            }
        }
        Ok(windows)
    }

    async fn connection_pid(&self, bus: &str) -> Option<u32> {
        let out = self
            .call(
                "org.freedesktop.DBus",
                "/org/freedesktop/DBus",
                "org.freedesktop.DBus.GetConnectionUnixProcessID",
                &[bus],
            )
            .await
            .ok()?;
        gvariant::first_number(&out).map(|n| n as u32)
    }

    fn handle_parts<'a>(&self, window: &'a WindowMetadata) -> Result<(&'a str, &'a str)> {
        match &window.handle {
            WindowHandle::Atspi { bus_name, object_path } => Ok((bus_name, object_path)),
            other => Err(CupError::InvalidParams(format!(
                "not an AT-SPI window handle: {:?}",
                other
            ))),
        }
    }

    async fn element_center(&self, bus: &str, path: &str) -> Result<(i32, i32)> {
        let out = self
            .call(bus, path, &format!("{}.GetExtents", IFACE_COMPONENT), &["0"])
            .await?;
        let bounds = gvariant::parse_extents(&out)
            .ok_or_else(|| CupError::PlatformFailure("element reports no extents".to_string()))?;
        Ok((bounds.x + bounds.w / 2, bounds.y + bounds.h / 2))
    }

    async fn do_named_action(&self, bus: &str, path: &str, wanted: &[&str]) -> Result<bool> {
        let out = self
            .call(bus, path, &format!("{}.GetActions", IFACE_ACTION), &[])
            .await?;
        let names = gvariant::parse_action_names(&out);
        for (index, name) in names.iter().enumerate() {
            if wanted.contains(&name.as_str()) {
                self.call(
                    bus,
                    path,
                    &format!("{}.DoAction", IFACE_ACTION),
                    &[&index.to_string()],
                )
                .await?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn xdotool(&self, args: &[&str]) -> Result<()> {
        let mut cmd = Command::new("xdotool");
        cmd.args(args);
        run_command(cmd, SUBPROCESS_TIMEOUT_SECS, "xdotool").await?;
        Ok(())
    }

    async fn click_at(&self, x: i32, y: i32, button: &str, repeat: u32) -> Result<()> {
        self.xdotool(&["mousemove", &x.to_string(), &y.to_string()]).await?;
        if repeat > 1 {
            self.xdotool(&["click", "--repeat", &repeat.to_string(), "--delay", "120", button])
                .await
        } else {
            self.xdotool(&["click", button]).await
        }
    }

    async fn grab_focus(&self, bus: &str, path: &str) -> Result<()> {
        self.call(bus, path, &format!("{}.GrabFocus", IFACE_COMPONENT), &[])
            .await?;
        Ok(())
    }
}

impl Default for LinuxAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformAdapter for LinuxAdapter {
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn initialize(&self) -> Result<()> {
        // One cheap registry call both checks that gdbus exists and that the
        // AT-SPI bus is reachable.
        self.call(
            REGISTRY_BUS,
            ROOT_PATH,
            &format!("{}.GetRoleName", IFACE_ACCESSIBLE),
            &[],
        )
        .await
        .map_err(|err| match err {
            CupError::PlatformUnavailable(_) => {
                CupError::PlatformUnavailable("gdbus".to_string())
            }
            CupError::PlatformFailure(msg) => CupError::PlatformUnavailable(format!(
                "AT-SPI registry not reachable: {}",
                msg
            )),
            other => other,
        })?;
        Ok(())
    }

    async fn screen_info(&self) -> Result<ScreenInfo> {
        let mut cmd = Command::new("xdotool");
        cmd.arg("getdisplaygeometry");
        let out = run_for_stdout(cmd, SUBPROCESS_TIMEOUT_SECS, "xdotool").await?;
        let mut parts = out.split_whitespace();
        let w = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        let h = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        if w == 0 || h == 0 {
            return Err(CupError::PlatformFailure(format!(
                "unexpected display geometry: {}",
                out
            )));
        }
        Ok(ScreenInfo::new(w, h, 1.0))
    }

    async fn foreground_window(&self) -> Result<WindowMetadata> {
        let windows = self.enumerate_windows().await?;
        windows
            .iter()
            .find(|(_, bits)| has_bit(*bits, state_bits::ACTIVE))
            .or_else(|| windows.first())
            .map(|(meta, _)| meta.clone())
            .ok_or_else(|| CupError::PlatformFailure("no windows visible".to_string()))
    }

    async fn all_windows(&self) -> Result<Vec<WindowMetadata>> {
        Ok(self
            .enumerate_windows()
            .await?
            .into_iter()
            .map(|(meta, _)| meta)
            .collect())
    }

    async fn window_list(&self) -> Result<Vec<WindowInfo>> {
        Ok(self
            .enumerate_windows()
            .await?
            .into_iter()
            .map(|(meta, bits)| WindowInfo {
                title: meta.title,
                pid: meta.pid,
                bundle_id: None,
                foreground: Some(has_bit(bits, state_bits::ACTIVE)).filter(|f| *f),
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

        // Independent D-Bus connections per window; walks run in parallel and
        // merge in input order.
        let walks = windows.iter().map(|window| async move {
            let (bus, path) = self.handle_parts(window)?;
            tokio::time::timeout(
                std::time::Duration::from_secs(CAPTURE_TIMEOUT_SECS),
                self.walk_window(bus, path, max_depth, screen),
            )
            .await
            .map_err(|_| CupError::PlatformTimeout(format!("capture of '{}'", window.title)))?
        });

        let mut merged = CaptureOutput::default();
        for (window, result) in windows.iter().zip(join_all(walks).await) {
            match result {
                Ok(output) => {
                    merged.stats.merge(output.stats);
                    merged.nodes.extend(output.nodes);
                }
                Err(err) => {
                    // A dead or denying window contributes nothing.
                    tracing::warn!(window = %window.title, error = %err, "window capture failed");
                }
            }
        }
        Ok(merged)
    }

    async fn focus_window(&self, window: &WindowMetadata) -> Result<()> {
        let (bus, path) = self.handle_parts(window)?;
        if self.grab_focus(bus, path).await.is_ok() {
            return Ok(());
        }
        self.xdotool(&["search", "--name", &window.title, "windowactivate"])
            .await
    }

    async fn perform(&self, target: &NativeRef, invocation: &ActionInvocation) -> Result<String> {
        let (bus, path) = match target {
            NativeRef::Atspi { bus_name, object_path } => (bus_name.as_str(), object_path.as_str()),
            other => {
                return Err(CupError::InvalidParams(format!(
                    "not an AT-SPI reference: {:?}",
                    other
                )))
            }
        };

        match invocation.action {
            Action::Click => {
                if !self.do_named_action(bus, path, &["click", "press", "activate", "jump"]).await? {
                    let (x, y) = self.element_center(bus, path).await?;
                    self.click_at(x, y, "1", 1).await?;
                }
            }
            Action::DoubleClick => {
                let (x, y) = self.element_center(bus, path).await?;
                self.click_at(x, y, "1", 2).await?;
            }
            Action::RightClick => {
                let (x, y) = self.element_center(bus, path).await?;
                self.click_at(x, y, "3", 1).await?;
            }
            Action::LongPress => {
                let (x, y) = self.element_center(bus, path).await?;
                self.xdotool(&["mousemove", &x.to_string(), &y.to_string()]).await?;
                self.xdotool(&["mousedown", "1"]).await?;
                tokio::time::sleep(std::time::Duration::from_millis(600)).await;
                self.xdotool(&["mouseup", "1"]).await?;
            }
            Action::Toggle => {
                if !self.do_named_action(bus, path, &["toggle", "click", "press", "activate"]).await? {
                    return Err(CupError::PlatformFailure(
                        "element exposes no toggle action".to_string(),
                    ));
                }
            }
            Action::Expand | Action::Collapse => {
                if !self
                    .do_named_action(bus, path, &["expand or contract", "expand", "collapse", "click"])
                    .await?
                {
                    return Err(CupError::PlatformFailure(
                        "element exposes no expand action".to_string(),
                    ));
                }
            }
            Action::Select => {
                if !self.do_named_action(bus, path, &["select", "click", "activate"]).await? {
                    self.grab_focus(bus, path).await?;
                    self.xdotool(&["key", "space"]).await?;
                }
            }
            Action::Type => {
                let value = invocation.value.as_deref().unwrap_or_default();
                self.grab_focus(bus, path).await?;
                self.xdotool(&["type", "--delay", "12", value]).await?;
            }
            Action::SetValue => {
                let value = invocation.value.as_deref().unwrap_or_default();
                let set_text = self
                    .call(
                        bus,
                        path,
                        &format!("{}.SetTextContents", IFACE_EDITABLE_TEXT),
                        &[value],
                    )
                    .await;
                if set_text.is_err() {
                    // Not editable text: try the Value interface.
                    let number: f64 = value.parse().map_err(|_| {
                        CupError::InvalidParams(format!("'{}' is not a number", value))
                    })?;
                    self.call(
                        bus,
                        path,
                        &format!("{}.Set", IFACE_PROPERTIES),
                        &[IFACE_VALUE, "CurrentValue", &format!("<{}>", number)],
                    )
                    .await?;
                }
            }
            Action::Increment | Action::Decrement => {
                let now = self
                    .get_property(bus, path, IFACE_VALUE, "CurrentValue")
                    .await
                    .ok()
                    .and_then(|s| gvariant::first_number(&s))
                    .unwrap_or(0.0);
                let step = self
                    .get_property(bus, path, IFACE_VALUE, "MinimumIncrement")
                    .await
                    .ok()
                    .and_then(|s| gvariant::first_number(&s))
                    .filter(|s| *s > 0.0)
                    .unwrap_or(1.0);
                let next = if invocation.action == Action::Increment {
                    now + step
                } else {
                    now - step
                };
                self.call(
                    bus,
                    path,
                    &format!("{}.Set", IFACE_PROPERTIES),
                    &[IFACE_VALUE, "CurrentValue", &format!("<{}>", next)],
                )
                .await?;
            }
            Action::Scroll => {
                let direction = invocation.direction.unwrap_or(ScrollDirection::Down);
                let (x, y) = self.element_center(bus, path).await?;
                // X wheel buttons: 4 up, 5 down, 6 left, 7 right.
                let button = match direction {
                    ScrollDirection::Up => "4",
                    ScrollDirection::Down => "5",
                    ScrollDirection::Left => "6",
                    ScrollDirection::Right => "7",
                };
                self.xdotool(&["mousemove", &x.to_string(), &y.to_string()]).await?;
                self.xdotool(&["click", "--repeat", "3", button]).await?;
            }
            Action::Focus => {
                self.grab_focus(bus, path).await?;
            }
            Action::Dismiss => {
                self.xdotool(&["key", "Escape"]).await?;
            }
        }
        Ok(crate::action::success_message(invocation))
    }

    async fn press_keys(&self, combo: &KeyCombo) -> Result<()> {
        let mut parts: Vec<String> = combo.modifiers.iter().map(|m| xdotool_key(m)).collect();
        parts.extend(combo.keys.iter().map(|k| xdotool_key(k)));
        self.xdotool(&["key", &parts.join("+")]).await
    }
}

/// AT-SPI role names come back as words ("push button"); the canonical
/// decoding lowercases and joins with dashes.
fn decode_role_name(raw: &str) -> String {
    raw.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

/// Canonical key names to X keysyms as xdotool expects them.
fn xdotool_key(key: &str) -> String {
    match key {
        "enter" => "Return",
        "escape" => "Escape",
        "delete" => "Delete",
        "backspace" => "BackSpace",
        "pageup" => "Page_Up",
        "pagedown" => "Page_Down",
        "home" => "Home",
        "end" => "End",
        "up" => "Up",
        "down" => "Down",
        "left" => "Left",
        "right" => "Right",
        "tab" => "Tab",
        "space" => "space",
        "meta" => "super",
        "insert" => "Insert",
        other => {
            if let Some(rest) = other.strip_prefix('f') {
                if rest.parse::<u8>().is_ok() {
                    return other.to_uppercase();
                }
            }
            return other.to_string();
        }
    }
    .to_string()
}

fn map_stale(err: CupError) -> CupError {
    if let CupError::PlatformFailure(msg) = &err {
        let lower = msg.to_lowercase();
        if lower.contains("unknownobject")
            || lower.contains("no such object")
            || lower.contains("does not exist")
            || lower.contains("unknown method")
        {
            return CupError::StaleSnapshot(msg.clone());
        }
    }
    err
}

/// Just enough GVariant text-form parsing for the handful of reply shapes
/// the adapter reads. `gdbus` prints e.g. `('push button',)`,
/// `([uint32 8388634, uint32 0],)`, `((0, 0, 1920, 1080),)`,
/// `([(':1.42', objectpath '/org/a11y/...'), ...],)`.
mod gvariant {
    use crate::model::Bounds;
    use std::collections::HashMap;

    /// All single-quoted strings, unescaping `\'` and `\\`.
    pub fn strings(input: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut chars = input.chars();
        while let Some(c) = chars.next() {
            if c != '\'' {
                continue;
            }
            let mut current = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            current.push(escaped);
                        }
                    }
                    '\'' => break,
                    other => current.push(other),
                }
            }
            out.push(current);
        }
        out
    }

    /// Numeric literals outside quotes, skipping identifiers such as
    /// `uint32` and `objectpath`.
    pub fn numbers(input: &str) -> Vec<f64> {
        let mut out = Vec::new();
        let bytes = input.as_bytes();
        let mut i = 0;
        let mut in_string = false;
        while i < bytes.len() {
            let c = bytes[i] as char;
            if c == '\'' {
                in_string = !in_string;
                i += 1;
                continue;
            }
            if in_string {
                if c == '\\' {
                    i += 1;
                }
                i += 1;
                continue;
            }
            if c.is_ascii_alphabetic() || c == '_' {
                // Consume the identifier including any trailing digits.
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                continue;
            }
            if c.is_ascii_digit() || (c == '-' && i + 1 < bytes.len() && (bytes[i + 1] as char).is_ascii_digit()) {
                let start = i;
                i += 1;
                while i < bytes.len() {
                    let c = bytes[i] as char;
                    if c.is_ascii_digit() || c == '.' || c == 'e' || c == '-' || c == '+' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                if let Ok(value) = input[start..i].parse() {
                    out.push(value);
                }
                continue;
            }
            i += 1;
        }
        out
    }

    pub fn first_string(input: &str) -> Option<String> {
        strings(input).into_iter().next()
    }

    pub fn first_number(input: &str) -> Option<f64> {
        numbers(input).into_iter().next()
    }

    /// `GetState` returns two 32-bit words, low word first.
    pub fn parse_state_bits(input: &str) -> u64 {
        let nums = numbers(input);
        let low = nums.first().copied().unwrap_or(0.0) as u64;
        let high = nums.get(1).copied().unwrap_or(0.0) as u64;
        low | (high << 32)
    }

    /// `GetExtents` returns `((x, y, w, h),)`.
    pub fn parse_extents(input: &str) -> Option<Bounds> {
        let nums = numbers(input);
        if nums.len() < 4 {
            return None;
        }
        Some(Bounds::new(
            nums[0] as i32,
            nums[1] as i32,
            nums[2] as i32,
            nums[3] as i32,
        ))
    }

    /// `GetActions` returns an array of (name, description, keybinding)
    /// tuples; the names are every third string.
    pub fn parse_action_names(input: &str) -> Vec<String> {
        strings(input).chunks(3).filter_map(|c| c.first().cloned()).collect()
    }

    /// `GetAttributes` returns a string dict: alternating keys and values.
    pub fn parse_dict(input: &str) -> HashMap<String, String> {
        let mut out = HashMap::new();
        for pair in strings(input).chunks(2) {
            if let [key, value] = pair {
                out.insert(key.clone(), value.clone());
            }
        }
        out
    }

    /// `GetChildren` returns an array of (busName, objectPath) references.
    pub fn parse_object_pairs(input: &str) -> Vec<(String, String)> {
        strings(input)
            .chunks(2)
            .filter_map(|c| match c {
                [bus, path] => Some((bus.clone(), path.clone())),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_role_name() {
        assert_eq!(decode_role_name("push button"), "push-button");
        assert_eq!(decode_role_name("Page Tab List"), "page-tab-list");
        assert_eq!(decode_role_name("frame"), "frame");
    }

    #[test]
    fn test_gvariant_strings() {
        let input = "([(':1.42', objectpath '/org/a11y/atspi/accessible/5')],)";
        assert_eq!(
            gvariant::strings(input),
            vec![":1.42", "/org/a11y/atspi/accessible/5"]
        );
        assert_eq!(gvariant::strings("('it\\'s',)"), vec!["it's"]);
    }

    #[test]
    fn test_gvariant_numbers_skip_identifiers() {
        let input = "([uint32 8388634, uint32 0],)";
        assert_eq!(gvariant::numbers(input), vec![8388634.0, 0.0]);
        // Digits inside quoted strings are not numbers.
        assert_eq!(gvariant::numbers("('abc123', 7)"), vec![7.0]);
    }

    #[test]
    fn test_parse_state_bits() {
        let bits = gvariant::parse_state_bits("([uint32 256, uint32 1],)");
        assert!(has_bit(bits, state_bits::ENABLED));
        assert!(has_bit(bits, 32));
    }

    #[test]
    fn test_parse_extents() {
        let bounds = gvariant::parse_extents("((10, 20, 300, 40),)").unwrap();
        assert_eq!(bounds, Bounds::new(10, 20, 300, 40));
        assert!(gvariant::parse_extents("()").is_none());
    }

    #[test]
    fn test_parse_action_names() {
        let input = "([('click', 'Click the button', ''), ('focus', '', '<Alt>f')],)";
        assert_eq!(gvariant::parse_action_names(input), vec!["click", "focus"]);
    }

    #[test]
    fn test_parse_dict() {
        let input = "({'toolkit': 'GTK', 'level': '2'},)";
        let dict = gvariant::parse_dict(input);
        assert_eq!(dict.get("toolkit").map(String::as_str), Some("GTK"));
        assert_eq!(dict.get("level").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_parse_object_pairs() {
        let input =
            "([(':1.42', objectpath '/a/b'), (':1.43', objectpath '/c/d')],)";
        assert_eq!(
            gvariant::parse_object_pairs(input),
            vec![
                (":1.42".to_string(), "/a/b".to_string()),
                (":1.43".to_string(), "/c/d".to_string()),
            ]
        );
    }

    #[test]
    fn test_xdotool_key_mapping() {
        assert_eq!(xdotool_key("enter"), "Return");
        assert_eq!(xdotool_key("pageup"), "Page_Up");
        assert_eq!(xdotool_key("meta"), "super");
        assert_eq!(xdotool_key("f5"), "F5");
        assert_eq!(xdotool_key("a"), "a");
    }

    #[test]
    fn test_map_stale() {
        let err = map_stale(CupError::PlatformFailure(
            "GDBus.Error: no such object path '/x'".to_string(),
        ));
        assert!(matches!(err, CupError::StaleSnapshot(_)));

        let err = map_stale(CupError::PlatformFailure("boom".to_string()));
        assert!(matches!(err, CupError::PlatformFailure(_)));
    }
}
