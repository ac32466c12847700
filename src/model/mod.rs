//! Canonical data model: the role/state/action vocabulary, the node tree,
//! and the envelope document.

mod envelope;
mod node;
mod vocab;

pub use envelope::{AppInfo, Envelope, ScreenInfo, ToolDescriptor, WindowInfo, ENVELOPE_VERSION};
pub use node::{
    truncate, Autocomplete, Bounds, ClippedCounts, LiveSetting, Node, NodeAttributes, Orientation,
    MAX_TEXT_LEN, MAX_URL_LEN,
};
pub use vocab::{Action, DetailLevel, Platform, Role, Scope, State};
