//! # cup
//!
//! A uniform model of a computer's graphical user interface for autonomous
//! agents. Heterogeneous native accessibility sources — Windows UI
//! Automation, the macOS AXUIElement API, Linux AT-SPI2, and the Chrome
//! DevTools Protocol — are normalized into one canonical envelope: a tree of
//! semantic nodes with stable tree-local `e<N>` identifiers, a fixed
//! role/state/action vocabulary, and per-platform native references for
//! action dispatch.
//!
//! ## Taking a snapshot
//!
//! ```rust,no_run
//! use cup::{Session, SnapshotRequest};
//!
//! # async fn demo() -> cup::Result<()> {
//! let mut session = Session::detect()?;
//! let snapshot = session.snapshot(&SnapshotRequest::default()).await?;
//! println!("{}", snapshot.compact);
//! # Ok(())
//! # }
//! ```
//!
//! ## Finding and acting on elements
//!
//! ```rust,no_run
//! use cup::{ExecuteRequest, FindRequest, Session};
//!
//! # async fn demo() -> cup::Result<()> {
//! let mut session = Session::detect()?;
//! let hits = session.find(&FindRequest::query("search bar")).await?;
//! if let Some(hit) = hits.first() {
//!     let result = session
//!         .execute(&ExecuteRequest::element(hit.node.id.as_str(), "click"))
//!         .await;
//!     println!("{}", result.message.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Element IDs are valid only within the snapshot that produced them; a new
//! capture atomically replaces the session's retained trees and reference
//! map. Native references can go stale between snapshot and action — the
//! dispatcher reports that as a typed failure instead of panicking.
//!
//! ## Module overview
//!
//! - [`model`]: canonical vocabulary, nodes, and the envelope document
//! - [`platform`]: the four platform adapters behind one async trait
//! - [`map`]: per-platform attribute mapping and tree reassembly
//! - [`transform`]: detail levels, pruning, and viewport clipping
//! - [`serialize`]: the compact text format and the JSON envelope
//! - [`search`]: relevance-ranked semantic search over the unpruned tree
//! - [`action`]: dispatcher validation and key-combo parsing
//! - [`session`]: the snapshot/find/execute state machine

pub mod action;
pub mod config;
pub mod error;
pub mod map;
pub mod model;
pub mod platform;
pub mod requests;
pub mod search;
pub mod serialize;
pub mod session;
pub mod transform;

pub use action::{parse_combo, ActionResult, KeyCombo};
pub use config::CdpConfig;
pub use error::{CupError, Result};
pub use model::{
    Action, Bounds, DetailLevel, Envelope, Node, Platform, Role, Scope, ScreenInfo, State,
    WindowInfo,
};
pub use platform::{create_adapter, NativeRef, PlatformAdapter};
pub use requests::{BatchStep, ExecuteRequest, FindRequest, SnapshotRequest};
pub use search::{search_tree, SearchHit};
pub use serialize::{serialize_compact, serialize_json, serialize_overview};
pub use session::{Session, Snapshot};
pub use transform::prune_tree;
