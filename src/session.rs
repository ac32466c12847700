//! Session: owns one adapter plus the artifacts of the most recent snapshot
//! (unpruned tree for search, pruned tree for display, id-to-native-ref map
//! for actions). A new capture atomically replaces all three; element IDs
//! from earlier snapshots are invalid afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

use tokio::sync::Mutex;

use crate::action::{self, ActionResult, ValidatedAction};
use crate::config::CdpConfig;
use crate::error::{CupError, Result};
use crate::map::{map_capture, MappedCapture};
use crate::model::{
    AppInfo, Envelope, Node, Platform, ScreenInfo, Scope, ToolDescriptor, WindowInfo,
};
use crate::platform::{
    create_adapter, CaptureStats, NativeRef, PlatformAdapter, WindowMetadata,
};
use crate::requests::{BatchStep, ExecuteRequest, FindRequest, SnapshotRequest};
use crate::search::{search_tree, SearchHit};
use crate::serialize::{serialize_compact, serialize_overview};
use crate::transform::prune_tree;

/// Everything retained from one capture.
struct SnapshotState {
    screen: ScreenInfo,
    scope: Scope,
    app: Option<AppInfo>,
    windows: Option<Vec<WindowInfo>>,
    tools: Option<Vec<ToolDescriptor>>,
    unpruned: Vec<Node>,
    pruned: Vec<Node>,
    refs: HashMap<String, NativeRef>,
    stats: CaptureStats,
}

/// The rendered result of one snapshot.
pub struct Snapshot {
    pub envelope: Envelope,
    pub compact: String,
    pub nodes_before_pruning: usize,
    pub stats: CaptureStats,
}

pub struct Session {
    adapter: Box<dyn PlatformAdapter>,
    state: Option<SnapshotState>,
}

impl Session {
    pub fn new(adapter: Box<dyn PlatformAdapter>) -> Self {
        Self {
            adapter,
            state: None,
        }
    }

    /// Session for the detected host platform.
    pub fn detect() -> Result<Self> {
        Ok(Self::new(create_adapter(None, CdpConfig::from_env())?))
    }

    /// Session for an explicit platform (the only way to get `web`).
    pub fn for_platform(platform: Platform, cdp: CdpConfig) -> Result<Self> {
        Ok(Self::new(create_adapter(Some(platform), cdp)?))
    }

    pub fn platform(&self) -> Platform {
        self.adapter.platform()
    }

    /// Capture and render a snapshot, replacing any previous one.
    pub async fn snapshot(&mut self, request: &SnapshotRequest) -> Result<Snapshot> {
        self.adapter.initialize().await?;
        let screen = self.adapter.screen_info().await?;

        if request.scope == Scope::Overview {
            return self.snapshot_overview(screen).await;
        }

        let targets = self.select_windows(request).await?;
        let output = self
            .adapter
            .capture_tree(&targets, request.max_depth)
            .await?;
        let MappedCapture { roots, refs, stats } = map_capture(output);

        let pruned = prune_tree(&roots, request.detail, screen.bounds());

        let app = targets.first().map(|w| AppInfo {
            name: Some(w.title.clone()).filter(|t| !t.is_empty()),
            pid: w.pid,
            bundle_id: w.bundle_id.clone(),
        });
        let windows = if request.scope == Scope::Full {
            Some(self.adapter.window_list().await.unwrap_or_default())
        } else {
            None
        };
        let tools = {
            let tools = self.adapter.page_tools().await.unwrap_or_default();
            if tools.is_empty() {
                None
            } else {
                Some(tools)
            }
        };

        let state = SnapshotState {
            screen,
            scope: request.scope,
            app: app.filter(|a| !a.is_empty()),
            windows,
            tools,
            unpruned: roots,
            pruned,
            refs,
            stats,
        };
        let snapshot = self.render(&state, request.max_chars);
        // The triple (pruned, unpruned, refs) swaps in as one unit.
        self.state = Some(state);
        Ok(snapshot)
    }

    async fn snapshot_overview(&mut self, screen: ScreenInfo) -> Result<Snapshot> {
        let windows = self.adapter.window_list().await?;
        let mut envelope = Envelope::new(self.adapter.platform(), screen, Vec::new());
        envelope.scope = Some(Scope::Overview);
        envelope.windows = Some(windows.clone());
        let compact = serialize_overview(&envelope, &windows);

        self.state = Some(SnapshotState {
            screen,
            scope: Scope::Overview,
            app: None,
            windows: Some(windows),
            tools: None,
            unpruned: Vec::new(),
            pruned: Vec::new(),
            refs: HashMap::new(),
            stats: CaptureStats::default(),
        });
        Ok(Snapshot {
            envelope,
            compact,
            nodes_before_pruning: 0,
            stats: CaptureStats::default(),
        })
    }

    async fn select_windows(&self, request: &SnapshotRequest) -> Result<Vec<WindowMetadata>> {
        if let Some(filter) = &request.app_filter {
            let needle = filter.to_lowercase();
            let matches: Vec<WindowMetadata> = self
                .adapter
                .all_windows()
                .await?
                .into_iter()
                .filter(|w| w.title.to_lowercase().contains(&needle))
                .collect();
            if matches.is_empty() {
                tracing::warn!(filter = %filter, "no window matched the app filter");
            }
            return Ok(matches);
        }
        match request.scope {
            Scope::Foreground => Ok(vec![self.adapter.foreground_window().await?]),
            Scope::Desktop => Ok(self.adapter.desktop_window().await?.into_iter().collect()),
            Scope::Full => self.adapter.all_windows().await,
            Scope::Overview => Ok(Vec::new()),
        }
    }

    fn render(&self, state: &SnapshotState, max_chars: usize) -> Snapshot {
        let mut envelope = Envelope::new(self.adapter.platform(), state.screen, state.pruned.clone());
        envelope.scope = Some(state.scope);
        envelope.app = state.app.clone();
        envelope.windows = state.windows.clone();
        envelope.tools = state.tools.clone();

        let before: usize = state.unpruned.iter().map(Node::subtree_size).sum();
        let compact = serialize_compact(&envelope, before, max_chars);
        Snapshot {
            envelope,
            compact,
            nodes_before_pruning: before,
            stats: state.stats.clone(),
        }
    }

    /// The unpruned tree of the current snapshot as an envelope (the
    /// `--full-json-out` surface).
    pub fn full_envelope(&self) -> Option<Envelope> {
        let state = self.state.as_ref()?;
        let mut envelope =
            Envelope::new(self.adapter.platform(), state.screen, state.unpruned.clone());
        envelope.scope = Some(state.scope);
        envelope.app = state.app.clone();
        envelope.windows = state.windows.clone();
        envelope.tools = state.tools.clone();
        Some(envelope)
    }

    /// Search the unpruned tree. In the fresh state this takes a foreground
    /// snapshot first.
    pub async fn find(&mut self, request: &FindRequest) -> Result<Vec<SearchHit>> {
        if self.state.is_none() {
            self.snapshot(&SnapshotRequest::default()).await?;
        }
        let state = self.state.as_ref().expect("snapshot state");
        Ok(search_tree(&state.unpruned, request))
    }

    /// Dispatch one action. Failures come back as a result record, never a
    /// panic; only programming errors propagate as `Err`.
    pub async fn execute(&mut self, request: &ExecuteRequest) -> ActionResult {
        let validated = match action::validate(request) {
            Ok(v) => v,
            Err(err) => return err.into(),
        };

        match validated {
            ValidatedAction::PressKeys(combo) => {
                match self.adapter.press_keys(&combo).await {
                    Ok(()) => {
                        let mut all = combo.modifiers.clone();
                        all.extend(combo.keys.iter().cloned());
                        ActionResult::ok(format!("Pressed: {}", all.join("+")))
                    }
                    Err(err) => err.into(),
                }
            }
            ValidatedAction::Element {
                element_id,
                invocation,
            } => {
                let target = match self
                    .state
                    .as_ref()
                    .and_then(|s| s.refs.get(&element_id))
                {
                    Some(target) => target.clone(),
                    None => return CupError::UnknownElement(element_id).into(),
                };
                match self.adapter.perform(&target, &invocation).await {
                    Ok(message) => ActionResult::ok(message),
                    Err(err) => err.into(),
                }
            }
        }
    }

    /// Run a batch in order, stopping at the first non-successful result.
    /// Returns the results up to and including the failure.
    pub async fn execute_batch(&mut self, steps: &[BatchStep]) -> Vec<ActionResult> {
        let mut results = Vec::new();
        for step in steps {
            let result = match step {
                BatchStep::Wait { ms } => {
                    let ms = action::clamp_wait(*ms);
                    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
                    ActionResult::ok(format!("Waited {}ms", ms))
                }
                BatchStep::PressKeys { keys } => {
                    self.execute(&ExecuteRequest {
                        action: "press_keys".to_string(),
                        keys: Some(keys.clone()),
                        ..ExecuteRequest::default()
                    })
                    .await
                }
                BatchStep::Element(request) => self.execute(request).await,
            };
            let failed = !result.success;
            results.push(result);
            if failed {
                break;
            }
        }
        results
    }
}

static DEFAULT_SESSION: OnceLock<Mutex<Option<Session>>> = OnceLock::new();

/// Process-wide lazily created default session for the detected platform.
/// Convenience only: callers needing isolation must hold their own
/// [`Session`] — independent concurrent callers sharing this one serialize
/// on its lock and share its snapshot.
pub async fn with_default_session<F, T>(f: F) -> Result<T>
where
    F: for<'a> FnOnce(
        &'a mut Session,
    )
        -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<T>> + Send + 'a>>,
{
    let cell = DEFAULT_SESSION.get_or_init(|| Mutex::new(None));
    let mut guard = cell.lock().await;
    if guard.is_none() {
        *guard = Some(Session::detect()?);
    }
    f(guard.as_mut().expect("default session")).await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::action::KeyCombo;
    use crate::model::Role;
    use crate::platform::{
        ActionInvocation, AtspiRaw, CaptureOutput, RawAttrs, RawNode, WindowHandle,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Adapter that serves a canned AT-SPI-shaped stream.
    pub struct MockAdapter {
        pub captures: Arc<AtomicUsize>,
    }

    impl MockAdapter {
        pub fn new() -> Self {
            Self {
                captures: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn raw(depth: u32, role: &str, name: &str, actions: &[&str]) -> RawNode {
            RawNode {
                depth,
                attrs: RawAttrs::Atspi(AtspiRaw {
                    role: role.to_string(),
                    name: name.to_string(),
                    state_bits: (1 << crate::map::state_bits::ENABLED)
                        | (1 << crate::map::state_bits::VISIBLE)
                        | (1 << crate::map::state_bits::SHOWING),
                    actions: actions.iter().map(|s| s.to_string()).collect(),
                    ..AtspiRaw::default()
                }),
                native: NativeRef::Atspi {
                    bus_name: ":1.99".to_string(),
                    object_path: format!("/obj/{}/{}", role, name),
                },
                offscreen_by_screen: false,
            }
        }
    }

    #[async_trait]
    impl PlatformAdapter for MockAdapter {
        fn platform(&self) -> Platform {
            Platform::Linux
        }

        async fn initialize(&self) -> Result<()> {
            Ok(())
        }

        async fn screen_info(&self) -> Result<ScreenInfo> {
            Ok(ScreenInfo::new(1920, 1080, 1.0))
        }

        async fn foreground_window(&self) -> Result<WindowMetadata> {
            Ok(WindowMetadata {
                handle: WindowHandle::Atspi {
                    bus_name: ":1.99".to_string(),
                    object_path: "/obj/frame".to_string(),
                },
                title: "Mock Window".to_string(),
                pid: Some(4242),
                bundle_id: None,
                url: None,
            })
        }

        async fn all_windows(&self) -> Result<Vec<WindowMetadata>> {
            Ok(vec![self.foreground_window().await?])
        }

        async fn window_list(&self) -> Result<Vec<WindowInfo>> {
            Ok(vec![WindowInfo {
                title: "Mock Window".to_string(),
                pid: Some(4242),
                foreground: Some(true),
                ..WindowInfo::default()
            }])
        }

        async fn capture_tree(
            &self,
            _windows: &[WindowMetadata],
            _max_depth: u32,
        ) -> Result<CaptureOutput> {
            self.captures.fetch_add(1, Ordering::SeqCst);
            let nodes = vec![
                Self::raw(0, "frame", "Mock Window", &[]),
                Self::raw(1, "push-button", "Save", &["click"]),
                Self::raw(1, "entry", "Name", &[]),
            ];
            let mut stats = CaptureStats::default();
            for node in &nodes {
                stats.record(node.depth, node.attrs.native_role());
            }
            Ok(CaptureOutput { nodes, stats })
        }

        async fn focus_window(&self, _window: &WindowMetadata) -> Result<()> {
            Ok(())
        }

        async fn perform(
            &self,
            _target: &NativeRef,
            invocation: &ActionInvocation,
        ) -> Result<String> {
            Ok(crate::action::success_message(invocation))
        }

        async fn press_keys(&self, _combo: &KeyCombo) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_snapshot_then_execute() {
        let mut session = Session::new(Box::new(MockAdapter::new()));
        let snapshot = session.snapshot(&SnapshotRequest::default()).await.unwrap();
        assert_eq!(snapshot.envelope.tree[0].role, Role::Window);
        assert!(snapshot.compact.contains("[e1] button \"Save\""));

        let result = session
            .execute(&ExecuteRequest::element("e1", "click"))
            .await;
        assert!(result.success);
        assert_eq!(result.message.as_deref(), Some("Clicked"));
    }

    #[tokio::test]
    async fn test_unknown_element_fails_typed() {
        let mut session = Session::new(Box::new(MockAdapter::new()));
        session.snapshot(&SnapshotRequest::default()).await.unwrap();
        let result = session
            .execute(&ExecuteRequest::element("e99", "click"))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_find_auto_snapshots_when_fresh() {
        let mock = MockAdapter::new();
        let captures = Arc::clone(&mock.captures);
        let mut session = Session::new(Box::new(mock));

        let hits = session.find(&FindRequest::query("save")).await.unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].node.name, "Save");
        assert_eq!(captures.load(Ordering::SeqCst), 1);

        // A second find reuses the snapshot.
        session.find(&FindRequest::query("name")).await.unwrap();
        assert_eq!(captures.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_new_snapshot_invalidates_old_ids() {
        let mut session = Session::new(Box::new(MockAdapter::new()));
        session.snapshot(&SnapshotRequest::default()).await.unwrap();
        let first = session
            .execute(&ExecuteRequest::element("e1", "click"))
            .await;
        assert!(first.success);

        session.snapshot(&SnapshotRequest::default()).await.unwrap();
        // e1 exists again in the new snapshot; an id beyond the new tree
        // does not, even if some caller remembered it.
        let stale = session
            .execute(&ExecuteRequest::element("e77", "click"))
            .await;
        assert!(!stale.success);
    }

    #[tokio::test]
    async fn test_batch_stops_on_first_failure() {
        let mut session = Session::new(Box::new(MockAdapter::new()));
        session.snapshot(&SnapshotRequest::default()).await.unwrap();

        let steps = vec![
            BatchStep::Element(ExecuteRequest::element("e1", "click")),
            BatchStep::Element(ExecuteRequest::element("e99", "click")),
            BatchStep::Element(ExecuteRequest::element("e1", "click")),
        ];
        let results = session.execute_batch(&steps).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].success);
        assert!(!results[1].success);
    }

    #[tokio::test]
    async fn test_overview_scope() {
        let mut session = Session::new(Box::new(MockAdapter::new()));
        let snapshot = session
            .snapshot(&SnapshotRequest {
                scope: Scope::Overview,
                ..SnapshotRequest::default()
            })
            .await
            .unwrap();
        assert!(snapshot.envelope.tree.is_empty());
        assert!(snapshot.compact.contains("# overview | 1 windows"));
        assert!(snapshot.compact.contains("* [fg] Mock Window"));
    }

    #[tokio::test]
    async fn test_full_envelope_is_unpruned() {
        let mut session = Session::new(Box::new(MockAdapter::new()));
        session.snapshot(&SnapshotRequest::default()).await.unwrap();
        let full = session.full_envelope().unwrap();
        assert_eq!(full.node_count(), 3);
    }
}
