//! Navigation core for a server-driven UI client.
//!
//! The controller translates navigation requests (programmatic calls,
//! back/forward notifications, the initial load) into content fetches,
//! decodes the streamed UI description through the [`decode::TreeDecoder`]
//! seam, and commits results to the history sink and the published
//! [`RouterState`] under a latest-wins ordering policy: every navigation
//! mints a fresh token, and only the most recently minted token may commit,
//! regardless of the order in which fetches resolve.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    sync::{Arc, Weak},
};

use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
pub use shared::{
    error::ContentError,
    location::{HistoryMode, Location},
    tree::{RenderNode, RenderTree},
};
use tokio::{
    sync::{mpsc, watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, trace};
use url::Url;

pub mod decode;
pub mod fetch;
pub mod render;

pub use decode::{DecodeError, JsonTreeDecoder, TreeDecoder};
pub use fetch::{ContentFetcher, ContentStream, FetchError, HttpContentFetcher};
pub use render::{CommittedView, RenderHandle, RenderScheduler, TreePainter};

/// Address-state seam. Mutated exclusively by the controller, and only
/// after a successful, still-latest resolution.
pub trait HistorySink: Send + Sync {
    /// Synchronous read of the live address state.
    fn current_location(&self) -> Location;
    fn push(&self, location: &Location);
    fn replace(&self, location: &Location);
}

/// How a resolved navigation touches the history sink. `AlreadyApplied`
/// covers external (back/forward) changes and the initial load, where the
/// address state has moved before the fetch even starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommitMode {
    Push,
    Replace,
    AlreadyApplied,
}

static NEXT_CONTENT_ID: AtomicU64 = AtomicU64::new(1);

type SharedTree = Shared<BoxFuture<'static, Result<Arc<RenderTree>, ContentError>>>;

/// Clonable handle to one navigation's tree-producing computation.
///
/// Shared between the controller (which awaits it to decide on commit) and
/// the render scheduler (which awaits it to paint). Never mutated after
/// creation; a new navigation always mints a new future.
#[derive(Clone)]
pub struct ContentFuture {
    id: u64,
    inner: SharedTree,
}

impl ContentFuture {
    pub fn new(
        future: impl std::future::Future<Output = Result<Arc<RenderTree>, ContentError>>
            + Send
            + 'static,
    ) -> Self {
        Self {
            id: NEXT_CONTENT_ID.fetch_add(1, Ordering::Relaxed),
            inner: future.boxed().shared(),
        }
    }

    /// Process-unique identity, used by the render scheduler to paint each
    /// future at most once.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Drives the computation to resolution (or joins an already-running
    /// resolution) and returns the decoded tree.
    pub async fn tree(&self) -> Result<Arc<RenderTree>, ContentError> {
        self.inner.clone().await
    }

    /// Non-blocking inspection of an already-resolved future.
    pub fn peek(&self) -> Option<Result<Arc<RenderTree>, ContentError>> {
        self.inner.peek().cloned()
    }
}

impl fmt::Debug for ContentFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentFuture")
            .field("id", &self.id)
            .field("resolved", &self.inner.peek().is_some())
            .finish()
    }
}

/// Router state observable by the rest of the UI.
///
/// `next_location` reflects the most recently requested destination the
/// moment a navigation is initiated; `current_location` lags until that
/// navigation's content has resolved and committed.
#[derive(Debug, Clone)]
pub struct RouterState {
    pub current_location: Location,
    pub next_location: Location,
    pub content: Option<ContentFuture>,
    pub is_pending: bool,
}

struct ControllerState {
    latest_token: u64,
    current_location: Location,
    next_location: Location,
    content: Option<ContentFuture>,
    pending: bool,
}

/// The navigation state machine.
pub struct NavigationController {
    fetcher: Arc<dyn ContentFetcher>,
    decoder: Arc<dyn TreeDecoder>,
    history: Arc<dyn HistorySink>,
    module_base: Url,
    inner: Mutex<ControllerState>,
    state_tx: watch::Sender<RouterState>,
    external_listener: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl NavigationController {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        decoder: Arc<dyn TreeDecoder>,
        history: Arc<dyn HistorySink>,
        module_base: Url,
    ) -> Arc<Self> {
        let location = history.current_location();
        let (state_tx, _) = watch::channel(RouterState {
            current_location: location.clone(),
            next_location: location.clone(),
            content: None,
            is_pending: false,
        });
        Arc::new(Self {
            fetcher,
            decoder,
            history,
            module_base,
            inner: Mutex::new(ControllerState {
                latest_token: 0,
                current_location: location.clone(),
                next_location: location,
                content: None,
                pending: false,
            }),
            state_tx,
            external_listener: std::sync::Mutex::new(None),
        })
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RouterState> {
        self.state_tx.subscribe()
    }

    /// Fetches content for the location the history sink already points at.
    /// Mints a token like any other navigation; commits without touching
    /// history.
    pub async fn initial_load(self: &Arc<Self>) {
        let location = self.history.current_location();
        self.begin(location, CommitMode::AlreadyApplied).await;
    }

    /// Programmatic navigation entry point. Returns as soon as the
    /// navigation is initiated; the outcome is observed through the
    /// published [`RouterState`] and its content future.
    pub async fn navigate(self: &Arc<Self>, location: Location, mode: HistoryMode) {
        let mode = match mode {
            HistoryMode::Push => CommitMode::Push,
            HistoryMode::Replace => CommitMode::Replace,
        };
        self.begin(location, mode).await;
    }

    /// Back/forward notification: the address state has already moved, so
    /// the committing resolution must not push or replace. Always
    /// re-fetches, even when the destination equals `next_location` —
    /// skipping could hide server-side data changes.
    pub async fn notify_external_location_change(self: &Arc<Self>) {
        let location = self.history.current_location();
        self.begin(location, CommitMode::AlreadyApplied).await;
    }

    /// Registers the out-of-band location-change listener. A previously
    /// bound listener is torn down first; [`Self::detach_external_changes`]
    /// or dropping the controller tears the listener down explicitly.
    pub fn bind_external_changes(self: &Arc<Self>, mut changes: mpsc::Receiver<()>) {
        // Weak so the listener never keeps the controller alive on its own.
        let controller = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            while changes.recv().await.is_some() {
                let Some(controller) = Weak::upgrade(&controller) else {
                    break;
                };
                controller.notify_external_location_change().await;
            }
        });
        let mut slot = self
            .external_listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    pub fn detach_external_changes(&self) {
        let mut slot = self
            .external_listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(listener) = slot.take() {
            listener.abort();
        }
    }

    /// Initiate: mint the new latest token, reflect the destination in
    /// `next_location` synchronously, install a fresh content future, and
    /// hand resolution off to a background task. All state mutation happens
    /// inside one critical section.
    async fn begin(self: &Arc<Self>, location: Location, mode: CommitMode) {
        let (token, future) = {
            let mut inner = self.inner.lock().await;
            inner.latest_token += 1;
            let token = inner.latest_token;

            let fetcher = Arc::clone(&self.fetcher);
            let decoder = Arc::clone(&self.decoder);
            let module_base = self.module_base.clone();
            let target = location.clone();
            let future = ContentFuture::new(async move {
                let stream =
                    fetcher
                        .open(&target)
                        .await
                        .map_err(|err| ContentError::Fetch {
                            location: target.to_string(),
                            message: err.to_string(),
                        })?;
                let tree = decoder
                    .decode(stream, &module_base)
                    .await
                    .map_err(|err| ContentError::Decode {
                        location: target.to_string(),
                        message: err.to_string(),
                    })?;
                Ok(Arc::new(tree))
            });

            inner.next_location = location.clone();
            inner.pending = true;
            inner.content = Some(future.clone());
            self.publish(&inner);
            (token, future)
        };

        debug!(location = %location, token, ?mode, "navigation initiated");

        let controller = Arc::clone(self);
        tokio::spawn(async move {
            controller.resolve(token, location, mode, future).await;
        });
    }

    /// Resolve: await the content future, then commit or discard under the
    /// state lock. The token comparison and the history mutation share one
    /// critical section, so no navigation can be initiated between the
    /// check and the commit.
    async fn resolve(&self, token: u64, location: Location, mode: CommitMode, future: ContentFuture) {
        let outcome = future.tree().await;

        let mut inner = self.inner.lock().await;
        if inner.latest_token != token {
            // Superseded: success and failure are dropped identically, with
            // no history mutation and no state update. Expected noise from
            // overlapping navigations, so never logged as an error.
            trace!(location = %location, token, "superseded navigation result dropped");
            return;
        }

        match outcome {
            Ok(_) => {
                match mode {
                    CommitMode::Push => self.history.push(&location),
                    CommitMode::Replace => self.history.replace(&location),
                    CommitMode::AlreadyApplied => {}
                }
                inner.current_location = location.clone();
                inner.pending = false;
                self.publish(&inner);
                debug!(location = %location, token, "navigation committed");
            }
            Err(err) => {
                // Latest-token failure: pending ends, current_location and
                // history stay put. The error itself reaches the
                // presentation layer through the content future, not here.
                inner.pending = false;
                self.publish(&inner);
                debug!(location = %location, token, error = %err, "latest navigation failed");
            }
        }
    }

    fn publish(&self, inner: &ControllerState) {
        self.state_tx.send_replace(RouterState {
            current_location: inner.current_location.clone(),
            next_location: inner.next_location.clone(),
            content: inner.content.clone(),
            is_pending: inner.pending,
        });
    }
}

impl Drop for NavigationController {
    fn drop(&mut self) {
        self.detach_external_changes();
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
