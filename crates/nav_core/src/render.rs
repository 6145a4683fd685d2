//! Deferred-commit render scheduling.
//!
//! The previously painted tree stays visible and interactive while a new
//! navigation's content future is outstanding; the visible tree only swaps,
//! atomically, once that future resolves. A newer published state abandons
//! the wait on a superseded future, so superseded results (success or
//! failure) never reach the painter.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shared::{error::ContentError, location::Location, tree::RenderTree};
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::{ContentFuture, RouterState};

/// Paint capability consumed by the scheduler. `paint_fallback` is the
/// error-boundary substitute for a failed latest navigation.
#[async_trait]
pub trait TreePainter: Send + Sync {
    async fn paint(&self, location: &Location, tree: &RenderTree);
    async fn paint_fallback(&self, location: &Location, error: &ContentError);
}

/// The committed half of the double buffer: what is currently on screen.
#[derive(Debug, Clone)]
pub struct CommittedView {
    pub location: Location,
    pub tree: Arc<RenderTree>,
}

struct SchedulerShared {
    committed: Mutex<Option<CommittedView>>,
}

impl SchedulerShared {
    fn committed(&self) -> Option<CommittedView> {
        self.committed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn swap(&self, view: CommittedView) {
        *self
            .committed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(view);
    }
}

/// Read-only view of the scheduler for sibling UI: the pending indicator
/// and the currently committed tree stay observable while a navigation's
/// content is still streaming in.
#[derive(Clone)]
pub struct RenderHandle {
    states: watch::Receiver<RouterState>,
    shared: Arc<SchedulerShared>,
}

impl RenderHandle {
    /// True whenever the latest navigation's content has not yet resolved
    /// relative to what is painted.
    pub fn is_pending(&self) -> bool {
        self.states.borrow().is_pending
    }

    pub fn committed(&self) -> Option<CommittedView> {
        self.shared.committed()
    }
}

/// Drives published router states to the painter with deferred-commit
/// semantics.
pub struct RenderScheduler {
    states: watch::Receiver<RouterState>,
    painter: Arc<dyn TreePainter>,
    shared: Arc<SchedulerShared>,
}

impl RenderScheduler {
    pub fn new(states: watch::Receiver<RouterState>, painter: Arc<dyn TreePainter>) -> Self {
        Self {
            states,
            painter,
            shared: Arc::new(SchedulerShared {
                committed: Mutex::new(None),
            }),
        }
    }

    pub fn handle(&self) -> RenderHandle {
        RenderHandle {
            states: self.states.clone(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// True when an unseen published state carries a different content
    /// future than the one just resolved.
    fn is_superseded(&self, content: &ContentFuture) -> bool {
        match self.states.has_changed() {
            Ok(true) => self
                .states
                .borrow()
                .content
                .as_ref()
                .map_or(true, |latest| latest.id() != content.id()),
            Ok(false) | Err(_) => false,
        }
    }

    /// Runs until the state publisher goes away. Each content future is
    /// painted at most once; a state change observed while waiting on a
    /// future re-evaluates against the newer future instead.
    pub async fn run(mut self) {
        // 0 is never a ContentFuture id.
        let mut last_painted = 0u64;
        loop {
            let snapshot = self.states.borrow_and_update().clone();
            let content = snapshot.content.clone().filter(|c| c.id() != last_painted);

            if let Some(content) = content {
                enum Step {
                    StateChanged(bool),
                    Resolved(Result<Arc<RenderTree>, ContentError>),
                }

                let step = tokio::select! {
                    changed = self.states.changed() => Step::StateChanged(changed.is_ok()),
                    outcome = content.tree() => Step::Resolved(outcome),
                };

                match step {
                    Step::StateChanged(false) => break,
                    Step::StateChanged(true) => {
                        trace!("newer router state observed while content was outstanding");
                    }
                    Step::Resolved(outcome) => {
                        // Both select arms can be ready at once: a newer
                        // state published in the same quiescent window as
                        // the old future's resolution. Re-check before
                        // painting; a superseded result must never reach
                        // the painter.
                        if self.is_superseded(&content) {
                            trace!("superseded content resolved alongside a state change, not painting");
                            continue;
                        }
                        last_painted = content.id();
                        match outcome {
                            Ok(tree) => {
                                self.shared.swap(CommittedView {
                                    location: snapshot.next_location.clone(),
                                    tree: Arc::clone(&tree),
                                });
                                debug!(location = %snapshot.next_location, "committed tree swapped");
                                self.painter.paint(&snapshot.next_location, &tree).await;
                            }
                            Err(error) => {
                                // Error boundary: fallback replaces the
                                // subtree, the committed buffer stays.
                                debug!(location = %snapshot.next_location, %error, "painting fallback");
                                self.painter
                                    .paint_fallback(&snapshot.next_location, &error)
                                    .await;
                            }
                        }
                    }
                }
                continue;
            }

            if self.states.changed().await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
