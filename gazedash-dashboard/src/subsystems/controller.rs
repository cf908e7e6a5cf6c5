//! Session controller. Keeps `{ session, events, stats, loading, error }`
//! consistent with the currently selected session id
//!
//! Each id change starts a fetch cycle:
//! - the previous cycle's cancellation token is cancelled first
//! - session, events and stats are requested concurrently with one shared token
//! - results are committed only when all three succeed, and only if the cycle
//!   is still the latest one
//!
//! Cycle identity is a sequence number stored in the watched state itself, so
//! the staleness check and the write happen under the same lock inside
//! `watch::Sender::send_if_modified`. A superseded cycle never becomes
//! observable, whether it finished, failed, or was cancelled.

use std::sync::Arc;

use futures::future;
use gazedash_core::{Event, RequestError, Session, SessionGateway, Stats};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Which reads a cycle issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchScope {
    /// Session, events and stats (the session detail view).
    #[default]
    Full,
    /// Events only (the timeline view). `session` and `stats` are left alone.
    EventsOnly,
}

/// How a single fetch cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Committed,
    Failed(String),
    /// Cancelled or overtaken by a newer cycle. Produces no observable effect.
    Superseded,
    /// There was no session id, so nothing was requested.
    MissingId,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub session_id: Option<String>,
    pub session: Option<Session>,
    pub events: Vec<Event>,
    pub stats: Option<Stats>,
    pub loading: bool,
    pub error: Option<String>,
    /// Sequence number of the latest cycle. Bumped on every id change.
    pub cycle: u64,
}

/// The condition a view should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus<'a> {
    /// No session id to load; nothing was requested.
    MissingId,
    Loading,
    Failed(&'a str),
    Ready,
}

impl SessionState {
    pub fn status(&self) -> ViewStatus<'_> {
        if self.session_id.is_none() {
            ViewStatus::MissingId
        } else if self.loading {
            ViewStatus::Loading
        } else if let Some(error) = &self.error {
            ViewStatus::Failed(error)
        } else {
            ViewStatus::Ready
        }
    }
}

enum Fetched {
    Full {
        session: Session,
        events: Vec<Event>,
        stats: Stats,
    },
    EventsOnly {
        events: Vec<Event>,
    },
}

pub struct SessionController {
    gateway: Arc<dyn SessionGateway>,
    scope: FetchScope,
    state: Arc<watch::Sender<SessionState>>,
    active: Option<CancellationToken>,
}

impl SessionController {
    pub fn new(gateway: Arc<dyn SessionGateway>) -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self {
            gateway,
            scope: FetchScope::Full,
            state: Arc::new(tx),
            active: None,
        }
    }

    pub fn with_scope(mut self, scope: FetchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Point the controller at `id`, superseding any cycle in flight.
    ///
    /// Returns the spawned cycle, or `None` when `id` is missing (in which
    /// case no request is made). Must be called from within a Tokio runtime.
    pub fn set_session_id(&mut self, id: Option<&str>) -> Option<JoinHandle<CycleOutcome>> {
        self.cancel_active();

        let id = id.map(str::trim).filter(|id| !id.is_empty());

        let mut cycle = 0;
        self.state.send_modify(|s| {
            s.cycle += 1;
            cycle = s.cycle;
            s.session_id = id.map(str::to_string);
            s.error = None;
            match id {
                Some(_) => s.loading = true,
                None => {
                    s.loading = false;
                    s.session = None;
                    s.events.clear();
                    s.stats = None;
                }
            }
        });

        let Some(id) = id else {
            tracing::debug!(cycle, "No session id; nothing to load");
            return None;
        };

        let token = CancellationToken::new();
        self.active = Some(token.clone());

        Some(tokio::spawn(run_cycle(
            self.gateway.clone(),
            self.state.clone(),
            self.scope,
            id.to_string(),
            cycle,
            token,
        )))
    }

    /// Start a cycle for `id` and wait for it to finish.
    pub async fn load(&mut self, id: &str) -> CycleOutcome {
        let Some(handle) = self.set_session_id(Some(id)) else {
            return CycleOutcome::MissingId;
        };
        join_cycle(handle).await
    }

    /// Cancel the outstanding cycle, if any. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        self.cancel_active();
    }

    fn cancel_active(&mut self) {
        if let Some(token) = self.active.take() {
            token.cancel();
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.cancel_active();
    }
}

/// Wait for a spawned cycle. A panicked or aborted task is logged and
/// reported as a failure.
pub async fn join_cycle(handle: JoinHandle<CycleOutcome>) -> CycleOutcome {
    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "Fetch cycle task failed");
            CycleOutcome::Failed(format!("fetch task failed: {}", e))
        }
    }
}

async fn run_cycle(
    gateway: Arc<dyn SessionGateway>,
    state: Arc<watch::Sender<SessionState>>,
    scope: FetchScope,
    id: String,
    cycle: u64,
    token: CancellationToken,
) -> CycleOutcome {
    tracing::info!(session_id = %id, cycle, ?scope, "Fetch cycle started");

    let fetched = tokio::select! {
        biased;
        _ = token.cancelled() => Err(RequestError::Cancelled),
        result = fetch(gateway.as_ref(), scope, &id, &token) => result,
    };

    let outcome = match fetched {
        Ok(data) => {
            let committed = commit(&state, cycle, &token, |s| {
                match data {
                    Fetched::Full {
                        session,
                        events,
                        stats,
                    } => {
                        s.session = Some(session);
                        s.events = events;
                        s.stats = Some(stats);
                    }
                    Fetched::EventsOnly { events } => s.events = events,
                }
                s.loading = false;
                s.error = None;
            });
            if committed {
                CycleOutcome::Committed
            } else {
                CycleOutcome::Superseded
            }
        }
        Err(e) if e.is_cancelled() => CycleOutcome::Superseded,
        Err(e) => {
            let message = e.user_message();
            let committed = commit(&state, cycle, &token, |s| {
                s.loading = false;
                s.error = Some(message.clone());
            });
            if committed {
                tracing::warn!(session_id = %id, cycle, error = %message, "Fetch cycle failed");
                CycleOutcome::Failed(message)
            } else {
                CycleOutcome::Superseded
            }
        }
    };

    match &outcome {
        CycleOutcome::Committed => tracing::info!(session_id = %id, cycle, "Fetch cycle committed"),
        CycleOutcome::Superseded => {
            tracing::debug!(session_id = %id, cycle, "Fetch cycle superseded; results dropped")
        }
        CycleOutcome::Failed(_) | CycleOutcome::MissingId => {}
    }

    outcome
}

async fn fetch(
    gateway: &dyn SessionGateway,
    scope: FetchScope,
    id: &str,
    token: &CancellationToken,
) -> Result<Fetched, RequestError> {
    match scope {
        FetchScope::Full => {
            // First failure drops the other two requests.
            let (session, events, stats) = future::try_join3(
                gateway.get_session(id, Some(token)),
                gateway.get_session_events(id, Some(token)),
                gateway.get_session_stats(id, Some(token)),
            )
            .await?;
            Ok(Fetched::Full {
                session,
                events,
                stats,
            })
        }
        FetchScope::EventsOnly => {
            let events = gateway.get_session_events(id, Some(token)).await?;
            Ok(Fetched::EventsOnly { events })
        }
    }
}

/// Apply `apply` only if `cycle` is still the latest and was not cancelled.
fn commit(
    state: &watch::Sender<SessionState>,
    cycle: u64,
    token: &CancellationToken,
    apply: impl FnOnce(&mut SessionState),
) -> bool {
    state.send_if_modified(|s| {
        if s.cycle != cycle || token.is_cancelled() {
            return false;
        }
        apply(s);
        true
    })
}

// ============================================================================
// TESTS
// ============================================================================
