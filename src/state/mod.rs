mod sse;
pub mod state_machine;
pub mod timer;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, watch};

use crate::config::AppConfig;
use crate::dao::schedule_store::ScheduleStore;

pub use self::sse::SseHub;
use self::sse::SseState;
use self::timer::{LiveSession, ProgramItem, SyncGate};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, SSE hubs, the ministry roster
/// and the in-memory live session.
pub struct AppState {
    schedule_store: RwLock<Option<Arc<dyn ScheduleStore>>>,
    sse: SseState,
    roster: AppConfig,
    session: RwLock<Option<LiveSession>>,
    program: RwLock<Vec<ProgramItem>>,
    sync_gate: Mutex<SyncGate>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct the state wrapped in an [`Arc`] so handlers can clone it.
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed by the supervisor.
    pub fn new(roster: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            schedule_store: RwLock::new(None),
            sse: SseState::new(16, 16),
            roster,
            session: RwLock::new(None),
            program: RwLock::new(Vec::new()),
            sync_gate: Mutex::new(SyncGate::new()),
            degraded: degraded_tx,
        })
    }

    /// Handle to the current schedule store, if one is installed.
    pub async fn schedule_store(&self) -> Option<Arc<dyn ScheduleStore>> {
        let guard = self.schedule_store.read().await;
        guard.as_ref().cloned()
    }

    /// Handle to the schedule store, failing when running degraded.
    pub async fn require_schedule_store(
        &self,
    ) -> Result<Arc<dyn ScheduleStore>, crate::error::ServiceError> {
        self.schedule_store()
            .await
            .ok_or(crate::error::ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn install_schedule_store(&self, store: Arc<dyn ScheduleStore>) {
        {
            let mut guard = self.schedule_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Drop the storage backend and enter degraded mode.
    pub async fn clear_schedule_store(&self) {
        {
            let mut guard = self.schedule_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Whether the application is currently running without healthy storage.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded-mode changes.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Hub behind the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        self.sse.public()
    }

    /// Hub behind the admin SSE stream.
    pub fn admin_sse(&self) -> &SseHub {
        self.sse.admin().hub()
    }

    /// Token that marks the single active admin SSE subscriber.
    pub fn admin_token(&self) -> &Mutex<Option<String>> {
        self.sse.admin().token()
    }

    /// Configured worship groups and director rotation.
    pub fn roster(&self) -> &AppConfig {
        &self.roster
    }

    /// Live session currently driven by the ticker, if any.
    pub fn session(&self) -> &RwLock<Option<LiveSession>> {
        &self.session
    }

    /// Program items of the event the live session belongs to.
    pub fn program(&self) -> &RwLock<Vec<ProgramItem>> {
        &self.program
    }

    /// Write-throttle shared between the ticker and the command handlers.
    pub fn sync_gate(&self) -> &Mutex<SyncGate> {
        &self.sync_gate
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub(crate) async fn update_degraded(&self, value: bool) {
        if self.is_degraded().await == value {
            return;
        }

        let _ = self.degraded.send(value);
    }
}
