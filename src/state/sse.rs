use tokio::sync::{Mutex, broadcast};

use crate::dto::sse::ServerEvent;

/// Broadcast hub fanning one event stream out to every SSE subscriber.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Hub backed by a Tokio broadcast channel of the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a subscriber; it only sees events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Push an event to all subscribers. Lagging or absent receivers are not
    /// an error.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

/// Admin stream bundle: its hub plus the token that serializes controllers.
pub struct AdminSseState {
    hub: SseHub,
    token: Mutex<Option<String>>,
}

impl AdminSseState {
    fn new(capacity: usize) -> Self {
        Self {
            hub: SseHub::new(capacity),
            token: Mutex::new(None),
        }
    }

    /// Hub carrying admin-only events.
    pub fn hub(&self) -> &SseHub {
        &self.hub
    }

    /// Token slot; holding the latest token makes a connection the active
    /// controller.
    pub fn token(&self) -> &Mutex<Option<String>> {
        &self.token
    }
}

/// Both SSE streams, carved out of the application state.
pub struct SseState {
    public: SseHub,
    admin: AdminSseState,
}

impl SseState {
    /// Build both hubs with their channel capacities.
    pub fn new(public_capacity: usize, admin_capacity: usize) -> Self {
        Self {
            public: SseHub::new(public_capacity),
            admin: AdminSseState::new(admin_capacity),
        }
    }

    /// Stream every projector and follower device watches.
    pub fn public(&self) -> &SseHub {
        &self.public
    }

    /// Stream reserved for the controlling admin client.
    pub fn admin(&self) -> &AdminSseState {
        &self.admin
    }
}
