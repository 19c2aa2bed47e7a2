use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{
    admin::{DeleteYearSummary, GenerationSummary},
    timer::{SessionSnapshot, VisibleTimerPhase},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream (`public` or `admin`).
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
    /// Optional admin token returned when the stream is privileged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Token refresh payload pushed onto the admin stream.
pub struct AdminHandshake {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever the timer phase changes.
pub struct PhaseChangedEvent(pub VisibleTimerPhase);

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast on every synced tick and after every timer command.
pub struct SessionUpdatedEvent(pub SessionSnapshot);

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast when a yearly schedule was generated.
pub struct ScheduleGeneratedEvent(pub GenerationSummary);

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast when a yearly schedule was deleted.
pub struct ScheduleDeletedEvent(pub DeleteYearSummary);
