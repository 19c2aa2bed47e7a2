use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        admin::{DeleteYearSummary, GenerationSummary},
        sse::{
            PhaseChangedEvent, ScheduleDeletedEvent, ScheduleGeneratedEvent, ServerEvent,
            SessionUpdatedEvent, SystemStatus,
        },
        timer::SessionSnapshot,
    },
    state::{SharedState, state_machine::TimerPhase},
};

const EVENT_SESSION_UPDATED: &str = "session.updated";
const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_SCHEDULE_GENERATED: &str = "schedule.generated";
const EVENT_SCHEDULE_DELETED: &str = "schedule.deleted";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the current live-session snapshot to every subscriber.
pub fn broadcast_session_updated(state: &SharedState, snapshot: SessionSnapshot) {
    let payload = SessionUpdatedEvent(snapshot);
    send_public_event(state, EVENT_SESSION_UPDATED, &payload);
    send_admin_event(state, EVENT_SESSION_UPDATED, &payload);
}

/// Broadcast a timer phase change notification.
pub fn broadcast_phase_changed(state: &SharedState, phase: TimerPhase) {
    let payload = PhaseChangedEvent(phase.into());
    send_public_event(state, EVENT_PHASE_CHANGED, &payload);
    send_admin_event(state, EVENT_PHASE_CHANGED, &payload);
}

/// Broadcast the result of a yearly schedule generation to admins.
pub fn broadcast_schedule_generated(state: &SharedState, summary: GenerationSummary) {
    let payload = ScheduleGeneratedEvent(summary);
    send_admin_event(state, EVENT_SCHEDULE_GENERATED, &payload);
}

/// Broadcast the result of a yearly schedule deletion to admins.
pub fn broadcast_schedule_deleted(state: &SharedState, summary: DeleteYearSummary) {
    let payload = ScheduleDeletedEvent(summary);
    send_admin_event(state, EVENT_SCHEDULE_DELETED, &payload);
}

/// Broadcast a degraded-mode transition to every subscriber.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    let payload = SystemStatus { degraded };
    send_public_event(state, EVENT_SYSTEM_STATUS, &payload);
    send_admin_event(state, EVENT_SYSTEM_STATUS, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

fn send_admin_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.admin_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize admin SSE payload"),
    }
}
