//! Live timer session commands and the server-side ticker.

use std::time::{Duration, Instant, SystemTime};

use futures::try_join;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::timer::{SessionSnapshot, StatisticsReport},
    error::ServiceError,
    services::{sse_events, statistics},
    state::{
        SharedState,
        timer::{CommandError, LiveSession, ProgramItem, reconcile},
    },
};

/// Open the live session for an event, resuming the persisted open row when
/// one exists or creating a fresh one otherwise.
///
/// A session already held in memory for the same event is merged with the
/// stored row through [`reconcile`], so a restarted controller resumes from
/// the authoritative state.
pub async fn open_session(
    state: &SharedState,
    event_id: Uuid,
) -> Result<SessionSnapshot, ServiceError> {
    let store = state.require_schedule_store().await?;
    let (items, existing) = try_join!(
        store.list_program_items(event_id),
        store.find_open_session(event_id),
    )?;
    let program: Vec<ProgramItem> = items.into_iter().map(Into::into).collect();

    let session = match existing {
        Some(entity) => {
            let remote = LiveSession::from(entity);
            let local = state.session().read().await.clone();
            match local {
                Some(local) if local.event_id == event_id => reconcile(local, remote),
                _ => remote,
            }
        }
        None => {
            let fresh = LiveSession::new(event_id);
            store.save_session(fresh.to_entity(SystemTime::now())).await?;
            info!(event_id = %event_id, session_id = %fresh.id, "opened a new live session");
            fresh
        }
    };

    let snapshot = SessionSnapshot::from_session(&session, &program);
    *state.program().write().await = program;
    *state.session().write().await = Some(session);
    sse_events::broadcast_session_updated(state, snapshot.clone());
    Ok(snapshot)
}

/// Start (or resume into) the current section.
pub async fn start_timer(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    with_session(state, |session, _program| session.start(SystemTime::now())).await
}

/// End the current section and enter the preparation phase.
pub async fn stop_section(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    with_session(state, |session, program| session.stop_section(program)).await
}

/// Advance to the next section, finishing the event when none remain.
pub async fn next_section(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    with_session(state, |session, program| {
        session.advance_section(program, SystemTime::now())
    })
    .await
}

/// Jump directly to the section at `index`.
pub async fn skip_to_section(
    state: &SharedState,
    index: usize,
) -> Result<SessionSnapshot, ServiceError> {
    with_session(state, move |session, program| {
        session.skip_to_section(index, program)
    })
    .await
}

/// Reopen a previously completed section.
pub async fn restore_section(
    state: &SharedState,
    item_id: Uuid,
) -> Result<SessionSnapshot, ServiceError> {
    with_session(state, move |session, program| {
        session.restore_section(item_id, program)
    })
    .await
}

/// Pause or resume the active counter.
pub async fn toggle_pause(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    with_session(state, |session, _program| session.toggle_pause()).await
}

/// Abandon the current session row and open a fresh one for the same event.
///
/// The old row is left behind untouched; history and reports derived from it
/// remain queryable.
pub async fn reset_session(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    let store = state.require_schedule_store().await?;
    let program = state.program().read().await.clone();

    let (snapshot, entity) = {
        let mut guard = state.session().write().await;
        let session = guard.as_mut().ok_or_else(no_session)?;
        let fresh = LiveSession::new(session.event_id);
        info!(
            abandoned = %session.id,
            session_id = %fresh.id,
            "live session reset"
        );
        *session = fresh;
        (
            SessionSnapshot::from_session(session, &program),
            session.to_entity(SystemTime::now()),
        )
    };

    store.save_session(entity).await?;
    sse_events::broadcast_session_updated(state, snapshot.clone());
    sse_events::broadcast_phase_changed(state, crate::state::state_machine::TimerPhase::Idle);
    Ok(snapshot)
}

/// Derive a statistics report from the session's recorded times.
pub async fn session_statistics(state: &SharedState) -> Result<StatisticsReport, ServiceError> {
    let guard = state.session().read().await;
    let session = guard.as_ref().ok_or_else(no_session)?;
    let program = state.program().read().await;
    let figures = statistics::build_report(session, &program);
    Ok(StatisticsReport::from(&figures))
}

/// Derive a statistics report and persist it alongside the session.
///
/// The persisted row gets its own id and timestamp; the derivation itself
/// stays identical to what `session_statistics` returns.
pub async fn save_session_statistics(
    state: &SharedState,
) -> Result<StatisticsReport, ServiceError> {
    let store = state.require_schedule_store().await?;
    let figures = {
        let guard = state.session().read().await;
        let session = guard.as_ref().ok_or_else(no_session)?;
        let program = state.program().read().await;
        statistics::build_report(session, &program)
    };

    let report = StatisticsReport::from(&figures);
    store.save_report(figures.into_entity(SystemTime::now())).await?;
    info!(session_id = %report.session_id, "event report saved");
    Ok(report)
}

/// Drive the live session's counters once per second.
///
/// The persisted row trails the in-memory counters through the sync gate, so
/// the write rate stays bounded while followers still see every synced tick
/// through the SSE stream. Persistence failures are logged and retried on the
/// next synced tick rather than stopping the clock.
pub async fn run_ticker(state: SharedState) {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let synced = {
            let mut guard = state.session().write().await;
            let Some(session) = guard.as_mut() else {
                continue;
            };
            if !session.tick() {
                continue;
            }

            let mut gate = state.sync_gate().lock().await;
            gate.register_tick();
            if !gate.should_sync(Instant::now()) {
                continue;
            }
            gate.mark_synced(Instant::now());
            drop(gate);

            let program = state.program().read().await;
            (
                session.to_entity(SystemTime::now()),
                SessionSnapshot::from_session(session, &program),
            )
        };

        let (entity, snapshot) = synced;
        if let Some(store) = state.schedule_store().await {
            if let Err(err) = store.save_session(entity).await {
                warn!(error = %err, "failed to persist ticked session; will retry");
            }
        }
        sse_events::broadcast_session_updated(&state, snapshot);
    }
}

fn no_session() -> ServiceError {
    ServiceError::NotFound("no live session is open".into())
}

/// Run one command against the live session, persist the result and notify
/// subscribers. The phase-changed event is only emitted when the command
/// actually moved the state machine.
async fn with_session<F>(state: &SharedState, apply: F) -> Result<SessionSnapshot, ServiceError>
where
    F: FnOnce(&mut LiveSession, &[ProgramItem]) -> Result<(), CommandError>,
{
    let store = state.require_schedule_store().await?;
    let program = state.program().read().await.clone();

    let (snapshot, entity, before, after) = {
        let mut guard = state.session().write().await;
        let session = guard.as_mut().ok_or_else(no_session)?;
        let before = session.phase();
        apply(session, &program)?;
        (
            SessionSnapshot::from_session(session, &program),
            session.to_entity(SystemTime::now()),
            before,
            session.phase(),
        )
    };

    store.save_session(entity).await?;
    sse_events::broadcast_session_updated(state, snapshot.clone());
    if after != before {
        sse_events::broadcast_phase_changed(state, after);
    }
    Ok(snapshot)
}
