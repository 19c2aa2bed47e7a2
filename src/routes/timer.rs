use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::timer::{SessionSnapshot, StatisticsReport},
    error::AppError,
    routes::admin::require_admin_token,
    services::timer_service,
    state::SharedState,
};

/// Routes driving the live event timer. All of them require the admin token
/// issued to the controlling SSE stream.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/events/{event_id}/session", post(open_session))
        .route("/timer/start", post(start_timer))
        .route("/timer/stop-section", post(stop_section))
        .route("/timer/next-section", post(next_section))
        .route("/timer/skip/{index}", post(skip_to_section))
        .route("/timer/restore/{item_id}", post(restore_section))
        .route("/timer/toggle-pause", post(toggle_pause))
        .route("/timer/reset", post(reset_session))
        .route("/timer/statistics", get(session_statistics))
        .route("/timer/statistics/save", post(save_statistics))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Open (or resume) the live session for an event.
#[utoipa::path(
    post,
    path = "/events/{event_id}/session",
    tag = "timer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("event_id" = String, Path, description = "Identifier of the event to open a session for")),
    responses((status = 200, description = "Session opened or resumed", body = SessionSnapshot))
)]
pub async fn open_session(
    State(state): State<SharedState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(timer_service::open_session(&state, event_id).await?))
}

/// Start (or resume into) the current section.
#[utoipa::path(
    post,
    path = "/timer/start",
    tag = "timer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses(
        (status = 200, description = "Section counter started", body = SessionSnapshot),
        (status = 409, description = "The timer cannot start from its current phase")
    )
)]
pub async fn start_timer(
    State(state): State<SharedState>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(timer_service::start_timer(&state).await?))
}

/// End the current section and enter the preparation phase.
#[utoipa::path(
    post,
    path = "/timer/stop-section",
    tag = "timer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses(
        (status = 200, description = "Section completed", body = SessionSnapshot),
        (status = 409, description = "No section counter is live")
    )
)]
pub async fn stop_section(
    State(state): State<SharedState>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(timer_service::stop_section(&state).await?))
}

/// Advance to the next section, finishing the event when none remain.
#[utoipa::path(
    post,
    path = "/timer/next-section",
    tag = "timer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Moved to the next section", body = SessionSnapshot))
)]
pub async fn next_section(
    State(state): State<SharedState>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(timer_service::next_section(&state).await?))
}

/// Jump directly to the section at the given index.
#[utoipa::path(
    post,
    path = "/timer/skip/{index}",
    tag = "timer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("index" = usize, Path, description = "Zero-based index of the target section")),
    responses(
        (status = 200, description = "Skipped to the section", body = SessionSnapshot),
        (status = 400, description = "Index is outside the program")
    )
)]
pub async fn skip_to_section(
    State(state): State<SharedState>,
    Path(index): Path<usize>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(timer_service::skip_to_section(&state, index).await?))
}

/// Reopen a previously completed section.
#[utoipa::path(
    post,
    path = "/timer/restore/{item_id}",
    tag = "timer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("item_id" = String, Path, description = "Identifier of the completed section to reopen")),
    responses(
        (status = 200, description = "Section reopened", body = SessionSnapshot),
        (status = 400, description = "The section was never completed")
    )
)]
pub async fn restore_section(
    State(state): State<SharedState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(timer_service::restore_section(&state, item_id).await?))
}

/// Pause or resume the active counter.
#[utoipa::path(
    post,
    path = "/timer/toggle-pause",
    tag = "timer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Pause toggled", body = SessionSnapshot))
)]
pub async fn toggle_pause(
    State(state): State<SharedState>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(timer_service::toggle_pause(&state).await?))
}

/// Abandon the current session and open a fresh one for the same event.
#[utoipa::path(
    post,
    path = "/timer/reset",
    tag = "timer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Session reset", body = SessionSnapshot))
)]
pub async fn reset_session(
    State(state): State<SharedState>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(timer_service::reset_session(&state).await?))
}

/// Derive a statistics report from the recorded section times.
#[utoipa::path(
    get,
    path = "/timer/statistics",
    tag = "timer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Statistics report", body = StatisticsReport))
)]
pub async fn session_statistics(
    State(state): State<SharedState>,
) -> Result<Json<StatisticsReport>, AppError> {
    Ok(Json(timer_service::session_statistics(&state).await?))
}

/// Derive and persist a statistics report for the current session.
#[utoipa::path(
    post,
    path = "/timer/statistics/save",
    tag = "timer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Report saved", body = StatisticsReport))
)]
pub async fn save_statistics(
    State(state): State<SharedState>,
) -> Result<Json<StatisticsReport>, AppError> {
    Ok(Json(timer_service::save_session_statistics(&state).await?))
}
