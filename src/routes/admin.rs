use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, post},
};
use validator::Validate;

use crate::{
    dto::admin::{DeleteYearSummary, GenerateYearRequest, GenerationSummary},
    error::AppError,
    services::schedule_service,
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only endpoints for generating and wiping yearly schedules.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/services/generate", post(generate_services))
        .route("/admin/services/{year}", delete(delete_services))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Generate the full yearly service schedule.
#[utoipa::path(
    post,
    path = "/admin/services/generate",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = GenerateYearRequest,
    responses(
        (status = 200, description = "Schedule generated", body = GenerationSummary),
        (status = 409, description = "The year already has generated services")
    )
)]
pub async fn generate_services(
    State(state): State<SharedState>,
    Json(payload): Json<GenerateYearRequest>,
) -> Result<Json<GenerationSummary>, AppError> {
    payload.validate()?;
    let summary = schedule_service::generate_year(&state, payload.year).await?;
    Ok(Json(summary))
}

/// Delete every generated service of a year.
#[utoipa::path(
    delete,
    path = "/admin/services/{year}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("year" = i32, Path, description = "Calendar year to wipe")),
    responses((status = 200, description = "Schedule deleted", body = DeleteYearSummary))
)]
pub async fn delete_services(
    State(state): State<SharedState>,
    Path(year): Path<i32>,
) -> Result<Json<DeleteYearSummary>, AppError> {
    let summary = schedule_service::delete_year(&state, year).await?;
    Ok(Json(summary))
}

/// Reject requests that do not carry the token issued to the active admin
/// SSE stream.
pub(crate) async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    let expected = {
        let guard = state.admin_token().lock().await;
        guard.clone()
    };

    match expected {
        Some(token) if token == provided => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid admin token".into())),
        None => Err(AppError::Unauthorized(
            "admin SSE stream not initialised yet".into(),
        )),
    }
}
