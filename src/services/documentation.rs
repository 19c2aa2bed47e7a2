use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the worship ministry backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::sse::admin_stream,
        crate::routes::admin::generate_services,
        crate::routes::admin::delete_services,
        crate::routes::timer::open_session,
        crate::routes::timer::start_timer,
        crate::routes::timer::stop_section,
        crate::routes::timer::next_section,
        crate::routes::timer::skip_to_section,
        crate::routes::timer::restore_section,
        crate::routes::timer::toggle_pause,
        crate::routes::timer::reset_session,
        crate::routes::timer::session_statistics,
        crate::routes::timer::save_statistics,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::admin::GenerateYearRequest,
            crate::dto::admin::GenerationSummary,
            crate::dto::admin::DeleteYearSummary,
            crate::dto::common::ProgramItemSnapshot,
            crate::dto::timer::SessionSnapshot,
            crate::dto::timer::VisibleTimerPhase,
            crate::dto::timer::StatisticsReport,
            crate::dto::timer::ItemStatistics,
            crate::dto::sse::AdminHandshake,
            crate::dto::sse::Handshake,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "admin", description = "Yearly schedule administration"),
        (name = "timer", description = "Live event timer operations"),
    )
)]
pub struct ApiDoc;
