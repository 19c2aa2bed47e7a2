use serde::Serialize;
use utoipa::ToSchema;

/// Response body of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether the backend is currently running without a storage connection.
    pub storage_degraded: bool,
}

impl HealthResponse {
    /// Storage is reachable and the service is fully operational.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            storage_degraded: false,
        }
    }

    /// The service is up but scheduling and persistence are unavailable.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
            storage_degraded: true,
        }
    }
}
