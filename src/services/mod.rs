/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Yearly schedule generation and deletion.
pub mod schedule_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Statistics derivation from recorded section times.
pub mod statistics;
/// Storage reconnection supervisor.
pub mod storage_supervisor;
/// Live timer session commands and the server-side ticker.
pub mod timer_service;
