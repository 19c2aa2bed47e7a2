#[cfg(test)]
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use crate::dao::models::{EventReportEntity, ProgramItemEntity, ServiceEntity, SessionEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for service rows, live sessions,
/// event programs and reports.
pub trait ScheduleStore: Send + Sync {
    /// Persist a batch of generated service rows in one write, returning the
    /// number of rows inserted.
    fn insert_services(
        &self,
        services: Vec<ServiceEntity>,
    ) -> BoxFuture<'static, StorageResult<usize>>;
    /// Delete every service row whose date falls in `[from, to)`, returning
    /// the number of rows removed.
    fn delete_services_between(
        &self,
        from: SystemTime,
        to: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>>;
    /// Count service rows whose date falls in `[from, to)`.
    fn count_services_between(
        &self,
        from: SystemTime,
        to: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>>;
    /// The most recent Sunday-service rows strictly before `cutoff`, ordered
    /// descending by date and limited to `limit` rows.
    fn last_sunday_services_before(
        &self,
        cutoff: SystemTime,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ServiceEntity>>>;
    /// The open (not yet ended) session for an event, if one exists.
    fn find_open_session(
        &self,
        event_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    /// Upsert the authoritative session row.
    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Ordered program items of an event.
    fn list_program_items(
        &self,
        event_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ProgramItemEntity>>>;
    /// Persist a planned-vs-actual event report.
    fn save_report(&self, report: EventReportEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap connectivity probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a dropped backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
