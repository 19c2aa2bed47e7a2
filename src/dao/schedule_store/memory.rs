//! In-memory [`ScheduleStore`] used by service-level tests.

use std::{
    sync::{Arc, Mutex},
    time::SystemTime,
};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{
        EventReportEntity, ProgramItemEntity, ServiceEntity, ServiceType, SessionEntity,
    },
    schedule_store::ScheduleStore,
    storage::StorageResult,
};

#[derive(Default)]
struct MemoryState {
    services: Vec<ServiceEntity>,
    sessions: Vec<SessionEntity>,
    program_items: Vec<ProgramItemEntity>,
    reports: Vec<EventReportEntity>,
}

/// Store backed by plain vectors behind a mutex. Cheap to clone and share
/// between a test and the state under test.
#[derive(Clone, Default)]
pub struct MemoryScheduleStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed service rows, bypassing the insert path.
    pub fn seed_services(&self, services: Vec<ServiceEntity>) {
        self.state.lock().unwrap().services.extend(services);
    }

    /// Seed program items for an event.
    pub fn seed_program_items(&self, items: Vec<ProgramItemEntity>) {
        self.state.lock().unwrap().program_items.extend(items);
    }

    /// All service rows currently held.
    pub fn services(&self) -> Vec<ServiceEntity> {
        self.state.lock().unwrap().services.clone()
    }

    /// All session rows ever saved (a reset leaves the abandoned row behind).
    pub fn sessions(&self) -> Vec<SessionEntity> {
        self.state.lock().unwrap().sessions.clone()
    }

    /// All persisted reports.
    pub fn reports(&self) -> Vec<EventReportEntity> {
        self.state.lock().unwrap().reports.clone()
    }
}

impl ScheduleStore for MemoryScheduleStore {
    fn insert_services(
        &self,
        services: Vec<ServiceEntity>,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        let state = self.state.clone();
        Box::pin(async move {
            let count = services.len();
            state.lock().unwrap().services.extend(services);
            Ok(count)
        })
    }

    fn delete_services_between(
        &self,
        from: SystemTime,
        to: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let state = self.state.clone();
        Box::pin(async move {
            let mut guard = state.lock().unwrap();
            let before = guard.services.len();
            guard
                .services
                .retain(|service| service.service_date < from || service.service_date >= to);
            Ok((before - guard.services.len()) as u64)
        })
    }

    fn count_services_between(
        &self,
        from: SystemTime,
        to: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let state = self.state.clone();
        Box::pin(async move {
            let guard = state.lock().unwrap();
            let count = guard
                .services
                .iter()
                .filter(|service| service.service_date >= from && service.service_date < to)
                .count();
            Ok(count as u64)
        })
    }

    fn last_sunday_services_before(
        &self,
        cutoff: SystemTime,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ServiceEntity>>> {
        let state = self.state.clone();
        Box::pin(async move {
            let guard = state.lock().unwrap();
            let mut matching: Vec<ServiceEntity> = guard
                .services
                .iter()
                .filter(|service| {
                    service.service_type == ServiceType::Sunday && service.service_date < cutoff
                })
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.service_date.cmp(&a.service_date));
            matching.truncate(limit);
            Ok(matching)
        })
    }

    fn find_open_session(
        &self,
        event_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let state = self.state.clone();
        Box::pin(async move {
            let guard = state.lock().unwrap();
            Ok(guard
                .sessions
                .iter()
                .find(|session| session.event_id == event_id && session.event_end_time.is_none())
                .cloned())
        })
    }

    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let state = self.state.clone();
        Box::pin(async move {
            let mut guard = state.lock().unwrap();
            match guard
                .sessions
                .iter_mut()
                .find(|existing| existing.id == session.id)
            {
                Some(existing) => *existing = session,
                None => guard.sessions.push(session),
            }
            Ok(())
        })
    }

    fn list_program_items(
        &self,
        event_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ProgramItemEntity>>> {
        let state = self.state.clone();
        Box::pin(async move {
            let guard = state.lock().unwrap();
            let mut items: Vec<ProgramItemEntity> = guard
                .program_items
                .iter()
                .filter(|item| item.event_id == event_id)
                .cloned()
                .collect();
            items.sort_by_key(|item| item.position);
            Ok(items)
        })
    }

    fn save_report(&self, report: EventReportEntity) -> BoxFuture<'static, StorageResult<()>> {
        let state = self.state.clone();
        Box::pin(async move {
            let mut guard = state.lock().unwrap();
            match guard
                .reports
                .iter_mut()
                .find(|existing| existing.id == report.id)
            {
                Some(existing) => *existing = report,
                None => guard.reports.push(report),
            }
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
