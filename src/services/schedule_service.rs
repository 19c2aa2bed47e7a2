//! Yearly schedule generation and deletion.

use std::time::SystemTime;

use futures::try_join;
use time::{Date, Month, Time};
use tracing::info;

use crate::{
    dao::models::ServiceEntity,
    dto::admin::{DeleteYearSummary, GenerationSummary},
    error::ServiceError,
    schedule::{calendar::slot_instant, plan_year},
    services::sse_events,
    state::SharedState,
};

/// Generate and persist the full service slate for `year`.
///
/// The year must be empty: regeneration requires an explicit delete first so
/// manual edits are never silently overwritten. The first Sunday's rotation
/// continues from the previous December when history exists in storage.
pub async fn generate_year(
    state: &SharedState,
    year: i32,
) -> Result<GenerationSummary, ServiceError> {
    let store = state.require_schedule_store().await?;
    let (from, to) = year_bounds(year)?;

    let (existing, prior_december) = try_join!(
        store.count_services_between(from, to),
        store.last_sunday_services_before(from, 2),
    )?;
    if existing > 0 {
        return Err(ServiceError::InvalidState(format!(
            "year {year} already has {existing} services; delete them before regenerating"
        )));
    }

    let prior_rest = infer_prior_rest(state, &prior_december);
    let plan = plan_year(year, state.roster(), prior_rest);
    let inserted = store.insert_services(plan.services).await?;

    info!(
        year,
        inserted,
        continued = prior_rest.is_some(),
        "yearly schedule generated"
    );
    let summary =
        GenerationSummary::from_breakdown(year, &plan.breakdown, inserted, prior_rest.is_some());
    sse_events::broadcast_schedule_generated(state, summary.clone());
    Ok(summary)
}

/// Delete every generated service of `year`.
pub async fn delete_year(state: &SharedState, year: i32) -> Result<DeleteYearSummary, ServiceError> {
    let store = state.require_schedule_store().await?;
    let (from, to) = year_bounds(year)?;

    let deleted = store.delete_services_between(from, to).await?;
    info!(year, deleted, "yearly schedule deleted");

    let summary = DeleteYearSummary { year, deleted };
    sse_events::broadcast_schedule_deleted(state, summary.clone());
    Ok(summary)
}

/// Half-open `[Jan 1 of year, Jan 1 of year+1)` as persisted instants.
fn year_bounds(year: i32) -> Result<(SystemTime, SystemTime), ServiceError> {
    let start = Date::from_calendar_date(year, Month::January, 1)
        .map_err(|err| ServiceError::InvalidInput(format!("invalid year {year}: {err}")))?;
    let end = Date::from_calendar_date(year + 1, Month::January, 1)
        .map_err(|err| ServiceError::InvalidInput(format!("invalid year {year}: {err}")))?;
    Ok((
        slot_instant(start, Time::MIDNIGHT),
        slot_instant(end, Time::MIDNIGHT),
    ))
}

/// Roster position of the group that rested on the last prior-year Sunday.
///
/// The two most recent Sunday rows before January 1st carry the two singing
/// groups of that Sunday; the resting group is whichever of the three appears
/// in neither. Any gap in the data (different dates, unknown group ids, fewer
/// than two rows) disables the continuation and the bootstrap rotation is
/// used instead.
fn infer_prior_rest(state: &SharedState, prior_december: &[ServiceEntity]) -> Option<usize> {
    let [first, second] = prior_december else {
        return None;
    };
    if date_only(first.service_date) != date_only(second.service_date) {
        return None;
    }

    let roster = state.roster();
    let sang_first = roster.group_position_by_id(first.assigned_group_id?)?;
    let sang_second = roster.group_position_by_id(second.assigned_group_id?)?;
    (0..roster.groups().len()).find(|position| *position != sang_first && *position != sang_second)
}

fn date_only(at: SystemTime) -> Date {
    time::OffsetDateTime::from(at).date()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::ServiceType,
            schedule_store::memory::MemoryScheduleStore,
        },
        state::AppState,
    };
    use std::sync::Arc;
    use time::macros::time;
    use uuid::Uuid;

    async fn state_with_store() -> (crate::state::SharedState, MemoryScheduleStore) {
        let state = AppState::new(AppConfig::default());
        let store = MemoryScheduleStore::new();
        state.install_schedule_store(Arc::new(store.clone())).await;
        (state, store)
    }

    fn december_sunday_row(roster: &AppConfig, group_position: usize, at: Time) -> ServiceEntity {
        let date = Date::from_calendar_date(2025, Month::December, 28).unwrap();
        ServiceEntity {
            id: Uuid::new_v4(),
            title: "Servicio Dominical".into(),
            service_date: slot_instant(date, at),
            leader: "Lucía Ferrer".into(),
            assigned_group_id: Some(roster.groups()[group_position].id),
            service_type: ServiceType::Sunday,
            location: "Templo Central".into(),
            is_confirmed: true,
            month_name: "Diciembre".into(),
            month_order: Some(12),
        }
    }

    #[tokio::test]
    async fn generating_an_empty_year_inserts_the_full_slate() {
        let (state, store) = state_with_store().await;
        let summary = generate_year(&state, 2026).await.unwrap();

        assert_eq!(summary.total_inserted, 52 * 2 + 7 + 45);
        assert!(!summary.continued_from_prior_year);
        assert_eq!(store.services().len(), summary.total_inserted);
    }

    #[tokio::test]
    async fn generating_twice_is_rejected() {
        let (state, _store) = state_with_store().await;
        generate_year(&state, 2026).await.unwrap();

        let err = generate_year(&state, 2026).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn prior_december_history_drives_the_first_rotation() {
        let (state, store) = state_with_store().await;
        // Groups 0 and 1 sang the last December Sunday, so group 2 rested and
        // must sing on the first Sunday of the new year.
        store.seed_services(vec![
            december_sunday_row(state.roster(), 0, time!(8:00)),
            december_sunday_row(state.roster(), 1, time!(10:45)),
        ]);

        let summary = generate_year(&state, 2026).await.unwrap();
        assert!(summary.continued_from_prior_year);

        let resting_id = state.roster().groups()[2].id;
        let first_sunday = slot_instant(
            Date::from_calendar_date(2026, Month::January, 4).unwrap(),
            Time::MIDNIGHT,
        );
        let next_day = slot_instant(
            Date::from_calendar_date(2026, Month::January, 5).unwrap(),
            Time::MIDNIGHT,
        );
        let singing: Vec<_> = store
            .services()
            .into_iter()
            .filter(|service| {
                service.service_type == ServiceType::Sunday
                    && service.service_date >= first_sunday
                    && service.service_date < next_day
            })
            .filter_map(|service| service.assigned_group_id)
            .collect();
        assert!(singing.contains(&resting_id));
    }

    #[tokio::test]
    async fn delete_year_removes_only_that_year() {
        let (state, store) = state_with_store().await;
        store.seed_services(vec![december_sunday_row(state.roster(), 0, time!(8:00))]);
        generate_year(&state, 2026).await.unwrap();

        let summary = delete_year(&state, 2026).await.unwrap();
        assert_eq!(summary.deleted, (52 * 2 + 7 + 45) as u64);
        // The seeded 2025 row survives.
        assert_eq!(store.services().len(), 1);
    }

    #[tokio::test]
    async fn degraded_mode_refuses_generation() {
        let state = AppState::new(AppConfig::default());
        let err = generate_year(&state, 2026).await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }
}
