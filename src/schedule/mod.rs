//! Deterministic yearly service planner.
//!
//! [`plan_year`] turns a target year plus the roster into the full slate of
//! service rows: two services per Sunday with rotating groups and a
//! constraint-checked director rotation, plus the quarantine contingency
//! services. The planner is pure; storage reads (prior-year history) and the
//! batch write happen in the service layer.

pub mod calendar;
pub mod rotation;

use std::collections::HashSet;

use time::Date;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::models::{ServiceEntity, ServiceType},
};
use calendar::{
    FIRST_SERVICE, QUARANTINE_SERVICE, SECOND_SERVICE, companion_sunday, month_name,
    quarantine_saturdays, quarantine_wednesdays, slot_instant, sundays_of_year,
};
use rotation::{GroupRotation, SlotKind, resolve_director, rotation_for_sunday};

/// Venue stamped onto every generated row; individual rows are edited by
/// admins afterwards.
const DEFAULT_LOCATION: &str = "Templo Central";
/// Display title of a regular Sunday service.
const SUNDAY_TITLE: &str = "Servicio Dominical";
/// Display title of a quarantine contingency service.
const QUARANTINE_TITLE: &str = "Servicio de Cuarentena";

/// Row counts reported back to the caller after generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationBreakdown {
    /// Number of Sunday service rows (two per Sunday).
    pub sunday_services: usize,
    /// Number of Saturday quarantine rows.
    pub quarantine_saturdays: usize,
    /// Number of Wednesday quarantine rows.
    pub quarantine_wednesdays: usize,
}

impl GenerationBreakdown {
    /// Total number of generated rows.
    pub fn total(&self) -> usize {
        self.sunday_services + self.quarantine_saturdays + self.quarantine_wednesdays
    }
}

/// Output of the planner: the rows to persist and their breakdown.
#[derive(Debug, Clone)]
pub struct YearPlan {
    /// Every generated service row, Sundays first, then quarantine dates.
    pub services: Vec<ServiceEntity>,
    /// Row counts per category.
    pub breakdown: GenerationBreakdown,
}

/// Generate the complete service slate for `year`.
///
/// `prior_rest` is the roster position of the group that rested on the last
/// Sunday of the previous December, when known; the first Sunday's rotation is
/// chosen to avoid repeating it. Rotation cursors are threaded through as
/// explicit accumulators so repeated calls with the same inputs produce
/// identical output.
pub fn plan_year(year: i32, roster: &AppConfig, prior_rest: Option<usize>) -> YearPlan {
    let sundays = sundays_of_year(year);
    let mut services = Vec::with_capacity(sundays.len() * 2 + 64);

    plan_sundays(year, roster, prior_rest, &sundays, &mut services);
    let sunday_services = services.len();

    let saturdays = quarantine_saturdays(year);
    let wednesdays = quarantine_wednesdays(year);
    let saturday_count = saturdays.len();
    let wednesday_count = wednesdays.len();

    plan_quarantine(
        roster,
        prior_rest,
        &sundays,
        saturdays.into_iter().chain(wednesdays),
        &mut services,
    );

    YearPlan {
        services,
        breakdown: GenerationBreakdown {
            sunday_services,
            quarantine_saturdays: saturday_count,
            quarantine_wednesdays: wednesday_count,
        },
    }
}

/// Emit the two Sunday services for every Sunday of the year.
fn plan_sundays(
    _year: i32,
    roster: &AppConfig,
    prior_rest: Option<usize>,
    sundays: &[Date],
    services: &mut Vec<ServiceEntity>,
) {
    // The director cursor restarts at the first Sunday of each calendar month
    // and advances once per emitted service.
    let mut month_cursor = 0usize;
    let mut current_month = None;

    for (sunday_index, sunday) in sundays.iter().enumerate() {
        if current_month != Some(sunday.month()) {
            current_month = Some(sunday.month());
            month_cursor = 0;
        }

        let group_rotation = rotation_for_sunday(sunday_index, prior_rest);
        let mut used_today: HashSet<String> = HashSet::new();

        let slots = [
            (SlotKind::SundayMorning, group_rotation.service1, FIRST_SERVICE),
            (SlotKind::SundayLater, group_rotation.service2, SECOND_SERVICE),
        ];

        for (slot, group_position, at) in slots {
            let director_index =
                resolve_director(roster, month_cursor, &used_today, slot, Some(&group_rotation));
            let director = &roster.directors()[director_index];
            used_today.insert(director.name.clone());

            services.push(service_row(
                SUNDAY_TITLE,
                ServiceType::Sunday,
                *sunday,
                at,
                &director.name,
                Some(roster.groups()[group_position].id),
            ));
            month_cursor += 1;
        }
    }
}

/// Emit one 19:00 quarantine service per contingency date, borrowing the
/// companion Sunday's resting group.
///
/// A single director cursor runs across the entire quarantine sequence; the
/// used set is fresh for each date (one slot per day).
fn plan_quarantine(
    roster: &AppConfig,
    prior_rest: Option<usize>,
    sundays: &[Date],
    dates: impl Iterator<Item = Date>,
    services: &mut Vec<ServiceEntity>,
) {
    let mut cursor = 0usize;

    for date in dates {
        let rest_group = companion_sunday(date)
            .and_then(|sunday| sundays.iter().position(|candidate| *candidate == sunday))
            .map(|index| rotation_for_sunday(index, prior_rest).rest)
            .unwrap_or_else(|| rotation_for_sunday(0, prior_rest).rest);

        let used_today = HashSet::new();
        let director_index =
            resolve_director(roster, cursor, &used_today, SlotKind::Quarantine, None);
        let director = &roster.directors()[director_index];

        services.push(service_row(
            QUARANTINE_TITLE,
            ServiceType::Quarantine,
            date,
            QUARANTINE_SERVICE,
            &director.name,
            Some(roster.groups()[rest_group].id),
        ));
        cursor += 1;
    }
}

fn service_row(
    title: &str,
    service_type: ServiceType,
    date: Date,
    at: time::Time,
    leader: &str,
    assigned_group_id: Option<Uuid>,
) -> ServiceEntity {
    ServiceEntity {
        id: Uuid::new_v4(),
        title: title.to_owned(),
        service_date: slot_instant(date, at),
        leader: leader.to_owned(),
        assigned_group_id,
        service_type,
        location: DEFAULT_LOCATION.to_owned(),
        is_confirmed: false,
        month_name: month_name(date.month()).to_owned(),
        month_order: Some(u8::from(date.month()) as i32),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use time::{Month, OffsetDateTime};

    fn roster() -> AppConfig {
        AppConfig::default()
    }

    fn date_of(service: &ServiceEntity) -> Date {
        OffsetDateTime::from(service.service_date).date()
    }

    fn sunday_pairs(plan: &YearPlan) -> HashMap<Date, Vec<&ServiceEntity>> {
        let mut by_date: HashMap<Date, Vec<&ServiceEntity>> = HashMap::new();
        for service in &plan.services {
            if service.service_type == ServiceType::Sunday {
                by_date.entry(date_of(service)).or_default().push(service);
            }
        }
        by_date
    }

    #[test]
    fn year_2026_row_counts_match_the_calendar() {
        let plan = plan_year(2026, &roster(), None);
        assert_eq!(plan.breakdown.sunday_services, 52 * 2);
        assert_eq!(plan.breakdown.quarantine_saturdays, 7);
        assert_eq!(plan.breakdown.quarantine_wednesdays, 45);
        assert_eq!(plan.breakdown.total(), 52 * 2 + 7 + 45);
        assert_eq!(plan.services.len(), plan.breakdown.total());
    }

    #[test]
    fn every_sunday_partitions_the_three_groups() {
        let roster = roster();
        let plan = plan_year(2026, &roster, None);

        for (date, pair) in sunday_pairs(&plan) {
            assert_eq!(pair.len(), 2, "{date} does not have two services");
            let first = pair[0].assigned_group_id.unwrap();
            let second = pair[1].assigned_group_id.unwrap();
            assert_ne!(first, second, "{date} repeats a group");
            // The implicit rest group is whichever id neither slot carries.
            let resting: Vec<_> = roster
                .groups()
                .iter()
                .filter(|group| group.id != first && group.id != second)
                .collect();
            assert_eq!(resting.len(), 1, "{date} does not leave one group resting");
        }
    }

    #[test]
    fn no_director_serves_both_sunday_services() {
        let plan = plan_year(2026, &roster(), None);
        for (date, pair) in sunday_pairs(&plan) {
            assert_ne!(pair[0].leader, pair[1].leader, "{date} repeats a leader");
        }
    }

    #[test]
    fn later_services_never_get_morning_only_directors() {
        let roster = roster();
        let plan = plan_year(2026, &roster, None);
        let restricted: Vec<&str> = roster
            .directors()
            .iter()
            .filter(|director| director.only_morning)
            .map(|director| director.name.as_str())
            .collect();

        for service in &plan.services {
            if service.service_type != ServiceType::Sunday {
                continue;
            }
            let at = OffsetDateTime::from(service.service_date).time();
            if at == SECOND_SERVICE {
                assert!(
                    !restricted.contains(&service.leader.as_str()),
                    "{} leads a 10:45 service on {}",
                    service.leader,
                    date_of(service)
                );
            }
        }
    }

    #[test]
    fn quarantine_services_use_the_companion_sundays_resting_group() {
        let roster = roster();
        let plan = plan_year(2026, &roster, None);
        let sundays = sundays_of_year(2026);

        for service in &plan.services {
            if service.service_type != ServiceType::Quarantine {
                continue;
            }
            let date = date_of(service);
            let companion = companion_sunday(date).unwrap();
            let index = sundays.iter().position(|sunday| *sunday == companion).unwrap();
            let rest = rotation_for_sunday(index, None).rest;
            assert_eq!(
                service.assigned_group_id,
                Some(roster.groups()[rest].id),
                "{date} does not borrow the resting group of {companion}"
            );
        }
    }

    #[test]
    fn first_sunday_continues_the_prior_december_rotation() {
        let roster = roster();
        for prior_rest in 0..3 {
            let plan = plan_year(2026, &roster, Some(prior_rest));
            let sundays = sundays_of_year(2026);
            let first = sundays[0];
            let pair: Vec<_> = plan
                .services
                .iter()
                .filter(|service| {
                    service.service_type == ServiceType::Sunday && date_of(service) == first
                })
                .collect();
            let singing: Vec<_> = pair
                .iter()
                .map(|service| service.assigned_group_id.unwrap())
                .collect();
            // The group that rested in December must sing on the first Sunday.
            assert!(singing.contains(&roster.groups()[prior_rest].id));
        }
    }

    #[test]
    fn month_boundaries_restart_the_director_cursor() {
        let roster = roster();
        let plan = plan_year(2026, &roster, None);
        let sundays = sundays_of_year(2026);

        let mut seen_month = None;
        for (index, sunday) in sundays.iter().enumerate() {
            if seen_month == Some(sunday.month()) {
                continue;
            }
            seen_month = Some(sunday.month());

            let rotation = rotation_for_sunday(index, None);
            let expected = resolve_director(
                &roster,
                0,
                &HashSet::new(),
                SlotKind::SundayMorning,
                Some(&rotation),
            );
            let morning = plan
                .services
                .iter()
                .find(|service| {
                    service.service_type == ServiceType::Sunday
                        && date_of(service) == *sunday
                        && OffsetDateTime::from(service.service_date).time() == FIRST_SERVICE
                })
                .unwrap();
            assert_eq!(
                morning.leader,
                roster.directors()[expected].name,
                "month starting {sunday} did not restart the cursor"
            );
        }
    }

    #[test]
    fn generated_rows_default_to_unconfirmed_with_month_metadata() {
        let plan = plan_year(2026, &roster(), None);
        for service in &plan.services {
            assert!(!service.is_confirmed);
            assert!(service.month_order.is_some());
            assert!(!service.month_name.is_empty());
        }
        let january = plan
            .services
            .iter()
            .find(|service| date_of(service).month() == Month::January)
            .unwrap();
        assert_eq!(january.month_name, "Enero");
        assert_eq!(january.month_order, Some(1));
    }

    #[test]
    fn planning_is_deterministic_apart_from_row_ids() {
        let roster = roster();
        let first = plan_year(2026, &roster, Some(1));
        let second = plan_year(2026, &roster, Some(1));
        assert_eq!(first.services.len(), second.services.len());
        for (a, b) in first.services.iter().zip(second.services.iter()) {
            assert_eq!(a.service_date, b.service_date);
            assert_eq!(a.leader, b.leader);
            assert_eq!(a.assigned_group_id, b.assigned_group_id);
            assert_eq!(a.service_type, b.service_type);
        }
    }
}
