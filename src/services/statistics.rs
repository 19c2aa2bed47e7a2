//! Statistics derivation from a session's recorded section times.

use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    dao::models::{EventReportEntity, ItemReportEntity},
    state::timer::{LiveSession, ProgramItem},
};

/// A per-section recommendation is only produced when the deviation exceeds
/// this many seconds in either direction.
pub const RECOMMENDATION_THRESHOLD_SECONDS: i64 = 60;

/// Figures derived from a session, before any persistence identity exists.
///
/// Derivation is a pure function of the session and program, so repeated
/// calls over unchanged state yield equal figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFigures {
    /// Event the figures describe.
    pub event_id: Uuid,
    /// Session the figures were derived from.
    pub session_id: Uuid,
    /// Sum of planned seconds across the whole program.
    pub planned_total_seconds: u64,
    /// Sum of recorded actual seconds, counting zero for uncompleted items.
    pub actual_total_seconds: u64,
    /// True when the aggregate actual ran strictly below the aggregate plan.
    pub ahead_of_schedule: bool,
    /// One line per program item, in program order.
    pub items: Vec<ItemReportEntity>,
}

impl ReportFigures {
    /// Attach a persistence identity and timestamp for the save path.
    pub fn into_entity(self, now: SystemTime) -> EventReportEntity {
        EventReportEntity {
            id: Uuid::new_v4(),
            event_id: self.event_id,
            session_id: self.session_id,
            generated_at: now,
            planned_total_seconds: self.planned_total_seconds,
            actual_total_seconds: self.actual_total_seconds,
            ahead_of_schedule: self.ahead_of_schedule,
            items: self.items,
        }
    }
}

/// Build statistics figures from the session's recorded times.
///
/// Every program item contributes a line and its planned seconds to the
/// totals; items that never completed count zero actual seconds.
pub fn build_report(session: &LiveSession, program: &[ProgramItem]) -> ReportFigures {
    let items: Vec<ItemReportEntity> = program
        .iter()
        .map(|item| {
            let actual = session.item_actual_times.get(&item.id).copied().unwrap_or(0);
            item_line(item, actual)
        })
        .collect();

    let planned_total: u64 = items.iter().map(|line| line.planned_seconds).sum();
    let actual_total: u64 = items.iter().map(|line| line.actual_seconds).sum();

    ReportFigures {
        event_id: session.event_id,
        session_id: session.id,
        planned_total_seconds: planned_total,
        actual_total_seconds: actual_total,
        ahead_of_schedule: actual_total < planned_total,
        items,
    }
}

fn item_line(item: &ProgramItem, actual_seconds: u64) -> ItemReportEntity {
    let planned_seconds = u64::from(item.duration_minutes) * 60;
    let difference_seconds = actual_seconds as i64 - planned_seconds as i64;

    ItemReportEntity {
        item_id: item.id,
        title: item.title.clone(),
        planned_seconds,
        actual_seconds,
        difference_seconds,
        recommendation: recommendation_for(&item.title, difference_seconds),
    }
}

fn recommendation_for(title: &str, difference_seconds: i64) -> Option<String> {
    if difference_seconds > RECOMMENDATION_THRESHOLD_SECONDS {
        Some(format!(
            "«{title}» excedió lo planificado por {difference_seconds}s; considera asignarle más minutos en el programa"
        ))
    } else if difference_seconds < -RECOMMENDATION_THRESHOLD_SECONDS {
        let early = -difference_seconds;
        Some(format!(
            "«{title}» terminó {early}s antes de lo planificado; considera acortar su espacio en el programa"
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn item(title: &str, duration_minutes: u32) -> ProgramItem {
        ProgramItem {
            id: Uuid::new_v4(),
            position: 0,
            title: title.into(),
            duration_minutes,
            responsible: None,
        }
    }

    fn session_with_times(times: &[(Uuid, u64)]) -> LiveSession {
        let mut session = LiveSession::new(Uuid::new_v4());
        for (id, seconds) in times {
            session.completed_items.push(*id);
            session.item_actual_times.insert(*id, *seconds);
        }
        session
    }

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_750_000_000)
    }

    #[test]
    fn uncompleted_sections_count_as_zero_in_the_totals() {
        let program = vec![item("Alabanza", 10), item("Prédica", 40)];
        let session = session_with_times(&[(program[0].id, 600)]);

        let report = build_report(&session, &program);
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.planned_total_seconds, 600 + 2400);
        assert_eq!(report.actual_total_seconds, 600);

        let pending = &report.items[1];
        assert_eq!(pending.item_id, program[1].id);
        assert_eq!(pending.actual_seconds, 0);
        assert_eq!(pending.difference_seconds, -2400);
    }

    #[test]
    fn small_deviations_produce_no_recommendation() {
        let program = vec![item("Alabanza", 10)];
        // 10 minutes planned, 10:59 actual: within the threshold.
        let session = session_with_times(&[(program[0].id, 659)]);

        let report = build_report(&session, &program);
        assert!(report.items[0].recommendation.is_none());
    }

    #[test]
    fn overruns_beyond_the_threshold_are_flagged() {
        let program = vec![item("Prédica", 30)];
        let session = session_with_times(&[(program[0].id, 30 * 60 + 61)]);

        let report = build_report(&session, &program);
        assert_eq!(report.items[0].difference_seconds, 61);
        let recommendation = report.items[0].recommendation.as_deref().unwrap();
        assert!(recommendation.contains("61s"));
        assert!(recommendation.contains("más minutos"));
        assert!(!recommendation.contains("acortar"));
    }

    #[test]
    fn underruns_beyond_the_threshold_are_flagged() {
        let program = vec![item("Anuncios", 5)];
        let session = session_with_times(&[(program[0].id, 100)]);

        let report = build_report(&session, &program);
        assert_eq!(report.items[0].difference_seconds, -200);
        let recommendation = report.items[0].recommendation.as_deref().unwrap();
        assert!(recommendation.contains("200s"));
        assert!(recommendation.contains("acortar"));
    }

    #[test]
    fn ahead_of_schedule_requires_strictly_less_actual() {
        let program = vec![item("Alabanza", 10)];

        let ahead = session_with_times(&[(program[0].id, 599)]);
        assert!(build_report(&ahead, &program).ahead_of_schedule);

        let exact = session_with_times(&[(program[0].id, 600)]);
        assert!(!build_report(&exact, &program).ahead_of_schedule);

        let behind = session_with_times(&[(program[0].id, 601)]);
        assert!(!build_report(&behind, &program).ahead_of_schedule);
    }

    #[test]
    fn derivation_is_idempotent_over_unchanged_state() {
        let program = vec![item("Alabanza", 10), item("Prédica", 30)];
        let session = session_with_times(&[(program[0].id, 500)]);

        let first = build_report(&session, &program);
        let second = build_report(&session, &program);
        assert_eq!(first, second);
    }

    #[test]
    fn save_path_mints_identity_and_timestamp() {
        let program = vec![item("Alabanza", 10)];
        let session = session_with_times(&[(program[0].id, 500)]);

        let first = build_report(&session, &program).into_entity(now());
        let second = build_report(&session, &program).into_entity(now());
        assert_ne!(first.id, second.id);
        assert_eq!(first.generated_at, now());
        assert_eq!(first.planned_total_seconds, second.planned_total_seconds);
    }

    #[test]
    fn empty_history_covers_the_whole_program_with_zeroes() {
        let program = vec![item("Alabanza", 10)];
        let session = session_with_times(&[]);

        let report = build_report(&session, &program);
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.planned_total_seconds, 600);
        assert_eq!(report.actual_total_seconds, 0);
        assert!(report.ahead_of_schedule);
    }
}
