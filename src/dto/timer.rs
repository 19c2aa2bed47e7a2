//! DTO definitions for the live timer API.

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::ItemReportEntity;
use crate::dto::{common::ProgramItemSnapshot, format_system_time};
use crate::services::statistics::ReportFigures;
use crate::state::state_machine::{CounterKind, TimerPhase};
use crate::state::timer::{LiveSession, ProgramItem};

/// Externally visible phase of the live timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisibleTimerPhase {
    /// No counter is advancing.
    Idle,
    /// The current section's counter is advancing.
    Running,
    /// The interstitial preparation counter is advancing.
    Preparation,
    /// A counter is frozen mid-section.
    Paused,
    /// The event has ended.
    Finished,
}

impl From<TimerPhase> for VisibleTimerPhase {
    fn from(phase: TimerPhase) -> Self {
        match phase {
            TimerPhase::Idle => VisibleTimerPhase::Idle,
            TimerPhase::Counting(CounterKind::Section) => VisibleTimerPhase::Running,
            TimerPhase::Counting(CounterKind::Preparation) => VisibleTimerPhase::Preparation,
            TimerPhase::Paused(_) => VisibleTimerPhase::Paused,
            TimerPhase::Finished => VisibleTimerPhase::Finished,
        }
    }
}

/// Full projection of the live session sent to controllers and followers.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSnapshot {
    /// Identifier of the persisted session row.
    pub session_id: Uuid,
    /// Event the session belongs to.
    pub event_id: Uuid,
    /// Current timer phase.
    pub phase: VisibleTimerPhase,
    /// Index of the section currently being timed.
    pub current_item_index: usize,
    /// Elapsed seconds for the current section.
    pub elapsed_seconds: u64,
    /// Elapsed seconds of the preparation interstitial.
    pub preparation_seconds: u64,
    /// Section ids already completed, in completion order.
    pub completed_items: Vec<Uuid>,
    /// Recorded actual elapsed seconds per completed section.
    pub item_actual_times: IndexMap<Uuid, u64>,
    /// RFC 3339 timestamp of the first start, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_start_time: Option<String>,
    /// RFC 3339 timestamp of the event end, if finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_end_time: Option<String>,
    /// Snapshot of the current section, when the index is in range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_item: Option<ProgramItemSnapshot>,
}

impl SessionSnapshot {
    /// Project a live session and its program onto the wire format.
    pub fn from_session(session: &LiveSession, program: &[ProgramItem]) -> Self {
        Self {
            session_id: session.id,
            event_id: session.event_id,
            phase: session.phase().into(),
            current_item_index: session.current_item_index,
            elapsed_seconds: session.elapsed_seconds,
            preparation_seconds: session.preparation_seconds,
            completed_items: session.completed_items.clone(),
            item_actual_times: session.item_actual_times.clone(),
            event_start_time: session.event_start_time.map(format_system_time),
            event_end_time: session.event_end_time.map(format_system_time),
            current_item: program
                .get(session.current_item_index)
                .map(ProgramItemSnapshot::from),
        }
    }
}

/// Per-section line of a statistics report.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemStatistics {
    pub item_id: Uuid,
    pub title: String,
    pub planned_seconds: u64,
    pub actual_seconds: u64,
    /// Positive when the section ran long, negative when it ran short.
    pub difference_seconds: i64,
    /// Suggestion produced when the deviation exceeds the reporting threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Statistics derived from a session's recorded section times.
///
/// A pure projection of the current state: deriving twice over an unchanged
/// session yields identical bodies.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatisticsReport {
    pub event_id: Uuid,
    pub session_id: Uuid,
    pub planned_total_seconds: u64,
    pub actual_total_seconds: u64,
    /// Positive when the event ran long overall.
    pub difference_seconds: i64,
    pub ahead_of_schedule: bool,
    pub items: Vec<ItemStatistics>,
}

impl From<&ReportFigures> for StatisticsReport {
    fn from(figures: &ReportFigures) -> Self {
        Self {
            event_id: figures.event_id,
            session_id: figures.session_id,
            planned_total_seconds: figures.planned_total_seconds,
            actual_total_seconds: figures.actual_total_seconds,
            difference_seconds: figures.actual_total_seconds as i64
                - figures.planned_total_seconds as i64,
            ahead_of_schedule: figures.ahead_of_schedule,
            items: figures.items.iter().map(ItemStatistics::from).collect(),
        }
    }
}

impl From<&ItemReportEntity> for ItemStatistics {
    fn from(entity: &ItemReportEntity) -> Self {
        Self {
            item_id: entity.item_id,
            title: entity.title.clone(),
            planned_seconds: entity.planned_seconds,
            actual_seconds: entity.actual_seconds,
            difference_seconds: entity.difference_seconds,
            recommendation: entity.recommendation.clone(),
        }
    }
}
