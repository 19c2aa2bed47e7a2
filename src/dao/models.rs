use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Discriminates the two kinds of schedulable services.
///
/// The string forms are a wire contract shared with the frontend and must not
/// change: `"Servicio Dominical"` for regular Sunday services and
/// `"cuarentena"` for the contingency mid-week/Saturday services.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceType {
    /// Regular Sunday service (two per Sunday, 08:00 and 10:45).
    #[serde(rename = "Servicio Dominical")]
    Sunday,
    /// Contingency service using the weekly resting group.
    #[serde(rename = "cuarentena")]
    Quarantine,
}

/// A single schedulable service row persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceEntity {
    /// Primary key of the service row.
    pub id: Uuid,
    /// Display title shown on agendas.
    pub title: String,
    /// Instant the service starts.
    pub service_date: SystemTime,
    /// Name of the assigned director.
    pub leader: String,
    /// Identifier of the worship group singing this service, if any.
    pub assigned_group_id: Option<Uuid>,
    /// Sunday or quarantine.
    pub service_type: ServiceType,
    /// Venue of the service.
    pub location: String,
    /// Whether an admin has confirmed the slot. Defaults to false at creation.
    pub is_confirmed: bool,
    /// Localized month name used for display grouping.
    pub month_name: String,
    /// Ordinal of the month within the year, for display grouping.
    pub month_order: Option<i32>,
}

/// Persisted state of one live event's timer, shared by all observers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionEntity {
    /// Primary key of the session row.
    pub id: Uuid,
    /// Event this session belongs to. At most one open session per event.
    pub event_id: Uuid,
    /// Index of the program item currently being timed.
    pub current_item_index: usize,
    /// Elapsed seconds for the current section.
    pub elapsed_seconds: u64,
    /// Elapsed seconds of the preparation interstitial.
    pub preparation_seconds: u64,
    /// Whether the timer has been started.
    pub is_running: bool,
    /// Whether ticking is currently suspended.
    pub is_paused: bool,
    /// Whether the preparation counter is ticking instead of the section one.
    pub is_preparation_phase: bool,
    /// Program item ids already completed, in completion order.
    pub completed_items: Vec<Uuid>,
    /// Recorded actual elapsed seconds per completed program item.
    pub item_actual_times: IndexMap<Uuid, u64>,
    /// Set once on the first start and never cleared.
    pub event_start_time: Option<SystemTime>,
    /// Set when the event finishes; a session with this set is closed.
    pub event_end_time: Option<SystemTime>,
    /// Last time the session row was written.
    pub updated_at: SystemTime,
}

/// Ordered program section of an event, read-only for the timer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgramItemEntity {
    /// Primary key of the program item.
    pub id: Uuid,
    /// Event this item belongs to.
    pub event_id: Uuid,
    /// Position within the event program, starting at zero.
    pub position: u32,
    /// Section title.
    pub title: String,
    /// Planned duration in minutes.
    pub duration_minutes: u32,
    /// Person responsible for the section, if assigned.
    pub responsible: Option<String>,
}

/// Persisted planned-vs-actual report for a finished (or in-flight) event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventReportEntity {
    /// Primary key of the report.
    pub id: Uuid,
    /// Event the report describes.
    pub event_id: Uuid,
    /// Session the figures were derived from.
    pub session_id: Uuid,
    /// When the report was generated.
    pub generated_at: SystemTime,
    /// Sum of planned seconds across all program items.
    pub planned_total_seconds: u64,
    /// Sum of recorded actual seconds across all program items.
    pub actual_total_seconds: u64,
    /// True when the aggregate actual ran below the aggregate plan.
    pub ahead_of_schedule: bool,
    /// Per-item breakdown.
    pub items: Vec<ItemReportEntity>,
}

/// Per-item entry of an [`EventReportEntity`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemReportEntity {
    /// Program item described by this entry.
    pub item_id: Uuid,
    /// Section title at report time.
    pub title: String,
    /// Planned seconds (`duration_minutes * 60`).
    pub planned_seconds: u64,
    /// Recorded actual seconds, zero when the item never completed.
    pub actual_seconds: u64,
    /// `actual - planned`, signed.
    pub difference_seconds: i64,
    /// Suggestion produced when the difference exceeds the threshold.
    pub recommendation: Option<String>,
}
