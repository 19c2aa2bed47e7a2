use std::time::{Duration, Instant, SystemTime};

use indexmap::IndexMap;
use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::{ProgramItemEntity, SessionEntity};
use crate::state::state_machine::{
    CounterKind, InvalidTransition, TimerEvent, TimerPhase, TimerStateMachine,
};

/// Runtime representation of an ordered event program section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramItem {
    /// Stable identifier of the section.
    pub id: Uuid,
    /// Position within the program, starting at zero.
    pub position: u32,
    /// Section title.
    pub title: String,
    /// Planned duration in minutes.
    pub duration_minutes: u32,
    /// Person responsible for the section, if assigned.
    pub responsible: Option<String>,
}

impl From<ProgramItemEntity> for ProgramItem {
    fn from(value: ProgramItemEntity) -> Self {
        Self {
            id: value.id,
            position: value.position,
            title: value.title,
            duration_minutes: value.duration_minutes,
            responsible: value.responsible,
        }
    }
}

/// Errors raised by timer commands on a live session.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The underlying state machine rejected the transition.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    /// A skip target lies outside the program.
    #[error("section index {index} is out of range (program has {count} items)")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of items in the program.
        count: usize,
    },
    /// Restore was requested for an item that never completed.
    #[error("item `{item_id}` has not been completed")]
    NotCompleted {
        /// The item the controller tried to reopen.
        item_id: Uuid,
    },
    /// The current index points past the end of the program.
    #[error("no program item at index {index}")]
    NoCurrentItem {
        /// The dangling index.
        index: usize,
    },
}

/// In-memory state of one live event's timer, mirrored to the session row.
#[derive(Debug, Clone)]
pub struct LiveSession {
    /// Identifier of the persisted session row.
    pub id: Uuid,
    /// Event this session belongs to.
    pub event_id: Uuid,
    machine: TimerStateMachine,
    /// Index of the program item currently being timed.
    pub current_item_index: usize,
    /// Elapsed seconds for the current section.
    pub elapsed_seconds: u64,
    /// Elapsed seconds of the preparation interstitial.
    pub preparation_seconds: u64,
    /// Item ids already completed, in completion order.
    pub completed_items: Vec<Uuid>,
    /// Recorded actual elapsed seconds per completed item.
    pub item_actual_times: IndexMap<Uuid, u64>,
    /// Set on the first start and never cleared.
    pub event_start_time: Option<SystemTime>,
    /// Set when the program is exhausted; closes the session.
    pub event_end_time: Option<SystemTime>,
}

impl LiveSession {
    /// Open a brand-new session for an event.
    pub fn new(event_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            machine: TimerStateMachine::new(),
            current_item_index: 0,
            elapsed_seconds: 0,
            preparation_seconds: 0,
            completed_items: Vec::new(),
            item_actual_times: IndexMap::new(),
            event_start_time: None,
            event_end_time: None,
        }
    }

    /// Current phase of the session's state machine.
    pub fn phase(&self) -> TimerPhase {
        self.machine.phase()
    }

    /// Start (or resume into) the current section. The event start timestamp
    /// is recorded on the first call only.
    pub fn start(&mut self, now: SystemTime) -> Result<(), CommandError> {
        self.machine.apply(TimerEvent::Start)?;
        self.preparation_seconds = 0;
        if self.event_start_time.is_none() {
            self.event_start_time = Some(now);
        }
        Ok(())
    }

    /// End the current section: record it as completed, snapshot its elapsed
    /// time, and enter the preparation phase.
    pub fn stop_section(&mut self, program: &[ProgramItem]) -> Result<(), CommandError> {
        let item = program
            .get(self.current_item_index)
            .ok_or(CommandError::NoCurrentItem {
                index: self.current_item_index,
            })?;

        self.machine.apply(TimerEvent::StopSection)?;
        if !self.completed_items.contains(&item.id) {
            self.completed_items.push(item.id);
        }
        self.item_actual_times.insert(item.id, self.elapsed_seconds);
        Ok(())
    }

    /// Advance to the next section, or finish the event when the program is
    /// exhausted.
    pub fn advance_section(
        &mut self,
        program: &[ProgramItem],
        now: SystemTime,
    ) -> Result<(), CommandError> {
        let has_more = self.current_item_index + 1 < program.len();
        self.machine.apply(TimerEvent::AdvanceSection { has_more })?;

        if has_more {
            self.current_item_index += 1;
            self.elapsed_seconds = 0;
            self.preparation_seconds = 0;
        } else {
            self.event_end_time = Some(now);
        }
        Ok(())
    }

    /// Jump directly to an arbitrary section. Completion history is left
    /// untouched.
    pub fn skip_to_section(
        &mut self,
        index: usize,
        program: &[ProgramItem],
    ) -> Result<(), CommandError> {
        if index >= program.len() {
            return Err(CommandError::IndexOutOfRange {
                index,
                count: program.len(),
            });
        }

        self.machine.apply(TimerEvent::SkipToSection)?;
        self.current_item_index = index;
        self.elapsed_seconds = 0;
        self.preparation_seconds = 0;
        Ok(())
    }

    /// Reopen a completed section, restoring its recorded elapsed time as the
    /// starting point so the controller resumes exactly where it left off.
    pub fn restore_section(
        &mut self,
        item_id: Uuid,
        program: &[ProgramItem],
    ) -> Result<(), CommandError> {
        if !self.completed_items.contains(&item_id) {
            return Err(CommandError::NotCompleted { item_id });
        }
        let position = program
            .iter()
            .position(|item| item.id == item_id)
            .ok_or(CommandError::NotCompleted { item_id })?;

        self.machine.apply(TimerEvent::RestoreSection)?;
        self.completed_items.retain(|completed| *completed != item_id);
        self.elapsed_seconds = self.item_actual_times.shift_remove(&item_id).unwrap_or(0);
        self.preparation_seconds = 0;
        self.current_item_index = position;
        Ok(())
    }

    /// Pause or resume the active counter.
    pub fn toggle_pause(&mut self) -> Result<(), CommandError> {
        self.machine.apply(TimerEvent::TogglePause)?;
        Ok(())
    }

    /// Advance whichever counter is live. Returns true when a counter moved.
    pub fn tick(&mut self) -> bool {
        match self.phase() {
            TimerPhase::Counting(CounterKind::Section) => {
                self.elapsed_seconds += 1;
                true
            }
            TimerPhase::Counting(CounterKind::Preparation) => {
                self.preparation_seconds += 1;
                true
            }
            _ => false,
        }
    }

    /// Project the runtime state onto a persistable session row.
    pub fn to_entity(&self, now: SystemTime) -> SessionEntity {
        let (is_running, is_paused, is_preparation_phase) = self.phase().flags();
        SessionEntity {
            id: self.id,
            event_id: self.event_id,
            current_item_index: self.current_item_index,
            elapsed_seconds: self.elapsed_seconds,
            preparation_seconds: self.preparation_seconds,
            is_running,
            is_paused,
            is_preparation_phase,
            completed_items: self.completed_items.clone(),
            item_actual_times: self.item_actual_times.clone(),
            event_start_time: self.event_start_time,
            event_end_time: self.event_end_time,
            updated_at: now,
        }
    }
}

impl From<SessionEntity> for LiveSession {
    fn from(value: SessionEntity) -> Self {
        let phase = TimerPhase::from_flags(
            value.is_running,
            value.is_paused,
            value.is_preparation_phase,
            value.event_end_time.is_some(),
        );
        Self {
            id: value.id,
            event_id: value.event_id,
            machine: TimerStateMachine::at(phase),
            current_item_index: value.current_item_index,
            elapsed_seconds: value.elapsed_seconds,
            preparation_seconds: value.preparation_seconds,
            completed_items: value.completed_items,
            item_actual_times: value.item_actual_times,
            event_start_time: value.event_start_time,
            event_end_time: value.event_end_time,
        }
    }
}

/// Merge a locally held session with the authoritative persisted row.
///
/// The policy is deliberately "remote wins": every observer overwrites its
/// view with whatever the store returns, so a reloaded page or a second device
/// resumes from the same place. Kept as a named function so the policy can
/// change without touching the subscription plumbing.
pub fn reconcile(_local: LiveSession, remote: LiveSession) -> LiveSession {
    remote
}

/// Write-throttle for session persistence.
///
/// The authoritative row may lag the live counters by a few seconds; the gate
/// trades perfect accuracy for a bounded write rate.
#[derive(Debug)]
pub struct SyncGate {
    last_sync: Option<Instant>,
    ticks_since_sync: u32,
}

impl SyncGate {
    /// Minimum wall-clock spacing between two persisted writes.
    const MIN_INTERVAL: Duration = Duration::from_secs(2);
    /// A write is only considered on every Nth accumulated tick.
    const TICKS_PER_SYNC: u32 = 5;

    /// Fresh gate that allows an immediate first write.
    pub fn new() -> Self {
        Self {
            last_sync: None,
            ticks_since_sync: Self::TICKS_PER_SYNC,
        }
    }

    /// Record one timer tick.
    pub fn register_tick(&mut self) {
        self.ticks_since_sync = self.ticks_since_sync.saturating_add(1);
    }

    /// Whether a persisted write is due.
    pub fn should_sync(&self, now: Instant) -> bool {
        if self.ticks_since_sync < Self::TICKS_PER_SYNC {
            return false;
        }
        match self.last_sync {
            Some(last) => now.duration_since(last) >= Self::MIN_INTERVAL,
            None => true,
        }
    }

    /// Mark a successful write, resetting the cadence.
    pub fn mark_synced(&mut self, now: Instant) {
        self.last_sync = Some(now);
        self.ticks_since_sync = 0;
    }
}

impl Default for SyncGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program() -> Vec<ProgramItem> {
        (0..3)
            .map(|position| ProgramItem {
                id: Uuid::new_v4(),
                position,
                title: format!("Sección {position}"),
                duration_minutes: 1,
                responsible: None,
            })
            .collect()
    }

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_750_000_000)
    }

    #[test]
    fn ticks_only_advance_while_counting() {
        let program = program();
        let mut session = LiveSession::new(Uuid::new_v4());

        assert!(!session.tick(), "idle session must not tick");
        assert_eq!(session.elapsed_seconds, 0);

        session.start(now()).unwrap();
        for _ in 0..5 {
            assert!(session.tick());
        }
        assert_eq!(session.elapsed_seconds, 5);

        session.toggle_pause().unwrap();
        assert!(!session.tick(), "paused session must not tick");
        assert_eq!(session.elapsed_seconds, 5);

        session.toggle_pause().unwrap();
        session.stop_section(&program).unwrap();
        assert!(session.tick());
        assert_eq!(session.elapsed_seconds, 5, "section counter stays frozen");
        assert_eq!(session.preparation_seconds, 1);
    }

    #[test]
    fn start_records_event_start_only_once() {
        let first = now();
        let later = first + Duration::from_secs(600);

        let mut session = LiveSession::new(Uuid::new_v4());
        session.start(first).unwrap();
        session.stop_section(&program()).unwrap();
        session.start(later).unwrap();
        assert_eq!(session.event_start_time, Some(first));
    }

    #[test]
    fn start_clears_preparation_seconds() {
        let program = program();
        let mut session = LiveSession::new(Uuid::new_v4());
        session.start(now()).unwrap();
        session.stop_section(&program).unwrap();
        session.tick();
        session.tick();
        assert_eq!(session.preparation_seconds, 2);

        session.advance_section(&program, now()).unwrap();
        session.start(now()).unwrap();
        assert_eq!(session.preparation_seconds, 0);
        assert_eq!(session.elapsed_seconds, 0);
    }

    #[test]
    fn stop_section_records_completion_and_actual_time() {
        let program = program();
        let mut session = LiveSession::new(Uuid::new_v4());
        session.start(now()).unwrap();
        for _ in 0..90 {
            session.tick();
        }
        session.stop_section(&program).unwrap();

        assert_eq!(session.completed_items, vec![program[0].id]);
        assert_eq!(session.item_actual_times.get(&program[0].id), Some(&90));
    }

    #[test]
    fn advancing_past_the_last_section_finishes_the_event() {
        let program = program();
        let mut session = LiveSession::new(Uuid::new_v4());
        session.start(now()).unwrap();

        for index in 0..program.len() {
            session.stop_section(&program).unwrap();
            session.advance_section(&program, now()).unwrap();
            if index + 1 < program.len() {
                assert_eq!(session.current_item_index, index + 1);
                session.start(now()).unwrap();
            }
        }

        assert_eq!(session.phase(), TimerPhase::Finished);
        assert!(session.event_end_time.is_some());
        assert!(!session.tick(), "finished session must not tick");
    }

    #[test]
    fn skip_resets_counters_but_keeps_completions() {
        let program = program();
        let mut session = LiveSession::new(Uuid::new_v4());
        session.start(now()).unwrap();
        for _ in 0..30 {
            session.tick();
        }
        session.stop_section(&program).unwrap();

        session.skip_to_section(2, &program).unwrap();
        assert_eq!(session.current_item_index, 2);
        assert_eq!(session.elapsed_seconds, 0);
        assert_eq!(session.completed_items, vec![program[0].id]);

        let err = session.skip_to_section(7, &program).unwrap_err();
        assert!(matches!(err, CommandError::IndexOutOfRange { index: 7, .. }));
    }

    #[test]
    fn restore_then_stop_reproduces_the_recorded_time() {
        let program = program();
        let mut session = LiveSession::new(Uuid::new_v4());
        session.start(now()).unwrap();
        for _ in 0..42 {
            session.tick();
        }
        session.stop_section(&program).unwrap();
        session.advance_section(&program, now()).unwrap();

        let recorded = *session.item_actual_times.get(&program[0].id).unwrap();
        session.restore_section(program[0].id, &program).unwrap();
        assert_eq!(session.current_item_index, 0);
        assert_eq!(session.elapsed_seconds, recorded);
        assert!(!session.completed_items.contains(&program[0].id));
        assert!(!session.item_actual_times.contains_key(&program[0].id));

        // Stopping again without further ticking must reproduce the value.
        session.start(now()).unwrap();
        session.elapsed_seconds = recorded;
        session.stop_section(&program).unwrap();
        assert_eq!(session.item_actual_times.get(&program[0].id), Some(&42));
    }

    #[test]
    fn restore_rejects_items_never_completed() {
        let program = program();
        let mut session = LiveSession::new(Uuid::new_v4());
        let err = session
            .restore_section(program[1].id, &program)
            .unwrap_err();
        assert!(matches!(err, CommandError::NotCompleted { .. }));
    }

    #[test]
    fn entity_round_trip_preserves_phase_and_counters() {
        let program = program();
        let mut session = LiveSession::new(Uuid::new_v4());
        session.start(now()).unwrap();
        for _ in 0..17 {
            session.tick();
        }
        session.stop_section(&program).unwrap();
        session.tick();

        let entity = session.to_entity(now());
        let restored = LiveSession::from(entity);
        assert_eq!(restored.phase(), session.phase());
        assert_eq!(restored.elapsed_seconds, 17);
        assert_eq!(restored.preparation_seconds, 1);
        assert_eq!(restored.completed_items, session.completed_items);
        assert_eq!(restored.item_actual_times, session.item_actual_times);
    }

    #[test]
    fn reconcile_prefers_the_remote_row() {
        let mut local = LiveSession::new(Uuid::new_v4());
        local.elapsed_seconds = 99;
        let mut remote = LiveSession::from(local.to_entity(now()));
        remote.elapsed_seconds = 42;

        let merged = reconcile(local, remote.clone());
        assert_eq!(merged.elapsed_seconds, 42);
        assert_eq!(merged.id, remote.id);
    }

    #[test]
    fn sync_gate_enforces_tick_and_interval_rules() {
        let mut gate = SyncGate::new();
        let start = Instant::now();

        // Fresh gate syncs immediately.
        assert!(gate.should_sync(start));
        gate.mark_synced(start);

        // Four ticks are not enough regardless of elapsed time.
        for _ in 0..4 {
            gate.register_tick();
        }
        assert!(!gate.should_sync(start + Duration::from_secs(10)));

        // Fifth tick satisfies the tick rule but the 2s spacing still applies.
        gate.register_tick();
        assert!(!gate.should_sync(start + Duration::from_secs(1)));
        assert!(gate.should_sync(start + Duration::from_secs(2)));
    }
}
