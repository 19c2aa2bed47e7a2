use thiserror::Error;

/// Which counter is advancing while the timer is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    /// The current program section's elapsed counter.
    Section,
    /// The interstitial preparation counter between sections.
    Preparation,
}

/// High-level phases of a live event timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// No counter is advancing; the current section has not started.
    Idle,
    /// A counter is advancing once per real second.
    Counting(CounterKind),
    /// A counter is frozen; resuming continues the same counter.
    Paused(CounterKind),
    /// The event has ended. Terminal: no event applies from here.
    Finished,
}

impl TimerPhase {
    /// True while the section or preparation counter should advance.
    pub fn is_ticking(self) -> bool {
        matches!(self, TimerPhase::Counting(_))
    }

    /// Rebuild a phase from the orthogonal flags of a persisted session row.
    pub fn from_flags(
        is_running: bool,
        is_paused: bool,
        is_preparation: bool,
        has_ended: bool,
    ) -> Self {
        let kind = if is_preparation {
            CounterKind::Preparation
        } else {
            CounterKind::Section
        };
        if has_ended {
            TimerPhase::Finished
        } else if !is_running {
            TimerPhase::Idle
        } else if is_paused {
            TimerPhase::Paused(kind)
        } else {
            TimerPhase::Counting(kind)
        }
    }

    /// Project this phase onto the persisted flag triplet
    /// `(is_running, is_paused, is_preparation_phase)`.
    pub fn flags(self) -> (bool, bool, bool) {
        match self {
            TimerPhase::Idle | TimerPhase::Finished => (false, false, false),
            TimerPhase::Counting(kind) => (true, false, kind == CounterKind::Preparation),
            TimerPhase::Paused(kind) => (true, true, kind == CounterKind::Preparation),
        }
    }
}

/// Events that can be applied to the timer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Controller starts (or resumes into) the current section.
    Start,
    /// Controller ends the current section, entering the preparation phase.
    StopSection,
    /// Controller advances to the next section; `has_more` is false when the
    /// program is exhausted, which finishes the event.
    AdvanceSection {
        /// Whether another program section exists after the current one.
        has_more: bool,
    },
    /// Controller jumps directly to an arbitrary section.
    SkipToSection,
    /// Controller reopens a previously completed section.
    RestoreSection,
    /// Controller pauses or resumes the active counter.
    TogglePause,
    /// Controller abandons the session and starts over.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: TimerPhase,
    /// The event that cannot be applied from this phase.
    pub event: TimerEvent,
}

/// State machine implementing the live-timer flow.
#[derive(Debug, Clone, Default)]
pub struct TimerStateMachine {
    phase: TimerPhase,
}

impl Default for TimerPhase {
    fn default() -> Self {
        TimerPhase::Idle
    }
}

impl TimerStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a state machine positioned at an arbitrary phase, used when
    /// adopting a persisted session row.
    pub fn at(phase: TimerPhase) -> Self {
        Self { phase }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    /// Apply an event, moving to the next phase when the transition is valid.
    pub fn apply(&mut self, event: TimerEvent) -> Result<TimerPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: TimerEvent) -> Result<TimerPhase, InvalidTransition> {
        use CounterKind::*;
        use TimerEvent::*;
        use TimerPhase::*;

        let next = match (self.phase, event) {
            // Starting runs the section counter from idle, from preparation,
            // and from either paused variant.
            (Idle, Start)
            | (Counting(Preparation), Start)
            | (Paused(_), Start) => Counting(Section),
            // A section can only be stopped while its own counter is live.
            (Counting(Section), StopSection) => Counting(Preparation),
            // Advancing is allowed from any live or paused state: the
            // controller may move on without having started the next section.
            (Counting(_), AdvanceSection { has_more })
            | (Paused(_), AdvanceSection { has_more })
            | (Idle, AdvanceSection { has_more }) => {
                if has_more {
                    Idle
                } else {
                    Finished
                }
            }
            (Counting(_), SkipToSection) | (Paused(_), SkipToSection) | (Idle, SkipToSection) => {
                Idle
            }
            (Counting(_), RestoreSection)
            | (Paused(_), RestoreSection)
            | (Idle, RestoreSection) => Idle,
            (Counting(kind), TogglePause) => Paused(kind),
            (Paused(kind), TogglePause) => Counting(kind),
            // Reset is accepted from every phase, including finished.
            (_, Reset) => Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
