//! Stateful session controller.
//!
//! `Session` owns the phase machine, the single open trial, and the
//! append-only trial log. All timing flows through `Instant` values passed
//! in by the caller, which keeps every transition deterministic under test.
//! Time-driven transitions (display window elapsed, session expired) are
//! applied lazily at the top of each operation, so there is no background
//! timer to cancel and nothing can fire after the session has ended.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::engine::generator;
use crate::engine::{Difficulty, EngineError, Position, Square};
use crate::session::state::{SessionEvent, SessionPhase};
use crate::session::trial::TrialRecord;

// =========================================================================
// Settings & errors
// =========================================================================

/// Immutable per-session parameters, fixed at creation.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub patient_name: String,
    pub difficulty: Difficulty,
    /// Total session length, measured from the first trial's display.
    pub duration: Duration,
    /// How long each trial's board stays visible.
    pub board_display: Duration,
    /// Pre-game countdown length.
    pub countdown: Duration,
}

/// Errors from session operations. Late or duplicate *input* is not an
/// error (see [`ResponseOutcome`]); these cover protocol misuse and
/// generation failure.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session has ended")]
    Ended,

    #[error("countdown still running ({remaining:.1}s left)")]
    CountdownRunning { remaining: f64 },

    #[error("cannot {action} while {phase}")]
    WrongPhase {
        action: &'static str,
        phase: SessionPhase,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// What happened to a submitted response.
#[derive(Clone, Debug)]
pub enum ResponseOutcome {
    /// First response for the open trial; graded and logged.
    Recorded { record: TrialRecord, correct: bool },
    /// The trial was already answered; the stored record is returned
    /// unchanged.
    Repeat { record: TrialRecord },
    /// No grading context (display phase, no open trial, or session over).
    Ignored,
}

// =========================================================================
// OpenTrial
// =========================================================================

/// The one trial currently in flight.
#[derive(Clone, Debug)]
pub struct OpenTrial {
    pub index: usize,
    pub position: Position,
    /// Seconds from session start to this trial's board being shown.
    pub trial_time: f64,
    /// When the board went on display.
    pub shown_at: Instant,
    /// When the display window ends and the response window opens.
    pub display_until: Instant,
    answered: bool,
}

// =========================================================================
// Session
// =========================================================================

/// One subject's run of trials, from configuration to frozen log.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    settings: SessionSettings,
    phase: SessionPhase,
    countdown_started: Option<Instant>,
    started_at: Option<Instant>,
    open: Option<OpenTrial>,
    trials: Vec<TrialRecord>,
}

impl Session {
    /// Create a session with a known subject name and configuration.
    pub fn new(settings: SessionSettings) -> Self {
        // Name and configuration arrive together, so the machine walks
        // through its first transition immediately.
        let phase = SessionPhase::AwaitingName
            .on(SessionEvent::NameEntered)
            .unwrap_or(SessionPhase::Configuring);
        Session {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            settings,
            phase,
            countdown_started: None,
            started_at: None,
            open: None,
            trials: Vec::new(),
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Current phase after applying any due time-driven transitions.
    pub fn phase_at(&self, now: Instant) -> SessionPhase {
        if self.expired(now) {
            return SessionPhase::Ended;
        }
        if self.phase == SessionPhase::DisplayingBoard {
            if let Some(open) = &self.open {
                if now >= open.display_until {
                    return SessionPhase::AwaitingResponse;
                }
            }
        }
        self.phase
    }

    /// The trial currently in flight, if any.
    pub fn open_trial(&self) -> Option<&OpenTrial> {
        self.open.as_ref()
    }

    /// Completed trial records, in order.
    pub fn trials(&self) -> &[TrialRecord] {
        &self.trials
    }

    pub fn trial_count(&self) -> usize {
        self.trials.len()
    }

    /// Whether the log is frozen.
    pub fn is_ended(&self) -> bool {
        self.phase == SessionPhase::Ended
    }

    /// Seconds elapsed since the first trial started (0 before that).
    pub fn elapsed(&self, now: Instant) -> f64 {
        self.started_at
            .map(|start| now.duration_since(start).as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Seconds left on the session clock.
    pub fn remaining(&self, now: Instant) -> f64 {
        (self.settings.duration.as_secs_f64() - self.elapsed(now)).max(0.0)
    }

    /// Whether the session timer has run out.
    pub fn expired(&self, now: Instant) -> bool {
        match self.started_at {
            Some(start) => now.duration_since(start) >= self.settings.duration,
            None => false,
        }
    }

    /// Seconds left on the pre-game countdown.
    pub fn countdown_remaining(&self, now: Instant) -> f64 {
        match self.countdown_started {
            Some(start) => {
                (self.settings.countdown.as_secs_f64()
                    - now.duration_since(start).as_secs_f64())
                .max(0.0)
            }
            None => self.settings.countdown.as_secs_f64(),
        }
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Enter the pre-game countdown.
    pub fn begin(&mut self, now: Instant) -> Result<(), SessionError> {
        self.advance_clock(now);
        if self.phase == SessionPhase::Ended {
            return Err(SessionError::Ended);
        }
        match self.phase.on(SessionEvent::Begun) {
            Ok(next) => {
                self.phase = next;
                self.countdown_started = Some(now);
                Ok(())
            }
            Err(phase) => Err(SessionError::WrongPhase {
                action: "begin",
                phase,
            }),
        }
    }

    /// Open the next trial: generate a position and start its display
    /// window. The session clock starts with the first trial.
    ///
    /// Advancing past an unanswered trial logs a timeout record first.
    pub fn next_trial<R: Rng>(
        &mut self,
        now: Instant,
        rng: &mut R,
    ) -> Result<&OpenTrial, SessionError> {
        self.advance_clock(now);

        match self.phase {
            SessionPhase::Ended => return Err(SessionError::Ended),
            SessionPhase::Countdown => {
                let remaining = self.countdown_remaining(now);
                if remaining > 0.0 {
                    return Err(SessionError::CountdownRunning { remaining });
                }
                self.started_at = Some(now);
            }
            SessionPhase::AwaitingResponse => {
                self.record_timeout(now);
            }
            SessionPhase::TrialFeedback => {}
            phase => {
                return Err(SessionError::WrongPhase {
                    action: "start a trial",
                    phase,
                });
            }
        }

        let position = generator::generate_with(self.settings.difficulty, rng)?;
        let started = self.started_at.unwrap_or(now);
        let open = OpenTrial {
            index: self.trials.len(),
            position,
            trial_time: now.duration_since(started).as_secs_f64(),
            shown_at: now,
            display_until: now + self.settings.board_display,
            answered: false,
        };
        self.apply(SessionEvent::TrialStarted);
        self.open = Some(open);
        Ok(self.open.as_ref().expect("just set"))
    }

    /// Grade a square click against the open trial.
    ///
    /// `client_response_time`, when the UI measured the reaction itself, is
    /// trusted over the server-side clock. Input outside the response
    /// window — during display, after the trial was answered, or after the
    /// session ended — is silently ignored per the task's input contract.
    pub fn record_response(
        &mut self,
        now: Instant,
        response: Square,
        client_response_time: Option<f64>,
    ) -> ResponseOutcome {
        self.advance_clock(now);

        if self.phase == SessionPhase::Ended {
            return ResponseOutcome::Ignored;
        }
        let Some(open) = &mut self.open else {
            return ResponseOutcome::Ignored;
        };
        if open.answered {
            // Idempotent: the stored record is returned unchanged.
            let record = self
                .trials
                .last()
                .cloned()
                .expect("answered trial has a record");
            return ResponseOutcome::Repeat { record };
        }
        if !self.phase.accepts_input() {
            return ResponseOutcome::Ignored;
        }

        let measured = now.duration_since(open.display_until).as_secs_f64();
        let response_time = client_response_time.unwrap_or(measured).max(0.0);
        let record = TrialRecord::graded(
            open.index,
            open.trial_time,
            &open.position,
            response,
            response_time,
        );
        open.answered = true;
        let correct = record.is_success();
        self.trials.push(record.clone());
        self.apply(SessionEvent::ResponseRecorded);
        ResponseOutcome::Recorded { record, correct }
    }

    /// End the session and freeze the log. Idempotent; an unanswered open
    /// trial is discarded, not recorded.
    pub fn finish(&mut self, now: Instant) -> &[TrialRecord] {
        self.advance_clock(now);
        self.freeze();
        &self.trials
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// Apply any due time-driven transitions before handling an event.
    fn advance_clock(&mut self, now: Instant) {
        if self.phase == SessionPhase::Ended {
            return;
        }
        if self.expired(now) {
            self.freeze();
            return;
        }
        if self.phase == SessionPhase::DisplayingBoard {
            if let Some(open) = &self.open {
                if now >= open.display_until {
                    self.apply(SessionEvent::DisplayElapsed);
                }
            }
        }
    }

    /// Log a timeout record for the open unanswered trial.
    fn record_timeout(&mut self, now: Instant) {
        let Some(open) = &mut self.open else {
            return;
        };
        if open.answered {
            return;
        }
        let response_time = now.duration_since(open.display_until).as_secs_f64();
        let record = TrialRecord::timed_out(
            open.index,
            open.trial_time,
            &open.position,
            response_time,
        );
        open.answered = true;
        self.trials.push(record);
        self.apply(SessionEvent::ResponseRecorded);
    }

    fn freeze(&mut self) {
        self.phase = SessionPhase::Ended;
        self.open = None;
    }

    fn apply(&mut self, event: SessionEvent) {
        if let Ok(next) = self.phase.on(event) {
            self.phase = next;
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
