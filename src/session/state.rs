//! Session phase state machine.
//!
//! One explicit phase value replaces the tangle of booleans the task is
//! usually driven by (board-visible, has-responded, countdown-running, …).
//! Transitions fire on named events; time-driven events (display window
//! elapsed, session timer expired) are raised by [`super::recorder::Session`]
//! from monotonic timestamps, so a stray trial can never start after the
//! session has ended.

use std::fmt;

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Where a session currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for a subject name.
    AwaitingName,
    /// Name known; difficulty/duration/display-time may still change.
    Configuring,
    /// Pre-game countdown running.
    Countdown,
    /// A trial's board is visible; no input accepted.
    DisplayingBoard,
    /// Board hidden, attacker isolated; exactly one input accepted.
    AwaitingResponse,
    /// Response recorded; brief pause before the next trial.
    TrialFeedback,
    /// Session timer expired or operator ended it; log is frozen.
    Ended,
}

impl SessionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::AwaitingName => "awaiting_name",
            SessionPhase::Configuring => "configuring",
            SessionPhase::Countdown => "countdown",
            SessionPhase::DisplayingBoard => "displaying_board",
            SessionPhase::AwaitingResponse => "awaiting_response",
            SessionPhase::TrialFeedback => "trial_feedback",
            SessionPhase::Ended => "ended",
        }
    }

    /// Whether a square click may be graded in this phase.
    #[inline]
    pub fn accepts_input(self) -> bool {
        self == SessionPhase::AwaitingResponse
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// Transition triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Subject name entered.
    NameEntered,
    /// Operator started the session; countdown begins.
    Begun,
    /// A new trial's position is put on display (countdown or feedback
    /// delay has elapsed).
    TrialStarted,
    /// The board-display window elapsed; responses now accepted.
    DisplayElapsed,
    /// A response (or timeout) was recorded for the open trial.
    ResponseRecorded,
    /// The session timer fired or the operator ended the session.
    Expired,
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

impl SessionPhase {
    /// Apply an event. `Err` carries the unchanged phase for reporting.
    ///
    /// `Ended` absorbs every event — anything arriving after the end of a
    /// session is silently ignored rather than an error.
    pub fn on(self, event: SessionEvent) -> Result<SessionPhase, SessionPhase> {
        use SessionEvent::*;
        use SessionPhase::*;

        match (self, event) {
            (Ended, _) => Ok(Ended),
            (_, Expired) => Ok(Ended),
            (AwaitingName, NameEntered) => Ok(Configuring),
            (Configuring, Begun) => Ok(Countdown),
            (Countdown, TrialStarted) => Ok(DisplayingBoard),
            (TrialFeedback, TrialStarted) => Ok(DisplayingBoard),
            (DisplayingBoard, DisplayElapsed) => Ok(AwaitingResponse),
            (AwaitingResponse, ResponseRecorded) => Ok(TrialFeedback),
            _ => Err(self),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::SessionEvent::*;
    use super::SessionPhase::*;

    #[test]
    fn happy_path_walk() {
        let mut phase = AwaitingName;
        for (event, expected) in [
            (NameEntered, Configuring),
            (Begun, Countdown),
            (TrialStarted, DisplayingBoard),
            (DisplayElapsed, AwaitingResponse),
            (ResponseRecorded, TrialFeedback),
            (TrialStarted, DisplayingBoard),
            (DisplayElapsed, AwaitingResponse),
            (Expired, Ended),
        ] {
            phase = phase.on(event).unwrap();
            assert_eq!(phase, expected);
        }
    }

    #[test]
    fn ended_absorbs_everything() {
        for event in [
            NameEntered,
            Begun,
            TrialStarted,
            DisplayElapsed,
            ResponseRecorded,
            Expired,
        ] {
            assert_eq!(Ended.on(event), Ok(Ended));
        }
    }

    #[test]
    fn expiry_from_any_phase() {
        for phase in [
            AwaitingName,
            Configuring,
            Countdown,
            DisplayingBoard,
            AwaitingResponse,
            TrialFeedback,
        ] {
            assert_eq!(phase.on(Expired), Ok(Ended));
        }
    }

    #[test]
    fn illegal_transitions_keep_phase() {
        assert_eq!(Configuring.on(TrialStarted), Err(Configuring));
        assert_eq!(Countdown.on(ResponseRecorded), Err(Countdown));
        assert_eq!(DisplayingBoard.on(ResponseRecorded), Err(DisplayingBoard));
        assert_eq!(DisplayingBoard.on(TrialStarted), Err(DisplayingBoard));
        assert_eq!(AwaitingResponse.on(TrialStarted), Err(AwaitingResponse));
        assert_eq!(AwaitingName.on(Begun), Err(AwaitingName));
    }

    #[test]
    fn only_awaiting_response_accepts_input() {
        assert!(AwaitingResponse.accepts_input());
        for phase in [
            AwaitingName,
            Configuring,
            Countdown,
            DisplayingBoard,
            TrialFeedback,
            Ended,
        ] {
            assert!(!phase.accepts_input());
        }
    }
}
