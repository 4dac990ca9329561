//! Per-trial outcome records.

use serde::{Deserialize, Serialize};

use crate::engine::{Position, Square};

/// The outcome of one display-then-respond cycle.
///
/// Created once — at response time or at timeout — appended to the session
/// log and never mutated afterward. Field names are the wire/export schema
/// shared with the results collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialRecord {
    /// Zero-based trial index within the session.
    pub trial: usize,
    /// Seconds from session start to this trial's board being shown.
    pub trial_time: f64,
    /// Attacker tag, e.g. `wQ`.
    pub attacking_piece: String,
    /// Attacker square in algebraic notation.
    pub attacking_position: String,
    /// Attacked squares, algebraic, semicolon-joined, in threat-walk order.
    pub attacked_pieces: String,
    /// Seconds from board-hide to the response (or to the timeout).
    pub response_time: f64,
    /// 1 for a correct response, 0 otherwise.
    pub success: u8,
    /// Response square in algebraic notation; empty on timeout.
    pub response_position: String,
}

impl TrialRecord {
    /// Record a graded response.
    pub fn graded(
        trial: usize,
        trial_time: f64,
        position: &Position,
        response: Square,
        response_time: f64,
    ) -> Self {
        let success = u8::from(position.is_attacked(response));
        TrialRecord {
            trial,
            trial_time,
            attacking_piece: position.attacker.to_tag(),
            attacking_position: position.attacker_square.to_algebraic(),
            attacked_pieces: position.attacked_algebraic(),
            response_time,
            success,
            response_position: response.to_algebraic(),
        }
    }

    /// Record an expired response window: no square, no success.
    pub fn timed_out(
        trial: usize,
        trial_time: f64,
        position: &Position,
        response_time: f64,
    ) -> Self {
        TrialRecord {
            trial,
            trial_time,
            attacking_piece: position.attacker.to_tag(),
            attacking_position: position.attacker_square.to_algebraic(),
            attacked_pieces: position.attacked_algebraic(),
            response_time,
            success: 0,
            response_position: String::new(),
        }
    }

    /// Whether the trial was answered correctly.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.success == 1
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
