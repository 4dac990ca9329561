use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::engine::{Board, Square};
use crate::session::{OpenTrial, ResultsReport, Session, TrialRecord};
use crate::submit::ServerMetrics;

// ---------------------------------------------------------------------------
// Request models
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub patient_name: String,
    pub difficulty: Option<String>,
    /// Session length in seconds. Ignored when `duration_preset` is given.
    pub duration: Option<f64>,
    /// Named length: short / medium / long / extended.
    pub duration_preset: Option<String>,
    /// Board display window in seconds.
    pub board_display_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    pub row: u8,
    pub col: u8,
    /// Reaction time measured by the UI, in seconds. Preferred over the
    /// server-side clock when present (no network latency baked in).
    pub response_time: Option<f64>,
}

// ---------------------------------------------------------------------------
// Response models
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub engine: String,
    pub uptime: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub patient_name: String,
    pub difficulty: String,
    pub duration: f64,
    pub board_display_time: f64,
    pub countdown: f64,
    pub phase: String,
    pub trial_count: usize,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialResponse {
    pub trial: usize,
    /// 8×8 grid of piece tags, row 0 = rank 8.
    pub board: Vec<Vec<Option<String>>>,
    pub attacking_piece: String,
    pub attacking_position: String,
    pub display_seconds: f64,
    pub session_elapsed: f64,
    pub session_remaining: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondResponse {
    /// False when the click fell outside the response window and was
    /// silently ignored.
    pub accepted: bool,
    /// True when the trial had already been answered; `record` then holds
    /// the original, unchanged record.
    pub repeat: bool,
    pub correct: Option<bool>,
    pub record: Option<TrialRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    pub patient_name: String,
    pub difficulty: String,
    pub total_trials: usize,
    pub successful_trials: usize,
    pub success_rate: Option<f64>,
    pub mean_response_time: Option<f64>,
    pub ies: Option<f64>,
    pub ies_source: String,
    pub ies1: Option<f64>,
    pub ies2: Option<f64>,
    pub ies3: Option<f64>,
    pub focus_drift: Option<f64>,
    pub focus_stability: Option<f64>,
    pub submitted: bool,
    pub trial_data: Vec<TrialRecord>,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// The board as a grid of piece tags for rendering.
pub fn board_to_grid(board: &Board) -> Vec<Vec<Option<String>>> {
    (0..8u8)
        .map(|row| {
            (0..8u8)
                .map(|col| board.piece_at(Square::new(row, col)).map(|p| p.to_tag()))
                .collect()
        })
        .collect()
}

pub fn session_to_response(session: &Session, now: Instant) -> SessionResponse {
    let settings = session.settings();
    SessionResponse {
        id: session.id.clone(),
        patient_name: settings.patient_name.clone(),
        difficulty: settings.difficulty.to_string(),
        duration: settings.duration.as_secs_f64(),
        board_display_time: settings.board_display.as_secs_f64(),
        countdown: settings.countdown.as_secs_f64(),
        phase: session.phase_at(now).to_string(),
        trial_count: session.trial_count(),
        created_at: session.created_at.to_rfc3339(),
    }
}

pub fn trial_to_response(session: &Session, open: &OpenTrial, now: Instant) -> TrialResponse {
    TrialResponse {
        trial: open.index,
        board: board_to_grid(&open.position.board),
        attacking_piece: open.position.attacker.to_tag(),
        attacking_position: open.position.attacker_square.to_algebraic(),
        display_seconds: session.settings().board_display.as_secs_f64(),
        session_elapsed: session.elapsed(now),
        session_remaining: session.remaining(now),
    }
}

pub fn results_to_response(
    session: &Session,
    server_metrics: Option<ServerMetrics>,
    submitted: bool,
) -> ResultsResponse {
    let settings = session.settings();
    let local = crate::session::summarize(session.trials());
    let report = ResultsReport::new(local, server_metrics);

    let (total, successful, rate, mean_rt) = match &report.local {
        Some(summary) => (
            summary.total_trials,
            summary.successful_trials,
            Some(summary.success_rate),
            summary.mean_response_time,
        ),
        None => (0, 0, None, None),
    };

    let (ies1, ies2, ies3) = match &report.server {
        Some(s) => (s.ies1, s.ies2, s.ies3),
        None => (None, None, None),
    };

    ResultsResponse {
        patient_name: settings.patient_name.clone(),
        difficulty: settings.difficulty.to_string(),
        total_trials: total,
        successful_trials: successful,
        success_rate: rate,
        mean_response_time: mean_rt,
        ies: report.effective_ies(),
        ies_source: report.ies_source().as_str().to_string(),
        ies1,
        ies2,
        ies3,
        focus_drift: report.focus_drift(),
        focus_stability: report.focus_stability(),
        submitted,
        trial_data: session.trials().to_vec(),
    }
}
