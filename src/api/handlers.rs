use std::time::{Duration, Instant};

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use crate::engine::{Difficulty, DurationPreset, Square};
use crate::session::{export, ResponseOutcome, Session, SessionSettings};
use crate::submit::SessionPayload;

use super::errors::ApiError;
use super::models::*;
use super::state::{SessionEntry, SharedState};

// =========================================================================
// Health
// =========================================================================

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: "chess-attention".to_string(),
        uptime,
    })
}

// =========================================================================
// Create session
// =========================================================================

/// POST /api/sessions
pub async fn create_session(
    State(state): State<SharedState>,
    Json(input): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let patient_name = input.patient_name.trim().to_string();
    if patient_name.is_empty() {
        return Err(ApiError::InvalidRequest(
            "patientName must not be empty".into(),
        ));
    }

    let difficulty_str = input
        .difficulty
        .unwrap_or_else(|| state.config.default_difficulty.clone());
    let difficulty = Difficulty::from_str_loose(&difficulty_str)
        .ok_or_else(|| ApiError::InvalidRequest(format!("unknown difficulty: {difficulty_str}")))?;

    let duration_secs = match (&input.duration_preset, input.duration) {
        (Some(preset), _) => DurationPreset::from_str_loose(preset)
            .ok_or_else(|| {
                ApiError::InvalidRequest(format!("unknown duration preset: {preset}"))
            })?
            .seconds(),
        (None, Some(secs)) => secs,
        (None, None) => state.config.default_duration_secs,
    };
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(ApiError::InvalidRequest(
            "duration must be a positive number of seconds".into(),
        ));
    }

    let display_secs = input
        .board_display_time
        .unwrap_or(state.config.default_display_secs);
    if !display_secs.is_finite() || display_secs <= 0.0 {
        return Err(ApiError::InvalidRequest(
            "boardDisplayTime must be a positive number of seconds".into(),
        ));
    }

    let session = Session::new(SessionSettings {
        patient_name,
        difficulty,
        duration: Duration::from_secs_f64(duration_secs),
        board_display: Duration::from_secs_f64(display_secs),
        countdown: Duration::from_secs_f64(state.config.countdown_secs.max(0.0)),
    });

    let response = session_to_response(&session, Instant::now());
    let id = session.id.clone();
    tracing::info!(session = %id, difficulty = %difficulty, "session created");

    state
        .sessions
        .write()
        .await
        .insert(id, SessionEntry::new(session));

    Ok((StatusCode::CREATED, Json(response)))
}

// =========================================================================
// Session lookup / teardown
// =========================================================================

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let entry = sessions
        .get(&id)
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    Ok(Json(session_to_response(&entry.session, Instant::now())))
}

/// DELETE /api/sessions/{id}
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let removed = state.sessions.write().await.remove(&id);
    match removed {
        Some(_) => Ok(Json(DeleteResponse {
            success: true,
            message: format!("Session {id} deleted"),
        })),
        None => Err(ApiError::SessionNotFound(id)),
    }
}

// =========================================================================
// Lifecycle
// =========================================================================

/// POST /api/sessions/{id}/begin — enter the pre-game countdown.
pub async fn begin_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let now = Instant::now();
    let mut sessions = state.sessions.write().await;
    let entry = sessions
        .get_mut(&id)
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    entry.session.begin(now)?;
    Ok(Json(session_to_response(&entry.session, now)))
}

/// POST /api/sessions/{id}/trials — open the next trial.
pub async fn next_trial(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<TrialResponse>, ApiError> {
    let now = Instant::now();
    let mut sessions = state.sessions.write().await;
    let entry = sessions
        .get_mut(&id)
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;

    entry
        .session
        .next_trial(now, &mut rand::thread_rng())
        .map(|_| ())?;

    let open = entry
        .session
        .open_trial()
        .ok_or_else(|| ApiError::InternalError("trial was not opened".into()))?;
    Ok(Json(trial_to_response(&entry.session, open, now)))
}

/// POST /api/sessions/{id}/response — grade a square click.
///
/// Clicks outside the response window come back with `accepted: false`
/// rather than an error: duplicate and late input is ignored by design.
pub async fn respond(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<RespondRequest>,
) -> Result<Json<RespondResponse>, ApiError> {
    if input.row >= 8 || input.col >= 8 {
        return Err(ApiError::InvalidRequest(format!(
            "square ({}, {}) is out of range",
            input.row, input.col
        )));
    }
    if let Some(rt) = input.response_time {
        if !rt.is_finite() || rt < 0.0 {
            return Err(ApiError::InvalidRequest(
                "responseTime must be a non-negative number of seconds".into(),
            ));
        }
    }

    let now = Instant::now();
    let square = Square::new(input.row, input.col);

    let mut sessions = state.sessions.write().await;
    let entry = sessions
        .get_mut(&id)
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;

    let outcome = entry
        .session
        .record_response(now, square, input.response_time);

    let response = match outcome {
        ResponseOutcome::Recorded { record, correct } => RespondResponse {
            accepted: true,
            repeat: false,
            correct: Some(correct),
            record: Some(record),
        },
        ResponseOutcome::Repeat { record } => RespondResponse {
            accepted: false,
            repeat: true,
            correct: Some(record.is_success()),
            record: Some(record),
        },
        ResponseOutcome::Ignored => RespondResponse {
            accepted: false,
            repeat: false,
            correct: None,
            record: None,
        },
    };
    Ok(Json(response))
}

// =========================================================================
// Finish & results
// =========================================================================

/// POST /api/sessions/{id}/finish — freeze the session, submit the trial
/// log to the results collaborator, and return the merged report.
///
/// Submission failure is non-fatal: the response then carries the locally
/// computed metrics.
pub async fn finish_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ResultsResponse>, ApiError> {
    let now = Instant::now();

    // Freeze and snapshot the payload under the lock, then release it for
    // the network round-trip.
    let (payload, already_submitted) = {
        let mut sessions = state.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
        entry.session.finish(now);
        (SessionPayload::from_session(&entry.session), entry.submitted)
    };

    let metrics = if !already_submitted && state.results.is_enabled() {
        match state.results.submit(&payload).await {
            Ok(m) => {
                tracing::info!(session = %id, "results submitted");
                Some(m)
            }
            Err(e) => {
                tracing::warn!(session = %id, error = %e, "results submission failed; falling back to local metrics");
                None
            }
        }
    } else {
        None
    };

    let mut sessions = state.sessions.write().await;
    let entry = sessions
        .get_mut(&id)
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    if !already_submitted {
        entry.submitted = state.results.is_enabled();
        if metrics.is_some() {
            entry.server_metrics = metrics;
        }
    }

    Ok(Json(results_to_response(
        &entry.session,
        entry.server_metrics.clone(),
        entry.submitted,
    )))
}

/// GET /api/sessions/{id}/results — the merged report for an ended session.
pub async fn get_results(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ResultsResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let entry = sessions
        .get(&id)
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    if !entry.session.is_ended() {
        return Err(ApiError::WrongPhase(
            "results are available once the session has ended".into(),
        ));
    }
    Ok(Json(results_to_response(
        &entry.session,
        entry.server_metrics.clone(),
        entry.submitted,
    )))
}

/// GET /api/sessions/{id}/export — the frozen session as CSV.
pub async fn export_csv(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state.sessions.read().await;
    let entry = sessions
        .get(&id)
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    if !entry.session.is_ended() {
        return Err(ApiError::WrongPhase(
            "export requires an ended session".into(),
        ));
    }

    let settings = entry.session.settings();
    let csv = export::session_csv(settings, entry.session.trials());
    let filename = export::export_filename(&settings.patient_name, Utc::now());

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "text/csv; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}
