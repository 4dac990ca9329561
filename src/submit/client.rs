//! Client for the external results collaborator.
//!
//! The collaborator persists the raw trial log and computes the
//! authoritative session metrics (IES, per-segment IES, focus drift and
//! stability). Submission happens once, after the session is frozen, and is
//! fire-and-forget with respect to gameplay: every failure path leaves the
//! locally recorded data intact and the caller falls back to the local
//! estimator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::session::recorder::{Session, SessionSettings};
use crate::session::trial::TrialRecord;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// The finished-session payload POSTed to the collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub patient_name: String,
    pub difficulty: String,
    pub trial_data: Vec<TrialRecord>,
    /// Session length in seconds.
    pub duration: f64,
    /// Board display window in seconds.
    pub board_display_time: f64,
}

impl SessionPayload {
    /// Snapshot a frozen session for submission.
    pub fn from_session(session: &Session) -> Self {
        let settings: &SessionSettings = session.settings();
        SessionPayload {
            patient_name: settings.patient_name.clone(),
            difficulty: settings.difficulty.to_string(),
            trial_data: session.trials().to_vec(),
            duration: settings.duration.as_secs_f64(),
            board_display_time: settings.board_display.as_secs_f64(),
        }
    }
}

/// Metrics the collaborator computes from the submitted trial log. All
/// metric fields are optional so a partial reply still parses; `ies1..=3`
/// and the focus metrics are opaque to the core.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ServerMetrics {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub ies: Option<f64>,
    #[serde(default)]
    pub ies1: Option<f64>,
    #[serde(default)]
    pub ies2: Option<f64>,
    #[serde(default)]
    pub ies3: Option<f64>,
    #[serde(default)]
    pub focus_drift: Option<f64>,
    #[serde(default)]
    pub focus_stability: Option<f64>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Submission failures. All are non-fatal to the session.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("results submission is not configured")]
    Disabled,

    #[error("results request failed: {0}")]
    RequestFailed(String),

    #[error("results endpoint returned {status}: {body}")]
    EndpointError { status: u16, body: String },

    #[error("results endpoint reply was malformed: {0}")]
    MalformedReply(String),
}

// ---------------------------------------------------------------------------
// ResultsClient
// ---------------------------------------------------------------------------

/// HTTP client for the results endpoint. Constructed once at startup and
/// shared across sessions.
#[derive(Clone, Debug)]
pub struct ResultsClient {
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl ResultsClient {
    /// `endpoint = None` disables submission entirely.
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        ResultsClient { endpoint, client }
    }

    /// A client that never submits.
    pub fn disabled() -> Self {
        ResultsClient {
            endpoint: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// POST a finished session and parse the collaborator's metrics.
    pub async fn submit(&self, payload: &SessionPayload) -> Result<ServerMetrics, SubmitError> {
        let endpoint = self.endpoint.as_deref().ok_or(SubmitError::Disabled)?;

        let resp = self
            .client
            .post(endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| SubmitError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SubmitError::EndpointError { status, body });
        }

        resp.json::<ServerMetrics>()
            .await
            .map_err(|e| SubmitError::MalformedReply(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> SessionPayload {
        SessionPayload {
            patient_name: "subject".into(),
            difficulty: "medium".into(),
            trial_data: vec![TrialRecord {
                trial: 0,
                trial_time: 0.0,
                attacking_piece: "wR".into(),
                attacking_position: "a1".into(),
                attacked_pieces: "a8".into(),
                response_time: 1.5,
                success: 1,
                response_position: "a8".into(),
            }],
            duration: 90.0,
            board_display_time: 3.0,
        }
    }

    #[test]
    fn payload_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(sample_payload()).unwrap();
        assert!(json.get("patientName").is_some());
        assert!(json.get("trialData").is_some());
        assert!(json.get("boardDisplayTime").is_some());
        assert_eq!(json["trialData"][0]["responseTime"], 1.5);
        assert_eq!(json["trialData"][0]["attackingPiece"], "wR");
    }

    #[test]
    fn server_metrics_parse_full_reply() {
        let json = r#"{
            "success": true,
            "ies": 2.25,
            "ies1": 2.0,
            "ies2": 2.2,
            "ies3": 2.6,
            "focus_drift": 0.12,
            "focus_stability": 0.85
        }"#;
        let metrics: ServerMetrics = serde_json::from_str(json).unwrap();
        assert!(metrics.success);
        assert_eq!(metrics.ies, Some(2.25));
        assert_eq!(metrics.ies3, Some(2.6));
        assert_eq!(metrics.focus_drift, Some(0.12));
        assert_eq!(metrics.focus_stability, Some(0.85));
    }

    #[test]
    fn server_metrics_parse_partial_reply() {
        let metrics: ServerMetrics = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!metrics.success);
        assert_eq!(metrics.ies, None);
        assert_eq!(metrics.focus_stability, None);
    }

    #[tokio::test]
    async fn disabled_client_reports_disabled() {
        let client = ResultsClient::disabled();
        assert!(!client.is_enabled());
        let result = client.submit(&sample_payload()).await;
        assert!(matches!(result, Err(SubmitError::Disabled)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_request_failure() {
        // Port 9 (discard) on localhost: nothing listens there.
        let client = ResultsClient::new(
            Some("http://127.0.0.1:9/submit_results".into()),
            Duration::from_millis(250),
        );
        assert!(client.is_enabled());
        let result = client.submit(&sample_payload()).await;
        assert!(matches!(result, Err(SubmitError::RequestFailed(_))));
    }
}
