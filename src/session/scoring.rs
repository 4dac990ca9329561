//! Local performance metrics over a frozen trial log.
//!
//! The authoritative inverse efficiency score and the longitudinal metrics
//! (focus drift, focus stability) come from the results collaborator; this
//! module is the optimistic local estimator used for immediate feedback and
//! as the fallback when that collaborator is unreachable. Precedence is
//! explicit: a server value wins whenever it is present.

use crate::session::trial::TrialRecord;
use crate::submit::ServerMetrics;

// =========================================================================
// SessionSummary
// =========================================================================

/// Locally computed aggregates. `None` fields mean "undefined for this
/// log" — never NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub total_trials: usize,
    pub successful_trials: usize,
    /// successes / total, in [0, 1].
    pub success_rate: f64,
    /// Mean response time over *successful* trials only; `None` when no
    /// trial succeeded.
    pub mean_response_time: Option<f64>,
    /// Inverse efficiency score: mean RT ÷ accuracy. Lower is better;
    /// penalizes fast-but-inaccurate responding. `None` when undefined.
    pub ies: Option<f64>,
}

/// Accuracy with the division-by-zero substitution: an empty log counts as
/// perfectly accurate rather than dividing by zero.
fn accuracy(successes: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        successes as f64 / total as f64
    }
}

/// Aggregate a trial log. Returns `None` for an empty log — "no data", not
/// a row of zeros.
pub fn summarize(trials: &[TrialRecord]) -> Option<SessionSummary> {
    if trials.is_empty() {
        return None;
    }

    let total = trials.len();
    let successes: Vec<&TrialRecord> = trials.iter().filter(|t| t.is_success()).collect();
    let successful = successes.len();
    let success_rate = successful as f64 / total as f64;

    let mean_response_time = if successful > 0 {
        let sum: f64 = successes.iter().map(|t| t.response_time).sum();
        Some(sum / successful as f64)
    } else {
        None
    };

    let ies = mean_response_time.map(|mean| mean / accuracy(successful, total));

    Some(SessionSummary {
        total_trials: total,
        successful_trials: successful,
        success_rate,
        mean_response_time,
        ies,
    })
}

// =========================================================================
// ResultsReport
// =========================================================================

/// Where a reported metric came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricsSource {
    Server,
    Local,
}

impl MetricsSource {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricsSource::Server => "server",
            MetricsSource::Local => "local",
        }
    }
}

/// The merged view handed to the UI: local estimates plus whatever the
/// results collaborator returned.
#[derive(Clone, Debug, Default)]
pub struct ResultsReport {
    pub local: Option<SessionSummary>,
    pub server: Option<ServerMetrics>,
}

impl ResultsReport {
    pub fn new(local: Option<SessionSummary>, server: Option<ServerMetrics>) -> Self {
        ResultsReport { local, server }
    }

    /// The IES to display: server-computed when present, else local.
    pub fn effective_ies(&self) -> Option<f64> {
        self.server
            .as_ref()
            .and_then(|s| s.ies)
            .or_else(|| self.local.as_ref().and_then(|l| l.ies))
    }

    /// Which source [`Self::effective_ies`] drew from.
    pub fn ies_source(&self) -> MetricsSource {
        if self.server.as_ref().and_then(|s| s.ies).is_some() {
            MetricsSource::Server
        } else {
            MetricsSource::Local
        }
    }

    /// Longitudinal metrics are server-only; the core never computes them.
    pub fn focus_drift(&self) -> Option<f64> {
        self.server.as_ref().and_then(|s| s.focus_drift)
    }

    pub fn focus_stability(&self) -> Option<f64> {
        self.server.as_ref().and_then(|s| s.focus_stability)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(index: usize, response_time: f64, success: u8) -> TrialRecord {
        TrialRecord {
            trial: index,
            trial_time: index as f64 * 5.0,
            attacking_piece: "wQ".into(),
            attacking_position: "d4".into(),
            attacked_pieces: "d7".into(),
            response_time,
            success,
            response_position: if success == 1 { "d7".into() } else { "a1".into() },
        }
    }

    #[test]
    fn worked_example() {
        // RTs [1.0 ✓, 2.0 ✓, 0.5 ✗] ⇒ rate 2/3, mean 1.5 (successes only),
        // IES = 1.5 / (2/3) = 2.25.
        let trials = vec![trial(0, 1.0, 1), trial(1, 2.0, 1), trial(2, 0.5, 0)];
        let summary = summarize(&trials).unwrap();
        assert_eq!(summary.total_trials, 3);
        assert_eq!(summary.successful_trials, 2);
        assert!((summary.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((summary.mean_response_time.unwrap() - 1.5).abs() < 1e-9);
        assert!((summary.ies.unwrap() - 2.25).abs() < 1e-9);
    }

    #[test]
    fn empty_log_is_no_data() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn all_failures_leave_rt_and_ies_undefined() {
        let trials = vec![trial(0, 0.5, 0), trial(1, 0.7, 0)];
        let summary = summarize(&trials).unwrap();
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.mean_response_time, None);
        assert_eq!(summary.ies, None);
    }

    #[test]
    fn all_successes() {
        let trials = vec![trial(0, 1.0, 1), trial(1, 3.0, 1)];
        let summary = summarize(&trials).unwrap();
        assert_eq!(summary.success_rate, 1.0);
        assert_eq!(summary.mean_response_time, Some(2.0));
        assert_eq!(summary.ies, Some(2.0)); // accuracy 1 ⇒ IES = mean RT
    }

    #[test]
    fn accuracy_substitution_for_empty_log() {
        assert_eq!(accuracy(0, 0), 1.0);
        assert_eq!(accuracy(1, 2), 0.5);
    }

    #[test]
    fn server_ies_takes_precedence() {
        let local = summarize(&[trial(0, 1.0, 1)]);
        let server = ServerMetrics {
            success: true,
            ies: Some(9.9),
            ies1: None,
            ies2: None,
            ies3: None,
            focus_drift: Some(0.1),
            focus_stability: Some(0.8),
        };
        let report = ResultsReport::new(local, Some(server));
        assert_eq!(report.effective_ies(), Some(9.9));
        assert_eq!(report.ies_source(), MetricsSource::Server);
        assert_eq!(report.focus_drift(), Some(0.1));
        assert_eq!(report.focus_stability(), Some(0.8));
    }

    #[test]
    fn local_ies_is_the_fallback() {
        let local = summarize(&[trial(0, 1.0, 1)]);
        let report = ResultsReport::new(local, None);
        assert_eq!(report.effective_ies(), Some(1.0));
        assert_eq!(report.ies_source(), MetricsSource::Local);
        assert_eq!(report.focus_drift(), None);
        assert_eq!(report.focus_stability(), None);
    }

    #[test]
    fn server_reply_without_ies_falls_back_locally() {
        let local = summarize(&[trial(0, 2.0, 1)]);
        let server = ServerMetrics {
            success: false,
            ies: None,
            ies1: None,
            ies2: None,
            ies3: None,
            focus_drift: None,
            focus_stability: None,
        };
        let report = ResultsReport::new(local, Some(server));
        assert_eq!(report.effective_ies(), Some(2.0));
        assert_eq!(report.ies_source(), MetricsSource::Local);
    }
}
