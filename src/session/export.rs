//! CSV materialisation of a frozen session.
//!
//! Three metadata rows, one header row, then exactly one row per recorded
//! trial — the shape the clinical spreadsheet side expects. The session is
//! frozen before export, so the output is a complete, immutable snapshot.

use chrono::{DateTime, Utc};

use crate::session::recorder::SessionSettings;
use crate::session::trial::TrialRecord;

const TRIAL_HEADER: [&str; 8] = [
    "Trial",
    "Trial Time",
    "Attacking Piece",
    "Attacking Position",
    "Attacked Pieces",
    "Response Time",
    "Success",
    "Response Position",
];

/// Render a full session as CSV text.
pub fn session_csv(settings: &SessionSettings, trials: &[TrialRecord]) -> String {
    let mut out = String::new();

    push_row(
        &mut out,
        &["Difficulty", &settings.difficulty.to_string()],
    );
    push_row(
        &mut out,
        &[
            "Test Duration",
            &format_seconds(settings.duration.as_secs_f64()),
        ],
    );
    push_row(
        &mut out,
        &[
            "Board Display Time",
            &format_seconds(settings.board_display.as_secs_f64()),
        ],
    );
    push_row(&mut out, &TRIAL_HEADER);

    for t in trials {
        push_row(
            &mut out,
            &[
                &t.trial.to_string(),
                &format_seconds(t.trial_time),
                &t.attacking_piece,
                &t.attacking_position,
                &t.attacked_pieces,
                &format_seconds(t.response_time),
                &t.success.to_string(),
                &t.response_position,
            ],
        );
    }

    out
}

/// Download filename: subject name plus an ISO timestamp with characters
/// unsafe in filenames replaced.
pub fn export_filename(patient_name: &str, at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339()
        .replace([':', '.', '+'], "-");
    let name: String = patient_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect();
    format!("{name}_{stamp}.csv")
}

fn push_row(out: &mut String, fields: &[&str]) {
    let escaped: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    out.push_str(&escaped.join(","));
    out.push('\n');
}

/// Quote a field when it contains a delimiter, quote, or newline.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Seconds as the shortest faithful decimal (whole numbers without a
/// trailing ".0", to match the spreadsheet convention).
fn format_seconds(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

// =========================================================================
// Tests
// =========================================================================
