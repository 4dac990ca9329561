pub mod export;
pub mod recorder;
pub mod scoring;
pub mod state;
pub mod trial;

pub use recorder::{OpenTrial, ResponseOutcome, Session, SessionError, SessionSettings};
pub use scoring::{summarize, MetricsSource, ResultsReport, SessionSummary};
pub use state::{SessionEvent, SessionPhase};
pub use trial::TrialRecord;
