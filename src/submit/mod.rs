pub mod client;

pub use client::{ResultsClient, ServerMetrics, SessionPayload, SubmitError};
