use thiserror::Error;

/// Failures while producing an outage report.
///
/// Everything here is caught at the command-handler boundary; which variant
/// occurred decides what the user sees, the full cause goes to the log.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The schedule page replied with a non-success HTTP status.
    #[error("schedule page returned HTTP {0}")]
    FetchStatus(u16),

    /// Network-level failure talking to the schedule page.
    #[error("schedule fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// No inline script on the page carried the schedule assignment.
    #[error("schedule data not found on the page")]
    NotFound,

    /// The embedded literal could not be parsed into a structured value.
    #[error("schedule literal is malformed: {0}")]
    Parse(String),

    /// The schedule object exists but carries no day data.
    #[error("schedule payload is empty")]
    EmptyPayload,

    /// The schedule object reports a non-OK upstream status.
    #[error("upstream reports status {0:?}")]
    UpstreamStatus(String),
}
