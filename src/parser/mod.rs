pub mod literal;
pub mod script;

use serde_json::Value;
use tracing::debug;

use crate::error::ReportError;
use crate::schedule::ScheduleDocument;

/// Extract the outage schedule embedded in a page.
///
/// `Ok(None)` is the soft not-found: no inline script carried the schedule
/// assignment. Parse failures and payload problems are hard errors.
pub fn parse_schedule(html: &str) -> Result<Option<ScheduleDocument>, ReportError> {
    let Some(raw) = script::find_schedule_literal(html) else {
        return Ok(None);
    };
    debug!("Schedule literal found ({} bytes)", raw.len());

    let value = literal::parse_value(&raw).map_err(|e| ReportError::Parse(e.to_string()))?;
    let payload = unwrap_payload(value)?;
    Ok(Some(ScheduleDocument::from_value(&payload)))
}

/// Peel the optional wrapper around the day data. The source has been seen
/// both bare (day keys at the top level) and wrapped (`status` marker plus the
/// days under `data`).
fn unwrap_payload(value: Value) -> Result<Value, ReportError> {
    let Value::Object(map) = value else {
        return Err(ReportError::EmptyPayload);
    };

    if let Some(status) = map.get("status").and_then(Value::as_str) {
        if !status.eq_ignore_ascii_case("ok") {
            return Err(ReportError::UpstreamStatus(status.to_string()));
        }
    }

    if let Some(data) = map.get("data") {
        return match data {
            Value::Object(inner) if !inner.is_empty() => Ok(data.clone()),
            _ => Err(ReportError::EmptyPayload),
        };
    }

    if map.is_empty() {
        return Err(ReportError::EmptyPayload);
    }
    Ok(Value::Object(map))
}

// ── Tests ──
