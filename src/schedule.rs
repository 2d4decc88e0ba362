use std::collections::BTreeMap;

use serde_json::Value;

/// Hour-of-day key ("1".."24") to status token. Only the literal token "no"
/// means "no power"; anything else, including a missing hour, means power is
/// available.
pub type HourStatusMap = BTreeMap<String, String>;

/// Feeder identifier (e.g. "GPV5.1") to its per-hour statuses.
pub type FeederMap = BTreeMap<String, HourStatusMap>;

/// One fetched schedule: day timestamps (local midnight, seconds) to feeders.
/// Request-scoped and immutable once built; the `BTreeMap` keys give the
/// ascending-date iteration the report relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleDocument {
    pub days: BTreeMap<i64, FeederMap>,
}

impl ScheduleDocument {
    /// Build from a parsed literal, skipping entries that do not fit the
    /// day → feeder → hour shape. Scalar status tokens that are not strings
    /// are kept as their literal rendering.
    pub fn from_value(value: &Value) -> Self {
        let mut days = BTreeMap::new();
        let Value::Object(map) = value else {
            return Self { days };
        };

        for (day_key, feeders) in map {
            let Ok(timestamp) = day_key.parse::<i64>() else {
                continue;
            };
            let Value::Object(feeders) = feeders else {
                continue;
            };
            let feeder_map: FeederMap = feeders
                .iter()
                .filter_map(|(feeder, hours)| {
                    let Value::Object(hours) = hours else {
                        return None;
                    };
                    let hour_map = hours
                        .iter()
                        .map(|(hour, status)| (hour.clone(), status_token(status)))
                        .collect();
                    Some((feeder.clone(), hour_map))
                })
                .collect();
            days.insert(timestamp, feeder_map);
        }

        Self { days }
    }
}

fn status_token(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Restrict a document to the given feeders. Pure: every day key survives,
/// even when its feeder map becomes empty; kept feeders are compared as exact
/// case-sensitive strings and their hour maps are preserved unchanged.
pub fn filter(document: &ScheduleDocument, keep: &[String]) -> ScheduleDocument {
    let days = document
        .days
        .iter()
        .map(|(timestamp, feeders)| {
            let kept: FeederMap = feeders
                .iter()
                .filter(|(feeder, _)| keep.iter().any(|k| k == *feeder))
                .map(|(feeder, hours)| (feeder.clone(), hours.clone()))
                .collect();
            (*timestamp, kept)
        })
        .collect();
    ScheduleDocument { days }
}

// ── Tests ──
