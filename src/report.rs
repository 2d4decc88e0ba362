use std::fmt;

use chrono::{Local, TimeZone};
use reqwest::Client;
use tracing::info;

use crate::error::ReportError;
use crate::schedule::{self, HourStatusMap, ScheduleDocument};
use crate::{fetch, parser};

/// Status token meaning "no power" for the hour; every other token (and a
/// missing hour) means power is available.
const NO_POWER: &str = "no";

/// Feeder identifiers carry this prefix on the source page; the report label
/// drops it.
const FEEDER_PREFIX: &str = "GPV";

/// A maximal run of consecutive powerless hours, as [start, end) on a 24-hour
/// clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutageInterval {
    pub start: u32,
    pub end: u32,
}

impl fmt::Display for OutageInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// The full report flow: fetch the page, extract and filter the schedule,
/// render the outage lines. The soft not-found from the extractor becomes
/// `NotFound` here so callers branch on a single error type.
pub async fn outage_report(
    client: &Client,
    url: &str,
    feeders: &[String],
) -> Result<String, ReportError> {
    let html = fetch::fetch_page(client, url).await?;
    let Some(document) = parser::parse_schedule(&html)? else {
        info!("Schedule assignment not found on {}", url);
        return Err(ReportError::NotFound);
    };
    let kept = schedule::filter(&document, feeders);
    Ok(render_report(&kept))
}

/// One line per feeder with at least one outage, days ascending. An outage-free
/// document renders as the empty string.
pub fn render_report(document: &ScheduleDocument) -> String {
    compress(document).join("\n")
}

/// Description lines in day-then-feeder order. Fully-lit feeders are silent.
pub fn compress(document: &ScheduleDocument) -> Vec<String> {
    let mut lines = Vec::new();
    for (timestamp, feeders) in &document.days {
        let date = format_date(*timestamp);
        for (feeder, hours) in feeders {
            let intervals = outage_intervals(hours);
            if intervals.is_empty() {
                continue;
            }
            let spans = intervals
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!(
                "Дата {date}, график {label}, света не будет в такие промежутки: {spans}",
                label = feeder_label(feeder),
            ));
        }
    }
    lines
}

/// Merge the per-hour flags into maximal intervals. Hour "N" covers [N-1, N),
/// so a run opens at `hour - 1`; consecutive "no" hours only advance the end.
pub fn outage_intervals(hours: &HourStatusMap) -> Vec<OutageInterval> {
    let mut intervals = Vec::new();
    let mut open: Option<OutageInterval> = None;

    for hour in 1..=24u32 {
        let off = hours
            .get(&hour.to_string())
            .map(|status| status.as_str() == NO_POWER)
            .unwrap_or(false);
        if off {
            match open.as_mut() {
                Some(interval) => interval.end = hour,
                None => {
                    open = Some(OutageInterval {
                        start: hour - 1,
                        end: hour,
                    })
                }
            }
        } else if let Some(interval) = open.take() {
            intervals.push(interval);
        }
    }
    if let Some(interval) = open.take() {
        intervals.push(interval);
    }

    intervals
}

fn format_date(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(date) => date.format("%d.%m.%Y").to_string(),
        None => timestamp.to_string(),
    }
}

fn feeder_label(feeder: &str) -> &str {
    feeder.strip_prefix(FEEDER_PREFIX).unwrap_or(feeder)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hours(pairs: &[(u32, &str)]) -> HourStatusMap {
        pairs
            .iter()
            .map(|(h, s)| (h.to_string(), s.to_string()))
            .collect()
    }

    fn spans(intervals: &[OutageInterval]) -> String {
        intervals
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    #[test]
    fn full_day_merges_to_one_interval() {
        let all_no: Vec<(u32, &str)> = (1..=24).map(|h| (h, "no")).collect();
        let intervals = outage_intervals(&hours(&all_no));
        assert_eq!(intervals, vec![OutageInterval { start: 0, end: 24 }]);
        assert_eq!(spans(&intervals), "0 - 24");
    }

    #[test]
    fn gaps_split_intervals() {
        let intervals = outage_intervals(&hours(&[(3, "no"), (4, "no"), (5, "no"), (9, "no")]));
        assert_eq!(
            intervals,
            vec![
                OutageInterval { start: 2, end: 5 },
                OutageInterval { start: 8, end: 9 },
            ]
        );
        assert_eq!(spans(&intervals), "2 - 5, 8 - 9");
    }

    #[test]
    fn single_hour_outage_starts_at_previous_hour() {
        let intervals = outage_intervals(&hours(&[(9, "no")]));
        assert_eq!(spans(&intervals), "8 - 9");
    }

    #[test]
    fn run_through_hour_24_is_closed() {
        let intervals = outage_intervals(&hours(&[(23, "no"), (24, "no")]));
        assert_eq!(intervals, vec![OutageInterval { start: 22, end: 24 }]);
    }

    #[test]
    fn other_tokens_and_missing_hours_mean_power() {
        let intervals = outage_intervals(&hours(&[(3, "yes"), (4, "maybe"), (7, "no")]));
        assert_eq!(intervals, vec![OutageInterval { start: 6, end: 7 }]);
        assert!(outage_intervals(&hours(&[])).is_empty());
    }

    #[test]
    fn silent_feeders_emit_no_lines() {
        let doc = ScheduleDocument::from_value(&json!({
            "1700000000": {
                "GPV5.1": {"9": "no"},
                "GPV6.2": {"1": "yes", "2": "yes"},
            },
            "1700086400": {},
        }));
        let lines = compress(&doc);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("график 5.1"));
    }

    #[test]
    fn empty_document_renders_empty_string() {
        assert_eq!(render_report(&ScheduleDocument::default()), "");
    }

    #[test]
    fn lines_follow_day_then_feeder_order() {
        let doc = ScheduleDocument::from_value(&json!({
            "1700086400": {"GPV6.2": {"2": "no"}},
            "1700000000": {"GPV5.1": {"9": "no"}, "GPV1.1": {"4": "no"}},
        }));
        let lines = compress(&doc);
        assert_eq!(lines.len(), 3);
        // Earlier day first despite insertion order, feeders in mapping order.
        assert!(lines[0].contains("график 1.1"));
        assert!(lines[1].contains("график 5.1"));
        assert!(lines[2].contains("график 6.2"));
    }

    #[test]
    fn report_line_shape() {
        let doc = ScheduleDocument::from_value(&json!({
            "1700000000": {"GPV5.1": {"9": "no", "10": "no", "11": "yes"}},
        }));
        let lines = compress(&doc);
        assert_eq!(lines.len(), 1);
        let expected_date = format_date(1700000000);
        assert_eq!(
            lines[0],
            format!("Дата {expected_date}, график 5.1, света не будет в такие промежутки: 8 - 10")
        );
    }

    #[test]
    fn feeder_without_prefix_keeps_its_name() {
        assert_eq!(feeder_label("GPV5.1"), "5.1");
        assert_eq!(feeder_label("TP-12"), "TP-12");
    }

    #[test]
    fn date_renders_short_local_format() {
        let date = format_date(1700000000);
        assert_eq!(date.len(), 10);
        assert!(date.chars().filter(|c| *c == '.').count() == 2);
    }
}
