//! Locating the schedule assignment inside the page's inline scripts.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

/// The namespaced property the schedule is assigned to.
const MARKER: &str = "DisconSchedule.fact";

static ASSIGN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"DisconSchedule\.fact\s*=\s*\{").unwrap());

/// Walk inline `<script>` elements in document order and return the raw
/// object literal of the first schedule assignment, or `None` when no script
/// carries the marker (or its literal never closes).
pub fn find_schedule_literal(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let scripts = Selector::parse("script").ok()?;

    for script in document.select(&scripts) {
        let text: String = script.text().collect();
        if !text.contains(MARKER) {
            continue;
        }
        if let Some(found) = ASSIGN_RE.find(&text) {
            // The match ends on the opening brace of the literal.
            let start = found.end() - 1;
            if let Some(literal) = balanced_object(&text[start..]) {
                return Some(literal.to_string());
            }
        }
    }
    None
}

/// Slice a balanced `{...}` literal from the start of `s` with a brace-depth
/// scan. Braces inside quoted strings do not affect the depth. Returns `None`
/// if the literal never closes.
fn balanced_object(s: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in s.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => in_string = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn page(script_body: &str) -> String {
        format!(
            "<html><head><script>var x = 1;</script></head>\
             <body><p>schedule</p><script>{script_body}</script></body></html>"
        )
    }

    #[test]
    fn finds_assignment_in_later_script() {
        let html = page("DisconSchedule.fact = {'1700000000': {'GPV5.1': {'9': 'no'}}};");
        let literal = find_schedule_literal(&html).unwrap();
        assert_eq!(literal, "{'1700000000': {'GPV5.1': {'9': 'no'}}}");
    }

    #[test]
    fn first_assignment_wins() {
        let html = "<script>DisconSchedule.fact = {'a': 1};</script>\
                    <script>DisconSchedule.fact = {'b': 2};</script>";
        assert_eq!(find_schedule_literal(html).unwrap(), "{'a': 1}");
    }

    #[test]
    fn marker_absent_reports_none() {
        let html = page("var DisconSchedule = {};\nDisconSchedule.preset = {'a': 1};");
        assert!(find_schedule_literal(&html).is_none());
    }

    #[test]
    fn nested_braces_are_balanced() {
        let html = page(
            "DisconSchedule.fact = {'d': {'f': {'1': 'no', '2': 'yes'}}};\
             DisconSchedule.other = 1;",
        );
        assert_eq!(
            find_schedule_literal(&html).unwrap(),
            "{'d': {'f': {'1': 'no', '2': 'yes'}}}"
        );
    }

    #[test]
    fn braces_inside_strings_ignored() {
        let html = page("DisconSchedule.fact = {'note': 'a } b { c', 'd': {}};");
        assert_eq!(
            find_schedule_literal(&html).unwrap(),
            "{'note': 'a } b { c', 'd': {}}"
        );
    }

    #[test]
    fn unterminated_literal_treated_as_not_found() {
        let html = page("DisconSchedule.fact = {'d': {'f': ");
        assert!(find_schedule_literal(&html).is_none());
    }

    #[test]
    fn balanced_object_stops_at_depth_zero() {
        assert_eq!(balanced_object("{a{b}c} tail"), Some("{a{b}c}"));
        assert_eq!(balanced_object("{'}': 1} tail"), Some("{'}': 1}"));
        assert_eq!(balanced_object("{open"), None);
    }
}
