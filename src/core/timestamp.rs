// Colorful Logger - core/timestamp.rs
//
// Best-effort timestamp detection inside a line's header window.
// Rules are tried from most to least precise; the first rule whose regex
// matches AND whose text chrono accepts wins.

use crate::core::model::HeaderTimestamp;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

struct Rule {
    re: Regex,
    parse: fn(&str) -> Option<HeaderTimestamp>,
}

/// Replace the `:` or `/` date separators with `-` so one chrono format
/// covers all three spellings.
fn normalise_date(s: &str) -> String {
    let (date, rest) = s.split_at(10.min(s.len()));
    format!("{}{}", date.replace([':', '/'], "-"), rest)
}

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();

    RULES.get_or_init(|| {
        // Patterns are exercised by the unit tests below.
        fn re(pat: &str) -> Regex {
            Regex::new(pat).expect("timestamp rule: invalid regex")
        }

        vec![
            // YYYY[:/-]MM[:/-]DD HH:MM:SS
            Rule {
                re: re(r"\d{4}[:/-]\d{2}[:/-]\d{2}[ T]\d{2}:\d{2}:\d{2}"),
                parse: |s| {
                    let s = normalise_date(s).replace('T', " ");
                    NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                        .ok()
                        .map(HeaderTimestamp::DateTime)
                },
            },
            // YYYY[:/-]MM[:/-]DD
            Rule {
                re: re(r"\d{4}[:/-]\d{2}[:/-]\d{2}"),
                parse: |s| {
                    NaiveDate::parse_from_str(&normalise_date(s), "%Y-%m-%d")
                        .ok()
                        .map(HeaderTimestamp::Date)
                },
            },
            // HH:MM:SS
            Rule {
                re: re(r"\d{2}:\d{2}:\d{2}"),
                parse: |s| {
                    NaiveTime::parse_from_str(s, "%H:%M:%S")
                        .ok()
                        .map(HeaderTimestamp::Time)
                },
            },
        ]
    })
}

/// Find the first recognisable timestamp in `header`.
pub fn detect(header: &str) -> Option<HeaderTimestamp> {
    rules().iter().find_map(|rule| {
        rule.re
            .find_iter(header)
            .find_map(|m| (rule.parse)(m.as_str()))
    })
}
