use chrono::{DateTime, Utc};
use regex::Regex;

use crate::models::Chapter;

/// Normalize a search query into the key used for cache grouping
pub fn query_key(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Format an ISO8601 duration string (PT1H2M3S) as a clock string.
/// Hours present -> "H:MM:SS", otherwise "M:SS". Malformed input -> "0:00".
pub fn format_iso8601_duration(iso: &str) -> String {
    let mut hours: i64 = 0;
    let mut minutes: i64 = 0;
    let mut seconds: i64 = 0;

    if let Ok(re) = Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?") {
        if let Some(caps) = re.captures(iso) {
            hours = caps.get(1).map_or(0, |m| m.as_str().parse().unwrap_or(0));
            minutes = caps.get(2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
            seconds = caps.get(3).map_or(0, |m| m.as_str().parse().unwrap_or(0));
        }
    }

    let total = hours * 3600 + minutes * 60 + seconds;
    if total >= 3600 {
        format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Extract chapter markers from a free-text video description.
/// A chapter line looks like "12:34 Some title" or "1:02:34 Some title";
/// everything else is ignored.
pub fn parse_chapters(description: &str) -> Vec<Chapter> {
    let Ok(re) = Regex::new(r"^(?P<time>(?:\d+:)?\d{1,2}:\d{2})\s*(?P<title>.+)$") else {
        return Vec::new();
    };

    let mut chapters = Vec::new();
    for line in description.lines() {
        let Some(caps) = re.captures(line.trim()) else {
            continue;
        };
        let parts: Vec<i64> = caps["time"]
            .split(':')
            .filter_map(|p| p.parse().ok())
            .collect();
        let start_seconds = match parts.as_slice() {
            [h, m, s] => h * 3600 + m * 60 + s,
            [m, s] => m * 60 + s,
            _ => continue,
        };
        chapters.push(Chapter {
            start_seconds,
            title: caps["title"].trim().to_string(),
        });
    }
    chapters
}

/// Parse an RFC3339 timestamp (trailing "Z" included) into UTC
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_duration_with_hours() {
        assert_eq!(format_iso8601_duration("PT1H2M3S"), "1:02:03");
    }

    #[test]
    fn formats_duration_minutes_only() {
        assert_eq!(format_iso8601_duration("PT5M"), "5:00");
    }

    #[test]
    fn formats_zero_duration() {
        assert_eq!(format_iso8601_duration("PT0S"), "0:00");
    }

    #[test]
    fn formats_malformed_duration_as_zero() {
        assert_eq!(format_iso8601_duration("not a duration"), "0:00");
        assert_eq!(format_iso8601_duration(""), "0:00");
    }

    #[test]
    fn parses_chapter_lines() {
        let description = "0:00 Intro\n1:30 Setup\nnot a chapter";
        let chapters = parse_chapters(description);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].start_seconds, 0);
        assert_eq!(chapters[0].title, "Intro");
        assert_eq!(chapters[1].start_seconds, 90);
        assert_eq!(chapters[1].title, "Setup");
    }

    #[test]
    fn parses_hour_prefixed_chapter() {
        let chapters = parse_chapters("1:02:03 Deep dive");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].start_seconds, 3723);
        assert_eq!(chapters[0].title, "Deep dive");
    }

    #[test]
    fn no_chapters_is_empty() {
        assert!(parse_chapters("just a plain description").is_empty());
        assert!(parse_chapters("").is_empty());
    }

    #[test]
    fn normalizes_query_key() {
        assert_eq!(query_key("  SEO Basics "), "seo basics");
        assert_eq!(query_key("seo basics"), "seo basics");
    }

    #[test]
    fn parses_rfc3339_with_z_suffix() {
        let parsed = parse_rfc3339("2024-05-01T12:00:00Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-05-01T12:00:00+00:00");
        assert!(parse_rfc3339("yesterday").is_none());
    }
}
