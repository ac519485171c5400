//! Trend alerts served from the `seo_trends` table.
//!
//! The table is reseeded whenever its newest row is older than the
//! configured max age. Seed data stands in for a real trends feed.

use chrono::{DateTime, Duration, Utc};
use log::{error, info};
use serde_json::Value;

use crate::models::TrendRow;
use crate::store::StoreClient;

const TRENDS_TABLE: &str = "seo_trends";

pub fn seed_trends() -> Vec<TrendRow> {
    vec![
        TrendRow {
            keyword: "SGE".to_string(),
            alert: "RISING".to_string(),
            message: "Google's SGE feature is gaining traction fast; content strategies should account for it.".to_string(),
            link: "https://www.searchenginejournal.com/google-sge-guide/501234/".to_string(),
            icon: "📈".to_string(),
        },
        TrendRow {
            keyword: "helpful content update".to_string(),
            alert: "FALLING".to_string(),
            message: "Interest in the Helpful Content Update is cooling, but it remains a ranking factor.".to_string(),
            link: "https://www.searchenginejournal.com/google-helpful-content-system/461234/".to_string(),
            icon: "📉".to_string(),
        },
        TrendRow {
            keyword: "core web vitals".to_string(),
            alert: "STABLE".to_string(),
            message: "Search volume for Core Web Vitals is stable; keep improving page speed and UX.".to_string(),
            link: "https://web.dev/vitals/".to_string(),
            icon: "📊".to_string(),
        },
    ]
}

/// Stale when there are no rows, no readable `updated_at`, or the first
/// row's `updated_at` is older than `max_age`. Rows are assumed to be
/// reseeded together, so the first row speaks for the batch.
pub fn is_outdated(rows: &[Value], now: DateTime<Utc>, max_age: Duration) -> bool {
    let Some(first) = rows.first() else {
        return true;
    };
    let Some(updated_at) = first["updated_at"]
        .as_str()
        .and_then(crate::utils::parse_rfc3339)
    else {
        return true;
    };
    now - updated_at > max_age
}

/// Fetch trend rows, reseeding first when the data is missing or stale.
/// Store failures degrade to an empty list rather than an error.
pub async fn get_trends(store: &StoreClient, max_age: Duration) -> Vec<Value> {
    let rows = match store.table(TRENDS_TABLE).select().await {
        Ok(rows) => rows,
        Err(e) => {
            error!("failed to read trends: {e}");
            return Vec::new();
        }
    };

    if !is_outdated(&rows, Utc::now(), max_age) {
        return rows;
    }

    info!("trend data missing or stale, reseeding");
    if let Err(e) = store
        .table(TRENDS_TABLE)
        .upsert(&seed_trends(), "keyword")
        .await
    {
        error!("failed to reseed trends: {e}");
        return Vec::new();
    }

    match store.table(TRENDS_TABLE).select().await {
        Ok(rows) => rows,
        Err(e) => {
            error!("failed to re-read trends: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        crate::utils::parse_rfc3339(rfc3339).unwrap()
    }

    #[test]
    fn empty_rows_are_stale() {
        assert!(is_outdated(&[], at("2024-06-01T00:00:00Z"), Duration::hours(24)));
    }

    #[test]
    fn old_rows_are_stale() {
        let rows = vec![json!({"updated_at": "2024-05-01T00:00:00Z"})];
        assert!(is_outdated(&rows, at("2024-06-01T00:00:00Z"), Duration::hours(24)));
    }

    #[test]
    fn fresh_rows_are_not_stale() {
        let rows = vec![json!({"updated_at": "2024-05-31T12:00:00Z"})];
        assert!(!is_outdated(&rows, at("2024-06-01T00:00:00Z"), Duration::hours(24)));
    }

    #[test]
    fn unreadable_timestamp_is_stale() {
        let rows = vec![json!({"updated_at": 12345})];
        assert!(is_outdated(&rows, at("2024-06-01T00:00:00Z"), Duration::hours(24)));
    }

    #[test]
    fn seed_set_has_unique_keywords() {
        let seeds = seed_trends();
        let mut keywords: Vec<&str> = seeds.iter().map(|t| t.keyword.as_str()).collect();
        keywords.sort_unstable();
        keywords.dedup();
        assert_eq!(keywords.len(), seeds.len());
    }
}
