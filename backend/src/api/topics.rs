//! Topic/channel subscriptions, mounted under `/subscribe`.

use rocket::serde::json::Json;
use rocket::{get, post, State};
use serde_json::{json, Value};
use std::collections::BTreeSet;

use crate::models::{ApiError, TopicSubscribe};
use crate::AppState;

#[get("/topics?<user_id>&<channel_id>")]
pub async fn list_topics(
    user_id: String,
    channel_id: Option<String>,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let mut request = state
        .store
        .table("user_topics")
        .eq("user_id", &user_id);
    if let Some(channel_id) = &channel_id {
        // Channel-less subscriptions apply everywhere; channel-bound ones
        // only when the channel matches
        request = request.or_filter(&format!("(channel_id.is.null,channel_id.eq.{channel_id})"));
    }
    let rows = request.order("created_at", true).select().await?;
    Ok(Json(json!({ "topics": collect_topics(&rows) })))
}

#[post("/topics", data = "<subscription>")]
pub async fn subscribe_topic(
    subscription: Json<TopicSubscribe>,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .table("user_topics")
        .upsert(
            &json!({
                "user_id": subscription.user_id,
                "channel_id": subscription.channel_id,
                "topic": subscription.topic.trim(),
            }),
            "user_id,topic",
        )
        .await?;
    Ok(Json(json!({ "ok": true })))
}

#[post("/topics/unsubscribe", data = "<subscription>")]
pub async fn unsubscribe_topic(
    subscription: Json<TopicSubscribe>,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let mut request = state
        .store
        .table("user_topics")
        .eq("user_id", &subscription.user_id)
        .eq("topic", subscription.topic.trim());
    if let Some(channel_id) = &subscription.channel_id {
        request = request.eq("channel_id", channel_id);
    }
    request.delete().await?;
    Ok(Json(json!({ "ok": true })))
}

/// Trimmed, deduplicated, sorted topic strings
fn collect_topics(rows: &[Value]) -> Vec<String> {
    let topics: BTreeSet<String> = rows
        .iter()
        .filter_map(|row| row["topic"].as_str())
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .map(String::from)
        .collect();
    topics.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_dedupes_topics() {
        let rows = vec![
            json!({"topic": "SEO "}),
            json!({"topic": "SEO"}),
            json!({"topic": "analytics"}),
        ];
        assert_eq!(collect_topics(&rows), vec!["SEO", "analytics"]);
    }

    #[test]
    fn skips_empty_and_missing_topics() {
        let rows = vec![
            json!({"topic": "  "}),
            json!({"channel_id": "UC123"}),
            json!({"topic": "backlinks"}),
        ];
        assert_eq!(collect_topics(&rows), vec!["backlinks"]);
    }

    #[test]
    fn output_is_sorted() {
        let rows = vec![
            json!({"topic": "zebra"}),
            json!({"topic": "alpha"}),
            json!({"topic": "media"}),
        ];
        assert_eq!(collect_topics(&rows), vec!["alpha", "media", "zebra"]);
    }
}
