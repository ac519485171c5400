//! Video search gateway and new-videos poller backed by the YouTube Data API.
//!
//! Search results are enriched with a single batched details call and, when
//! the request is cache-eligible (first page, relevance order, no freshness
//! override), written through into the `videos` table keyed on `video_id`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde_json::Value;
use std::collections::HashMap;

use crate::models::{Chapter, NewVideoItem, SearchResponse, VideoItem, VideoRow};
use crate::store::StoreClient;
use crate::utils::{format_iso8601_duration, parse_chapters, parse_rfc3339, query_key};

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const VIDEOS_URL: &str = "https://www.googleapis.com/youtube/v3/videos";

/// Page size for the date-ordered new-videos poll
const NEW_VIDEOS_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub language: String,
    pub max_results: u32,
    pub order: String,
    pub page_token: Option<String>,
    pub fresh: bool,
}

impl SearchParams {
    /// Cache-eligible: no freshness override, first page, relevance order
    pub fn cache_eligible(&self) -> bool {
        !self.fresh && self.page_token.is_none() && self.order == "relevance"
    }
}

#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: String,
}

impl std::fmt::Debug for YouTubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubeClient")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl YouTubeClient {
    pub fn new(api_key: &str) -> Self {
        YouTubeClient {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
        }
    }

    async fn get_json(&self, url: &str, params: &[(&str, String)]) -> Result<Value> {
        let response = self.http.get(url).query(params).send().await?;
        Ok(response.json::<Value>().await?)
    }
}

/// Search the external catalog, enrich with per-video detail and serve or
/// fill the write-through cache.
pub async fn search_videos(
    youtube: &YouTubeClient,
    store: &StoreClient,
    params: &SearchParams,
) -> Result<SearchResponse> {
    let qk = query_key(&params.query);
    let use_cache = params.cache_eligible();

    if use_cache {
        let cached = store.table("videos").eq("query_key", &qk).select().await?;
        if !cached.is_empty() {
            info!("serving {} cached videos for '{}'", cached.len(), qk);
            return Ok(SearchResponse {
                items: cached.iter().map(cached_row_to_item).collect(),
                next_page_token: None,
            });
        }
    }

    let mut search_params = vec![
        ("part", "snippet".to_string()),
        ("q", params.query.clone()),
        ("type", "video".to_string()),
        ("relevanceLanguage", params.language.clone()),
        ("maxResults", params.max_results.to_string()),
        ("order", params.order.clone()),
        ("key", youtube.api_key.clone()),
    ];
    if let Some(token) = &params.page_token {
        search_params.push(("pageToken", token.clone()));
    }

    // Upstream failure or malformed payload counts as "no results"
    let data = match youtube.get_json(SEARCH_URL, &search_params).await {
        Ok(data) => data,
        Err(e) => {
            warn!("video search request failed: {e}");
            return Ok(empty_response());
        }
    };
    let raw_items = match data.get("items").and_then(Value::as_array) {
        Some(items) if !items.is_empty() => items.clone(),
        _ => return Ok(empty_response()),
    };

    let video_ids: Vec<String> = raw_items
        .iter()
        .filter_map(|it| it["id"]["videoId"].as_str())
        .map(String::from)
        .collect();

    // One batched details call for duration, description and channel
    let details = match youtube
        .get_json(
            VIDEOS_URL,
            &[
                ("part", "contentDetails,snippet".to_string()),
                ("id", video_ids.join(",")),
                ("key", youtube.api_key.clone()),
            ],
        )
        .await
    {
        Ok(details) => details,
        Err(e) => {
            warn!("video details request failed: {e}");
            Value::Null
        }
    };

    let items = build_items(&raw_items, &details);

    if use_cache && !items.is_empty() {
        let rows: Vec<VideoRow> = items
            .iter()
            .map(|item| VideoRow::from_item(item, &params.query, &qk))
            .collect();
        store
            .table("videos")
            .upsert(&rows, "video_id")
            .await
            .map(|_| info!("cached {} videos for '{}'", rows.len(), qk))?;
    }

    Ok(SearchResponse {
        items,
        next_page_token: data["nextPageToken"].as_str().map(String::from),
    })
}

/// Poll the catalog for videos published after `last_checked_at`.
/// Results come back newest-first; iteration stops at the first item not
/// newer than the bound. Never writes to the cache.
pub async fn new_videos_for_query(
    youtube: &YouTubeClient,
    query: &str,
    language: &str,
    last_checked_at: Option<&str>,
) -> Result<Vec<NewVideoItem>> {
    let poll_params = new_videos_params(query, language, &youtube.api_key);
    let data = match youtube.get_json(SEARCH_URL, &poll_params).await {
        Ok(data) => data,
        Err(e) => {
            warn!("new-videos poll failed for '{query}': {e}");
            return Ok(Vec::new());
        }
    };

    let Some(items) = data.get("items").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    let bound = last_checked_at.and_then(parse_rfc3339);
    Ok(collect_new_items(items, bound))
}

/// Date-ordered search request for the poll, language-pinned like the
/// main search path
fn new_videos_params(query: &str, language: &str, api_key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("part", "snippet".to_string()),
        ("q", query.to_string()),
        ("type", "video".to_string()),
        ("relevanceLanguage", language.to_string()),
        ("maxResults", NEW_VIDEOS_PAGE_SIZE.to_string()),
        ("order", "date".to_string()),
        ("key", api_key.to_string()),
    ]
}

fn empty_response() -> SearchResponse {
    SearchResponse {
        items: Vec::new(),
        next_page_token: None,
    }
}

/// Merge search snippets with the batched details payload into public items
fn build_items(raw_items: &[Value], details: &Value) -> Vec<VideoItem> {
    struct Detail {
        duration: String,
        channel_title: String,
        description: String,
    }

    let mut by_id: HashMap<&str, Detail> = HashMap::new();
    if let Some(detail_items) = details.get("items").and_then(Value::as_array) {
        for it in detail_items {
            let Some(id) = it["id"].as_str() else {
                continue;
            };
            let iso = it["contentDetails"]["duration"].as_str().unwrap_or("PT0S");
            by_id.insert(
                id,
                Detail {
                    duration: format_iso8601_duration(iso),
                    channel_title: it["snippet"]["channelTitle"]
                        .as_str()
                        .unwrap_or("")
                        .to_string(),
                    description: it["snippet"]["description"]
                        .as_str()
                        .unwrap_or("")
                        .to_string(),
                },
            );
        }
    }

    let mut items = Vec::new();
    for it in raw_items {
        let Some(video_id) = it["id"]["videoId"].as_str() else {
            continue;
        };
        let snippet = &it["snippet"];
        let detail = by_id.get(video_id);
        let description = detail.map(|d| d.description.clone()).unwrap_or_default();
        items.push(VideoItem {
            video_id: video_id.to_string(),
            title: snippet["title"].as_str().unwrap_or("").to_string(),
            chapters: parse_chapters(&description),
            description,
            thumbnail: snippet["thumbnails"]["high"]["url"]
                .as_str()
                .unwrap_or("")
                .to_string(),
            published_at: snippet["publishedAt"].as_str().unwrap_or("").to_string(),
            channel_title: detail
                .map(|d| d.channel_title.clone())
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| snippet["channelTitle"].as_str().unwrap_or("").to_string()),
            channel_id: snippet["channelId"].as_str().unwrap_or("").to_string(),
            duration: detail.map(|d| d.duration.clone()),
        });
    }
    items
}

/// Reshape a cached `videos` row into the public item format
fn cached_row_to_item(row: &Value) -> VideoItem {
    VideoItem {
        video_id: row["video_id"].as_str().unwrap_or("").to_string(),
        title: row["title"].as_str().unwrap_or("").to_string(),
        description: row["description"].as_str().unwrap_or("").to_string(),
        thumbnail: row["thumbnail"].as_str().unwrap_or("").to_string(),
        published_at: row["published_at"].as_str().unwrap_or("").to_string(),
        channel_title: row["channel_title"].as_str().unwrap_or("").to_string(),
        channel_id: row["channel_id"].as_str().unwrap_or("").to_string(),
        duration: row["duration"].as_str().map(String::from),
        chapters: serde_json::from_value::<Vec<Chapter>>(row["chapters"].clone())
            .unwrap_or_default(),
    }
}

/// Keep items strictly newer than the bound, stopping at the first older
/// or equal one (input is assumed newest-first).
fn collect_new_items(items: &[Value], bound: Option<DateTime<Utc>>) -> Vec<NewVideoItem> {
    let mut new_videos = Vec::new();
    for item in items {
        let published_str = item["snippet"]["publishedAt"].as_str().unwrap_or("");
        let Some(published_at) = parse_rfc3339(published_str) else {
            continue;
        };
        if let Some(bound) = bound {
            if published_at <= bound {
                break;
            }
        }
        new_videos.push(NewVideoItem {
            video_id: item["id"]["videoId"].as_str().unwrap_or("").to_string(),
            title: item["snippet"]["title"].as_str().unwrap_or("").to_string(),
            published_at: published_str.to_string(),
            channel_title: item["snippet"]["channelTitle"]
                .as_str()
                .unwrap_or("")
                .to_string(),
            thumbnail: item["snippet"]["thumbnails"]["high"]["url"]
                .as_str()
                .unwrap_or("")
                .to_string(),
        });
    }
    new_videos
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_item(video_id: &str, published_at: &str) -> Value {
        json!({
            "id": {"videoId": video_id},
            "snippet": {
                "title": format!("Video {video_id}"),
                "publishedAt": published_at,
                "channelTitle": "Snippet Channel",
                "channelId": "UC123",
                "thumbnails": {"high": {"url": format!("https://img.example/{video_id}.jpg")}}
            }
        })
    }

    #[test]
    fn merges_details_by_video_id() {
        let raw = vec![
            search_item("aaa", "2024-01-01T00:00:00Z"),
            search_item("bbb", "2024-01-02T00:00:00Z"),
        ];
        let details = json!({
            "items": [{
                "id": "bbb",
                "contentDetails": {"duration": "PT1H2M3S"},
                "snippet": {
                    "channelTitle": "Detail Channel",
                    "description": "0:00 Intro\n1:30 Setup"
                }
            }]
        });

        let items = build_items(&raw, &details);
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].video_id, "aaa");
        assert_eq!(items[0].duration, None);
        assert_eq!(items[0].channel_title, "Snippet Channel");
        assert!(items[0].chapters.is_empty());

        assert_eq!(items[1].video_id, "bbb");
        assert_eq!(items[1].duration.as_deref(), Some("1:02:03"));
        assert_eq!(items[1].channel_title, "Detail Channel");
        assert_eq!(items[1].thumbnail, "https://img.example/bbb.jpg");
        assert_eq!(
            items[1].chapters,
            vec![
                Chapter { start_seconds: 0, title: "Intro".to_string() },
                Chapter { start_seconds: 90, title: "Setup".to_string() },
            ]
        );
    }

    #[test]
    fn build_items_tolerates_missing_details_payload() {
        let raw = vec![search_item("aaa", "2024-01-01T00:00:00Z")];
        let items = build_items(&raw, &Value::Null);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "");
        assert_eq!(items[0].duration, None);
    }

    #[test]
    fn poll_request_pins_language_and_date_order() {
        let params = new_videos_params("seo basics", "en", "key");
        assert!(params.contains(&("relevanceLanguage", "en".to_string())));
        assert!(params.contains(&("order", "date".to_string())));
        assert!(params.contains(&("maxResults", "10".to_string())));
    }

    #[test]
    fn collects_only_items_newer_than_bound() {
        // Newest-first: T3, T2, T1 with the bound at T2 keeps exactly T3
        let items = vec![
            search_item("t3", "2024-03-01T00:00:00Z"),
            search_item("t2", "2024-02-01T00:00:00Z"),
            search_item("t1", "2024-01-01T00:00:00Z"),
        ];
        let bound = parse_rfc3339("2024-02-01T00:00:00Z");

        let new_videos = collect_new_items(&items, bound);
        assert_eq!(new_videos.len(), 1);
        assert_eq!(new_videos[0].video_id, "t3");
    }

    #[test]
    fn collects_everything_without_bound() {
        let items = vec![
            search_item("t2", "2024-02-01T00:00:00Z"),
            search_item("t1", "2024-01-01T00:00:00Z"),
        ];
        let new_videos = collect_new_items(&items, None);
        assert_eq!(new_videos.len(), 2);
        assert_eq!(new_videos[0].channel_title, "Snippet Channel");
    }

    #[test]
    fn reshapes_cached_row() {
        let row = json!({
            "video_id": "vid1",
            "title": "Cached title",
            "description": "desc",
            "thumbnail": "https://img.example/vid1.jpg",
            "published_at": "2024-01-01T00:00:00Z",
            "channel_title": "Channel",
            "channel_id": "UC123",
            "duration": "5:00",
            "chapters": [{"start_seconds": 0, "title": "Intro"}],
            "query": "seo",
            "query_key": "seo"
        });
        let item = cached_row_to_item(&row);
        assert_eq!(item.video_id, "vid1");
        assert_eq!(item.duration.as_deref(), Some("5:00"));
        assert_eq!(item.chapters.len(), 1);
    }

    #[test]
    fn cached_row_with_null_chapters_is_empty() {
        let row = json!({"video_id": "vid1", "chapters": null});
        let item = cached_row_to_item(&row);
        assert!(item.chapters.is_empty());
    }

    #[test]
    fn cache_eligibility_rules() {
        let base = SearchParams {
            query: "seo".to_string(),
            language: "en".to_string(),
            max_results: 9,
            order: "relevance".to_string(),
            page_token: None,
            fresh: false,
        };
        assert!(base.cache_eligible());
        assert!(!SearchParams { fresh: true, ..base.clone() }.cache_eligible());
        assert!(!SearchParams { order: "date".to_string(), ..base.clone() }.cache_eligible());
        assert!(
            !SearchParams { page_token: Some("tok".to_string()), ..base }.cache_eligible()
        );
    }
}
