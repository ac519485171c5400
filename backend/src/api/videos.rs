use rocket::serde::json::Json;
use rocket::{get, State};
use serde_json::{json, Value};

use crate::models::{ApiError, SearchResponse};
use crate::services::youtube::{self, SearchParams};
use crate::AppState;

#[get("/videos?<query>&<language>&<max_results>&<order>&<page_token>&<fresh>")]
pub async fn get_videos(
    query: String,
    language: Option<String>,
    max_results: Option<u32>,
    order: Option<String>,
    page_token: Option<String>,
    fresh: Option<bool>,
    state: &State<AppState>,
) -> Result<Json<SearchResponse>, ApiError> {
    let params = SearchParams {
        query,
        language: language.unwrap_or_else(|| "en".to_string()),
        max_results: max_results.unwrap_or(9),
        order: order.unwrap_or_else(|| "relevance".to_string()),
        page_token,
        fresh: fresh.unwrap_or(false),
    };
    let response = youtube::search_videos(&state.youtube, &state.store, &params).await?;
    Ok(Json(response))
}

#[get("/new_videos?<query>&<language>&<last_checked_at>")]
pub async fn get_new_videos(
    query: String,
    language: Option<String>,
    last_checked_at: Option<String>,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let items = youtube::new_videos_for_query(
        &state.youtube,
        &query,
        language.as_deref().unwrap_or("en"),
        last_checked_at.as_deref(),
    )
    .await?;
    Ok(Json(json!({ "items": items })))
}

#[get("/video/resources/<video_id>")]
pub async fn get_video_resources(
    video_id: &str,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let resources = state
        .store
        .table("video_resources")
        .eq("video_id", video_id)
        .order("start_seconds", false)
        .select()
        .await?;
    Ok(Json(json!({ "resources": resources })))
}

#[get("/video/heatmap?<video_id>")]
pub async fn get_video_heatmap(
    video_id: String,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let items = state
        .store
        .table("video_heatmap")
        .eq("video_id", &video_id)
        .order("bucket_10s", false)
        .select()
        .await?;
    Ok(Json(json!({ "items": items })))
}
