use rocket::serde::json::Json;
use rocket::{delete, get, post, State};
use serde_json::{json, Value};

use crate::models::ApiError;
use crate::AppState;

#[get("/favorites?<user_id>")]
pub async fn list_favorites(
    user_id: String,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let items = state
        .store
        .table("user_favorites")
        .eq("user_id", &user_id)
        .select()
        .await?;
    Ok(Json(json!({ "items": items })))
}

#[post("/favorites?<user_id>&<video_id>&<query>")]
pub async fn add_favorite(
    user_id: String,
    video_id: String,
    query: Option<String>,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .table("user_favorites")
        .upsert(
            &json!({
                "user_id": user_id,
                "video_id": video_id,
                "query": query.unwrap_or_default(),
            }),
            "user_id,video_id",
        )
        .await?;
    Ok(Json(json!({ "ok": true })))
}

#[delete("/favorites?<user_id>&<video_id>")]
pub async fn remove_favorite(
    user_id: String,
    video_id: String,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .table("user_favorites")
        .eq("user_id", &user_id)
        .eq("video_id", &video_id)
        .delete()
        .await?;
    Ok(Json(json!({ "ok": true })))
}

#[get("/favorites/detail?<user_id>")]
pub async fn favorites_detail(
    user_id: String,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let favorites = state
        .store
        .table("user_favorites")
        .columns("video_id")
        .eq("user_id", &user_id)
        .select()
        .await?;
    let ids: Vec<String> = favorites
        .iter()
        .filter_map(|f| f["video_id"].as_str())
        .map(String::from)
        .collect();
    if ids.is_empty() {
        return Ok(Json(json!({ "items": [] })));
    }

    let videos = state
        .store
        .table("videos")
        .in_list("video_id", &ids)
        .select()
        .await?;

    Ok(Json(json!({ "items": sort_by_favorite_order(videos, &ids) })))
}

/// Re-sort detail rows into the original favorite-insertion order;
/// rows whose id is not in the list sort last.
fn sort_by_favorite_order(mut rows: Vec<Value>, ids: &[String]) -> Vec<Value> {
    let position = |row: &Value| -> usize {
        row["video_id"]
            .as_str()
            .and_then(|id| ids.iter().position(|known| known == id))
            .unwrap_or(usize::MAX)
    };
    rows.sort_by_key(position);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(video_id: &str) -> Value {
        json!({"video_id": video_id, "title": format!("Video {video_id}")})
    }

    #[test]
    fn restores_favorite_insertion_order() {
        let ids = vec!["B".to_string(), "A".to_string(), "C".to_string()];
        let rows = vec![row("A"), row("C"), row("B")];

        let sorted = sort_by_favorite_order(rows, &ids);
        let order: Vec<&str> = sorted.iter().map(|r| r["video_id"].as_str().unwrap()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }

    #[test]
    fn unknown_ids_sort_last() {
        let ids = vec!["B".to_string(), "A".to_string()];
        let rows = vec![row("X"), row("A"), row("B")];

        let sorted = sort_by_favorite_order(rows, &ids);
        let order: Vec<&str> = sorted.iter().map(|r| r["video_id"].as_str().unwrap()).collect();
        assert_eq!(order, vec!["B", "A", "X"]);
    }
}
