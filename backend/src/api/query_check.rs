//! Per-(user, query) freshness bookkeeping: clients read the last check
//! time to decide when to poll `/new_videos`, and set it after polling.

use chrono::Utc;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use serde_json::{json, Value};

use crate::models::ApiError;
use crate::utils::query_key;
use crate::AppState;

#[get("/query-check/last?<user_id>&<query>")]
pub async fn get_last_check(
    user_id: String,
    query: String,
    state: &State<AppState>,
) -> Json<Value> {
    // Missing row or store failure both read as "never checked"
    let row = state
        .store
        .table("user_query_checks")
        .columns("last_checked_at")
        .eq("user_id", &user_id)
        .eq("query_key", &query_key(&query))
        .select_one()
        .await
        .ok()
        .flatten();
    let last_checked_at = row
        .and_then(|row| row.get("last_checked_at").cloned())
        .unwrap_or(Value::Null);
    Json(json!({ "last_checked_at": last_checked_at }))
}

#[post("/query-check/set?<user_id>&<query>")]
pub async fn set_last_check(
    user_id: String,
    query: String,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let last_checked_at = Utc::now().to_rfc3339();
    state
        .store
        .table("user_query_checks")
        .upsert(
            &json!({
                "user_id": user_id,
                "query_key": query_key(&query),
                "last_checked_at": last_checked_at,
            }),
            "user_id,query_key",
        )
        .await?;
    Ok(Json(json!({ "ok": true, "last_checked_at": last_checked_at })))
}
