use chrono::Duration;
use rocket::serde::json::Json;
use rocket::{get, State};
use serde_json::{json, Value};

use crate::services::trends;
use crate::AppState;

#[get("/trends")]
pub async fn get_trends(state: &State<AppState>) -> Json<Value> {
    let max_age = Duration::hours(state.trend_max_age_hours);
    let rows = trends::get_trends(&state.store, max_age).await;
    Json(json!({ "trends": rows }))
}
