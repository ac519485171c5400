//! Watch-session lifecycle: start, ping, end, plus session highlights.
//! Transitions are not validated against current state; ping and end are
//! accepted as-is.

use chrono::Utc;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use serde_json::{json, Value};

use crate::models::{ApiError, HighlightCreate, SessionEnd, SessionPing, SessionStart};
use crate::AppState;

#[post("/video/session/start", data = "<session>")]
pub async fn start_session(
    session: Json<SessionStart>,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let rows = state
        .store
        .table("video_sessions")
        .insert(&json!({
            "user_id": session.user_id,
            "video_id": session.video_id,
            "query": session.query,
        }))
        .await?;
    let session_id = rows
        .first()
        .and_then(|row| row.get("id"))
        .cloned()
        .unwrap_or(Value::Null);
    Ok(Json(json!({ "session_id": session_id })))
}

#[post("/video/ping", data = "<ping>")]
pub async fn ping_session(
    ping: Json<SessionPing>,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .table("video_pings")
        .insert(&json!({
            "session_id": ping.session_id,
            "t_seconds": ping.t_seconds,
            "event": ping.event,
        }))
        .await?;
    state
        .store
        .table("video_sessions")
        .eq("id", &ping.session_id)
        .update(&json!({
            "last_ping_time": Utc::now().to_rfc3339(),
            "last_t_seconds": ping.t_seconds,
        }))
        .await?;
    Ok(Json(json!({ "status": "ok" })))
}

#[post("/video/session/end", data = "<end>")]
pub async fn end_session(
    end: Json<SessionEnd>,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .table("video_sessions")
        .eq("id", &end.session_id)
        .update(&json!({ "ended_at": Utc::now().to_rfc3339() }))
        .await?;
    Ok(Json(json!({ "status": "ok" })))
}

#[post("/video/highlights", data = "<highlight>")]
pub async fn add_highlight(
    highlight: Json<HighlightCreate>,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let rows = state
        .store
        .table("video_highlights")
        .insert(&json!({
            "session_id": highlight.session_id,
            "t_seconds": highlight.t_seconds,
            "highlight_text": highlight.highlight_text,
        }))
        .await?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound("highlight was not created".to_string()))?;
    Ok(Json(json!({ "highlight": row })))
}

#[get("/video/highlights/<session_id>")]
pub async fn get_highlights(
    session_id: &str,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let highlights = state
        .store
        .table("video_highlights")
        .eq("session_id", session_id)
        .order("t_seconds", false)
        .select()
        .await?;
    Ok(Json(json!({ "highlights": highlights })))
}
