use rocket::serde::json::Json;
use rocket::{delete, get, post, State};
use serde_json::{json, Value};

use crate::models::{ApiError, NoteCreate};
use crate::AppState;

#[post("/video/notes", data = "<note>")]
pub async fn add_note(
    note: Json<NoteCreate>,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let rows = state
        .store
        .table("video_notes")
        .insert(&json!({
            "user_id": note.user_id,
            "video_id": note.video_id,
            "video_title": note.video_title,
            "timestamp_seconds": note.timestamp_seconds.max(0),
            "note_text": note.note_text.trim(),
        }))
        .await?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound("note was not created".to_string()))?;
    Ok(Json(json!({ "note": row })))
}

#[get("/video/notes/<video_id>?<user_id>")]
pub async fn get_notes_for_video(
    video_id: &str,
    user_id: String,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let notes = state
        .store
        .table("video_notes")
        .eq("user_id", &user_id)
        .eq("video_id", video_id)
        .order("created_at", true)
        .select()
        .await?;
    Ok(Json(json!({ "notes": notes })))
}

#[get("/video/notes-all?<user_id>")]
pub async fn get_all_notes(
    user_id: String,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let notes = state
        .store
        .table("video_notes")
        .eq("user_id", &user_id)
        .order("created_at", true)
        .select()
        .await?;
    Ok(Json(json!({ "notes": notes })))
}

#[delete("/video/notes/<note_id>?<user_id>")]
pub async fn remove_note(
    note_id: &str,
    user_id: String,
    state: &State<AppState>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .table("video_notes")
        .eq("id", note_id)
        .eq("user_id", &user_id)
        .delete()
        .await?;
    Ok(Json(json!({ "ok": true })))
}
