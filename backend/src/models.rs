use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::Responder;
use rocket::serde::{Deserialize, Serialize};
use rocket::{response, Response};
use std::io::Cursor;

use crate::store::StoreError;

/// A named timestamp marker parsed from a video description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub start_seconds: i64,
    pub title: String,
}

/// Public item shape returned by the search endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoItem {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub published_at: String,
    pub channel_title: String,
    pub channel_id: String,
    pub duration: Option<String>,
    pub chapters: Vec<Chapter>,
}

/// Row shape of the `videos` cache table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRow {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub published_at: String,
    pub channel_title: String,
    pub channel_id: String,
    pub duration: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    pub query: String,
    pub query_key: String,
}

impl VideoRow {
    pub fn from_item(item: &VideoItem, query: &str, query_key: &str) -> Self {
        VideoRow {
            video_id: item.video_id.clone(),
            title: item.title.clone(),
            description: item.description.clone(),
            thumbnail: item.thumbnail.clone(),
            published_at: item.published_at.clone(),
            channel_title: item.channel_title.clone(),
            channel_id: item.channel_id.clone(),
            duration: item.duration.clone(),
            chapters: item.chapters.clone(),
            query: query.to_string(),
            query_key: query_key.to_string(),
        }
    }
}

/// Trimmed item shape returned by the new-videos poller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVideoItem {
    pub video_id: String,
    pub title: String,
    pub published_at: String,
    pub channel_title: String,
    pub thumbnail: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<VideoItem>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// Seeded row shape of the `seo_trends` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendRow {
    pub keyword: String,
    pub alert: String,
    pub message: String,
    pub link: String,
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionStart {
    pub user_id: String,
    pub video_id: String,
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionPing {
    pub session_id: String,
    pub t_seconds: i64,
    pub event: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionEnd {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct HighlightCreate {
    pub session_id: String,
    pub t_seconds: i64,
    pub highlight_text: String,
}

#[derive(Debug, Deserialize)]
pub struct NoteCreate {
    pub user_id: String,
    pub video_id: String,
    pub video_title: Option<String>,
    #[serde(default)]
    pub timestamp_seconds: i64,
    pub note_text: String,
}

#[derive(Debug, Deserialize)]
pub struct TopicSubscribe {
    pub user_id: String,
    pub topic: String,
    pub channel_id: Option<String>,
}

/// Error union for the handler boundary, mapped once to an HTTP status
/// plus a JSON `{error, message}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    fn status(&self) -> Status {
        match self {
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Store(_) | ApiError::Upstream(_) => Status::InternalServerError,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not found",
            ApiError::Store(_) => "store operation failed",
            ApiError::Upstream(_) => "upstream request failed",
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.label(),
            "message": self.to_string(),
        })
        .to_string();
        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}
