#[macro_use]
extern crate rocket;

mod api;
mod config;
mod models;
mod services;
mod store;
mod utils;

use rocket::serde::json::Json;
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::services::youtube::YouTubeClient;
use crate::store::StoreClient;

/// Shared handles injected into every handler via Rocket managed state.
/// Both clients are immutable; there is no other in-process state.
pub struct AppState {
    pub store: StoreClient,
    pub youtube: YouTubeClient,
    pub trend_max_age_hours: i64,
}

#[get("/health")]
fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

#[launch]
fn rocket() -> _ {
    config::load_environment();
    config::init_logger();

    let app_config = AppConfig::from_env().expect("Incomplete configuration");
    let store = StoreClient::new(&app_config.store_url, &app_config.store_key)
        .expect("Invalid store configuration");
    let youtube = YouTubeClient::new(&app_config.youtube_api_key);
    let cors = config::create_cors().expect("Invalid CORS configuration");

    let state = AppState {
        store,
        youtube,
        trend_max_age_hours: app_config.trend_max_age_hours,
    };

    rocket::build()
        .manage(state)
        .attach(cors)
        .mount(
            "/",
            routes![
                health,
                api::videos::get_videos,
                api::videos::get_new_videos,
                api::videos::get_video_resources,
                api::videos::get_video_heatmap,
                api::favorites::list_favorites,
                api::favorites::add_favorite,
                api::favorites::remove_favorite,
                api::favorites::favorites_detail,
                api::sessions::start_session,
                api::sessions::ping_session,
                api::sessions::end_session,
                api::sessions::add_highlight,
                api::sessions::get_highlights,
                api::notes::add_note,
                api::notes::get_notes_for_video,
                api::notes::get_all_notes,
                api::notes::remove_note,
                api::query_check::get_last_check,
                api::query_check::set_last_check,
                api::trends::get_trends,
            ],
        )
        .mount(
            "/subscribe",
            routes![
                api::topics::list_topics,
                api::topics::subscribe_topic,
                api::topics::unsubscribe_topic,
            ],
        )
}
