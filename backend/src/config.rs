use anyhow::{Context, Result};
use env_logger::Builder;
use log::{info, LevelFilter};
use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use std::env;

const DEFAULT_TREND_MAX_AGE_HOURS: i64 = 24;

/// All external configuration, read once at startup and injected from main.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub store_key: String,
    pub youtube_api_key: String,
    pub trend_max_age_hours: i64,
}

impl AppConfig {
    /// Missing store credentials or API key are fatal at startup.
    pub fn from_env() -> Result<Self> {
        let store_url = env::var("SUPABASE_URL")
            .context("SUPABASE_URL environment variable must be set")?;
        let store_key = env::var("SUPABASE_KEY")
            .context("SUPABASE_KEY environment variable must be set")?;
        let youtube_api_key = env::var("YOUTUBE_API_KEY")
            .context("YOUTUBE_API_KEY environment variable must be set")?;
        let trend_max_age_hours = env::var("TREND_MAX_AGE_HOURS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_TREND_MAX_AGE_HOURS);

        Ok(AppConfig {
            store_url,
            store_key,
            youtube_api_key,
            trend_max_age_hours,
        })
    }
}

pub fn init_logger() {
    Builder::new().filter_level(LevelFilter::Info).init();
    info!("Starting Rocket backend...");
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}

pub fn create_cors() -> Result<rocket_cors::Cors> {
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![
                Method::Get,
                Method::Post,
                Method::Put,
                Method::Delete,
                Method::Options,
            ]
            .into_iter()
            .map(From::from)
            .collect(),
        )
        .allowed_headers(AllowedHeaders::some(&[
            "Authorization",
            "Accept",
            "Content-Type",
        ]))
        .to_cors()
        .map_err(|e| anyhow::anyhow!("Failed to create CORS options: {}", e))?;

    Ok(cors)
}
