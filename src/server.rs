//! HTTP surface.
//!
//! ## Endpoints
//!
//! - `POST   /countries/refresh` - run the refresh pipeline
//! - `GET    /countries` - list, filtered by `region`/`currency`, ordered by `sort`
//! - `GET    /countries/image` - summary image (`?format=png|svg`)
//! - `GET    /countries/{name}` - one country (name matched case-insensitively)
//! - `DELETE /countries/{name}` - remove one country
//! - `GET    /status` (also `/countries/status`) - record count and last refresh time

use crate::api::Client;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{Country, RefreshSummary, Status};
use crate::query::ListQuery;
use crate::refresh::RefreshPipeline;
use crate::store::{CountryStore, SqliteCountryStore};
use crate::summary::{ImageFormat, SummaryData, SummaryRenderer};
use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// `Path` whose rejections render as JSON validation errors.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
struct ApiPath<T>(T);

/// `Query` whose rejections render as JSON validation errors.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
struct ApiQuery<T>(T);

/// Shared handler state; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CountryStore>,
    pub pipeline: Arc<RefreshPipeline>,
    pub renderer: Arc<SummaryRenderer>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CountryStore>,
        pipeline: Arc<RefreshPipeline>,
        renderer: Arc<SummaryRenderer>,
    ) -> Self {
        Self {
            store,
            pipeline,
            renderer,
        }
    }

    /// Production wiring: SQLite store, HTTP providers, renderer, all from one config.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn CountryStore> = Arc::new(SqliteCountryStore::connect(config).await?);
        let client = Arc::new(Client::new(config)?);
        let pipeline = Arc::new(RefreshPipeline::new(
            client.clone(),
            client,
            store.clone(),
            config,
        ));
        let renderer = Arc::new(SummaryRenderer::new(config));
        Ok(Self::new(store, pipeline, renderer))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/countries", get(list_countries))
        .route("/countries/refresh", post(refresh_countries))
        .route("/countries/image", get(summary_image))
        .route("/countries/status", get(status))
        .route(
            "/countries/{name}",
            get(get_country).delete(delete_country),
        )
        .route("/status", get(status))
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub message: String,
    pub countries_processed: usize,
    pub countries_created: usize,
    pub countries_updated: usize,
    pub countries_upserted: usize,
    pub countries_skipped: usize,
    pub exchange_rates_available: bool,
}

impl From<RefreshSummary> for RefreshResponse {
    fn from(s: RefreshSummary) -> Self {
        let message = if s.rates_available {
            "Countries data refreshed successfully"
        } else {
            "Countries data refreshed without exchange rates"
        };
        Self {
            message: message.to_string(),
            countries_processed: s.processed,
            countries_created: s.created,
            countries_updated: s.updated,
            countries_upserted: s.upserted(),
            countries_skipped: s.skipped,
            exchange_rates_available: s.rates_available,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    #[serde(default)]
    pub format: Option<String>,
}

async fn refresh_countries(State(state): State<AppState>) -> AppResult<Json<RefreshResponse>> {
    log::info!("Starting countries refresh");
    let summary = state.pipeline.refresh_all().await?;
    Ok(Json(summary.into()))
}

async fn list_countries(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HashMap<String, String>>,
) -> AppResult<Json<Vec<Country>>> {
    let query = ListQuery::from_params(&params)?;
    Ok(Json(state.store.list(&query).await?))
}

async fn get_country(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
) -> AppResult<Json<Country>> {
    Ok(Json(state.store.get_by_name(&name).await?))
}

async fn delete_country(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
) -> AppResult<Json<MessageResponse>> {
    state.store.delete_by_name(&name).await?;
    log::info!("Deleted country {name}");
    Ok(Json(MessageResponse {
        message: format!("Country {name} deleted successfully"),
    }))
}

async fn status(State(state): State<AppState>) -> AppResult<Json<Status>> {
    Ok(Json(Status {
        total_countries: state.store.count().await?,
        last_refreshed_at: state.store.last_refresh().await?,
    }))
}

async fn summary_image(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ImageQuery>,
) -> AppResult<Response> {
    let format: ImageFormat = query.format.as_deref().unwrap_or("png").parse()?;
    let countries = state.store.list(&ListQuery::default()).await?;
    let data = SummaryData::from_countries(&countries, state.store.last_refresh().await?);

    let renderer = state.renderer.clone();
    let bytes = tokio::task::spawn_blocking(move || renderer.render(&data, format))
        .await
        .map_err(|e| AppError::Internal(format!("image task failed: {e}")))??;

    Ok(([(header::CONTENT_TYPE, format.content_type())], bytes).into_response())
}
