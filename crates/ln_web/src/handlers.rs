use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::{CACHE_CONTROL, ETAG, IF_NONE_MATCH};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use ln_core::{Article, Error};
use ln_inference::summary_or_message;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

const NEWS_CACHE_CONTROL: &str = "public, max-age=60";

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    #[serde(default)]
    pub meta: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewsMeta {
    fetched_at: Option<DateTime<Utc>>,
    count: usize,
    stale: bool,
}

#[derive(Serialize)]
struct NewsWithMeta<'a> {
    news: &'a [Article],
    meta: NewsMeta,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub summary: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

fn etag_matches(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(IF_NONE_MATCH)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate == etag || candidate.strip_prefix("W/") == Some(etag))
}

pub async fn economic_news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let snapshot = state.cache.get().await;
    if snapshot.fetched_at.is_none() && snapshot.is_empty() {
        return Err(ApiError::Unavailable);
    }

    let etag = snapshot.etag().and_then(|tag| HeaderValue::from_str(&tag).ok());
    if let Some(etag) = &etag {
        if etag.to_str().map_or(false, |tag| etag_matches(&headers, tag)) {
            return Ok((StatusCode::NOT_MODIFIED, [(ETAG, etag.clone())]).into_response());
        }
    }

    let mut response = if query.meta {
        let status = state.cache.status().await;
        Json(NewsWithMeta {
            news: &snapshot.articles,
            meta: NewsMeta {
                fetched_at: snapshot.fetched_at,
                count: snapshot.len(),
                stale: status.stale,
            },
        })
        .into_response()
    } else {
        Json(&snapshot.articles[..]).into_response()
    };

    let headers = response.headers_mut();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(NEWS_CACHE_CONTROL));
    if let Some(etag) = etag {
        headers.insert(ETAG, etag);
    }
    Ok(response)
}

pub async fn news_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let url = query
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("the url query parameter is required".to_string()))?;

    info!("📝 Summarizing {} with {}", url, state.summarizer.name());
    let summary = match state.summarizer.summarize_url(&url).await {
        Err(Error::InvalidUrl(message)) => return Err(ApiError::BadRequest(message)),
        result => summary_or_message(result),
    };

    Ok(Json(SummaryResponse {
        summary,
        url,
        timestamp: Utc::now(),
    }))
}

pub async fn cache_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.cache.status().await)
}

pub async fn refresh_cache(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    info!("🔄 Manual cache refresh requested");
    let snapshot = state.cache.refresh_now().await?;
    Ok(Json(json!({
        "count": snapshot.len(),
        "fetchedAt": snapshot.fetched_at,
    })))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "timestamp": Utc::now() }))
}
