pub mod analyze;
pub mod chat;
pub mod config;
pub mod db;
pub mod extraction;
pub mod fetch;
pub mod models;
pub mod normalize;
pub mod platform;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use analyze::Analyzer;
use config::AppConfig;
use db::Store;
use fetch::{HttpFetcher, PageFetcher};
use models::{AnalysisResult, EventOverview, Message, NewMessage};

const DEFAULT_MESSAGE_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("URL is required")]
    MalformedInput,
    #[error("message not found")]
    NotFound,
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::MalformedInput => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self, "request failed");
        }
        (status, Json(AnalysisResult::failure(self.to_string()))).into_response()
    }
}

pub struct AppState<F> {
    analyzer: Arc<Analyzer<F>>,
    database_path: PathBuf,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            analyzer: Arc::clone(&self.analyzer),
            database_path: self.database_path.clone(),
        }
    }
}

impl<F: PageFetcher> AppState<F> {
    pub fn new(analyzer: Analyzer<F>, database_path: PathBuf) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            database_path,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

/// Pulls a non-empty string `url` out of a JSON request body. A body that is
/// not JSON at all is a server-side failure, not a malformed input.
pub fn url_from_body(body: &[u8]) -> Result<String, ApiError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|err| ApiError::Internal(err.to_string()))?;
    match value.get("url") {
        Some(Value::String(url)) if !url.is_empty() => Ok(url.clone()),
        _ => Err(ApiError::MalformedInput),
    }
}

async fn analyze_event_route<F: PageFetcher>(
    State(state): State<AppState<F>>,
    body: Bytes,
) -> Result<Json<AnalysisResult>, ApiError> {
    let url = url_from_body(&body)?;
    Ok(Json(state.analyzer.analyze_event(&url).await))
}

async fn list_messages_route<F: PageFetcher>(
    State(state): State<AppState<F>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_MESSAGE_LIMIT);
    let messages = with_store(state.database_path.clone(), move |store| {
        store.list_messages(limit)
    })
    .await?;
    Ok(Json(messages))
}

async fn post_message_route<F: PageFetcher>(
    State(state): State<AppState<F>>,
    Json(new_message): Json<NewMessage>,
) -> Result<Json<Message>, ApiError> {
    let mut message = with_store(state.database_path.clone(), move |store| {
        store.insert_message(&new_message)
    })
    .await?;

    let Some(link) = chat::find_event_link(&message.content).map(str::to_string) else {
        return Ok(Json(message));
    };

    let result = state.analyzer.analyze_event(&link).await;
    match result.event {
        Some(event) => {
            let id = message.id.clone();
            if let Some(updated) = with_store(state.database_path.clone(), move |store| {
                store.update_event_data(&id, &event)
            })
            .await?
            {
                message = updated;
            }
        }
        None => info!(
            message_id = %message.id,
            link = %link,
            error = result.error.as_deref().unwrap_or_default(),
            "event link could not be analyzed"
        ),
    }

    Ok(Json(message))
}

async fn update_event_data_route<F: PageFetcher>(
    State(state): State<AppState<F>>,
    Path(id): Path<String>,
    Json(event): Json<EventOverview>,
) -> Result<Json<Message>, ApiError> {
    let updated = with_store(state.database_path.clone(), move |store| {
        store.update_event_data(&id, &event)
    })
    .await?;
    updated.map(Json).ok_or(ApiError::NotFound)
}

async fn with_store<T, F>(path: PathBuf, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&Store) -> rusqlite::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || -> Result<T, ApiError> {
        let store = Store::open(&path)?;
        Ok(work(&store)?)
    })
    .await
    .map_err(|err| ApiError::Internal(err.to_string()))?
}

pub fn router<F: PageFetcher + 'static>(state: AppState<F>) -> Router {
    Router::new()
        .route("/api/event/analyze", post(analyze_event_route::<F>))
        .route(
            "/api/messages",
            get(list_messages_route::<F>).post(post_message_route::<F>),
        )
        .route(
            "/api/messages/:id/event_data",
            put(update_event_data_route::<F>),
        )
        .with_state(state)
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    Store::open(&config.database_path).with_context(|| {
        format!(
            "unable to open message store {}",
            config.database_path.display()
        )
    })?;

    let fetcher = HttpFetcher::from_config(&config).context("unable to build http client")?;
    let state = AppState::new(Analyzer::new(fetcher), config.database_path.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("unable to bind {}", config.bind_address))?;
    info!(address = %config.bind_address, "listening");

    axum::serve(listener, router(state))
        .await
        .context("server stopped unexpectedly")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::json;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::fetch::stub::{Reply, StubFetcher};

    const EVENT_PAGE: &str = r#"
    <html><head>
      <script type="application/ld+json">
        {"@type": "Event", "name": "Rust Night", "startDate": "2025-11-04T18:30:00-07:00"}
      </script>
    </head></html>
    "#;

    fn app(reply: Reply, dir: &TempDir) -> Router {
        let analyzer = Analyzer::new(StubFetcher::replying(reply));
        router(AppState::new(analyzer, dir.path().join("messages.sqlite")))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let body = body.map_or_else(Body::empty, |value| Body::from(value.to_string()));
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    fn chat_message(content: &str) -> Value {
        json!({"user_id": "user-1", "user_email": "ada@example.com", "content": content})
    }

    #[tokio::test]
    async fn analyze_route_returns_the_analysis() {
        let dir = TempDir::new().expect("temp dir");
        let app = app(Reply::Page(EVENT_PAGE.to_string()), &dir);

        let (status, body) = send(
            &app,
            "POST",
            "/api/event/analyze",
            Some(json!({"url": "example.com/e/1?utm_source=chat"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["event"]["title"], "Rust Night");
        assert_eq!(body["event"]["platform"], "unknown");
        assert_eq!(body["event"]["originalUrl"], "https://example.com/e/1");

        let (status, body) = send(&app, "POST", "/api/event/analyze", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "URL is required");
    }

    #[tokio::test]
    async fn failed_analysis_is_still_a_200() {
        let dir = TempDir::new().expect("temp dir");
        let app = app(Reply::Status(StatusCode::NOT_FOUND), &dir);

        let (status, body) = send(
            &app,
            "POST",
            "/api/event/analyze",
            Some(json!({"url": "https://lu.ma/gone"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().expect("error").contains("404"));
    }

    #[tokio::test]
    async fn posted_event_links_are_analyzed_and_stored() {
        let dir = TempDir::new().expect("temp dir");
        let app = app(Reply::Page(EVENT_PAGE.to_string()), &dir);

        let (status, posted) = send(
            &app,
            "POST",
            "/api/messages",
            Some(chat_message("see you at https://www.meetup.com/rust/events/1 tonight")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(posted["event_data"]["title"], "Rust Night");
        assert_eq!(posted["event_data"]["platform"], "meetup");

        let (_, plain) = send(&app, "POST", "/api/messages", Some(chat_message("hi all"))).await;
        assert!(plain["event_data"].is_null());

        let (status, listed) = send(&app, "GET", "/api/messages?limit=10", None).await;
        assert_eq!(status, StatusCode::OK);
        let listed = listed.as_array().expect("message list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["id"], posted["id"]);
        assert_eq!(listed[0]["event_data"]["title"], "Rust Night");
        assert_eq!(listed[1]["content"], "hi all");
    }

    #[tokio::test]
    async fn failed_link_analysis_leaves_event_data_empty() {
        let dir = TempDir::new().expect("temp dir");
        let app = app(Reply::Unreachable, &dir);

        let (status, posted) = send(
            &app,
            "POST",
            "/api/messages",
            Some(chat_message("https://www.eventbrite.com/e/1")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(posted["event_data"].is_null());
        assert_eq!(posted["content"], "https://www.eventbrite.com/e/1");
    }

    #[tokio::test]
    async fn event_data_can_be_replaced_on_known_messages_only() {
        let dir = TempDir::new().expect("temp dir");
        let app = app(Reply::Unreachable, &dir);
        let event = json!({
            "title": "Edited by hand",
            "platform": "luma",
            "originalUrl": "https://lu.ma/abc"
        });

        let (status, body) = send(
            &app,
            "PUT",
            "/api/messages/missing/event_data",
            Some(event.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (_, posted) = send(&app, "POST", "/api/messages", Some(chat_message("hello"))).await;
        let id = posted["id"].as_str().expect("message id");
        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/messages/{id}/event_data"),
            Some(event),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["event_data"]["title"], "Edited by hand");
    }

    #[test]
    fn accepts_string_urls() {
        let url = url_from_body(br#"{"url": "eventbrite.com/e/1"}"#).expect("url");
        assert_eq!(url, "eventbrite.com/e/1");
    }

    #[test]
    fn rejects_missing_or_non_string_urls() {
        for body in [
            r#"{}"#,
            r#"{"url": 42}"#,
            r#"{"url": ""}"#,
            r#"{"url": null}"#,
            r#"["https://x.com"]"#,
        ] {
            assert!(
                matches!(url_from_body(body.as_bytes()), Err(ApiError::MalformedInput)),
                "body: {body}"
            );
        }
    }

    #[test]
    fn unreadable_body_is_a_server_error() {
        let err = url_from_body(b"not json").expect_err("invalid json");
        assert!(matches!(err, ApiError::Internal(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            ApiError::MalformedInput.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
