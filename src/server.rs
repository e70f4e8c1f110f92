use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::CrawlConfig;
use crate::crawler::Crawler;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub crawler: Arc<Crawler>,
    pub config: Arc<CrawlConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/refresh/:region", get(refresh_handler))
        .nest_service(
            "/static/listings",
            ServeDir::new(&state.config.data_dir),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Kick off a region crawl. The crawl runs on the runtime after this handler
/// has already answered, so the caller gets an acknowledgement, not a result.
async fn refresh_handler(
    Path(region): Path<String>,
    State(state): State<AppState>,
) -> (StatusCode, Json<serde_json::Value>) {
    let region = region.to_lowercase();

    if state.config.cities(&region).is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("unknown region: {region}")})),
        );
    }

    info!(region = %region, "Refresh requested");
    let crawler = state.crawler.clone();
    tokio::spawn(async move {
        if let Err(e) = crawler.run_crawl(&region).await {
            error!(region = %region, error = %e, "Crawl failed");
        }
    });

    (StatusCode::ACCEPTED, Json(json!({"success": true})))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::scrapers::error::ScrapeError;
    use crate::scrapers::traits::Fetch;

    struct OfflineFetcher;

    #[async_trait]
    impl Fetch for OfflineFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScrapeError> {
            Err(ScrapeError::fetch(url, "offline"))
        }
    }

    fn test_state(dir: &std::path::Path) -> AppState {
        let config = Arc::new(CrawlConfig {
            data_dir: dir.to_path_buf(),
            ..CrawlConfig::default()
        });
        AppState {
            crawler: Arc::new(Crawler::new(Arc::new(OfflineFetcher), config.clone())),
            config,
        }
    }

    #[tokio::test]
    async fn test_refresh_unknown_region_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/refresh/zz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_refresh_known_region_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/refresh/mi")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
