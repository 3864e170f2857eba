//! HTTP access to the InspiCode catalog backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use ic_core::{CatalogFilters, CatalogSource, CoreError, CoreResult, Project, Stats};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("inspicode/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct CategoriesBody {
    categories: Vec<String>,
}

#[derive(Deserialize)]
struct DifficultiesBody {
    difficulties: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Catalog backend reached over JSON/HTTP.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base: Url,
}

impl HttpCatalog {
    /// Create a catalog client for the backend at `base_url`.
    pub fn new(base_url: &str) -> CoreResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| CoreError::Network(err.to_string()))?;
        Self::with_client(base_url, client)
    }

    /// Create a catalog client with a preconfigured HTTP client.
    pub fn with_client(base_url: &str, client: Client) -> CoreResult<Self> {
        let mut base = Url::parse(base_url.trim())
            .map_err(|err| CoreError::Validation(format!("invalid api url {base_url:?}: {err}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { client, base })
    }

    /// URL of the project listing for the given filters.
    pub fn projects_url(&self, filters: &CatalogFilters) -> CoreResult<Url> {
        self.endpoint("api/projects", &filters.query_pairs())
    }

    /// URL of the random project endpoint. Free-text search is not sent.
    pub fn random_url(&self, filters: &CatalogFilters) -> CoreResult<Url> {
        let pairs: Vec<_> = filters
            .query_pairs()
            .into_iter()
            .filter(|(key, _)| *key != "search")
            .collect();
        self.endpoint("api/random", &pairs)
    }

    fn endpoint(&self, path: &str, pairs: &[(&str, String)]) -> CoreResult<Url> {
        let mut url = self
            .base
            .join(path)
            .map_err(|err| CoreError::Validation(err.to_string()))?;
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> CoreResult<T> {
        debug!(%url, "catalog request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| CoreError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|body| body.detail)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(CoreError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| CoreError::Decode(err.to_string()))
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn categories(&self) -> CoreResult<Vec<String>> {
        let url = self.endpoint("api/categories", &[])?;
        let body: CategoriesBody = self.get_json(url).await?;
        Ok(body.categories)
    }

    async fn difficulties(&self) -> CoreResult<Vec<String>> {
        let url = self.endpoint("api/difficulties", &[])?;
        let body: DifficultiesBody = self.get_json(url).await?;
        Ok(body.difficulties)
    }

    async fn projects(&self, filters: &CatalogFilters) -> CoreResult<Vec<Project>> {
        let url = self.projects_url(filters)?;
        self.get_json(url).await
    }

    async fn random(&self, filters: &CatalogFilters) -> CoreResult<Project> {
        let url = self.random_url(filters)?;
        self.get_json(url).await
    }

    async fn stats(&self) -> CoreResult<Stats> {
        let url = self.endpoint("api/stats", &[])?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{StatusCode, Uri};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use ic_core::Difficulty;
    use serde_json::json;

    type Seen = Arc<Mutex<Vec<String>>>;

    async fn projects(State(seen): State<Seen>, uri: Uri) -> Json<serde_json::Value> {
        seen.lock().unwrap().push(uri.to_string());
        Json(json!([
            {
                "title": "Chat App",
                "description": "Realtime rooms over websockets",
                "category": "Web",
                "difficulty": "hard"
            }
        ]))
    }

    async fn random_missing() -> impl IntoResponse {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "No project found for these criteria" })),
        )
    }

    async fn serve(seen: Seen) -> String {
        let router = Router::new()
            .route("/api/projects", get(projects))
            .route(
                "/api/categories",
                get(|| async { Json(json!({ "categories": ["Games", "Web"] })) }),
            )
            .route(
                "/api/difficulties",
                get(|| async { Json(json!({ "difficulties": ["easy", "hard", "medium"] })) }),
            )
            .route(
                "/api/stats",
                get(|| async { Json(json!({ "total_projects": 30, "categories": 6 })) }),
            )
            .route("/api/random", get(random_missing))
            .with_state(seen);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        format!("http://{addr}")
    }

    fn catalog(base: &str) -> HttpCatalog {
        let client = Client::builder().no_proxy().build().expect("client");
        HttpCatalog::with_client(base, client).expect("catalog")
    }

    #[test]
    fn projects_url_omits_unset_filters() {
        let catalog = catalog("http://localhost:8000");
        let url = catalog.projects_url(&CatalogFilters::default()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/projects");
    }

    #[test]
    fn base_path_prefix_is_preserved() {
        let catalog = catalog("http://example.test/inspicode");
        let url = catalog
            .random_url(&CatalogFilters::new(None, Some(Difficulty::Easy), Some("x".into())))
            .unwrap();
        assert_eq!(url.as_str(), "http://example.test/inspicode/api/random?difficulty=easy");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            HttpCatalog::new("not a url"),
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn structured_filters_reach_the_backend() {
        let seen = Seen::default();
        let base = serve(seen.clone()).await;
        let catalog = catalog(&base);

        let filters = CatalogFilters::new(Some("Web".into()), Some(Difficulty::Hard), None);
        let projects = catalog.projects(&filters).await.expect("projects");

        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].difficulty, Difficulty::Hard);
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            ["/api/projects?category=Web&difficulty=hard"]
        );
    }

    #[tokio::test]
    async fn vocabularies_and_stats_decode() {
        let base = serve(Seen::default()).await;
        let catalog = catalog(&base);

        assert_eq!(catalog.categories().await.unwrap(), ["Games", "Web"]);
        assert_eq!(catalog.difficulties().await.unwrap().len(), 3);
        let stats = catalog.stats().await.unwrap();
        assert_eq!((stats.total_projects, stats.categories), (30, 6));
    }

    #[tokio::test]
    async fn error_detail_is_surfaced() {
        let base = serve(Seen::default()).await;
        let catalog = catalog(&base);

        let err = catalog
            .random(&CatalogFilters::default())
            .await
            .expect_err("random should fail");
        match err {
            CoreError::Api { status, detail } => {
                assert_eq!(status, 404);
                assert_eq!(detail, "No project found for these criteria");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let catalog = catalog(&format!("http://{addr}"));
        assert!(matches!(
            catalog.stats().await,
            Err(CoreError::Network(_))
        ));
    }
}
