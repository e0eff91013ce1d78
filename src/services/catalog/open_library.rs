//! Open Library catalog client
//!
//! API Flow:
//! 1. Author search: /search/authors.json?q= → candidates with work counts
//! 2. Author works: /authors/{key}/works.json?limit= → titles with subjects
//! 3. Subject works: /subjects/{subject}.json?limit=&sort=new → recent works
//! 4. Editions: /works/{key}/editions.json?limit= → edition publish dates
//! 5. Work detail: /works/{key}.json → description
use std::time::Duration;

use reqwest::{Client as HttpClient, Url};
use serde::de::DeserializeOwned;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        AuthorCandidate, AuthorSearchResponse, AuthorWork, AuthorWorksResponse, Edition,
        EditionsResponse, SubjectWork, SubjectWorksResponse, WorkDetail,
    },
    services::catalog::{bare_key, Catalog},
};

/// Builds the outbound HTTP client shared by every catalog call
pub fn build_http_client(timeout: Duration) -> AppResult<HttpClient> {
    let client = HttpClient::builder()
        .timeout(timeout)
        .user_agent(concat!("common-shelf/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

#[derive(Clone)]
pub struct OpenLibraryCatalog {
    http_client: HttpClient,
    base_url: Url,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl OpenLibraryCatalog {
    pub fn new(http_client: HttpClient, base_url: &str) -> AppResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            AppError::Internal(format!("Invalid catalog base URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Internal(format!(
                "Catalog base URL '{}' cannot carry a path",
                base_url
            )));
        }

        Ok(Self {
            http_client,
            base_url,
            cache: None,
            cache_ttl: 0,
        })
    }

    /// Enables read-through caching of catalog responses
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    /// Appends percent-encoded path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        tracing::debug!(url = %url, "Fetching from catalog");

        let response = self.http_client.get(url.clone()).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Open Library returned status {} for {}: {}",
                status,
                url.path(),
                body.chars().take(200).collect::<String>()
            )));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::debug!(error = %e, url = %url, "Failed to deserialize catalog response");
            AppError::ExternalApi(format!(
                "Failed to parse Open Library response for {}: {}",
                url.path(),
                e
            ))
        })
    }
}

#[async_trait::async_trait]
impl Catalog for OpenLibraryCatalog {
    async fn search_authors(&self, name: &str) -> AppResult<Vec<AuthorCandidate>> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Author name cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache.as_ref(),
            CacheKey::AuthorSearch(name.to_string()),
            self.cache_ttl,
            async move {
                let url = self.endpoint(&["search", "authors.json"]);
                let response: AuthorSearchResponse =
                    self.get_json(url, &[("q", name.trim().to_string())]).await?;

                tracing::debug!(
                    author = %name,
                    candidates = response.docs.len(),
                    "Author search completed"
                );

                Ok::<_, AppError>(response.docs)
            }
        )
    }

    async fn author_works(&self, author_key: &str, limit: usize) -> AppResult<Vec<AuthorWork>> {
        let author_key = bare_key(author_key);

        cached!(
            self.cache.as_ref(),
            CacheKey::AuthorWorks {
                author_key: author_key.to_string(),
                limit,
            },
            self.cache_ttl,
            async move {
                let url = self.endpoint(&["authors", author_key, "works.json"]);
                let response: AuthorWorksResponse =
                    self.get_json(url, &[("limit", limit.to_string())]).await?;
                Ok::<_, AppError>(response.entries)
            }
        )
    }

    async fn subject_works(&self, subject: &str, limit: usize) -> AppResult<Vec<SubjectWork>> {
        let slug = subject.trim().replace(' ', "_");

        cached!(
            self.cache.as_ref(),
            CacheKey::SubjectWorks {
                subject: slug.clone(),
                limit,
            },
            self.cache_ttl,
            async {
                let file = format!("{}.json", slug);
                let url = self.endpoint(&["subjects", &file]);
                let response: SubjectWorksResponse = self
                    .get_json(
                        url,
                        &[("limit", limit.to_string()), ("sort", "new".to_string())],
                    )
                    .await?;

                tracing::info!(
                    subject = %subject,
                    works = response.works.len(),
                    "Subject works fetched"
                );

                Ok::<_, AppError>(response.works)
            }
        )
    }

    async fn work_editions(&self, work_key: &str, limit: usize) -> AppResult<Vec<Edition>> {
        let work_key = bare_key(work_key);

        cached!(
            self.cache.as_ref(),
            CacheKey::WorkEditions {
                work_key: work_key.to_string(),
                limit,
            },
            self.cache_ttl,
            async move {
                let url = self.endpoint(&["works", work_key, "editions.json"]);
                let response: EditionsResponse =
                    self.get_json(url, &[("limit", limit.to_string())]).await?;
                Ok::<_, AppError>(response.entries)
            }
        )
    }

    async fn work_detail(&self, work_key: &str) -> AppResult<WorkDetail> {
        let work_key = bare_key(work_key);

        cached!(
            self.cache.as_ref(),
            CacheKey::WorkDetail(work_key.to_string()),
            self.cache_ttl,
            async move {
                let file = format!("{}.json", work_key);
                let url = self.endpoint(&["works", &file]);
                self.get_json::<WorkDetail>(url, &[]).await
            }
        )
    }

    fn name(&self) -> &'static str {
        "open_library"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog_for(server: &MockServer) -> OpenLibraryCatalog {
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        OpenLibraryCatalog::new(client, &server.uri()).unwrap()
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = reqwest::Client::new();
        let catalog = OpenLibraryCatalog::new(client, "https://openlibrary.org").unwrap();

        let url = catalog.endpoint(&["subjects", "science_fiction.json"]);
        assert_eq!(url.as_str(), "https://openlibrary.org/subjects/science_fiction.json");

        let url = catalog.endpoint(&["subjects", "war/peace.json"]);
        assert_eq!(url.as_str(), "https://openlibrary.org/subjects/war%2Fpeace.json");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = reqwest::Client::new();
        let catalog = OpenLibraryCatalog::new(client, "http://localhost:9000/ol/").unwrap();

        let url = catalog.endpoint(&["works", "OL1W.json"]);
        assert_eq!(url.as_str(), "http://localhost:9000/ol/works/OL1W.json");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let client = reqwest::Client::new();
        assert!(OpenLibraryCatalog::new(client, "not a url").is_err());
    }

    #[tokio::test]
    async fn test_search_authors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/authors.json"))
            .and(query_param("q", "Robin Hobb"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [
                    {"key": "OL33674A", "name": "Robin Hobb", "work_count": 95},
                    {"key": "OL999A", "name": "Robin Hobb", "work_count": 1}
                ]
            })))
            .mount(&server)
            .await;

        let candidates = catalog_for(&server).search_authors("Robin Hobb").await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].key, "OL33674A");
        assert_eq!(candidates[0].work_count, 95);
    }

    #[tokio::test]
    async fn test_author_works_strips_key_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/authors/OL33674A/works.json"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entries": [{"title": "Assassin's Apprentice", "subjects": ["Fantasy", "Assassins"]}]
            })))
            .mount(&server)
            .await;

        let works = catalog_for(&server)
            .author_works("/authors/OL33674A", 100)
            .await
            .unwrap();
        assert_eq!(works.len(), 1);
        assert_eq!(works[0].subjects, vec!["Fantasy", "Assassins"]);
    }

    #[tokio::test]
    async fn test_subject_works_uses_underscored_slug() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subjects/science_fiction.json"))
            .and(query_param("limit", "50"))
            .and(query_param("sort", "new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "works": [{
                    "key": "/works/OL1W",
                    "title": "Project Hail Mary",
                    "authors": [{"key": "/authors/OL1394244A", "name": "Andy Weir"}],
                    "first_publish_year": 2021
                }]
            })))
            .mount(&server)
            .await;

        let works = catalog_for(&server)
            .subject_works("science fiction", 50)
            .await
            .unwrap();
        assert_eq!(works.len(), 1);
        assert_eq!(works[0].first_publish_year, Some(2021));
        assert_eq!(works[0].author_names(), vec!["Andy Weir"]);
    }

    #[tokio::test]
    async fn test_work_detail_and_editions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/works/OL1W.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Project Hail Mary",
                "description": {"type": "/type/text", "value": "A lone astronaut."}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/works/OL1W/editions.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entries": [{"publish_date": "May 4, 2021"}, {}]
            })))
            .mount(&server)
            .await;

        let catalog = catalog_for(&server);
        let detail = catalog.work_detail("/works/OL1W").await.unwrap();
        assert_eq!(
            detail.description().into_option(),
            Some("A lone astronaut.".to_string())
        );

        let editions = catalog.work_editions("OL1W", 10).await.unwrap();
        assert_eq!(editions.len(), 2);
        assert_eq!(editions[0].year(), Some(2021));
        assert_eq!(editions[1].year(), None);
    }

    #[tokio::test]
    async fn test_non_success_status_is_external_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/authors.json"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = catalog_for(&server).search_authors("Anyone").await.unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_external_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/authors/OL1A/works.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = catalog_for(&server).author_works("OL1A", 100).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
    }

    #[tokio::test]
    async fn test_empty_author_name_rejected() {
        let server = MockServer::start().await;
        let err = catalog_for(&server).search_authors("   ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
