use crate::config::ApiConfig;
use crate::types::{Book, BookId, BookPatch, NewBook, PageResponse};
use crate::{Error, Result};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// HTTP client for the catalog REST API
#[derive(Debug, Clone)]
pub struct CatalogApi {
    client: Client,
    base: Url,
}

impl CatalogApi {
    /// Creates a client from API settings
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Self::with_timeout(config.base_url()?, config.timeout())
    }

    /// Creates a client for an already parsed base URL with a custom timeout (primarily for tests)
    pub fn with_timeout(base: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bookshelf/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client, base })
    }

    /// Base URL every endpoint is resolved against
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// `GET books?page=&page_size=`
    pub async fn list_books(&self, page: u32, page_size: u32) -> Result<PageResponse> {
        let mut url = self.endpoint("books")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("page_size", &page_size.to_string());

        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let response = ensure_success(Method::GET, &url, response)?;
        decode(response).await
    }

    /// `DELETE books/<id>`; the response body is ignored
    pub async fn delete_book(&self, id: BookId) -> Result<()> {
        let url = self.book_url(id)?;
        debug!("DELETE {}", url);
        let response = self.client.delete(url.clone()).send().await?;
        ensure_success(Method::DELETE, &url, response)?;
        Ok(())
    }

    /// `PUT books/<id>` with the patch as JSON body, returning the stored record
    pub async fn update_book(&self, id: BookId, patch: &BookPatch) -> Result<Book> {
        let url = self.book_url(id)?;
        debug!("PUT {}", url);
        let response = self.client.put(url.clone()).json(patch).send().await?;
        let response = ensure_success(Method::PUT, &url, response)?;
        decode(response).await
    }

    /// `POST books` with the new record as JSON body, returning the created record
    pub async fn create_book(&self, book: &NewBook) -> Result<Book> {
        let url = self.endpoint("books")?;
        debug!("POST {}", url);
        let response = self.client.post(url.clone()).json(book).send().await?;
        let response = ensure_success(Method::POST, &url, response)?;
        decode(response).await
    }

    fn book_url(&self, id: BookId) -> Result<Url> {
        self.endpoint(&format!("books/{id}"))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }
}

/// Read the whole body, then decode it, so that malformed JSON surfaces as
/// [`Error::Parse`] rather than a transport error.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

fn ensure_success(method: Method, url: &Url, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::RequestFailed {
            method,
            url: url.to_string(),
            status,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path, query_param},
    };

    async fn api_for(server: &MockServer) -> CatalogApi {
        let base = Url::parse(&format!("{}/api/", server.uri())).unwrap();
        CatalogApi::with_timeout(base, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_client_creation_from_config() {
        let api = CatalogApi::new(&ApiConfig::default()).unwrap();
        assert_eq!(api.base_url().as_str(), "http://localhost:3005/api/");
    }

    #[tokio::test]
    async fn test_list_books_sends_paging_query() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/books"))
            .and(query_param("page", "2"))
            .and(query_param("page_size", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 6, "title": "Middlemarch"}],
                "meta": {"total_pages": 4, "total": 17, "current_page": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = api_for(&server).await.list_books(2, 5).await?;
        assert_eq!(page.data, vec![Book::new(6, "Middlemarch")]);
        assert_eq!(page.meta.current_page, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_books_rejects_malformed_body() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/books"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = api_for(&server).await.list_books(1, 10).await;
        assert!(matches!(result, Err(Error::Parse(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_non_success_is_request_failed() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/books/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        match api_for(&server).await.delete_book(BookId(9)).await {
            Err(Error::RequestFailed {
                method: m,
                status,
                url,
            }) => {
                assert_eq!(m, Method::DELETE);
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert!(url.ends_with("/api/books/9"));
            },
            other => panic!("Expected RequestFailed, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_update_sends_patch_body() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/books/3"))
            .and(body_json(json!({"title": "Renamed"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 3, "title": "Renamed"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let patch = BookPatch::new().title("Renamed");
        let updated = api_for(&server).await.update_book(BookId(3), &patch).await?;
        assert_eq!(updated, Book::new(3, "Renamed"));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_returns_server_record() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/books"))
            .and(body_json(json!({"title": "Beloved", "isFavorite": false})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": 40, "title": "Beloved"})),
            )
            .mount(&server)
            .await;

        let created = api_for(&server).await.create_book(&NewBook::new("Beloved")).await?;
        assert_eq!(created.id, BookId(40));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_server_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/books"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = api_for(&server)
            .await
            .create_book(&NewBook::new("Beloved"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(err.is_recoverable());
        Ok(())
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let base = Url::parse("http://127.0.0.1:9/api/").unwrap();
        let api = CatalogApi::with_timeout(base, Duration::from_millis(500)).unwrap();
        let result = api.list_books(1, 10).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
