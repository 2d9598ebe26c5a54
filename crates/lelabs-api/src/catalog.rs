use std::time::Duration;

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CatalogFetchError {
    #[error("Failed to fetch data: status {0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CatalogFetchError>;

/// Fetches the site's data document (`{ meta, projects, news, pages }`).
///
/// The body is handed back untouched; deciding whether it is a usable
/// snapshot is the caller's job, since a malformed document must trigger
/// the same fallback as a network error.
pub struct CatalogClient {
    client: reqwest::Client,
    url: String,
}

impl CatalogClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(15))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the document. Any non-2xx status is an error.
    pub async fn fetch_document(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogFetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        debug!("Fetched catalog document from {} ({} bytes)", self.url, body.len());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/le-labs-data.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"projects":[]}"#))
            .mount(&server)
            .await;

        let client = CatalogClient::new(format!("{}/data/le-labs-data.json", server.uri())).unwrap();
        let body = client.fetch_document().await.unwrap();
        assert_eq!(body, r#"{"projects":[]}"#);
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = CatalogClient::new(server.uri()).unwrap();
        match client.fetch_document().await {
            Err(CatalogFetchError::Status(code)) => assert_eq!(code, 503),
            other => panic!("expected status error, got {:?}", other.map(|_| ())),
        }
    }
}
