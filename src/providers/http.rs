use crate::core::config::FetchConfig;
use crate::core::{AcquireError, DocumentFetcher, FetchedDocument};
use async_trait::async_trait;
use tracing::debug;

/// Fetches documents over HTTP with a per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, locator: &str) -> Result<FetchedDocument, AcquireError> {
        debug!("Requesting index document from {}", locator);

        let transient = |e: reqwest::Error| AcquireError::TransientFetch {
            locator: locator.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(locator).send().await.map_err(transient)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transient)?;
        debug!("Fetched {} bytes from {} (status {})", body.len(), locator, status);

        Ok(FetchedDocument { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(status_code: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index"))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_fetch_returns_status_and_body() {
        let mock_server = create_mock_server(200, "<p>SCFI 1,234</p>").await;
        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();

        let doc = fetcher
            .fetch(&format!("{}/index", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(doc.status, 200);
        assert_eq!(doc.body, "<p>SCFI 1,234</p>");
    }

    #[tokio::test]
    async fn test_fetch_keeps_error_status() {
        let mock_server = create_mock_server(500, "Server Error").await;
        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let locator = format!("{}/index", mock_server.uri());

        let doc = fetcher.fetch(&locator).await.unwrap();
        assert_eq!(doc.status, 500);
        assert!(matches!(
            doc.into_success(&locator),
            Err(AcquireError::TransientFetch { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transient() {
        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let result = fetcher.fetch("http://127.0.0.1:1/index").await;
        assert!(matches!(result, Err(AcquireError::TransientFetch { .. })));
    }
}
