// src/fetch/mod.rs

pub mod envelope;

pub use envelope::{strip_callback, unwrap_envelope};

use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::error::SnapshotError;
use crate::raw::RawTree;

/// GETs the feed and turns the body into a `RawTree`.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    url: Url,
    max_retries: u32,
    initial_backoff_ms: u64,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, SnapshotError> {
        let url = config.endpoint_url()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .build()
            .map_err(|source| SnapshotError::Fetch {
                url: url.to_string(),
                source,
            })?;
        Ok(Self::with_client(client, url, config))
    }

    /// Use an existing client (shared connection pool, custom TLS, ...).
    pub fn with_client(client: Client, url: Url, config: &FetchConfig) -> Self {
        Self {
            client,
            url,
            max_retries: config.max_retries,
            initial_backoff_ms: config.initial_backoff_ms,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn get_text_core(&self) -> Result<String, reqwest::Error> {
        debug!("Fetching text from {}", self.url);
        self.client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    async fn get_text_with_retry(&self) -> Result<String, SnapshotError> {
        let mut attempts = 0;
        loop {
            match self.get_text_core().await {
                Ok(t) => return Ok(t),
                Err(e) if attempts < self.max_retries => {
                    attempts += 1;
                    let backoff = self.initial_backoff_ms * 2u64.pow(attempts - 1);
                    warn!(url = %self.url, attempt = attempts, delay_ms = backoff, error = %e, "Retrying");
                    sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => {
                    error!(url = %self.url, attempts = attempts + 1, error = %e, "GET failed");
                    return Err(SnapshotError::Fetch {
                        url: self.url.to_string(),
                        source: e,
                    });
                }
            }
        }
    }

    /// One GET (plus configured retries), then envelope unwrapping.
    #[instrument(level = "info", skip(self), fields(url = %self.url))]
    pub async fn fetch_raw(&self) -> Result<RawTree, SnapshotError> {
        let body = self.get_text_with_retry().await?;
        info!(bytes = body.len(), "fetched payload");
        Ok(unwrap_envelope(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve;

    fn config(endpoint: String, max_retries: u32) -> FetchConfig {
        FetchConfig {
            endpoint,
            timeout_secs: 5,
            max_retries,
            initial_backoff_ms: 1,
        }
    }

    #[tokio::test]
    async fn fetches_and_unwraps() {
        let body = r#"42({"ret":0,"data":"{\"lastUpdateTime\":\"2020-02-05 09:52:25\"}"})"#;
        let endpoint = serve(vec![(200, body.to_string())]).await;

        let fetcher = Fetcher::new(&config(endpoint, 0)).unwrap();
        let raw = fetcher.fetch_raw().await.unwrap();
        assert_eq!(
            raw.last_update_time.as_ref().and_then(|t| t.as_str()),
            Some("2020-02-05 09:52:25")
        );
    }

    #[tokio::test]
    async fn error_status_is_a_fetch_error() {
        let endpoint = serve(vec![(503, "busy".to_string())]).await;

        let fetcher = Fetcher::new(&config(endpoint.clone(), 0)).unwrap();
        match fetcher.fetch_raw().await {
            Err(SnapshotError::Fetch { url, source }) => {
                assert_eq!(url, endpoint);
                assert_eq!(source.status().map(|s| s.as_u16()), Some(503));
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn retries_up_to_the_configured_limit() {
        let body = r#"{"data":{"lastUpdateTime":"t"}}"#;
        let endpoint = serve(vec![
            (500, String::new()),
            (500, String::new()),
            (200, body.to_string()),
        ])
        .await;

        let fetcher = Fetcher::new(&config(endpoint, 2)).unwrap();
        let raw = fetcher.fetch_raw().await.unwrap();
        assert_eq!(
            raw.last_update_time.as_ref().and_then(|t| t.as_str()),
            Some("t")
        );
    }

    #[tokio::test]
    async fn garbage_body_is_an_unwrap_error() {
        let endpoint = serve(vec![(200, "<html>maintenance</html>".to_string())]).await;

        let fetcher = Fetcher::new(&config(endpoint, 0)).unwrap();
        assert!(matches!(
            fetcher.fetch_raw().await,
            Err(SnapshotError::Unwrap(_))
        ));
    }

    #[test]
    fn invalid_endpoint_is_a_config_error() {
        assert!(matches!(
            Fetcher::new(&config("::".into(), 0)),
            Err(SnapshotError::Config(_))
        ));
    }
}
