use std::future::Future;
use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed for {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("non-success status {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("unable to read response body for {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Retrieves the HTML document behind a URL. Timeouts and redirects are the
/// implementation's business; no retries happen above this layer.
pub trait PageFetcher: Send + Sync {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            Duration::from_secs(config.fetch_timeout_secs),
            &config.user_agent,
        )
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
pub(crate) mod stub {
    use std::sync::Mutex;

    use super::*;

    pub(crate) enum Reply {
        Page(String),
        Status(StatusCode),
        Unreachable,
    }

    /// Canned fetcher that records every URL it is asked for.
    pub(crate) struct StubFetcher {
        reply: Reply,
        pub(crate) requested: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        pub(crate) fn page(body: &str) -> Self {
            Self::replying(Reply::Page(body.to_string()))
        }

        pub(crate) fn replying(reply: Reply) -> Self {
            Self {
                reply,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl PageFetcher for StubFetcher {
        async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().expect("stub mutex").push(url.to_string());
            match &self.reply {
                Reply::Page(body) => Ok(body.clone()),
                Reply::Status(status) => Err(FetchError::Status {
                    status: *status,
                    url: url.to_string(),
                }),
                Reply::Unreachable => Err(FetchError::Request {
                    url: url.to_string(),
                    source: Client::new()
                        .get("not a url")
                        .build()
                        .expect_err("relative url is rejected"),
                }),
            }
        }
    }
}
