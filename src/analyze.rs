use thiserror::Error;
use tracing::{info, warn};

use crate::extraction::{self, ExtractorRegistry};
use crate::fetch::{FetchError, PageFetcher};
use crate::models::{AnalysisResult, EventOverview};
use crate::normalize::normalize;
use crate::platform::classify;

pub const EXTRACTION_FAILED: &str = "Could not extract event data from the provided URL";

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Could not extract event data from the provided URL")]
    Exhausted,
    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Normalize, classify, fetch, extract. One analysis per call; concurrent
/// calls share nothing but the fetcher and the extractor table.
pub struct Analyzer<F> {
    fetcher: F,
    registry: ExtractorRegistry,
}

impl<F: PageFetcher> Analyzer<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_registry(fetcher, ExtractorRegistry::default())
    }

    pub fn with_registry(fetcher: F, registry: ExtractorRegistry) -> Self {
        Self { fetcher, registry }
    }

    pub async fn analyze_event(&self, raw_url: &str) -> AnalysisResult {
        match self.run(raw_url).await {
            Ok(event) => AnalysisResult::success(event),
            Err(err) => {
                warn!(url = raw_url, error = %err, "event analysis failed");
                AnalysisResult::failure(err.to_string())
            }
        }
    }

    async fn run(&self, raw_url: &str) -> Result<EventOverview, AnalyzeError> {
        let url = normalize(raw_url);
        let platform = classify(&url);
        info!(%url, %platform, "analyzing event link");

        let html = self.fetcher.fetch_page(&url).await?;
        let dedicated = self.registry.find(platform);

        // Extraction runs on the blocking pool; a panic comes back as a JoinError.
        tokio::task::spawn_blocking(move || match dedicated {
            Some(extractor) => extractor.extract(&url, &html).map_err(|err| {
                warn!(%url, %platform, error = %err, "platform extractor failed");
                AnalyzeError::Exhausted
            }),
            None => Ok(extraction::extract_generic(&html, platform, &url)),
        })
        .await
        .map_err(|err| AnalyzeError::Task(err.to_string()))?
    }
}
