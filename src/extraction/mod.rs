pub mod base;
pub mod draft;
pub mod eventbrite;
pub mod json_ld;
pub mod open_graph;

use std::sync::Arc;

use tracing::debug;

use crate::models::{EventOverview, Platform};
use base::HtmlPage;

/// Dedicated extraction for a platform whose markup the generic path reads
/// poorly. An `Err` means the extractor gave up on the page entirely.
pub trait PlatformExtractor: Send + Sync {
    fn platform(&self) -> Platform;
    fn extract(&self, url: &str, html: &str) -> anyhow::Result<EventOverview>;
}

pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn PlatformExtractor>>,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::empty().with(eventbrite::Eventbrite)
    }
}

impl ExtractorRegistry {
    pub fn empty() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Registers `extractor`, replacing any earlier one for the same platform.
    pub fn with(mut self, extractor: impl PlatformExtractor + 'static) -> Self {
        let platform = extractor.platform();
        self.extractors.retain(|existing| existing.platform() != platform);
        self.extractors.push(Arc::new(extractor));
        self
    }

    pub fn find(&self, platform: Platform) -> Option<Arc<dyn PlatformExtractor>> {
        self.extractors
            .iter()
            .find(|extractor| extractor.platform() == platform)
            .cloned()
    }

    pub fn platforms(&self) -> Vec<Platform> {
        self.extractors
            .iter()
            .map(|extractor| extractor.platform())
            .collect()
    }
}

/// Structured data first, then social-preview tags for whatever it left
/// empty. Never fails: the worst case is a placeholder title.
pub fn extract_generic(html: &str, platform: Platform, url: &str) -> EventOverview {
    let page = HtmlPage::parse(html);
    let fallback = open_graph::draft(&page);
    let draft = match json_ld::find_event(&page) {
        Some(event) => json_ld::draft_from_event(&event).merge(fallback),
        None => {
            debug!(url, "no Event structured data, using page tags");
            fallback
        }
    };
    draft.finish(platform, url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNTITLED_EVENT;

    const SAMPLE_HTML: &str = r#"
    <html>
      <head>
        <title>Document title</title>
        <meta property="og:title" content="OG title">
        <meta property="og:description" content="OG description">
        <meta property="og:image" content="https://img.example.com/og.png">
        <script type="application/ld+json">
          {"@type": "Event", "name": "Structured title", "startDate": "2025-10-08",
           "image": "https://img.example.com/ld.png",
           "offers": {"price": "20", "priceCurrency": "USD"}}
        </script>
      </head>
    </html>
    "#;

    struct Fixed(Platform);

    impl PlatformExtractor for Fixed {
        fn platform(&self) -> Platform {
            self.0
        }

        fn extract(&self, _url: &str, _html: &str) -> anyhow::Result<EventOverview> {
            anyhow::bail!("fixed extractor never succeeds")
        }
    }

    #[test]
    fn structured_data_wins_over_open_graph() {
        let event = extract_generic(SAMPLE_HTML, Platform::Meetup, "https://www.meetup.com/x/events/1");
        assert_eq!(event.title, "Structured title");
        assert_eq!(event.image_url.as_deref(), Some("https://img.example.com/ld.png"));
        assert_eq!(event.cost.as_deref(), Some("USD20"));
        assert_eq!(event.date_time.map(|dt| dt.start).as_deref(), Some("2025-10-08"));
        assert_eq!(event.description.as_deref(), Some("OG description"));
        assert_eq!(event.platform, Platform::Meetup);
    }

    #[test]
    fn bare_page_still_produces_a_record() {
        let event = extract_generic("<p>nothing here</p>", Platform::Unknown, "https://example.com/");
        assert_eq!(event.title, UNTITLED_EVENT);
        assert_eq!(event.original_url, "https://example.com/");
        assert_eq!(event.description, None);
        assert_eq!(event.image_url, None);
        assert_eq!(event.date_time, None);
    }

    #[test]
    fn registry_routes_by_platform() {
        let registry = ExtractorRegistry::default();
        assert!(registry.find(Platform::Eventbrite).is_some());
        assert!(registry.find(Platform::Meetup).is_none());

        let registry = registry.with(Fixed(Platform::Meetup)).with(Fixed(Platform::Eventbrite));
        assert_eq!(registry.platforms(), vec![Platform::Meetup, Platform::Eventbrite]);
        let replaced = registry.find(Platform::Eventbrite).expect("eventbrite extractor");
        assert!(replaced.extract("https://www.eventbrite.com/e/1", "").is_err());
    }
}
