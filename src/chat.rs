use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("valid url regex"));

static EVENT_LINK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)eventbrite\.com",
        r"(?i)meetup\.com",
        r"(?i)facebook\.com/events",
        r"(?i)lu\.ma",
        r"(?i)zoom\.us",
        r"(?i)teams\.microsoft\.com",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid event link pattern"))
    .collect()
});

pub fn extract_urls(text: &str) -> Vec<&str> {
    URL_RE.find_iter(text).map(|found| found.as_str()).collect()
}

pub fn is_event_url(url: &str) -> bool {
    EVENT_LINK_PATTERNS.iter().any(|pattern| pattern.is_match(url))
}

/// First link in a chat message that points at an event page.
pub fn find_event_link(text: &str) -> Option<&str> {
    extract_urls(text).into_iter().find(|url| is_event_url(url))
}
