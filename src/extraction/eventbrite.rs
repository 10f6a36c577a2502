use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use super::base::{non_empty, DocumentQuery, HtmlPage};
use super::draft::EventDraft;
use super::json_ld;
use super::PlatformExtractor;
use crate::models::{EventOverview, Platform};

static SERVER_DATA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"window\.__SERVER_DATA__\s*=\s*").expect("valid server data regex")
});
static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[$€£][\d,]+\.?\d*").expect("valid price regex"));

const TITLE_SELECTOR: &str = r#"h1[class*="event-title"]"#;
const DESCRIPTION_SELECTOR: &str = r#"div[class*="event-description"]"#;
const IMAGE_SELECTOR: &str = r#"img[class*="event-image"]"#;
const LOCATION_SELECTORS: [&str; 2] = [
    r#"div[class*="location-info"]"#,
    r#"p[class*="location"]"#,
];
const DATE_SELECTOR: &str = r#"div[class*="date-info"]"#;
const ORGANIZER_SELECTORS: [&str; 2] = [
    r#"div[class*="organizer-name"]"#,
    r#"a[class*="organizer"]"#,
];
const PANEL_PRICE_SELECTOR: &str = r#"div[class*="conversion-bar__panel-info"]"#;
const PRICE_SELECTORS: [&str; 2] = [r#"div[class*="price"]"#, r#"span[class*="price"]"#];

type Tier = fn(&dyn DocumentQuery) -> Result<EventDraft>;

// Earlier tiers own the fields they fill.
const TIERS: [(&str, Tier); 3] = [
    ("structured-data", structured_data_tier),
    ("server-state", server_state_tier),
    ("dom", dom_tier),
];

pub struct Eventbrite;

impl PlatformExtractor for Eventbrite {
    fn platform(&self) -> Platform {
        Platform::Eventbrite
    }

    fn extract(&self, url: &str, html: &str) -> Result<EventOverview> {
        extract_eventbrite(url, html)
    }
}

pub fn extract_eventbrite(url: &str, html: &str) -> Result<EventOverview> {
    let page = HtmlPage::parse(html);
    let draft = run_tiers(&page);
    let event = draft.finish(Platform::Eventbrite, url);
    info!(url, title = %event.title, "eventbrite extraction finished");
    Ok(event)
}

fn run_tiers(page: &dyn DocumentQuery) -> EventDraft {
    TIERS
        .iter()
        .fold(EventDraft::default(), |draft, (name, tier)| match tier(page) {
            Ok(found) => {
                debug!(tier = *name, "tier applied");
                draft.merge(found)
            }
            Err(err) => {
                debug!(tier = *name, error = %err, "tier skipped");
                draft
            }
        })
}

fn structured_data_tier(page: &dyn DocumentQuery) -> Result<EventDraft> {
    let event = json_ld::find_event(page).ok_or_else(|| anyhow!("no Event structured data"))?;
    Ok(json_ld::draft_from_event(&event))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerData {
    event: Option<ServerEvent>,
    venue: Option<ServerVenue>,
    organizer: Option<Named>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerEvent {
    name: Option<Text>,
    summary: Option<String>,
    description: Option<Text>,
    start: Option<ServerTime>,
    end: Option<ServerTime>,
    is_online_event: Option<bool>,
    is_free: Option<bool>,
    logo: Option<ServerImage>,
    image_url: Option<String>,
    venue: Option<ServerVenue>,
    organizer: Option<Named>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Text {
    Plain(String),
    Rich { text: Option<String> },
}

impl Text {
    fn into_text(self) -> Option<String> {
        match self {
            Text::Plain(text) => Some(text),
            Text::Rich { text } => text,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerTime {
    utc: Option<String>,
    local: Option<String>,
}

impl ServerTime {
    fn into_timestamp(self) -> Option<String> {
        self.utc.or(self.local)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerImage {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerVenue {
    name: Option<String>,
    address: Option<ServerAddress>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerAddress {
    localized_address_display: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Named {
    name: Option<String>,
}

fn server_state_tier(page: &dyn DocumentQuery) -> Result<EventDraft> {
    let mut draft = EventDraft::default();
    let mut seen_marker = false;
    let mut parsed_any = false;

    for body in page.script_bodies("script") {
        let Some(marker) = SERVER_DATA_RE.find(&body) else {
            continue;
        };
        seen_marker = true;
        let mut values =
            serde_json::Deserializer::from_str(&body[marker.end()..]).into_iter::<ServerData>();
        match values.next() {
            Some(Ok(data)) => {
                parsed_any = true;
                draft = draft.merge(draft_from_server_data(data));
            }
            Some(Err(err)) => debug!(error = %err, "failed to parse __SERVER_DATA__"),
            None => debug!("empty __SERVER_DATA__ assignment"),
        }
    }

    match (seen_marker, parsed_any) {
        (false, _) => Err(anyhow!("no __SERVER_DATA__ assignment")),
        (true, false) => Err(anyhow!("__SERVER_DATA__ present but unreadable")),
        (true, true) => Ok(draft),
    }
}

fn draft_from_server_data(data: ServerData) -> EventDraft {
    let mut draft = EventDraft::default();
    let ServerData {
        event,
        venue,
        organizer,
    } = data;
    let event = event.unwrap_or_default();

    draft.fill_title(event.name.and_then(Text::into_text));
    draft.fill_description(event.summary);
    draft.fill_description(event.description.and_then(Text::into_text));
    draft.fill_date_time(
        event.start.and_then(ServerTime::into_timestamp),
        event.end.and_then(ServerTime::into_timestamp),
    );
    draft.fill_image_url(event.logo.and_then(|logo| logo.url));
    draft.fill_image_url(event.image_url);

    if let Some(venue) = venue.or(event.venue) {
        draft.fill_location_name(venue.name);
        draft.fill_location_address(
            venue
                .address
                .and_then(|address| address.localized_address_display),
        );
    }
    draft.fill_online(event.is_online_event);

    if event.is_free == Some(true) {
        draft.fill_cost(Some("Free".to_string()));
    }
    draft.fill_organizer(organizer.or(event.organizer).and_then(|named| named.name));
    draft
}

fn dom_tier(page: &dyn DocumentQuery) -> Result<EventDraft> {
    let mut draft = EventDraft::default();

    draft.fill_title(
        page.first_text(TITLE_SELECTOR)
            .or_else(|| page.meta_property("og:title"))
            .or_else(|| page.first_text("h1")),
    );
    draft.fill_description(
        page.first_text(DESCRIPTION_SELECTOR)
            .or_else(|| page.meta_property("og:description"))
            .or_else(|| page.meta_name("description")),
    );
    draft.fill_image_url(
        page.first_attr(IMAGE_SELECTOR, "src")
            .or_else(|| page.meta_property("og:image")),
    );

    if let Some(location) = LOCATION_SELECTORS
        .iter()
        .find_map(|selector| page.all_text(selector))
    {
        draft.fill_online(Some(location.to_lowercase().contains("online")));
        draft.fill_location_name(Some(location));
    }

    draft.fill_date_time(
        page.first_attr("time", "datetime")
            .or_else(|| page.all_text(DATE_SELECTOR)),
        None,
    );
    draft.fill_organizer(first_text_of(page, &ORGANIZER_SELECTORS));

    let price_text = page
        .all_text(PANEL_PRICE_SELECTOR)
        .or_else(|| first_text_of(page, &PRICE_SELECTORS));
    draft.fill_cost(price_text.as_deref().and_then(price_from_text));

    Ok(draft)
}

fn first_text_of(page: &dyn DocumentQuery, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|selector| page.first_text(selector))
}

/// "Free" wins; otherwise the first currency amount, otherwise the text itself.
fn price_from_text(text: &str) -> Option<String> {
    let text = non_empty(text)?;
    if text.to_lowercase().contains("free") {
        return Some("Free".to_string());
    }
    match PRICE_RE.find(&text) {
        Some(found) => Some(found.as_str().to_string()),
        None => Some(text),
    }
}
