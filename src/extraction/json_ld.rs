//! schema.org Event blocks embedded as `application/ld+json`.

use serde_json::{Map, Value};
use tracing::debug;

use super::base::DocumentQuery;
use super::draft::EventDraft;

pub const LD_JSON_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

const DEFAULT_CURRENCY: &str = "$";

/// First Event node across every structured-data block on the page. Blocks
/// that fail to parse are skipped.
pub fn find_event(page: &dyn DocumentQuery) -> Option<Map<String, Value>> {
    for (index, body) in page.script_bodies(LD_JSON_SELECTOR).iter().enumerate() {
        match serde_json::from_str::<Value>(body.trim()) {
            Ok(value) => {
                if let Some(node) = first_event_node(&value) {
                    debug!(block = index, "found Event structured data");
                    return Some(node.clone());
                }
            }
            Err(err) => debug!(block = index, error = %err, "skipping malformed ld+json block"),
        }
    }
    None
}

fn first_event_node(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Array(items) => items.iter().find_map(first_event_node),
        Value::Object(map) if is_event(map) => Some(map),
        Value::Object(map) => map.get("@graph").and_then(first_event_node),
        _ => None,
    }
}

// schema.org subtypes (MusicEvent, SocialEvent, ...) all end in "Event".
fn is_event(map: &Map<String, Value>) -> bool {
    let is_event_type = |name: &str| name.ends_with("Event");
    match map.get("@type") {
        Some(Value::String(name)) => is_event_type(name.as_str()),
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .any(is_event_type),
        _ => false,
    }
}

pub fn draft_from_event(event: &Map<String, Value>) -> EventDraft {
    let mut draft = EventDraft::default();
    draft.fill_title(string_field(event, "name"));
    draft.fill_description(string_field(event, "description"));
    draft.fill_date_time(
        string_field(event, "startDate"),
        string_field(event, "endDate"),
    );

    let online_mode = event
        .get("eventAttendanceMode")
        .and_then(Value::as_str)
        .is_some_and(|mode| mode.ends_with("OnlineEventAttendanceMode"));

    if let Some(location) = event.get("location").and_then(first_of) {
        match location {
            Value::String(name) => draft.fill_location_name(Some(name.trim().to_string())),
            Value::Object(place) => {
                draft.fill_location_name(string_field(place, "name"));
                draft.fill_location_address(place.get("address").and_then(address_text));
            }
            _ => {}
        }
        let virtual_place = location
            .get("@type")
            .and_then(Value::as_str)
            .is_some_and(|kind| kind == "VirtualLocation");
        draft.fill_online(Some(online_mode || virtual_place));
    } else if online_mode {
        draft.fill_online(Some(true));
    }

    draft.fill_image_url(event.get("image").and_then(image_url));
    draft.fill_cost(event.get("offers").and_then(first_of).and_then(offer_cost));
    draft.fill_organizer(event.get("organizer").and_then(first_of).and_then(named));
    draft
}

fn first_of(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).and_then(trimmed)
}

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn named(value: &Value) -> Option<String> {
    match value {
        Value::String(name) => trimmed(name),
        Value::Object(map) => string_field(map, "name"),
        _ => None,
    }
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => trimmed(url),
        Value::Object(map) => string_field(map, "url"),
        Value::Array(items) => items.first().and_then(image_url),
        _ => None,
    }
}

/// Street, locality, region and postal code, comma separated, skipping the
/// missing parts.
pub fn address_text(value: &Value) -> Option<String> {
    match value {
        Value::String(address) => trimmed(address),
        Value::Object(map) => {
            let parts = ["streetAddress", "addressLocality", "addressRegion", "postalCode"]
                .iter()
                .filter_map(|key| string_field(map, key))
                .collect::<Vec<_>>();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

/// `"Free"` for a zero price, otherwise the currency (or `$`) glued to the price.
pub fn offer_cost(offer: &Value) -> Option<String> {
    let price = match offer.get("price")? {
        Value::Number(number) => number.to_string(),
        Value::String(text) => trimmed(text)?,
        _ => return None,
    };
    if price.parse::<f64>().is_ok_and(|amount| amount == 0.0) {
        return Some("Free".to_string());
    }
    let currency = offer
        .get("priceCurrency")
        .and_then(Value::as_str)
        .and_then(trimmed)
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    Some(format!("{currency}{price}"))
}
