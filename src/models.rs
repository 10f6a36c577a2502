use std::fmt;

use serde::{Deserialize, Serialize};

pub const UNTITLED_EVENT: &str = "Untitled Event";

/// Event hosting service a link belongs to.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Eventbrite,
    Meetup,
    Luma,
    Partful,
    Facebook,
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Eventbrite => "eventbrite",
            Platform::Meetup => "meetup",
            Platform::Luma => "luma",
            Platform::Partful => "partful",
            Platform::Facebook => "facebook",
            Platform::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EventDateTime {
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
}

impl EventLocation {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none() && self.is_online.is_none()
    }
}

/// Structured description of an event page. Everything but `title`,
/// `platform` and `original_url` is best-effort.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventOverview {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<EventLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    pub platform: Platform,
    pub original_url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AnalysisResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventOverview>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn success(event: EventOverview) -> Self {
        Self {
            success: true,
            event: Some(event),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            event: None,
            error: Some(message.into()),
        }
    }
}

/// Chat message as kept by the message store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub id: String, // sha256 of user_id|created_at|content
    pub user_id: String,
    pub user_email: String,
    pub user_name: Option<String>,
    pub user_image: Option<String>,
    pub content: String,
    pub event_data: Option<EventOverview>,
    pub created_at: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NewMessage {
    pub user_id: String,
    pub user_email: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_image: Option<String>,
    pub content: String,
}
