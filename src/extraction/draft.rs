use crate::models::{EventDateTime, EventLocation, EventOverview, Platform, UNTITLED_EVENT};

/// Partially extracted event. Writes only land on fields that are still
/// empty, so whichever source fills a field first keeps it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub location: EventLocation,
    pub cost: Option<String>,
    pub image_url: Option<String>,
    pub organizer: Option<String>,
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value.filter(|v| !v.trim().is_empty());
    }
}

impl EventDraft {
    pub fn fill_title(&mut self, value: Option<String>) {
        fill(&mut self.title, value);
    }

    pub fn fill_description(&mut self, value: Option<String>) {
        fill(&mut self.description, value);
    }

    /// Start and end land as a pair, and only while no start is set. An end
    /// without a start is dropped.
    pub fn fill_date_time(&mut self, start: Option<String>, end: Option<String>) {
        if self.start.is_some() {
            return;
        }
        fill(&mut self.start, start);
        if self.start.is_some() {
            self.end = end.filter(|v| !v.trim().is_empty());
        }
    }

    pub fn fill_location_name(&mut self, value: Option<String>) {
        fill(&mut self.location.name, value);
    }

    pub fn fill_location_address(&mut self, value: Option<String>) {
        fill(&mut self.location.address, value);
    }

    pub fn fill_online(&mut self, value: Option<bool>) {
        if self.location.is_online.is_none() {
            self.location.is_online = value;
        }
    }

    pub fn fill_cost(&mut self, value: Option<String>) {
        fill(&mut self.cost, value);
    }

    pub fn fill_image_url(&mut self, value: Option<String>) {
        fill(&mut self.image_url, value);
    }

    pub fn fill_organizer(&mut self, value: Option<String>) {
        fill(&mut self.organizer, value);
    }

    /// Folds a later tier's findings in without touching populated fields.
    pub fn merge(mut self, later: EventDraft) -> Self {
        self.fill_title(later.title);
        self.fill_description(later.description);
        self.fill_date_time(later.start, later.end);
        self.merge_location(later.location);
        self.fill_cost(later.cost);
        self.fill_image_url(later.image_url);
        self.fill_organizer(later.organizer);
        self
    }

    // A named place comes with its own address and online flag; those are
    // dropped once a name is already set.
    fn merge_location(&mut self, later: EventLocation) {
        if later.name.is_some() && self.location.name.is_some() {
            return;
        }
        self.fill_location_name(later.name);
        self.fill_location_address(later.address);
        self.fill_online(later.is_online);
    }

    pub fn finish(self, platform: Platform, original_url: &str) -> EventOverview {
        let date_time = self.start.map(|start| EventDateTime {
            start,
            end: self.end,
        });
        let location = if self.location.is_empty() {
            None
        } else {
            Some(self.location)
        };

        EventOverview {
            title: self.title.unwrap_or_else(|| UNTITLED_EVENT.to_string()),
            description: self.description,
            date_time,
            location,
            cost: self.cost,
            image_url: self.image_url,
            organizer: self.organizer,
            platform,
            original_url: original_url.to_string(),
        }
    }
}
