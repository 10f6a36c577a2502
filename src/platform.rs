use url::Url;

use crate::models::Platform;

struct Rule {
    hosts: &'static [&'static str],
    path_fragment: Option<&'static str>,
    platform: Platform,
}

// Checked in order, first match wins.
const RULES: &[Rule] = &[
    Rule {
        hosts: &["eventbrite.com"],
        path_fragment: None,
        platform: Platform::Eventbrite,
    },
    Rule {
        hosts: &["meetup.com"],
        path_fragment: None,
        platform: Platform::Meetup,
    },
    Rule {
        hosts: &["lu.ma", "luma.com"],
        path_fragment: None,
        platform: Platform::Luma,
    },
    Rule {
        hosts: &["partful.com"],
        path_fragment: None,
        platform: Platform::Partful,
    },
    Rule {
        hosts: &["facebook.com"],
        path_fragment: Some("/events/"),
        platform: Platform::Facebook,
    },
];

pub fn classify(url: &str) -> Platform {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return Platform::Unknown,
    };
    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    let path = parsed.path();

    RULES
        .iter()
        .find(|rule| {
            rule.hosts.iter().any(|needle| host.contains(needle))
                && rule
                    .path_fragment
                    .map_or(true, |fragment| path.contains(fragment))
        })
        .map_or(Platform::Unknown, |rule| rule.platform)
}
