use once_cell::sync::Lazy;
use regex::Regex;
use url::{form_urlencoded, Url};

const TRACKING_PARAMS: [&str; 8] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "utm_term",
    "fbclid",
    "gclid",
    "_ga",
];

static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://").expect("valid scheme regex"));

/// Canonicalises a pasted link: adds `https://` when no scheme is given and
/// drops tracking parameters. Input that does not parse as a URL is returned
/// trimmed but otherwise untouched.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let candidate = if SCHEME_RE.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut url = match Url::parse(&candidate) {
        Ok(url) => url,
        Err(_) => return trimmed.to_string(),
    };

    if let Some(query) = url.query() {
        let kept: Vec<&str> = query
            .split('&')
            .filter(|pair| !is_tracking_pair(pair))
            .collect();
        let removed = kept.len() != query.split('&').count();
        if removed {
            let joined = kept.join("&");
            if joined.is_empty() {
                url.set_query(None);
            } else {
                url.set_query(Some(&joined));
            }
        }
    }

    url.to_string()
}

// Keys are compared decoded, so `utm%5Fsource` counts as `utm_source`.
fn is_tracking_pair(pair: &str) -> bool {
    form_urlencoded::parse(pair.as_bytes())
        .next()
        .is_some_and(|(key, _)| TRACKING_PARAMS.contains(&&*key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepends_scheme_and_strips_tracking() {
        assert_eq!(
            normalize("eventbrite.com/e/sample?utm_source=newsletter"),
            "https://eventbrite.com/e/sample"
        );
    }

    #[test]
    fn keeps_other_params_verbatim() {
        let url = normalize("https://x.com/e?utm_source=a&keep=1");
        assert_eq!(url, "https://x.com/e?keep=1");

        let url = normalize("  https://x.com/e?q=a+b&fbclid=xyz&page=2#details ");
        assert_eq!(url, "https://x.com/e?q=a+b&page=2#details");
    }

    #[test]
    fn encoded_tracking_keys_are_stripped() {
        assert_eq!(
            normalize("https://lu.ma/abc?utm%5Fsource=x&name=caf%C3%A9"),
            "https://lu.ma/abc?name=caf%C3%A9"
        );
    }

    #[test]
    fn leaves_http_scheme_alone() {
        assert_eq!(
            normalize("HTTP://lu.ma/abc?gclid=1&_ga=2"),
            "http://lu.ma/abc"
        );
    }

    #[test]
    fn unparseable_input_is_returned_trimmed() {
        assert_eq!(normalize("  not a url  "), "not a url");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "eventbrite.com/e/sample?utm_source=newsletter",
            "https://x.com/e?utm_source=a&keep=1",
            "https://www.meetup.com/rust/events/123/?utm_medium=email&ref=home",
            "not a url",
            "lu.ma",
            "https://facebook.com/events/42?",
            "  ",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }
}
