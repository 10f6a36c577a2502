use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Read-only queries the extractors run against a page. Selectors are CSS;
/// every text result is whitespace-collapsed and empty results are `None`.
pub trait DocumentQuery {
    /// Text of the first element matching `css`.
    fn first_text(&self, css: &str) -> Option<String>;
    /// Text of every element matching `css`, joined.
    fn all_text(&self, css: &str) -> Option<String>;
    /// Attribute `attr` of the first element matching `css`.
    fn first_attr(&self, css: &str, attr: &str) -> Option<String>;
    /// Raw bodies of the `<script>` elements matching `css`.
    fn script_bodies(&self, css: &str) -> Vec<String>;

    fn meta_property(&self, property: &str) -> Option<String> {
        self.first_attr(&format!(r#"meta[property="{property}"]"#), "content")
    }

    fn meta_name(&self, name: &str) -> Option<String> {
        self.first_attr(&format!(r#"meta[name="{name}"]"#), "content")
    }
}

pub struct HtmlPage {
    document: Html,
}

impl HtmlPage {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    fn selector(css: &str) -> Option<Selector> {
        match Selector::parse(css) {
            Ok(selector) => Some(selector),
            Err(err) => {
                debug!(css, error = %err, "invalid selector");
                None
            }
        }
    }
}

impl DocumentQuery for HtmlPage {
    fn first_text(&self, css: &str) -> Option<String> {
        let selector = Self::selector(css)?;
        self.document
            .select(&selector)
            .next()
            .and_then(|node| non_empty(&inner_text(node)))
    }

    fn all_text(&self, css: &str) -> Option<String> {
        let selector = Self::selector(css)?;
        let joined = self
            .document
            .select(&selector)
            .map(inner_text)
            .collect::<Vec<_>>()
            .join(" ");
        non_empty(&joined)
    }

    fn first_attr(&self, css: &str, attr: &str) -> Option<String> {
        let selector = Self::selector(css)?;
        self.document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr(attr))
            .and_then(non_empty)
    }

    fn script_bodies(&self, css: &str) -> Vec<String> {
        let Some(selector) = Self::selector(css) else {
            return Vec::new();
        };
        self.document
            .select(&selector)
            .map(|script| script.text().collect::<String>())
            .collect()
    }
}

pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn non_empty(input: &str) -> Option<String> {
    let cleaned = clean_text(input);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}
