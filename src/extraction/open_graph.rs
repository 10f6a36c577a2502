use super::base::DocumentQuery;
use super::draft::EventDraft;

/// Social-preview tags: title, description and image, nothing else.
pub fn draft(page: &dyn DocumentQuery) -> EventDraft {
    let mut draft = EventDraft::default();
    draft.fill_title(
        page.meta_property("og:title")
            .or_else(|| page.first_text("title")),
    );
    draft.fill_description(
        page.meta_property("og:description")
            .or_else(|| page.meta_name("description")),
    );
    draft.fill_image_url(page.meta_property("og:image"));
    draft
}
