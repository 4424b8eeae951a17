//! Allowlist HTML sanitization for letter bodies.

use ammonia::Builder;

/// Attributes kept on `<img>` elements.
const IMG_ATTRIBUTES: &[&str] = &["src", "alt", "title", "width", "height"];

/// Strip everything outside the safe tag allowlist (ammonia's defaults plus
/// `img`). Scripts, inline event handlers and `javascript:` URLs are removed.
pub fn sanitize_html(text: &str) -> String {
    let mut builder = Builder::default();
    builder
        .add_tags(&["img"])
        .add_tag_attributes("img", IMG_ATTRIBUTES);
    builder.clean(text).to_string()
}

/// Text content of an HTML fragment, every tag removed.
pub fn to_plain_text(html: &str) -> String {
    Builder::empty().clean(html).to_string()
}
