//! Preview-image extraction from page metadata.
//!
//! Priority: `og:image`, then `twitter:image`, then `link[rel=image_src]`.
//! Malformed HTML is fine; the parser is lenient and a page without any of
//! the three tags is simply "not found".

use scraper::{Html, Selector};

fn sel(s: &str) -> Selector {
    Selector::parse(s).unwrap()
}

/// Extract the page's canonical preview image URL, if it declares one.
pub fn extract_preview_image(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    let og = sel(r#"meta[property="og:image"]"#);
    if let Some(content) = doc
        .select(&og)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
    {
        return Some(content.to_string());
    }

    let twitter = sel(r#"meta[name="twitter:image"]"#);
    if let Some(content) = doc
        .select(&twitter)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
    {
        return Some(content.to_string());
    }

    let link = sel(r#"link[rel="image_src"]"#);
    doc.select(&link)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .find(|h| !h.is_empty())
        .map(str::to_string)
}
