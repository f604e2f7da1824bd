//! `<title>` extraction from raw response bodies.

use lazy_static::lazy_static;
use scraper::{Html, Selector};

lazy_static! {
    static ref TITLE_SELECTOR: Selector =
        Selector::parse("title").expect("'title' is a valid CSS selector");
}

/// Return the text of the first non-empty `<title>` element, or `""`.
///
/// The body is decoded as lossy UTF-8 and parsed with an HTML5 parser, so
/// malformed markup never fails; it just may not contain a title. The text
/// is returned as-is, without trimming.
pub fn extract_title(body: &[u8]) -> String {
    let html = String::from_utf8_lossy(body);
    let document = Html::parse_document(&html);

    document
        .select(&TITLE_SELECTOR)
        .map(|element| element.text().collect::<String>())
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}
