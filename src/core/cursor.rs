use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{Html, Selector};

/// Opaque `before` token pointing at the next page of the listing.
pub type Cursor = u64;

static SELECTOR_CURSOR_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="before="]"#).unwrap());
static REGEX_CURSOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"before=(\d+)").unwrap());
// Only used to resolve relative links, never requested.
static BASE_URL: Lazy<Url> = Lazy::new(|| Url::parse("https://localhost/").unwrap());

/// Cursor of the page following the given one, if any.
pub fn next_cursor(html: &str) -> Option<Cursor> {
    next_cursor_from(&Html::parse_document(html), html)
}

pub fn next_cursor_from(document: &Html, raw: &str) -> Option<Cursor> {
    document
        .select(&SELECTOR_CURSOR_LINK)
        .filter_map(|link| link.value().attr("href"))
        .find_map(cursor_from_href)
        // Pagination link absent or renamed, look for the token anywhere.
        .or_else(|| {
            REGEX_CURSOR
                .captures(raw)
                .and_then(|captures| captures.get(1))
                .and_then(|digits| digits.as_str().parse::<Cursor>().ok())
        })
}

fn cursor_from_href(href: &str) -> Option<Cursor> {
    let url = BASE_URL.join(href.trim()).ok()?;
    let before = url
        .query_pairs()
        .find(|(key, _)| key == "before")
        .map(|(_, value)| value.into_owned())?;
    before.trim().parse::<Cursor>().ok()
}
