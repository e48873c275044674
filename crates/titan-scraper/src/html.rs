//! Small helpers shared by the per-source selector rules.

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

/// Compiles a CSS selector that is known-valid at compile time.
macro_rules! static_selector {
    ($name:ident, $css:literal) => {
        static $name: std::sync::LazyLock<scraper::Selector> = std::sync::LazyLock::new(|| {
            scraper::Selector::parse($css).expect(concat!("valid selector: ", $css))
        });
    };
}
pub(crate) use static_selector;

/// Text content of an element with whitespace runs collapsed and the ends trimmed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Texts of every element under `container` matching `selector`.
pub(crate) fn texts_within(container: ElementRef<'_>, selector: &Selector) -> Vec<String> {
    container.select(selector).map(element_text).collect()
}

/// Texts of every element in the document matching `selector`.
pub(crate) fn texts_in_document(document: &Html, selector: &Selector) -> Vec<String> {
    document.select(selector).map(element_text).collect()
}

/// Direct element children of `parent` with the given tag name.
pub(crate) fn child_elements<'a>(
    parent: ElementRef<'a>,
    tag: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == tag)
}

/// Closest ancestor of `element` with the given tag name.
pub(crate) fn closest_ancestor<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == tag)
}

/// Value of `attr` on the first element matching `selector`, if non-blank.
pub(crate) fn first_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Resolves an `href` against the page it was found on.
///
/// Returns `None` for empty hrefs, fragments, and anything that does not
/// resolve to an `http(s)` URL.
pub(crate) fn resolve_href(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}
