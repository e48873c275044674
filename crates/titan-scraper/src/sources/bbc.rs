use reqwest::Url;
use scraper::Html;
use titan_core::{Extraction, LinkCandidate, LINKS_PER_SOURCE};

use super::NewsSource;
use crate::dates::parse_iso_datetime;
use crate::html::{element_text, first_attr, resolve_href, static_selector, texts_in_document};

static_selector!(CARD_LINK, r#"a[data-testid="internal-link"]"#);
static_selector!(CARD_HEADLINE, r#"h2[data-testid="card-headline"]"#);
static_selector!(BODY_PARAGRAPH, "p.sc-9a00e533-0.hxuGS");
static_selector!(PUBLISHED, "time.sc-801dd632-2.IvNnh");

/// BBC News.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bbc;

impl NewsSource for Bbc {
    fn name(&self) -> &str {
        "bbc"
    }

    fn domain(&self) -> &str {
        "bbc.com"
    }

    fn homepage(&self) -> &str {
        "https://www.bbc.com/news"
    }

    fn parse_links(&self, document: &Html, base: &Url) -> Vec<LinkCandidate> {
        // The cap applies before filtering, so live pages and videos in the
        // first few cards shrink the batch.
        document
            .select(&CARD_LINK)
            .take(LINKS_PER_SOURCE)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?;
                if href.contains("/live/") || href.contains("/videos/") {
                    return None;
                }
                let title = anchor.select(&CARD_HEADLINE).next().map(element_text)?;
                let url = resolve_href(base, href)?;
                (!title.is_empty()).then_some(LinkCandidate { title, url })
            })
            .collect()
    }

    fn parse_article(&self, document: &Html) -> Extraction {
        let published_at = first_attr(document, &PUBLISHED, "datetime")
            .and_then(|raw| {
                let parsed = parse_iso_datetime(&raw);
                if parsed.is_none() {
                    tracing::debug!(source = "bbc", raw = %raw, "unparseable publish time");
                }
                parsed
            });
        Extraction::from_paragraphs(texts_in_document(document, &BODY_PARAGRAPH), published_at)
    }
}
