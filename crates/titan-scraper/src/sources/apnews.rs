use reqwest::Url;
use scraper::Html;
use titan_core::{Extraction, LinkCandidate, LINKS_PER_SOURCE};

use super::NewsSource;
use crate::dates::parse_epoch_millis;
use crate::html::{element_text, first_attr, resolve_href, static_selector, texts_within};

static_selector!(PROMO, "div.PagePromo");
static_selector!(PROMO_LINK, "a.Link");
static_selector!(PROMO_TITLE, "h2.PagePromo-title");
static_selector!(PROMO_ICON_TITLE, "span.PagePromoContentIcons-text");
static_selector!(STORY_BODY, "div.RichTextStoryBody");
static_selector!(PARAGRAPH, "p");
static_selector!(TIMESTAMP, "bsp-timestamp");

/// Associated Press.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApNews;

impl NewsSource for ApNews {
    fn name(&self) -> &str {
        "apnews"
    }

    fn domain(&self) -> &str {
        "apnews.com"
    }

    fn homepage(&self) -> &str {
        "https://apnews.com/"
    }

    fn parse_links(&self, document: &Html, base: &Url) -> Vec<LinkCandidate> {
        document
            .select(&PROMO)
            .take(LINKS_PER_SOURCE)
            .filter_map(|promo| {
                let href = promo.select(&PROMO_LINK).next()?.value().attr("href")?;
                let title = promo
                    .select(&PROMO_TITLE)
                    .next()
                    .or_else(|| promo.select(&PROMO_ICON_TITLE).next())
                    .map(element_text)?;
                let url = resolve_href(base, href)?;
                (!title.is_empty()).then_some(LinkCandidate { title, url })
            })
            .collect()
    }

    fn parse_article(&self, document: &Html) -> Extraction {
        let paragraphs = document
            .select(&STORY_BODY)
            .next()
            .map(|body| texts_within(body, &PARAGRAPH))
            .unwrap_or_default();
        let published_at = first_attr(document, &TIMESTAMP, "data-timestamp")
            .and_then(|raw| {
                let parsed = parse_epoch_millis(&raw);
                if parsed.is_none() {
                    tracing::debug!(source = "apnews", raw = %raw, "unparseable data-timestamp");
                }
                parsed
            });
        Extraction::from_paragraphs(paragraphs, published_at)
    }
}
