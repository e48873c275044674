use chrono::{DateTime, Utc};
use reqwest::Url;
use scraper::Html;
use titan_core::{Extraction, LinkCandidate, LINKS_PER_SOURCE};

use super::NewsSource;
use crate::dates::{parse_iso_datetime, parse_month_day_year};
use crate::html::{child_elements, element_text, resolve_href, static_selector, texts_within};

static_selector!(CARD_LINK, "a.loop-card__title-link");
static_selector!(ENTRY_CONTENT, "div.entry-content");
static_selector!(PARAGRAPH, "p");
static_selector!(POSTED_TIME, "time.wp-block-post-date-posted");
static_selector!(ANY_TIME, "time");
static_selector!(PODCAST_POST_DATA, "div.wp-block-techcrunch-podcast-single-hero__post-data");

/// TechCrunch.
#[derive(Debug, Clone, Copy, Default)]
pub struct TechCrunch;

impl TechCrunch {
    /// Article pages carry a `<time datetime>`; podcast pages only print the
    /// date as text in the hero block.
    fn published_at(document: &Html) -> Option<DateTime<Utc>> {
        let time_element = document
            .select(&POSTED_TIME)
            .next()
            .or_else(|| document.select(&ANY_TIME).next());

        let raw_time = time_element.and_then(|el| el.value().attr("datetime"));
        if let Some(raw) = raw_time {
            match parse_iso_datetime(raw) {
                Some(parsed) => return Some(parsed),
                None => tracing::debug!(source = "techcrunch", raw, "unparseable publish time"),
            }
        }

        let hero = document.select(&PODCAST_POST_DATA).next()?;
        let text = child_elements(hero, "span")
            .map(element_text)
            .find(|text| text.contains(','))?;
        let parsed = parse_month_day_year(&text);
        if parsed.is_none() {
            tracing::debug!(source = "techcrunch", dateline = %text, "unparseable podcast date");
        }
        parsed
    }
}

impl NewsSource for TechCrunch {
    fn name(&self) -> &str {
        "techcrunch"
    }

    fn domain(&self) -> &str {
        "techcrunch.com"
    }

    fn homepage(&self) -> &str {
        "https://techcrunch.com/"
    }

    fn parse_links(&self, document: &Html, base: &Url) -> Vec<LinkCandidate> {
        document
            .select(&CARD_LINK)
            .take(LINKS_PER_SOURCE)
            .filter_map(|anchor| {
                let url = resolve_href(base, anchor.value().attr("href")?)?;
                let title = element_text(anchor);
                (!title.is_empty()).then_some(LinkCandidate { title, url })
            })
            .collect()
    }

    fn parse_article(&self, document: &Html) -> Extraction {
        let paragraphs = document
            .select(&ENTRY_CONTENT)
            .next()
            .map(|body| texts_within(body, &PARAGRAPH))
            .unwrap_or_default();
        Extraction::from_paragraphs(paragraphs, Self::published_at(document))
    }
}
