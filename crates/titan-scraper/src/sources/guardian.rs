use reqwest::Url;
use scraper::Html;
use titan_core::{Extraction, LinkCandidate, LINKS_PER_SOURCE};

use super::NewsSource;
use crate::dates::parse_dateline;
use crate::html::{element_text, resolve_href, static_selector, texts_within};

static_selector!(CARD, "div.dcr-199p3eh");
static_selector!(ANCHOR, "a");
static_selector!(CARD_HEADLINE, "h3.card-headline");
static_selector!(HEADLINE_TEXT, "span.show-underline");
static_selector!(ARTICLE_BODY, "div.article-body-commercial-selector");
static_selector!(BODY_PARAGRAPH, "p.dcr-16w5gq9");
static_selector!(DATELINE_SUMMARY, "summary.dcr-1ybxn6r");
static_selector!(DATELINE_TEXT, "span.dcr-u0h1qy");

/// The Guardian, international edition.
#[derive(Debug, Clone, Copy, Default)]
pub struct Guardian;

impl NewsSource for Guardian {
    fn name(&self) -> &str {
        "guardian"
    }

    fn domain(&self) -> &str {
        "theguardian.com"
    }

    fn homepage(&self) -> &str {
        "https://www.theguardian.com/international"
    }

    fn parse_links(&self, document: &Html, base: &Url) -> Vec<LinkCandidate> {
        document
            .select(&CARD)
            .take(LINKS_PER_SOURCE)
            .filter_map(|card| {
                let href = card.select(&ANCHOR).next()?.value().attr("href")?;
                let title = card
                    .select(&CARD_HEADLINE)
                    .next()?
                    .select(&HEADLINE_TEXT)
                    .next()
                    .map(element_text)?;
                let url = resolve_href(base, href)?;
                (!title.is_empty()).then_some(LinkCandidate { title, url })
            })
            .collect()
    }

    fn parse_article(&self, document: &Html) -> Extraction {
        let paragraphs = document
            .select(&ARTICLE_BODY)
            .next()
            .map(|body| texts_within(body, &BODY_PARAGRAPH))
            .unwrap_or_default();

        let published_at = document
            .select(&DATELINE_SUMMARY)
            .next()
            .and_then(|summary| summary.select(&DATELINE_TEXT).next())
            .map(element_text)
            .and_then(|raw| {
                let parsed = parse_dateline(&raw);
                if parsed.is_none() {
                    tracing::debug!(source = "guardian", dateline = %raw, "unparseable dateline");
                }
                parsed
            });

        Extraction::from_paragraphs(paragraphs, published_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const HOMEPAGE: &str = r#"
        <html><body>
          <div class="dcr-199p3eh">
            <a href="/world/2024/jun/01/story-one" aria-label="x"></a>
            <h3 class="card-headline"><span class="show-underline">Story one</span></h3>
          </div>
          <div class="dcr-199p3eh">
            <h3 class="card-headline"><span class="show-underline">No link</span></h3>
          </div>
          <div class="dcr-199p3eh">
            <a href="https://www.theguardian.com/uk-news/two"></a>
            <h3 class="card-headline"><span class="kicker">Kicker only</span></h3>
          </div>
          <div class="dcr-199p3eh">
            <a href="https://www.theguardian.com/sport/three"></a>
            <h3 class="card-headline"><span class="show-underline">Story three</span></h3>
          </div>
        </body></html>
    "#;

    const ARTICLE: &str = r#"
        <html><body>
          <details><summary class="dcr-1ybxn6r"><span class="dcr-u0h1qy">Sat 1 Jun 2024 14.30 BST</span></summary></details>
          <div class="article-body-commercial-selector">
            <p class="dcr-16w5gq9">First paragraph.</p>
            <p class="dcr-other">Pull quote.</p>
            <p class="dcr-16w5gq9">Second paragraph.</p>
          </div>
        </body></html>
    "#;

    #[test]
    fn parse_links_requires_anchor_and_underlined_headline() {
        let doc = Html::parse_document(HOMEPAGE);
        let links = Guardian.parse_links(&doc, &Url::parse(Guardian.homepage()).unwrap());

        assert_eq!(
            links,
            vec![
                LinkCandidate {
                    title: "Story one".to_string(),
                    url: "https://www.theguardian.com/world/2024/jun/01/story-one".to_string(),
                },
                LinkCandidate {
                    title: "Story three".to_string(),
                    url: "https://www.theguardian.com/sport/three".to_string(),
                },
            ]
        );
    }

    #[test]
    fn parse_article_reads_body_and_bst_dateline() {
        let doc = Html::parse_document(ARTICLE);
        let extraction = Guardian.parse_article(&doc);

        assert_eq!(
            extraction.body.as_deref(),
            Some("First paragraph.\n\nSecond paragraph.")
        );
        assert_eq!(
            extraction.published_at,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 13, 30, 0).unwrap())
        );
    }

    #[test]
    fn parse_article_with_unreadable_dateline_has_no_date() {
        let doc = Html::parse_document(
            r#"<summary class="dcr-1ybxn6r"><span class="dcr-u0h1qy">Updated recently</span></summary>
               <div class="article-body-commercial-selector"><p class="dcr-16w5gq9">Body.</p></div>"#,
        );
        let extraction = Guardian.parse_article(&doc);
        assert_eq!(extraction.body.as_deref(), Some("Body."));
        assert!(extraction.published_at.is_none());
    }
}
