use reqwest::Url;
use scraper::Html;
use titan_core::{Extraction, LinkCandidate, LINKS_PER_SOURCE};

use super::NewsSource;
use crate::dates::parse_iso_datetime;
use crate::html::{
    child_elements, closest_ancestor, element_text, first_attr, resolve_href, static_selector,
};

static_selector!(HEADLINE, "h3.title");
static_selector!(STORY_TEXT, "div#storytext");
static_selector!(ANY_TIME, "time");

/// NPR.
#[derive(Debug, Clone, Copy, Default)]
pub struct Npr;

impl NewsSource for Npr {
    fn name(&self) -> &str {
        "npr"
    }

    fn domain(&self) -> &str {
        "npr.org"
    }

    fn homepage(&self) -> &str {
        "https://www.npr.org/"
    }

    fn parse_links(&self, document: &Html, base: &Url) -> Vec<LinkCandidate> {
        document
            .select(&HEADLINE)
            .take(LINKS_PER_SOURCE)
            .filter_map(|headline| {
                let href = closest_ancestor(headline, "a")?.value().attr("href")?;
                let url = resolve_href(base, href)?;
                let title = element_text(headline);
                (!title.is_empty()).then_some(LinkCandidate { title, url })
            })
            .collect()
    }

    fn parse_article(&self, document: &Html) -> Extraction {
        // Only direct children: asides and captions nest their own paragraphs.
        let paragraphs: Vec<String> = document
            .select(&STORY_TEXT)
            .next()
            .map(|story| child_elements(story, "p").map(element_text).collect())
            .unwrap_or_default();
        let published_at = first_attr(document, &ANY_TIME, "datetime").and_then(|raw| {
            let parsed = parse_iso_datetime(&raw);
            if parsed.is_none() {
                tracing::debug!(source = "npr", raw = %raw, "unparseable publish time");
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
          <a href="https://www.npr.org/2024/06/01/one"><div class="story-text"><h3 class="title">One</h3></div></a>
          <div><h3 class="title">Headline without link</h3></div>
          <a href="/2024/06/01/three"><h3 class="title">Three</h3></a>
        </body></html>
    "#;

    const ARTICLE: &str = r#"
        <html><body>
          <div class="dateblock"><time datetime="2024-06-01T10:30:00-04:00">June 1, 2024</time></div>
          <div id="storytext">
            <p>Direct one.</p>
            <div class="bucketwrap"><p>Caption inside aside.</p></div>
            <p>Direct two.</p>
          </div>
        </body></html>
    "#;

    #[test]
    fn parse_links_uses_enclosing_anchor() {
        let doc = Html::parse_document(HOMEPAGE);
        let links = Npr.parse_links(&doc, &Url::parse(Npr.homepage()).unwrap());

        assert_eq!(
            links,
            vec![
                LinkCandidate {
                    title: "One".to_string(),
                    url: "https://www.npr.org/2024/06/01/one".to_string(),
                },
                LinkCandidate {
                    title: "Three".to_string(),
                    url: "https://www.npr.org/2024/06/01/three".to_string(),
                },
            ]
        );
    }

    #[test]
    fn parse_article_reads_direct_paragraphs_only() {
        let doc = Html::parse_document(ARTICLE);
        let extraction = Npr.parse_article(&doc);

        assert_eq!(extraction.body.as_deref(), Some("Direct one.\n\nDirect two."));
        assert_eq!(
            extraction.published_at,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 14, 30, 0).unwrap())
        );
    }

    #[test]
    fn parse_article_with_garbled_time_has_no_date() {
        let doc = Html::parse_document(
            r#"<time datetime="June-ish">x</time><div id="storytext"><p>Only text.</p></div>"#,
        );
        let extraction = Npr.parse_article(&doc);
        assert_eq!(extraction.body.as_deref(), Some("Only text."));
        assert!(extraction.published_at.is_none());
    }

    #[test]
    fn parse_article_without_time_has_no_date() {
        let doc = Html::parse_document(r#"<div id="storytext"><p>Only text.</p></div>"#);
        let extraction = Npr.parse_article(&doc);
        assert_eq!(extraction.body.as_deref(), Some("Only text."));
        assert!(extraction.published_at.is_none());
    }
}
