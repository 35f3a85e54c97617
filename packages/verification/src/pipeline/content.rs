//! Concurrent article body extraction.
//!
//! Every candidate with a URL yields exactly one [`ArticleContent`]. Fetch and
//! parse problems become [`ArticleBody::Failed`] entries instead of errors so
//! one bad source never affects its siblings.

use futures::stream::{self, StreamExt};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{FetchError, FetchResult, Result, VerificationError};
use crate::traits::fetcher::{ContentFetcher, FetchedDocument};
use crate::types::{
    config::ExtractorConfig,
    contracts::{ExtractionRequest, ExtractionResponse},
    source::{ArticleBody, ArticleContent, SourceCandidate, CANCELLED_REASON, NOT_FOUND_NOTICES},
};

/// Selectors tried in order; the first with non-empty text wins.
const CONTENT_SELECTORS: [&str; 9] = [
    "article",
    "div.story-body",
    "div.post-content",
    "div.entry-content",
    "div.article-content",
    "div.main-content",
    "section.article-body",
    "div.content__article-body",
    "p",
];


/// Fetches and parses source bodies on a bounded pool.
pub struct ContentExtractor {
    fetcher: Arc<dyn ContentFetcher>,
    config: ExtractorConfig,
}

impl ContentExtractor {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, config: ExtractorConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Handle a stage request.
    pub async fn handle(
        &self,
        request: ExtractionRequest,
        cancel: &CancellationToken,
    ) -> Result<ExtractionResponse> {
        request.validate()?;
        let results = self.extract(request.results, cancel).await?;
        Ok(ExtractionResponse { results })
    }

    /// Extract every source, failing with `Cancelled` if the token fired.
    pub async fn extract(
        &self,
        sources: Vec<SourceCandidate>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ArticleContent>> {
        let articles = self.extract_all(sources, cancel).await;
        if cancel.is_cancelled() {
            return Err(VerificationError::Cancelled);
        }
        Ok(articles)
    }

    /// Extract every source with a URL, one entry per source.
    ///
    /// Output order follows completion, not input. After cancellation the
    /// remaining sources resolve to `Failed { "cancelled" }` without fetching.
    pub async fn extract_all(
        &self,
        sources: Vec<SourceCandidate>,
        cancel: &CancellationToken,
    ) -> Vec<ArticleContent> {
        let sources: Vec<SourceCandidate> = sources
            .into_iter()
            .filter(|s| !s.url.trim().is_empty())
            .collect();
        let total = sources.len();
        let started = Instant::now();

        info!(
            sources = total,
            concurrency = self.config.concurrency,
            fetcher = self.fetcher.name(),
            "Extracting article content"
        );

        let articles: Vec<ArticleContent> = stream::iter(sources)
            .map(|source| async move {
                let body = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => ArticleBody::failed(CANCELLED_REASON),
                    body = self.extract_one(&source.url) => body,
                };
                ArticleContent::from_source(source, body)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let failed = articles.iter().filter(|a| a.content.is_failure()).count();
        info!(
            articles = articles.len(),
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Content extraction complete"
        );

        articles
    }

    /// Fetch and parse one URL. Never fails.
    async fn extract_one(&self, url: &str) -> ArticleBody {
        let fetched =
            match tokio::time::timeout(self.config.fetch_timeout, self.fetcher.fetch(url)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout {
                    url: url.to_string(),
                }),
            };

        let result = match fetched {
            Ok(document) => parse_document(document).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(body) => {
                debug!(url = %url, kind = body_kind(&body), "Extracted content");
                body
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Content extraction failed");
                ArticleBody::failed(failure_reason(&e))
            }
        }
    }
}

fn body_kind(body: &ArticleBody) -> &'static str {
    match body {
        ArticleBody::Text { .. } => "text",
        ArticleBody::Unsupported { .. } => "unsupported",
        ArticleBody::Failed { .. } => "failed",
    }
}

/// Human-readable failure marker for a fetch or parse error.
pub fn failure_reason(error: &FetchError) -> String {
    match error {
        FetchError::Pdf(_) => format!("Error processing PDF: {error}"),
        e if e.is_retrieval() => format!("Error retrieving content: {e}"),
        e => format!("Error processing content: {e}"),
    }
}

/// Dispatch a fetched document to the parser for its content type.
pub async fn parse_document(document: FetchedDocument) -> FetchResult<ArticleBody> {
    let content_type = document.content_type.to_lowercase();

    if content_type.contains("html") {
        let text = extract_html_text(&document.text());
        Ok(ArticleBody::text(
            text.unwrap_or_else(|| NOT_FOUND_NOTICES[0].to_string()),
        ))
    } else if content_type.contains("xml") {
        let text = extract_xml_text(&document.text());
        Ok(ArticleBody::text(
            text.unwrap_or_else(|| NOT_FOUND_NOTICES[1].to_string()),
        ))
    } else if content_type.contains("pdf") || document.url.to_lowercase().ends_with(".pdf") {
        let text = extract_pdf_text(document.body).await?;
        Ok(ArticleBody::text(
            text.unwrap_or_else(|| NOT_FOUND_NOTICES[2].to_string()),
        ))
    } else {
        Ok(ArticleBody::Unsupported {
            content_type: document.content_type,
        })
    }
}

/// Main text of an HTML page, or `None` when no selector yields text.
pub fn extract_html_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        let text = document
            .select(&selector)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() {
            return Some(text);
        }
    }

    None
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn markup_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)<!--.*?-->|<\?.*?\?>|<!\[CDATA\[|\]\]>|<[^>]*>").expect("static markup pattern")
    })
}

/// Text content of an XML document with markup removed.
pub fn extract_xml_text(xml: &str) -> Option<String> {
    let stripped = markup_pattern().replace_all(xml, " ");
    let text = decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Text of a PDF, parsed off the async runtime.
///
/// The parser can panic on malformed input; the blocking task contains it and
/// it surfaces as [`FetchError::Pdf`].
async fn extract_pdf_text(body: Vec<u8>) -> FetchResult<Option<String>> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&body))
        .await
        .map_err(|e| FetchError::Pdf(e.to_string()))?
        .map_err(|e| FetchError::Pdf(e.to_string()))?;

    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;
    use std::time::Duration;

    fn extractor(fetcher: MockFetcher) -> ContentExtractor {
        ContentExtractor::new(Arc::new(fetcher), ExtractorConfig::default())
    }

    fn source(url: &str) -> SourceCandidate {
        SourceCandidate::credible("Title", url)
    }

    #[test]
    fn test_html_prefers_article() {
        let html = r#"<html><body>
            <p>Sidebar</p>
            <article><h1>Headline</h1><p>Body text.</p></article>
        </body></html>"#;
        assert_eq!(extract_html_text(html).unwrap(), "Headline Body text.");
    }

    #[test]
    fn test_html_falls_back_to_paragraphs() {
        let html = "<html><body><div>nav</div><p>First.</p><p>Second.</p></body></html>";
        assert_eq!(extract_html_text(html).unwrap(), "First. Second.");
    }

    #[test]
    fn test_html_skips_empty_selector_matches() {
        let html = r#"<div class="story-body">  </div><div class="entry-content">Entry</div>"#;
        assert_eq!(extract_html_text(html).unwrap(), "Entry");
    }

    #[test]
    fn test_html_without_content() {
        assert!(extract_html_text("<html><body><div>x</div></body></html>").is_none());
    }

    #[test]
    fn test_xml_text() {
        let xml = r#"<?xml version="1.0"?><rss><item><title>Rates &amp; Savings</title>
            <description><![CDATA[Rates rose]]></description></item></rss>"#;
        assert_eq!(extract_xml_text(xml).unwrap(), "Rates & Savings Rates rose");
        assert!(extract_xml_text("<empty/>").is_none());
    }

    #[test]
    fn test_failure_reasons() {
        let timeout = FetchError::Timeout {
            url: "https://a.gov".into(),
        };
        assert!(failure_reason(&timeout).starts_with("Error retrieving content:"));
        assert!(failure_reason(&FetchError::Decode("bad".into()))
            .starts_with("Error processing content:"));
        assert!(failure_reason(&FetchError::Pdf("bad".into())).starts_with("Error processing PDF:"));
    }

    #[tokio::test]
    async fn test_dispatch_by_content_type() {
        let body = parse_document(FetchedDocument::new("https://a.gov/x", "image/png", vec![0u8]))
            .await
            .unwrap();
        assert_eq!(
            body,
            ArticleBody::Unsupported {
                content_type: "image/png".to_string()
            }
        );

        let body = parse_document(FetchedDocument::html("https://a.gov", "<div></div>"))
            .await
            .unwrap();
        assert_eq!(body, ArticleBody::text("Main content not found in HTML."));
        assert!(body.usable_text().is_none());
    }

    #[tokio::test]
    async fn test_malformed_pdf_is_an_error() {
        let result = parse_document(FetchedDocument::new(
            "https://a.gov/report.pdf",
            "application/octet-stream",
            b"not a pdf".to_vec(),
        ))
        .await;
        assert!(matches!(result, Err(FetchError::Pdf(_))));
    }

    #[tokio::test]
    async fn test_one_failure_among_many_yields_n_entries() {
        let fetcher = MockFetcher::new()
            .with_html("https://a.gov/1", "<article>One</article>")
            .with_html("https://a.gov/2", "<article>Two</article>")
            .with_failure("https://a.gov/3")
            .with_html("https://a.gov/4", "<p>Four</p>");
        let extractor = extractor(fetcher);

        let sources = (1..=4).map(|i| source(&format!("https://a.gov/{i}"))).collect();
        let articles = extractor
            .extract(sources, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(articles.len(), 4);
        let failed: Vec<_> = articles.iter().filter(|a| a.content.is_failure()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].url, "https://a.gov/3");
        assert!(failed[0]
            .content
            .to_string()
            .starts_with("Error retrieving content:"));
    }

    #[tokio::test]
    async fn test_sources_without_url_are_skipped() {
        let extractor = extractor(MockFetcher::new().with_html("https://a.gov", "<p>x</p>"));
        let articles = extractor
            .extract(vec![source("https://a.gov"), source("")], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(articles.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_times_out() {
        let fetcher = MockFetcher::new()
            .with_html("https://a.gov/slow", "<p>late</p>")
            .with_delay(Duration::from_secs(30));
        let extractor = ContentExtractor::new(
            Arc::new(fetcher),
            ExtractorConfig::default().with_fetch_timeout(Duration::from_secs(10)),
        );

        let articles = extractor
            .extract(vec![source("https://a.gov/slow")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(articles.len(), 1);
        assert!(articles[0].content.to_string().contains("timeout"));
    }

    #[tokio::test]
    async fn test_cancelled_extraction() {
        let extractor = extractor(MockFetcher::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let sources: Vec<_> = (0..3).map(|i| source(&format!("https://a.gov/{i}"))).collect();
        let articles = extractor.extract_all(sources.clone(), &cancel).await;
        assert_eq!(articles.len(), 3);
        assert!(articles
            .iter()
            .all(|a| a.content == ArticleBody::failed("cancelled")));

        let err = extractor.extract(sources, &cancel).await.unwrap_err();
        assert!(matches!(err, VerificationError::Cancelled));
    }

    #[tokio::test]
    async fn test_handle_rejects_empty_request() {
        let extractor = extractor(MockFetcher::new());
        let request = ExtractionRequest { results: vec![] };
        assert!(extractor
            .handle(request, &CancellationToken::new())
            .await
            .is_err());
    }
}
