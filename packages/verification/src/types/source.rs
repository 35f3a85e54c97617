//! Discovered sources and their extracted article bodies.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use url::Url;

/// Title used when a search hit carries none.
pub const UNTITLED_SOURCE: &str = "No Title Found";

/// A credible source discovered by search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCandidate {
    pub title: String,
    pub url: String,
    pub credibility: bool,
}

impl SourceCandidate {
    /// Create a candidate that passed the credibility filter.
    pub fn credible(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            credibility: true,
        }
    }

    /// Dedup key for this candidate's URL.
    pub fn normalized_url(&self) -> String {
        normalize_url(&self.url)
    }

    /// Lowercased host with any leading `www.` removed.
    pub fn domain(&self) -> String {
        domain_of(&self.url)
    }
}

/// Reduce a URL to scheme + host + path with no trailing slash.
///
/// Query strings and fragments are dropped. Strings that fail to parse are
/// returned trimmed and lowercased so they still dedup against themselves.
pub fn normalize_url(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) => {
            let host = url.host_str().unwrap_or("").to_lowercase();
            let path = url.path().trim_end_matches('/');
            format!("{}://{}{}", url.scheme(), host, path)
        }
        Err(_) => raw.trim().trim_end_matches('/').to_lowercase(),
    }
}

/// Extract the lowercased host of a URL, stripping a leading `www.`.
///
/// Returns an empty string for unparseable input.
pub fn domain_of(raw: &str) -> String {
    let host = Url::parse(raw.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Outcome of extracting one source's body.
///
/// Extraction never fails outward; every problem is carried here as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArticleBody {
    /// Extracted text. May be a "not found" notice when no selector matched.
    Text { text: String },

    /// Response type the extractor does not handle.
    Unsupported { content_type: String },

    /// Retrieval or processing failed.
    Failed { reason: String },
}

impl ArticleBody {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Text worth scoring: extracted, non-blank, not a not-found notice.
    pub fn usable_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } if !text.trim().is_empty() && !is_not_found_notice(text) => {
                Some(text)
            }
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Recover a body from its plain-string rendering.
    ///
    /// Failure and unsupported-type markers map back to their variants;
    /// anything else is text.
    pub fn from_plain(text: impl Into<String>) -> Self {
        let text = text.into();
        if let Some(content_type) = text.strip_prefix(UNSUPPORTED_PREFIX) {
            return Self::Unsupported {
                content_type: content_type.to_string(),
            };
        }
        if FAILURE_PREFIXES.iter().any(|p| text.starts_with(p)) || text == CANCELLED_REASON {
            return Self::Failed { reason: text };
        }
        Self::Text { text }
    }
}

const UNSUPPORTED_PREFIX: &str =
    "Content is neither HTML, XML, nor PDF. Detected content type: ";

const FAILURE_PREFIXES: [&str; 3] = [
    "Error retrieving content: ",
    "Error processing content: ",
    "Error processing PDF: ",
];

pub(crate) const CANCELLED_REASON: &str = "cancelled";

/// Article bodies arrive either tagged or as the plain string a client sees.
#[derive(Deserialize)]
#[serde(untagged)]
enum BodyInput {
    Plain(String),
    Tagged(ArticleBody),
}

fn deserialize_body<'de, D>(deserializer: D) -> Result<ArticleBody, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match BodyInput::deserialize(deserializer)? {
        BodyInput::Plain(text) => ArticleBody::from_plain(text),
        BodyInput::Tagged(body) => body,
    })
}

fn credible_by_default() -> bool {
    true
}

impl fmt::Display for ArticleBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { text } => f.write_str(text),
            Self::Unsupported { content_type } => write!(f, "{UNSUPPORTED_PREFIX}{content_type}"),
            Self::Failed { reason } => f.write_str(reason),
        }
    }
}

/// Notices produced when a document parsed but yielded no text.
pub(crate) const NOT_FOUND_NOTICES: [&str; 3] = [
    "Main content not found in HTML.",
    "Main content not found in XML.",
    "Main content not found in PDF.",
];

fn is_not_found_notice(text: &str) -> bool {
    NOT_FOUND_NOTICES.contains(&text)
}

/// A source together with its extracted body.
///
/// Deserializing also accepts the flat client shape
/// `{url, title, article_content: "..."}`, where credibility is implied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleContent {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "credible_by_default")]
    pub credibility: bool,
    #[serde(alias = "article_content", deserialize_with = "deserialize_body")]
    pub content: ArticleBody,
}

impl ArticleContent {
    /// Pair a candidate with its body.
    pub fn from_source(source: SourceCandidate, content: ArticleBody) -> Self {
        Self {
            url: source.url,
            title: source.title,
            credibility: source.credibility,
            content,
        }
    }

    /// Build an article directly from text (scoring requests, tests).
    pub fn with_text(
        url: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            credibility: true,
            content: ArticleBody::text(text),
        }
    }

    pub fn usable_text(&self) -> Option<&str> {
        self.content.usable_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_drops_query_and_trailing_slash() {
        assert_eq!(
            normalize_url("https://WWW.Reuters.com/world/?utm=1#top"),
            "https://www.reuters.com/world"
        );
        assert_eq!(
            normalize_url("https://reuters.com/world"),
            normalize_url("https://reuters.com/world/")
        );
    }

    #[test]
    fn test_domain_of_strips_www() {
        assert_eq!(domain_of("https://www.CDC.gov/flu"), "cdc.gov");
        assert_eq!(domain_of("https://moh.gov.sg/news"), "moh.gov.sg");
        assert_eq!(domain_of("not a url"), "");
    }

    #[test]
    fn test_usable_text() {
        assert_eq!(ArticleBody::text("Some body").usable_text(), Some("Some body"));
        assert_eq!(ArticleBody::text("  ").usable_text(), None);
        assert_eq!(
            ArticleBody::text("Main content not found in HTML.").usable_text(),
            None
        );
        assert_eq!(ArticleBody::failed("Error retrieving content: x").usable_text(), None);
    }

    #[test]
    fn test_article_accepts_plain_content() {
        let article: ArticleContent = serde_json::from_str(
            r#"{"url": "https://cdc.gov/a", "title": "t", "article_content": "body text"}"#,
        )
        .unwrap();
        assert!(article.credibility);
        assert_eq!(article.content, ArticleBody::text("body text"));
        assert_eq!(article.usable_text(), Some("body text"));

        let failed: ArticleContent = serde_json::from_str(
            r#"{"url": "https://cdc.gov/b", "title": "t", "article_content": "Error retrieving content: timed out"}"#,
        )
        .unwrap();
        assert!(failed.content.is_failure());
        assert_eq!(failed.usable_text(), None);
    }

    #[test]
    fn test_article_accepts_tagged_content() {
        let article = ArticleContent::from_source(
            SourceCandidate::credible("t", "https://who.int/a"),
            ArticleBody::Unsupported {
                content_type: "image/png".to_string(),
            },
        );
        let json = serde_json::to_string(&article).unwrap();
        assert_eq!(serde_json::from_str::<ArticleContent>(&json).unwrap(), article);
    }

    #[test]
    fn test_from_plain_recovers_markers() {
        let unsupported = ArticleBody::Unsupported {
            content_type: "image/png".to_string(),
        };
        assert_eq!(ArticleBody::from_plain(unsupported.to_string()), unsupported);
        assert!(ArticleBody::from_plain("Error processing PDF: bad xref").is_failure());
        assert!(ArticleBody::from_plain("cancelled").is_failure());
        assert_eq!(
            ArticleBody::from_plain("Main content not found in HTML.").usable_text(),
            None
        );
    }

    #[test]
    fn test_unsupported_marker_names_type() {
        let body = ArticleBody::Unsupported {
            content_type: "image/png".to_string(),
        };
        assert!(body.to_string().ends_with("image/png"));
    }
}
