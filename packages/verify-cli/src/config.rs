use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use verification::SecretString;

/// Default text-embeddings-inference endpoint, shared by all four models
/// unless `EMBEDDING_URLS` lists one per model.
const DEFAULT_EMBEDDING_URL: &str = "http://localhost:8080";

/// Default sentiment classifier endpoint.
const DEFAULT_SENTIMENT_URL: &str = "http://localhost:8081";

/// Default embedding models, one per ensemble slot.
const DEFAULT_EMBEDDING_MODELS: [&str; 4] = [
    "sentence-transformers/all-MiniLM-L12-v2",
    "sentence-transformers/all-mpnet-base-v2",
    "sentence-transformers/paraphrase-mpnet-base-v2",
    "sentence-transformers/all-MiniLM-L6-v2",
];

/// Search provider selected by `SEARCH_PROVIDER`.
#[derive(Debug, Clone)]
pub enum SearchProvider {
    Google {
        api_key: SecretString,
        engine_id: String,
    },
    Tavily {
        api_key: SecretString,
    },
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub search: SearchProvider,
    pub embedding_urls: [String; 4],
    pub embedding_models: [String; 4],
    pub sentiment_url: String,
    pub openai_api_key: Option<SecretString>,
    pub score_database_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let provider = env::var("SEARCH_PROVIDER").unwrap_or_else(|_| "google".to_string());
        let search = match provider.to_lowercase().as_str() {
            "google" => SearchProvider::Google {
                api_key: SecretString::new(
                    env::var("GOOGLE_API_KEY").context("GOOGLE_API_KEY must be set")?,
                ),
                engine_id: env::var("GOOGLE_CSE_ID").context("GOOGLE_CSE_ID must be set")?,
            },
            "tavily" => SearchProvider::Tavily {
                api_key: SecretString::new(
                    env::var("TAVILY_API_KEY").context("TAVILY_API_KEY must be set")?,
                ),
            },
            other => bail!("SEARCH_PROVIDER must be 'google' or 'tavily', got '{other}'"),
        };

        let embedding_models = match env::var("EMBEDDING_MODELS") {
            Ok(raw) => parse_four(&raw).context("EMBEDDING_MODELS must list four models")?,
            Err(_) => DEFAULT_EMBEDDING_MODELS.map(str::to_string),
        };

        let embedding_urls = match env::var("EMBEDDING_URLS") {
            Ok(raw) => parse_four(&raw).context("EMBEDDING_URLS must list four URLs")?,
            Err(_) => {
                let url = env::var("EMBEDDING_URL")
                    .unwrap_or_else(|_| DEFAULT_EMBEDDING_URL.to_string());
                std::array::from_fn(|_| url.clone())
            }
        };

        Ok(Self {
            search,
            embedding_urls,
            embedding_models,
            sentiment_url: env::var("SENTIMENT_URL")
                .unwrap_or_else(|_| DEFAULT_SENTIMENT_URL.to_string()),
            openai_api_key: env::var("OPENAI_API_KEY")
                .ok()
                .map(SecretString::new)
                .filter(|key| !key.is_empty()),
            score_database_url: env::var("SCORE_DATABASE_URL").ok(),
        })
    }
}

/// Split a comma list that must hold exactly four entries.
fn parse_four(raw: &str) -> Result<[String; 4]> {
    let entries: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect();

    entries
        .try_into()
        .map_err(|entries: Vec<String>| anyhow::anyhow!("expected 4 entries, got {}", entries.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_four() {
        let models = parse_four("a, b,c , d").unwrap();
        assert_eq!(models, ["a", "b", "c", "d"].map(String::from));
    }

    #[test]
    fn test_parse_four_wrong_count() {
        assert!(parse_four("a,b,c").is_err());
        assert!(parse_four("a,b,c,d,e").is_err());
        assert!(parse_four("").is_err());
    }
}
