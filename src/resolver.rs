use crate::error::{AppError, Result};
use crate::model::VideoReference;
use crate::tools::MediaSource;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument};
use url::Url;

lazy_static! {
    static ref VIDEO_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
}

/// How a user token is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An http(s) URL, fetched as-is.
    Url(String),
    /// A bare 11-character video id.
    VideoId(String),
    /// Anything else.
    Search(String),
}

impl Token {
    pub fn classify(raw: &str) -> Token {
        let trimmed = raw.trim();

        if let Ok(url) = Url::parse(trimmed) {
            if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() {
                return Token::Url(trimmed.to_string());
            }
        }

        if VIDEO_ID.is_match(trimmed) {
            return Token::VideoId(trimmed.to_string());
        }

        Token::Search(trimmed.to_string())
    }
}

/// Turns a token into at most `max_results` candidate videos.
///
/// URLs and ids resolve to exactly one reference; queries go through the
/// source's search, keeping its relevance order.
#[instrument(skip(source))]
pub async fn resolve(
    source: &dyn MediaSource,
    raw: &str,
    max_results: usize,
) -> Result<Vec<VideoReference>> {
    let references = match Token::classify(raw) {
        Token::Url(url) => vec![source.lookup(&url).await?],
        Token::VideoId(id) => {
            let url = format!("https://www.youtube.com/watch?v={}", id);
            vec![source.lookup(&url).await?]
        }
        Token::Search(query) => {
            if query.is_empty() {
                return Err(AppError::Resolution("empty search query".to_string()));
            }
            let mut found = source.search(&query, max_results).await?;
            found.truncate(max_results);
            found
        }
    };

    if references.is_empty() {
        return Err(AppError::Resolution(format!("no video found for '{}'", raw)));
    }

    info!(
        "Resolved '{}' to {} candidate(s) via {}",
        raw,
        references.len(),
        source.name()
    );
    Ok(references)
}
