//! URL handling module for Crawlkeep
//!
//! This module validates seed URLs and decides which discovered hrefs are worth
//! queueing. No canonicalization happens here: a link is stored exactly as written.

use crate::ConfigError;
use url::Url;

/// Schemes the crawler is willing to follow
const FOLLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Validates a seed URL before a crawl starts
///
/// A seed must carry both a scheme and a host component. Parsing is only a
/// check: the seed is queued exactly as given, since queue dedup compares
/// literal strings and a later link back to the seed must match it.
///
/// # Arguments
///
/// * `raw` - The URL as given on the command line
///
/// # Returns
///
/// * `Ok(&str)` - `raw`, unchanged
/// * `Err(ConfigError::InvalidUrl)` - Missing scheme or host, or unparseable
///
/// # Examples
///
/// ```
/// use crawlkeep::url::validate_seed_url;
///
/// assert_eq!(validate_seed_url("https://www.example.com").unwrap(), "https://www.example.com");
/// assert!(validate_seed_url("www.example.com").is_err());
/// ```
pub fn validate_seed_url(raw: &str) -> Result<&str, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", raw, e)))?;

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(raw),
        _ => Err(ConfigError::InvalidUrl(format!(
            "'{}' has no host component",
            raw
        ))),
    }
}

/// Returns true if the href's scheme prefix is exactly `http` or `https`
///
/// The scheme prefix is the text before the first colon. Relative links,
/// `mailto:`, `javascript:` and anything without a colon are rejected.
pub fn has_followed_scheme(href: &str) -> bool {
    match href.split_once(':') {
        Some((scheme, _)) => FOLLOWED_SCHEMES.contains(&scheme),
        None => false,
    }
}
