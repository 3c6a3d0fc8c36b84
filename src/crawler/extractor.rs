//! HTML content extraction
//!
//! This module turns raw page bytes into the pieces the crawler keeps:
//! - Page title (required; a page without one is unusable)
//! - Meta description
//! - The most frequent long words of the visible text
//! - Outbound absolute http(s) links

use crate::storage::TopWord;
use crate::url::has_followed_scheme;
use scraper::{Html, Node, Selector};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use thiserror::Error;

/// Elements whose text never counts as visible
const HIDDEN_TEXT_PARENTS: [&str; 5] = ["style", "script", "head", "title", "meta"];

/// Words must be longer than this many characters to be counted
pub const MIN_WORD_LENGTH: usize = 5;

/// How many of the most frequent words are kept per page
pub const TOP_WORDS_LIMIT: usize = 25;

/// Errors raised while extracting page content
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("No page title found")]
    MissingTitle,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// The page title (from the first <title> tag), trimmed
    pub title: String,

    /// Content of <meta name="description">, if present
    pub description: Option<String>,

    /// Up to 25 long words, most frequent first
    pub top_words: Vec<TopWord>,

    /// Absolute http(s) links, exactly as written in the page
    pub links: Vec<String>,
}

/// Parses raw page bytes and extracts title, description, top words and links
///
/// # Extraction Rules
///
/// - **Title:** text of the first `<title>` element; absent or blank fails the
///   whole extraction with [`ExtractError::MissingTitle`]
/// - **Description:** `content` of the last `<meta name="description">`
/// - **Words:** text nodes whose parent is not `style`, `script`, `head`, `title`
///   or `meta`, split on whitespace, tokens longer than 5 characters, top 25 by
///   count with ties in first-seen order
/// - **Links:** `<a href>` values whose scheme prefix is exactly `http` or `https`
///
/// # Example
///
/// ```
/// use crawlkeep::crawler::extract;
///
/// let html = br#"<html><head><title>Test</title></head>
///     <body><a href="https://example.com/next">Next</a></body></html>"#;
/// let page = extract(html).unwrap();
/// assert_eq!(page.title, "Test");
/// assert_eq!(page.links, vec!["https://example.com/next".to_string()]);
/// ```
pub fn extract(raw: &[u8]) -> Result<ExtractedPage, ExtractError> {
    let html = String::from_utf8_lossy(raw);
    let document = Html::parse_document(&html);

    let title = extract_title(&document).ok_or(ExtractError::MissingTitle)?;
    let description = extract_description(&document);
    let top_words = count_top_words(visible_text(&document), TOP_WORDS_LIMIT);
    let links = extract_links(&document);

    Ok(ExtractedPage {
        title,
        description,
        top_words,
        links,
    })
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_description(document: &Html) -> Option<String> {
    let meta_selector = Selector::parse(r#"meta[name="description"]"#).ok()?;

    document
        .select(&meta_selector)
        .last()
        .and_then(|element| element.value().attr("content"))
        .map(str::to_string)
}

/// Yields the text of every node a reader would actually see
fn visible_text(document: &Html) -> impl Iterator<Item = &str> {
    document.tree.root().descendants().filter_map(|node| {
        let Node::Text(text) = node.value() else {
            return None;
        };

        // Text hanging directly off the document has no element parent
        let parent = node.parent()?;
        let element = parent.value().as_element()?;

        if HIDDEN_TEXT_PARENTS.contains(&element.name()) {
            None
        } else {
            Some(&**text)
        }
    })
}

/// Counts long words and keeps the `limit` most frequent
///
/// The sort is stable, so words with equal counts stay in first-seen order.
fn count_top_words<'a>(texts: impl Iterator<Item = &'a str>, limit: usize) -> Vec<TopWord> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for text in texts {
        for token in text.split_whitespace() {
            if token.chars().count() <= MIN_WORD_LENGTH {
                continue;
            }

            match counts.entry(token) {
                Entry::Occupied(entry) => *entry.into_mut() += 1,
                Entry::Vacant(entry) => {
                    entry.insert(1);
                    first_seen.push(token);
                }
            }
        }
    }

    let mut ranked: Vec<TopWord> = first_seen
        .into_iter()
        .map(|word| TopWord::new(word, counts[word]))
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

/// Extracts every followable link from <a> tags
fn extract_links(document: &Html) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| has_followed_scheme(href))
        .map(str::to_string)
        .collect()
}
