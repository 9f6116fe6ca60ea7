//! Ad title and description scraping
//!
//! Design: the title is resolved by an ordered list of strategies.
//! [`TitleResolver`] asks each [`TitleStrategy`] in registration order
//! and keeps the first non-blank answer.

use crate::error::GrabError;
use scraper::{Html, Selector};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Name of the metadata file written next to the images
pub const METADATA_FILE_NAME: &str = "description.txt";

/// Title used when no strategy finds one
pub const NO_TITLE: &str = "No title found";

/// Description used when the description container is missing
pub const NO_DESCRIPTION: &str = "No description found";

/// Site suffixes appended to the document `<title>`
const TITLE_SUFFIXES: &[&str] = &[" • OLX.pl", " | OLX.pl", " - OLX.pl"];

/// Container holding the ad description
const DESCRIPTION_SELECTOR: &str = r#"div[data-cy="ad_description"]"#;

/// Trait for one way of finding the ad title
pub trait TitleStrategy: Send + Sync {
    /// Identifier for logging
    fn name(&self) -> &'static str;

    /// Title found by this strategy, if any
    fn resolve(&self, document: &Html) -> Option<String>;
}

/// `<meta property="og:title">`
pub struct OpenGraphTitle;

impl TitleStrategy for OpenGraphTitle {
    fn name(&self) -> &'static str {
        "og_title"
    }

    fn resolve(&self, document: &Html) -> Option<String> {
        let selector = parse_selector(r#"meta[property="og:title"]"#)?;
        document
            .select(&selector)
            .find_map(|el| el.value().attr("content"))
            .and_then(non_blank)
    }
}

/// First `<h1>` on the page
pub struct FirstHeading;

impl TitleStrategy for FirstHeading {
    fn name(&self) -> &'static str {
        "h1"
    }

    fn resolve(&self, document: &Html) -> Option<String> {
        let selector = parse_selector("h1")?;
        let heading = document.select(&selector).next()?;
        non_blank(&heading.text().collect::<String>())
    }
}

/// Document `<title>` with the site suffix removed
pub struct DocumentTitle;

impl TitleStrategy for DocumentTitle {
    fn name(&self) -> &'static str {
        "document_title"
    }

    fn resolve(&self, document: &Html) -> Option<String> {
        let selector = parse_selector("title")?;
        let title: String = document.select(&selector).next()?.text().collect();
        let title = title.trim();
        let title = TITLE_SUFFIXES
            .iter()
            .find_map(|suffix| title.strip_suffix(suffix))
            .unwrap_or(title);
        non_blank(title)
    }
}

/// Ordered list of title strategies
pub struct TitleResolver {
    strategies: Vec<Box<dyn TitleStrategy>>,
}

impl Default for TitleResolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TitleResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Create a resolver with the built-in strategies
    ///
    /// Order: og:title, first heading, document title.
    pub fn with_defaults() -> Self {
        let mut resolver = Self::new();
        resolver.register(Box::new(OpenGraphTitle));
        resolver.register(Box::new(FirstHeading));
        resolver.register(Box::new(DocumentTitle));
        resolver
    }

    /// Append a strategy; earlier registrations win
    pub fn register(&mut self, strategy: Box<dyn TitleStrategy>) {
        self.strategies.push(strategy);
    }

    /// First title any strategy finds
    pub fn resolve(&self, document: &Html) -> Option<String> {
        self.strategies.iter().find_map(|strategy| {
            let title = strategy.resolve(document)?;
            tracing::debug!(strategy = strategy.name(), "Resolved ad title");
            Some(title)
        })
    }
}

/// Title and description of an ad
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdMetadata {
    pub title: String,
    pub description: String,
}

impl AdMetadata {
    /// Scrape metadata from page HTML using the default title strategies
    pub fn from_html(html: &str) -> Self {
        Self::from_html_with(html, &TitleResolver::with_defaults())
    }

    /// Scrape metadata from page HTML with a custom title resolver
    pub fn from_html_with(html: &str, resolver: &TitleResolver) -> Self {
        let document = Html::parse_document(html);
        Self {
            title: resolver
                .resolve(&document)
                .unwrap_or_else(|| NO_TITLE.to_string()),
            description: extract_description(&document)
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        }
    }

    /// Plain-text rendering written to [`METADATA_FILE_NAME`]
    pub fn render(&self) -> String {
        format!(
            "TITLE:\n{}\n\nDESCRIPTION:\n{}\n",
            self.title, self.description
        )
    }

    /// Write the metadata file into `dir`
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, GrabError> {
        let path = dir.join(METADATA_FILE_NAME);
        std::fs::write(&path, self.render()).map_err(|e| GrabError::io(&path, e))?;
        Ok(path)
    }
}

/// Description text, one line per non-blank text node
fn extract_description(document: &Html) -> Option<String> {
    let selector = parse_selector(DESCRIPTION_SELECTOR)?;
    let container = document.select(&selector).next()?;
    let lines: Vec<&str> = container
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    non_blank(&lines.join("\n"))
}

fn parse_selector(selector: &str) -> Option<Selector> {
    Selector::parse(selector).ok()
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
