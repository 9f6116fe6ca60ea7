//! Image-link extraction from raw listing HTML
//!
//! The listing page embeds its gallery in inline JSON and `<img>` tags, so
//! instead of walking the DOM we scan the raw text for anything that looks
//! like a CDN file URL. This is a heuristic and breaks when the CDN layout
//! changes; everything site-specific lives in [`ImageLinkPattern`].

use regex::Regex;
use std::collections::HashSet;

/// Hostname marker of the listing CDN
pub const DEFAULT_CDN_MARKER: &str = "olxcdn.com";

/// Path marker every gallery file URL contains
pub const DEFAULT_PATH_MARKER: &str = "/v1/files/";

/// Marker that starts the resize parameters (`;s=640x480,q=80`)
const SIZE_MARKER: &str = ";s=";

/// Substrings that identify non-gallery images
const DEFAULT_EXCLUDED: &[&str] = &["icon", "avatar"];

/// Pattern describing which URLs in a page are gallery images
#[derive(Debug, Clone)]
pub struct ImageLinkPattern {
    cdn_marker: String,
    path_marker: String,
    excluded: Vec<String>,
    regex: Regex,
}

impl Default for ImageLinkPattern {
    fn default() -> Self {
        Self::new(DEFAULT_CDN_MARKER)
    }
}

impl ImageLinkPattern {
    /// Create a pattern matching URLs on the given CDN host marker
    pub fn new(cdn_marker: impl Into<String>) -> Self {
        let cdn_marker = cdn_marker.into();
        Self {
            regex: build_regex(&cdn_marker),
            cdn_marker,
            path_marker: DEFAULT_PATH_MARKER.to_string(),
            excluded: DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Set the path marker a URL must contain
    pub fn path_marker(mut self, marker: impl Into<String>) -> Self {
        self.path_marker = marker.into();
        self
    }

    /// Add a substring that disqualifies a URL
    pub fn exclude(mut self, marker: impl Into<String>) -> Self {
        self.excluded.push(marker.into());
        self
    }

    /// CDN host marker this pattern matches
    pub fn cdn_marker(&self) -> &str {
        &self.cdn_marker
    }

    /// Extract gallery image URLs from raw HTML
    ///
    /// URLs are returned without size parameters or query strings,
    /// deduplicated, in order of first appearance.
    pub fn extract(&self, html: &str) -> Vec<String> {
        let html = html.replace(r"\/", "/");
        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        for m in self.regex.find_iter(&html) {
            let raw = m.as_str();
            if !raw.contains(&self.path_marker) {
                continue;
            }

            let url = cut_at(cut_at(raw, SIZE_MARKER), "?");
            if self.excluded.iter().any(|marker| url.contains(marker.as_str())) {
                continue;
            }

            if seen.insert(url) {
                urls.push(url.to_string());
            }
        }

        tracing::debug!(
            cdn = %self.cdn_marker,
            found = urls.len(),
            "Extracted image links"
        );
        urls
    }
}

/// Extract gallery image URLs using the default listing CDN pattern
pub fn extract_image_urls(html: &str) -> Vec<String> {
    ImageLinkPattern::default().extract(html)
}

fn build_regex(cdn_marker: &str) -> Regex {
    let pattern = format!(
        r#"https?://[^\s"'<>]*{}[^\s"'<>]*"#,
        regex::escape(cdn_marker)
    );
    Regex::new(&pattern).expect("escaped CDN marker always forms a valid regex")
}

/// Everything before the first occurrence of `marker`
fn cut_at<'a>(s: &'a str, marker: &str) -> &'a str {
    s.split(marker).next().unwrap_or(s)
}
