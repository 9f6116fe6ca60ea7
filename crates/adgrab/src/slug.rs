//! Ad URL normalization and folder-name derivation
//!
//! Listing URLs end in a human-readable slug followed by ID markers,
//! e.g. `.../d/oferta/nice-laptop-CID99-ID123.html`. The folder name is
//! that slug with the markers and the page extension removed.

use percent_encoding::percent_decode_str;
use url::Url;

/// Folder name used when no usable slug can be derived
pub const DEFAULT_FOLDER_NAME: &str = "olx_download";

/// Maximum slug length in characters
const MAX_SLUG_CHARS: usize = 100;

/// Minimum slug length in characters before falling back to the default
const MIN_SLUG_CHARS: usize = 3;

/// Page extension stripped from the last path segment
const PAGE_SUFFIX: &str = ".html";

/// ID markers, checked in priority order
const ID_MARKERS: &[&str] = &["-CID", "-ID"];

/// Remove the query string from an ad URL
pub fn strip_query(url: &str) -> &str {
    match url.find('?') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Derive the sanitized slug from an ad URL
///
/// The last path segment is percent-decoded first, so non-ASCII letters
/// and spaces survive into the slug. Returns `None` if the URL cannot be
/// parsed or has no path segments.
/// The result may be shorter than the folder-name minimum; use
/// [`folder_name`] for the value with fallback applied.
pub fn slug_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    let last = percent_decode_str(last).decode_utf8_lossy();

    let name = last.strip_suffix(PAGE_SUFFIX).unwrap_or(&last);
    let name = strip_id_marker(name);

    Some(sanitize(name))
}

/// Folder name for an ad URL, falling back to [`DEFAULT_FOLDER_NAME`]
pub fn folder_name(url: &str) -> String {
    match slug_from_url(url) {
        Some(slug) if slug.chars().count() >= MIN_SLUG_CHARS => slug,
        _ => DEFAULT_FOLDER_NAME.to_string(),
    }
}

/// Cut the name at the first ID marker; the first marker found wins
fn strip_id_marker(name: &str) -> &str {
    ID_MARKERS
        .iter()
        .find_map(|marker| name.find(marker))
        .map(|idx| &name[..idx])
        .unwrap_or(name)
}

/// Keep alphanumerics, whitespace and dashes; trim; truncate
fn sanitize(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    kept.trim().chars().take(MAX_SLUG_CHARS).collect()
}
