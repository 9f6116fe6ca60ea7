//! Error types for AdGrab

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while grabbing an ad
#[derive(Debug, Error)]
pub enum GrabError {
    /// URL is missing
    #[error("Missing required parameter: url")]
    MissingUrl,

    /// URL has invalid scheme
    #[error("Invalid URL: must start with http:// or https://")]
    InvalidUrlScheme,

    /// JPEG conversion was required but this build cannot decode images
    #[error("Image conversion is unavailable: rebuild with the `convert` feature")]
    ConversionUnavailable,

    /// No home directory to place downloads under
    #[error("Could not determine the home directory")]
    HomeDirUnavailable,

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    ConnectError(#[source] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Filesystem error
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image could not be decoded or encoded
    #[error("Image conversion failed: {0}")]
    ImageError(String),
}

impl GrabError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GrabError::Timeout
        } else if err.is_connect() {
            GrabError::ConnectError(err)
        } else if let Some(status) = err.status() {
            GrabError::HttpStatus {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            GrabError::RequestError(err.to_string())
        }
    }

    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GrabError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            GrabError::MissingUrl.to_string(),
            "Missing required parameter: url"
        );
        assert_eq!(
            GrabError::InvalidUrlScheme.to_string(),
            "Invalid URL: must start with http:// or https://"
        );
        assert_eq!(
            GrabError::HttpStatus {
                status: 404,
                url: "https://example.com/ad.html".to_string()
            }
            .to_string(),
            "HTTP 404 for https://example.com/ad.html"
        );
        assert_eq!(GrabError::Timeout.to_string(), "Request timed out");
    }

    #[test]
    fn test_io_error_mentions_path() {
        let err = GrabError::io(
            "/tmp/ad/image_1.jpg",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/ad/image_1.jpg"));
        assert!(msg.contains("denied"));
    }
}
