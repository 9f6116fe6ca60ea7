//! Sequential image downloader
//!
//! Each URL is fetched, named `image_<n><ext>` and written to the output
//! folder. A failure only affects its own image.

use crate::client::HttpClient;
use crate::error::GrabError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Per-image request timeout
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause after each saved image
pub const DOWNLOAD_DELAY: Duration = Duration::from_millis(200);

/// Extension used when the content type is missing or unknown
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Known image MIME types and their file extensions
const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/jpg", ".jpg"),
    ("image/pjpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/webp", ".webp"),
    ("image/gif", ".gif"),
    ("image/avif", ".avif"),
    ("image/bmp", ".bmp"),
    ("image/x-ms-bmp", ".bmp"),
    ("image/tiff", ".tiff"),
    ("image/svg+xml", ".svg"),
    ("image/x-icon", ".ico"),
    ("image/vnd.microsoft.icon", ".ico"),
    ("image/heic", ".heic"),
];

/// Image that was written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedImage {
    pub url: String,
    pub path: PathBuf,
}

/// Image that could not be downloaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDownload {
    pub url: String,
    pub error: String,
}

/// Outcome of a download batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    pub saved: Vec<SavedImage>,
    pub failed: Vec<FailedDownload>,
}

/// File extension for a Content-Type header value
///
/// Parameters are ignored and unknown types fall back to
/// [`DEFAULT_EXTENSION`]. Every JPEG alias maps to `.jpg`, never `.jpe`.
pub fn extension_for_content_type(content_type: Option<&str>) -> &'static str {
    let Some(content_type) = content_type else {
        return DEFAULT_EXTENSION;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    MIME_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
        .unwrap_or(DEFAULT_EXTENSION)
}

/// File name for the image at zero-based `index`
pub fn image_file_name(index: usize, extension: &str) -> String {
    format!("image_{}{}", index + 1, extension)
}

/// Sequential downloader writing into one folder
#[derive(Debug, Clone)]
pub struct Downloader {
    client: HttpClient,
    timeout: Duration,
    delay: Duration,
}

impl Downloader {
    /// Create a downloader with the default timeout and delay
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            timeout: IMAGE_TIMEOUT,
            delay: DOWNLOAD_DELAY,
        }
    }

    /// Set the per-image timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the pause after each saved image
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Download every URL into `dir`, one after another
    ///
    /// The file number is the URL's position in `urls`, so failed
    /// downloads leave gaps in the numbering.
    pub async fn download_all(&self, urls: &[String], dir: &Path) -> DownloadReport {
        let mut report = DownloadReport::default();

        for (index, url) in urls.iter().enumerate() {
            match self.download_one(url, index, dir).await {
                Ok(path) => {
                    info!(
                        "Saved: {}",
                        path.file_name().unwrap_or_default().to_string_lossy()
                    );
                    report.saved.push(SavedImage {
                        url: url.clone(),
                        path,
                    });
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to download image");
                    report.failed.push(FailedDownload {
                        url: url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    async fn download_one(
        &self,
        url: &str,
        index: usize,
        dir: &Path,
    ) -> Result<PathBuf, GrabError> {
        let image = self.client.fetch_image(url, self.timeout).await?;
        let extension = extension_for_content_type(image.content_type.as_deref());
        let path = dir.join(image_file_name(index, extension));

        tokio::fs::write(&path, &image.body)
            .await
            .map_err(|e| GrabError::io(&path, e))?;
        Ok(path)
    }
}
