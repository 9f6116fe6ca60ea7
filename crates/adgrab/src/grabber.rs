//! Grabber builder and the end-to-end run
//!
//! A run is strictly sequential: fetch the page, write metadata, download
//! each image, then normalize the folder to JPEG.

use crate::client::HttpClient;
use crate::convert::{conversion_available, normalize_folder, ConversionPolicy, ConversionReport};
use crate::download::{DownloadReport, Downloader, DOWNLOAD_DELAY, IMAGE_TIMEOUT};
use crate::error::GrabError;
use crate::extract::ImageLinkPattern;
use crate::metadata::AdMetadata;
use crate::slug::{folder_name, strip_query};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Listing page request timeout
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Folder under the home directory that receives downloads
pub const DOWNLOADS_DIR_NAME: &str = "Downloads";

/// Options for a grab run
#[derive(Debug, Clone)]
pub struct GrabOptions {
    /// Custom User-Agent
    pub user_agent: Option<String>,
    /// Root folder for ad folders; `~/Downloads` when unset
    pub output_root: Option<PathBuf>,
    /// Write the title/description file
    pub scrape_metadata: bool,
    /// Behavior when JPEG conversion is unavailable or fails
    pub conversion: ConversionPolicy,
    /// Which page URLs count as gallery images
    pub image_pattern: ImageLinkPattern,
    /// Listing page timeout
    pub page_timeout: Duration,
    /// Per-image timeout
    pub image_timeout: Duration,
    /// Pause after each saved image
    pub download_delay: Duration,
}

impl Default for GrabOptions {
    fn default() -> Self {
        Self {
            user_agent: None,
            output_root: None,
            scrape_metadata: true,
            conversion: ConversionPolicy::default(),
            image_pattern: ImageLinkPattern::default(),
            page_timeout: PAGE_TIMEOUT,
            image_timeout: IMAGE_TIMEOUT,
            download_delay: DOWNLOAD_DELAY,
        }
    }
}

/// Result of a grab run
#[derive(Debug, Clone, Serialize)]
pub struct GrabReport {
    /// Ad URL with the query string removed
    pub page_url: String,
    /// Folder the images were written to
    pub folder: PathBuf,
    /// Number of image URLs found on the page
    pub found: usize,
    /// Metadata, when scraped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AdMetadata>,
    /// Metadata file, when written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_file: Option<PathBuf>,
    /// Download results
    pub downloads: DownloadReport,
    /// Conversion results, when conversion ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ConversionReport>,
}

impl GrabReport {
    /// Number of images written to disk
    pub fn saved_count(&self) -> usize {
        self.downloads.saved.len()
    }
}

/// Builder for configuring a [`Grabber`]
#[derive(Debug, Clone, Default)]
pub struct GrabberBuilder {
    options: GrabOptions,
}

impl GrabberBuilder {
    /// Create a builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.options.user_agent = Some(ua.into());
        self
    }

    /// Place ad folders under `root` instead of `~/Downloads`
    pub fn output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.options.output_root = Some(root.into());
        self
    }

    /// Enable or disable the metadata file
    pub fn scrape_metadata(mut self, enable: bool) -> Self {
        self.options.scrape_metadata = enable;
        self
    }

    /// Set the conversion policy
    pub fn conversion(mut self, policy: ConversionPolicy) -> Self {
        self.options.conversion = policy;
        self
    }

    /// Set the image link pattern
    pub fn image_pattern(mut self, pattern: ImageLinkPattern) -> Self {
        self.options.image_pattern = pattern;
        self
    }

    /// Set the listing page timeout
    pub fn page_timeout(mut self, timeout: Duration) -> Self {
        self.options.page_timeout = timeout;
        self
    }

    /// Set the per-image timeout
    pub fn image_timeout(mut self, timeout: Duration) -> Self {
        self.options.image_timeout = timeout;
        self
    }

    /// Set the pause after each saved image
    pub fn download_delay(mut self, delay: Duration) -> Self {
        self.options.download_delay = delay;
        self
    }

    /// Build the grabber
    pub fn build(self) -> Grabber {
        Grabber {
            options: self.options,
        }
    }
}

/// Configured ad grabber
#[derive(Debug, Clone, Default)]
pub struct Grabber {
    options: GrabOptions,
}

impl Grabber {
    /// Create a new grabber builder
    pub fn builder() -> GrabberBuilder {
        GrabberBuilder::new()
    }

    /// Options this grabber runs with
    pub fn options(&self) -> &GrabOptions {
        &self.options
    }

    /// Grab the photos of one ad
    ///
    /// Fails only on fatal errors: bad input, missing conversion support
    /// under [`ConversionPolicy::Required`], page fetch failure, or an
    /// output folder that cannot be created. Individual images that fail
    /// are recorded in the report.
    pub async fn run(&self, ad_url: &str) -> Result<GrabReport, GrabError> {
        let opts = &self.options;

        if opts.conversion == ConversionPolicy::Required && !conversion_available() {
            return Err(GrabError::ConversionUnavailable);
        }

        let ad_url = ad_url.trim();
        if ad_url.is_empty() {
            return Err(GrabError::MissingUrl);
        }
        if !has_http_scheme(ad_url) {
            return Err(GrabError::InvalidUrlScheme);
        }

        let page_url = strip_query(ad_url);
        info!("Connecting to: {}", page_url);

        let client = HttpClient::new(opts.user_agent.as_deref())?;
        let html = client.fetch_page(page_url, opts.page_timeout).await?;

        let folder = self.output_root()?.join(folder_name(ad_url));
        info!("Target folder: {}", folder.display());
        tokio::fs::create_dir_all(&folder)
            .await
            .map_err(|e| GrabError::io(&folder, e))?;

        let (metadata, metadata_file) = if opts.scrape_metadata {
            let metadata = AdMetadata::from_html(&html);
            let file = write_metadata(&metadata, &folder);
            (Some(metadata), file)
        } else {
            (None, None)
        };

        let urls = opts.image_pattern.extract(&html);
        info!("Found {} potential images", urls.len());

        let downloads = Downloader::new(client)
            .timeout(opts.image_timeout)
            .delay(opts.download_delay)
            .download_all(&urls, &folder)
            .await;

        let conversion = if downloads.saved.is_empty() {
            None
        } else if !conversion_available() {
            warn!("Image conversion unavailable, keeping downloaded formats");
            None
        } else {
            match normalize_folder(&folder, opts.conversion) {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(error = %e, "Could not normalize image folder");
                    None
                }
            }
        };

        Ok(GrabReport {
            page_url: page_url.to_string(),
            folder,
            found: urls.len(),
            metadata,
            metadata_file,
            downloads,
            conversion,
        })
    }

    fn output_root(&self) -> Result<PathBuf, GrabError> {
        match &self.options.output_root {
            Some(root) => Ok(root.clone()),
            None => default_output_root(),
        }
    }
}

/// `~/Downloads`
pub fn default_output_root() -> Result<PathBuf, GrabError> {
    dirs::home_dir()
        .map(|home| home.join(DOWNLOADS_DIR_NAME))
        .ok_or(GrabError::HomeDirUnavailable)
}

/// Grab an ad with default options
pub async fn grab(ad_url: &str) -> Result<GrabReport, GrabError> {
    Grabber::default().run(ad_url).await
}

/// `http://` or `https://` prefix, in any letter case
fn has_http_scheme(url: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        url.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Metadata write failures never stop the run
fn write_metadata(metadata: &AdMetadata, folder: &Path) -> Option<PathBuf> {
    match metadata.write_to(folder) {
        Ok(path) => {
            info!("Saved metadata: {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!(error = %e, "Could not save ad metadata");
            None
        }
    }
}
