//! AdGrab - classified-ad photo downloader
//!
//! This crate fetches a listing page, finds the gallery images embedded in
//! it, downloads them into a folder named after the ad and normalizes them
//! to JPEG. Optionally the ad title and description are saved next to the
//! images.
//!
//! ## Pipeline
//!
//! A [`Grabber`] runs the stages in order, one request at a time:
//! - [`slug`] - query stripping and folder-name derivation
//! - [`client`] - page and image requests with browser-like headers
//! - [`metadata`] - title strategies and description scraping
//! - [`extract`] - CDN image-link matching on raw HTML
//! - [`download`] - numbered image files with a politeness delay
//! - [`convert`] - JPEG normalization (`convert` feature)

pub mod client;
pub mod convert;
pub mod download;
mod error;
pub mod extract;
mod grabber;
pub mod metadata;
pub mod slug;

pub use client::{FetchedImage, HttpClient};
pub use convert::{conversion_available, normalize_folder, ConversionPolicy, ConversionReport};
pub use download::{DownloadReport, Downloader};
pub use error::GrabError;
pub use extract::{extract_image_urls, ImageLinkPattern};
pub use grabber::{
    default_output_root, grab, GrabOptions, GrabReport, Grabber, GrabberBuilder, PAGE_TIMEOUT,
};
pub use metadata::{AdMetadata, TitleResolver, TitleStrategy, METADATA_FILE_NAME};
pub use slug::{folder_name, slug_from_url, strip_query, DEFAULT_FOLDER_NAME};

/// Default User-Agent string (desktop Chrome)
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Accept header sent with every request
pub const DEFAULT_ACCEPT: &str =
    "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";
