//! Network boundary: HTTPS downloads of installers and archives.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::ProvisionError;
use crate::validation::validate_https_url;

/// Fetches a remote file to a local path.
pub trait Downloader {
    /// Download `url` to `dest`, returning the number of bytes written.
    fn download(&self, url: &str, dest: &Path) -> Result<u64, ProvisionError>;
}

/// Blocking HTTPS client backed by reqwest with rustls.
pub struct HttpDownloader {
    client: reqwest::blocking::Client,
}

impl HttpDownloader {
    pub fn new(timeout: Duration) -> Result<Self, ProvisionError> {
        let client = reqwest::blocking::Client::builder()
            .https_only(true)
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProvisionError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<u64, ProvisionError> {
        validate_https_url(url)?;

        let download_error = |message: String| ProvisionError::Download {
            url: url.to_string(),
            message,
        };

        debug!(url = %url, dest = %dest.display(), "Starting download");

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| download_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(format!("HTTP status {}", status)));
        }

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ProvisionError::filesystem(parent, e))?;
            }
        }

        let file = File::create(dest).map_err(|e| ProvisionError::filesystem(dest, e))?;
        let mut writer = BufWriter::new(file);
        let bytes = response
            .copy_to(&mut writer)
            .map_err(|e| download_error(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| ProvisionError::filesystem(dest, e))?;

        info!(url = %url, dest = %dest.display(), bytes, "Download complete");
        Ok(bytes)
    }
}
