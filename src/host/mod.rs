//! Host boundaries.
//!
//! Everything the provisioner does to the machine goes through the
//! `Filesystem`, `CommandRunner` and `Downloader` traits, bundled in a
//! `Host`. Production code uses the local implementations; tests swap in
//! an in-memory host.

mod download;
mod fs;

pub use download::{Downloader, HttpDownloader};
pub use fs::{Filesystem, LocalFilesystem};

use std::time::Duration;

use crate::config::Settings;
use crate::error::ProvisionError;
use crate::executor::{CommandRunner, SystemRunner};

/// The machine being provisioned, as seen through its boundaries.
pub struct Host {
    pub fs: Box<dyn Filesystem>,
    pub runner: Box<dyn CommandRunner>,
    pub downloader: Box<dyn Downloader>,
}

impl Host {
    pub fn new(
        fs: Box<dyn Filesystem>,
        runner: Box<dyn CommandRunner>,
        downloader: Box<dyn Downloader>,
    ) -> Self {
        Self {
            fs,
            runner,
            downloader,
        }
    }

    /// The local machine: real filesystem, child processes and HTTPS client.
    pub fn local(settings: &Settings) -> Result<Self, ProvisionError> {
        let downloader = HttpDownloader::new(Duration::from_secs(
            settings.limits.download_timeout_seconds,
        ))?;

        Ok(Self::new(
            Box::new(LocalFilesystem),
            Box::new(SystemRunner),
            Box::new(downloader),
        ))
    }
}
