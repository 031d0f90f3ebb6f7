use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::cards::printing::Printing;
use crate::utilities::file_management::write_file_atomically;

#[derive(Debug)]
pub enum DownloadError {
    Request(reqwest::Error),
    BadStatus {
        status: reqwest::StatusCode,
        url: String,
    },
    Io(std::io::Error),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::Request(e) => write!(f, "image fetch failed: {}", e),
            DownloadError::BadStatus { status, url } => {
                write!(f, "image fetch answered {} for {}", status, url)
            }
            DownloadError::Io(e) => write!(f, "could not write image: {}", e),
        }
    }
}

impl std::error::Error for DownloadError {}

impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        DownloadError::Request(err)
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        DownloadError::Io(err)
    }
}

/// What happened to one printing's artwork.
#[derive(Debug, PartialEq)]
pub enum DownloadOutcome {
    /// Fetched and written under the returned file name.
    Saved(String),
    /// The file already exists on disk, or a concurrent task claimed the
    /// same path first. Nothing was fetched.
    AlreadyPresent,
    /// The printing exposes no artwork for the configured image kind.
    NoArtwork,
}

pub struct ImageDownloader {
    client: reqwest::Client,
    image_kind: String,
    timeout: Duration,
    claimed: Mutex<HashSet<PathBuf>>,
}

impl ImageDownloader {
    pub fn new(client: reqwest::Client, image_kind: &str, timeout: Duration) -> Self {
        ImageDownloader {
            client,
            image_kind: image_kind.to_string(),
            timeout,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Fetches `printing`'s artwork into `dir`, at most once per target path
    /// per run. A path already on disk, or already claimed by a concurrent
    /// task, is reported present without another fetch; a completed write is
    /// renamed into place so the final path never holds a partial file.
    pub async fn download(
        &self,
        printing: &Printing,
        dir: &Path,
    ) -> Result<DownloadOutcome, DownloadError> {
        let url = match printing.image_url(&self.image_kind) {
            Some(url) => url.to_string(),
            None => return Ok(DownloadOutcome::NoArtwork),
        };

        let file_name = printing.file_name(&self.image_kind);
        let path = dir.join(&file_name);

        if !self.claim(&path) {
            return Ok(DownloadOutcome::AlreadyPresent);
        }
        if path.exists() {
            return Ok(DownloadOutcome::AlreadyPresent);
        }

        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::BadStatus { status, url });
        }
        let bytes = response.bytes().await?;

        write_file_atomically(&path, &bytes)?;
        Ok(DownloadOutcome::Saved(file_name))
    }

    /// True when this task is the first to claim `path` this run.
    fn claim(&self, path: &Path) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf())
    }
}
