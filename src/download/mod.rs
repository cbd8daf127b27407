//! Artifact download.
//!
//! Resolves the release link through [`RedirectingFetcher`], then streams the
//! body to disk in fixed-size chunks, logging progress per 10% when the
//! server advertises a length.

pub mod progress;

use anyhow::anyhow;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{Result, UpdaterError};
use crate::fetch::RedirectingFetcher;

pub use progress::DownloadProgress;
use progress::DecileTracker;

/// Chunk size for streaming copies.
pub const CHUNK_SIZE: usize = 1024;

/// Streams release artifacts to local storage.
pub struct ArtifactDownloader {
    fetcher: RedirectingFetcher,
    announce: bool,
}

impl ArtifactDownloader {
    /// Create a downloader on top of a redirect resolver.
    pub fn new(fetcher: RedirectingFetcher, announce: bool) -> Self {
        Self { fetcher, announce }
    }

    /// Download `url` to `destination`, replacing any existing file.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `DownloadFailed` wrapping the redirect, HTTP or I/O error.
    pub fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        self.try_download(url, destination)
            .map_err(|e| UpdaterError::DownloadFailed {
                url: url.to_string(),
                source: anyhow::Error::new(e),
            })
    }

    fn try_download(&self, url: &str, destination: &Path) -> Result<u64> {
        let resolved = self.fetcher.resolve(url)?;
        let response = self.fetcher.client().get(resolved.clone()).send()?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP {} fetching {}", response.status(), resolved).into());
        }

        let total = response.content_length();
        self.save(response, total, destination)
    }

    /// Stream `body` into `destination`.
    ///
    /// A transfer that fails part way leaves no file behind.
    fn save<R: Read>(&self, body: R, total: Option<u64>, destination: &Path) -> Result<u64> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(destination)?);
        let announce = self.announce;

        let copied = copy_chunks(body, &mut writer, total, |percent, progress| {
            if announce {
                info!("Downloading update: {}% ({} bytes).", percent, progress.received);
            }
        });

        let outcome = match copied {
            Ok(written) => writer.flush().map(|()| written),
            Err(e) => {
                if let Err(flush_err) = writer.flush() {
                    warn!(
                        "Could not flush partial download {}: {}",
                        destination.display(),
                        flush_err
                    );
                }
                Err(e)
            }
        };
        drop(writer);

        match outcome {
            Ok(written) => {
                debug!("Wrote {} bytes to {}", written, destination.display());
                Ok(written)
            }
            Err(e) => {
                discard_partial(destination);
                Err(e.into())
            }
        }
    }
}

fn discard_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(
            "The updater could not delete file at: {} ({})",
            path.display(),
            e
        );
    }
}

/// Copy `reader` into `writer` in [`CHUNK_SIZE`] pieces.
///
/// `on_step` is called whenever the transfer enters a new 10% band; it is
/// never called when `total` is unknown or zero.
pub fn copy_chunks<R, W, F>(
    mut reader: R,
    writer: &mut W,
    total: Option<u64>,
    mut on_step: F,
) -> std::io::Result<u64>
where
    R: Read,
    W: Write,
    F: FnMut(u8, &DownloadProgress),
{
    let mut buffer = [0u8; CHUNK_SIZE];
    let mut progress = DownloadProgress::new(total);
    let mut tracker = DecileTracker::default();

    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        writer.write_all(&buffer[..count])?;
        progress.advance(count as u64);

        if let Some(percent) = tracker.step(&progress) {
            on_step(percent, &progress);
        }
    }

    Ok(progress.received)
}
