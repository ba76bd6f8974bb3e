// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Single-flight ownership for cache fills.
//!
//! Whoever creates the marker owns the fetch; everybody else is a contender
//! and waits for the marker to go away. The lock is advisory and not
//! reentrant: acquiring a marker this process already holds just fails like
//! any other contender, so an owner must keep its guard rather than re-acquire.

use async_trait::async_trait;
use diagnostics::*;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;

/// Suffix of the in-flight marker next to a cache file
pub const PART_SUFFIX: &str = ".part";

#[async_trait]
pub trait FetchLock: Send + Sync {
    /// Released when dropped
    type Guard: Send;

    /// Returns the guard if this caller became the owner, `None` for a contender
    async fn try_acquire(&self) -> io::Result<Option<Self::Guard>>;

    async fn is_held(&self) -> io::Result<bool>;
}

#[derive(Debug)]
pub enum WaitError {
    TimedOut(Duration),
    Io(io::Error),
}

impl From<io::Error> for WaitError {
    fn from(err: io::Error) -> Self {
        WaitError::Io(err)
    }
}

/// Polls until the lock is released or `max_wait` has passed
pub async fn wait_for_release<L: FetchLock + ?Sized>(
    lock: &L,
    poll_interval: Duration,
    max_wait: Duration,
) -> Result<(), WaitError> {
    let started = Instant::now();
    loop {
        if !lock.is_held().await? {
            return Ok(());
        }
        let waited = started.elapsed();
        if waited >= max_wait {
            return Err(WaitError::TimedOut(waited));
        }
        tokio::time::sleep(poll_interval.min(max_wait - waited)).await;
    }
}

/// The `<cachefile>.part` marker used as a filesystem lock
#[derive(Debug, Clone)]
pub struct PartFileLock {
    marker: PathBuf,
}

impl PartFileLock {
    #[must_use]
    pub fn for_cache_path(cache_path: &Path) -> Self {
        let mut marker = cache_path.as_os_str().to_owned();
        marker.push(PART_SUFFIX);
        Self {
            marker: PathBuf::from(marker),
        }
    }

    #[must_use]
    pub fn marker(&self) -> &Path {
        &self.marker
    }
}

#[async_trait]
impl FetchLock for PartFileLock {
    type Guard = PartFile;

    async fn try_acquire(&self) -> io::Result<Option<PartFile>> {
        let mut options = tokio::fs::OpenOptions::new();
        let _ = options.write(true).create_new(true);
        #[cfg(unix)]
        let _ = options.mode(0o600);

        match options.open(&self.marker).await {
            Ok(file) => Ok(Some(PartFile {
                marker: self.marker.clone(),
                file,
                published: false,
            })),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn is_held(&self) -> io::Result<bool> {
        match tokio::fs::symlink_metadata(&self.marker).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Ownership of an in-flight fetch: the open partial file.
///
/// Dropping it without [`PartFile::publish`] deletes the partial file, which
/// returns the entry to absent so a later request can retry.
#[derive(Debug)]
pub struct PartFile {
    marker: PathBuf,
    file: File,
    published: bool,
}

impl PartFile {
    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    #[must_use]
    pub fn marker(&self) -> &Path {
        &self.marker
    }

    /// Makes the written content durable and renames it onto `dest`.
    ///
    /// The rename is the publish point: readers either miss `dest` or see it
    /// complete.
    pub async fn publish(mut self, dest: &Path) -> io::Result<()> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        tokio::fs::rename(&self.marker, dest).await?;
        self.published = true;
        Ok(())
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        match std::fs::remove_file(&self.marker) {
            Ok(()) => {
                let marker = self.marker.display().to_string();
                debug!("released fetch marker {marker}", marker: marker);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                let marker = self.marker.display().to_string();
                let err = e.to_string();
                warn!("could not remove fetch marker {marker}: {reason}", marker: marker, reason: err);
            }
        }
    }
}
