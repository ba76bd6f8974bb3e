// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Local file cache in front of the remote tree.
//!
//! A cache entry is absent, in flight (`<file>.part` exists), or ready (the
//! canonical file exists). The first requester of an absent entry becomes the
//! owner and downloads; concurrent requesters wait for the marker to vanish
//! and then read what the owner published.

use crate::error::{GatewayError, Result};
use crate::lock::{FetchLock, PartFile, PartFileLock, WaitError, wait_for_release};
use diagnostics::*;
use remotefs::{RemoteNode, Session};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::fs::File;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(60 * 60);

/// A ready cache file opened for reading
#[derive(Debug)]
pub struct CachedFile {
    pub file: File,
    pub len: u64,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    downloads: AtomicU64,
    waits: AtomicU64,
    timeouts: AtomicU64,
    failures: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    let _ = counter.fetch_add(1, Ordering::Relaxed);
}

/// Point-in-time copy of the cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub downloads: u64,
    pub waits: u64,
    pub timeouts: u64,
    pub failures: u64,
}

#[derive(Debug, Clone)]
pub struct DownloadCache {
    session: Session,
    poll_interval: Duration,
    max_wait: Duration,
    counters: Arc<CacheCounters>,
}

impl DownloadCache {
    pub fn new(session: Session, poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            session,
            poll_interval,
            max_wait,
            counters: Arc::new(CacheCounters::default()),
        }
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let c = &self.counters;
        CacheStats {
            hits: c.hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            downloads: c.downloads.load(Ordering::Relaxed),
            waits: c.waits.load(Ordering::Relaxed),
            timeouts: c.timeouts.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
        }
    }

    /// Returns the cached copy of `node`, downloading it first if needed.
    ///
    /// `label` names the resource in errors and logs (normally the request
    /// path).
    pub async fn fetch(&self, node: &RemoteNode, cache_path: &Path, label: &str) -> Result<CachedFile> {
        if let Some(ready) = open_cached(cache_path).await? {
            bump(&self.counters.hits);
            debug!("cache hit {label}", label: label);
            return Ok(ready);
        }
        bump(&self.counters.misses);

        if let Some(parent) = cache_path.parent() {
            create_private_dir_all(parent).await?;
        }

        let lock = PartFileLock::for_cache_path(cache_path);
        let acquired = lock
            .try_acquire()
            .await
            .map_err(|e| GatewayError::local_io(lock.marker(), e))?;
        match acquired {
            Some(part) => self.fill_detached(part, node, cache_path, label).await,
            None => self.wait_for_owner(&lock, cache_path, label).await,
        }
    }

    /// Runs the owner's fill on its own task. Dropping the request that won
    /// the marker does not cancel the download others are waiting on.
    async fn fill_detached(
        &self,
        part: PartFile,
        node: &RemoteNode,
        cache_path: &Path,
        label: &str,
    ) -> Result<CachedFile> {
        let cache = self.clone();
        let node = node.clone();
        let dest = cache_path.to_path_buf();
        let owned_label = label.to_string();
        let task = tokio::spawn(async move { cache.fill(part, &node, &dest, &owned_label).await });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                bump(&self.counters.failures);
                let reason = e.to_string();
                error!("fetch task for {label} ended abnormally: {reason}", label: label, reason: reason);
                Err(GatewayError::FetchAbandoned(label.to_string()))
            }
        }
    }

    async fn fill(
        &self,
        mut part: PartFile,
        node: &RemoteNode,
        cache_path: &Path,
        label: &str,
    ) -> Result<CachedFile> {
        // Another owner may have published between our miss and our acquire.
        if let Some(ready) = open_cached(cache_path).await? {
            debug!("cache filled concurrently {label}", label: label);
            return Ok(ready);
        }

        debug!("fetch owner for {label}", label: label);
        let transferred = {
            let mut tree = self.session.lock().await;
            tree.download(node, part.file_mut()).await
        };
        let bytes = match transferred {
            Ok(bytes) => bytes,
            Err(e) => {
                bump(&self.counters.failures);
                let reason = e.to_string();
                error!("download of {label} failed: {reason}", label: label, reason: reason);
                return Err(e.into());
            }
        };

        if let Err(e) = part.publish(cache_path).await {
            bump(&self.counters.failures);
            return Err(GatewayError::local_io(cache_path, e));
        }
        bump(&self.counters.downloads);
        info!("cached {label} ({bytes} bytes)", label: label, bytes: bytes);

        open_cached(cache_path)
            .await?
            .ok_or_else(|| GatewayError::local_io(cache_path, io::ErrorKind::NotFound.into()))
    }

    async fn wait_for_owner(&self, lock: &PartFileLock, cache_path: &Path, label: &str) -> Result<CachedFile> {
        bump(&self.counters.waits);
        debug!("waiting for in-flight fetch of {label}", label: label);

        match wait_for_release(lock, self.poll_interval, self.max_wait).await {
            Ok(()) => {}
            Err(WaitError::TimedOut(waited)) => {
                bump(&self.counters.timeouts);
                let secs = waited.as_secs();
                warn!(
                    "gave up on {label} after {secs}s; the fetch is still in flight",
                    label: label,
                    secs: secs
                );
                return Err(GatewayError::DownloadTimeout {
                    path: label.to_string(),
                    waited,
                });
            }
            Err(WaitError::Io(e)) => return Err(GatewayError::local_io(lock.marker(), e)),
        }

        if let Some(ready) = open_cached(cache_path).await? {
            return Ok(ready);
        }
        // The marker can vanish a moment before the rename is visible.
        tokio::time::sleep(self.poll_interval).await;
        if let Some(ready) = open_cached(cache_path).await? {
            return Ok(ready);
        }

        warn!("in-flight fetch of {label} ended without a cache file", label: label);
        Err(GatewayError::FetchAbandoned(label.to_string()))
    }
}

/// Opens a ready cache file. `None` when there is no such file.
async fn open_cached(path: &Path) -> Result<Option<CachedFile>> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(GatewayError::local_io(path, e)),
    };
    let meta = file
        .metadata()
        .await
        .map_err(|e| GatewayError::local_io(path, e))?;
    Ok(Some(CachedFile {
        file,
        len: meta.len(),
        path: path.to_path_buf(),
    }))
}

/// Creates a directory and its missing parents, readable only by this user
pub async fn create_private_dir_all(path: &Path) -> Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    let _ = builder.recursive(true);
    #[cfg(unix)]
    let _ = builder.mode(0o700);
    builder
        .create(path)
        .await
        .map_err(|e| GatewayError::local_io(path, e))
}

/// Makes sure the cache root exists before serving
pub async fn prepare_cache_root(path: &Path) -> Result<()> {
    create_private_dir_all(path).await?;
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| GatewayError::local_io(path, e))?;
    if !meta.is_dir() {
        return Err(GatewayError::local_io(
            path,
            io::Error::other("cache root is not a directory"),
        ));
    }
    let root = path.display().to_string();
    info!("cache root ready at {root}", root: root);
    Ok(())
}
