// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use crate::node::{NodeId, NodeKind, RemoteNode, validate_name};
use crate::tree::RemoteTree;
use async_trait::async_trait;
use diagnostics::*;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Counters and fault switches shared with whoever built the tree.
///
/// The tree itself usually ends up boxed inside a `Session`; the probe is how
/// tests observe it and steer it afterwards.
#[derive(Debug, Default)]
pub struct MemoryProbe {
    downloads: AtomicUsize,
    uploads: AtomicUsize,
    deletes: AtomicUsize,
    folders_created: AtomicUsize,
    failing_downloads: AtomicUsize,
    download_delay_ms: AtomicU64,
}

impl MemoryProbe {
    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn folders_created(&self) -> usize {
        self.folders_created.load(Ordering::SeqCst)
    }

    /// The next `count` downloads fail after writing part of the content
    pub fn fail_downloads(&self, count: usize) {
        self.failing_downloads.store(count, Ordering::SeqCst);
    }

    /// Every download sleeps this long before writing
    pub fn set_download_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.download_delay_ms.store(millis, Ordering::SeqCst);
    }

    fn take_failure(&self) -> bool {
        self.failing_downloads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn download_delay(&self) -> Duration {
        Duration::from_millis(self.download_delay_ms.load(Ordering::SeqCst))
    }
}

struct Entry {
    node: RemoteNode,
    path: PathBuf,
    children: BTreeMap<String, NodeId>,
    content: Vec<u8>,
}

/// A remote tree held entirely in memory.
///
/// Children are kept in a BTreeMap so listings come back sorted by name.
/// Suitable for tests and for running the gateway without a real store.
pub struct MemoryTree {
    entries: HashMap<NodeId, Entry>,
    root: NodeId,
    next_id: u64,
    probe: Arc<MemoryProbe>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        let root = NodeId::from_sequence(0);
        let entry = Entry {
            node: RemoteNode::root(root.clone()),
            path: PathBuf::from("/"),
            children: BTreeMap::new(),
            content: Vec::new(),
        };
        Self {
            entries: HashMap::from([(root.clone(), entry)]),
            root,
            next_id: 1,
            probe: Arc::new(MemoryProbe::default()),
        }
    }
}

fn content_hash(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

impl MemoryTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn probe(&self) -> Arc<MemoryProbe> {
        self.probe.clone()
    }

    /// Seeds a file at a slash-separated path, creating folders on the way.
    /// Does not touch the probe counters.
    pub fn insert_file(&mut self, path: &str, content: &[u8]) -> Result<RemoteNode> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (name, folders) = segments
            .split_last()
            .ok_or_else(|| Error::invalid_name(path))?;
        let mut parent = self.root.clone();
        for folder in folders {
            parent = match self.entry(&parent)?.children.get(*folder) {
                Some(id) => id.clone(),
                None => self.add(&parent, folder, NodeKind::Folder, Vec::new())?.id,
            };
        }
        self.add(&parent, name, NodeKind::File, content.to_vec())
    }

    /// Reads a file's content by path, bypassing the download counters
    #[must_use]
    pub fn content_at(&self, path: &str) -> Option<Vec<u8>> {
        let mut id = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            id = self.entries.get(&id)?.children.get(segment)?.clone();
        }
        let entry = self.entries.get(&id)?;
        entry.node.is_file().then(|| entry.content.clone())
    }

    fn entry(&self, id: &NodeId) -> Result<&Entry> {
        self.entries
            .get(id)
            .ok_or_else(|| Error::not_found(format!("<node {}>", id)))
    }

    fn container(&self, node: &RemoteNode) -> Result<&Entry> {
        let entry = self.entry(&node.id)?;
        if !entry.node.is_folder() {
            return Err(Error::not_a_folder(&entry.path));
        }
        Ok(entry)
    }

    fn add(&mut self, parent: &NodeId, name: &str, kind: NodeKind, content: Vec<u8>) -> Result<RemoteNode> {
        validate_name(name)?;
        let parent_entry = self.entry(parent)?;
        let path = parent_entry.path.join(name);
        if parent_entry.children.contains_key(name) {
            return Err(Error::already_exists(&path));
        }

        let id = NodeId::from_sequence(self.next_id);
        self.next_id += 1;
        let node = match kind {
            NodeKind::File => RemoteNode::file(
                id.clone(),
                name,
                content.len() as u64,
                Some(content_hash(&content)),
            ),
            _ => RemoteNode::folder(id.clone(), name),
        };
        let _ = self.entries.insert(
            id.clone(),
            Entry {
                node: node.clone(),
                path,
                children: BTreeMap::new(),
                content,
            },
        );
        if let Some(parent_entry) = self.entries.get_mut(parent) {
            let _ = parent_entry.children.insert(name.to_string(), id);
        }
        Ok(node)
    }

    fn remove_subtree(&mut self, id: &NodeId) {
        if let Some(entry) = self.entries.remove(id) {
            for child in entry.children.values() {
                self.remove_subtree(child);
            }
        }
    }
}

#[async_trait]
impl RemoteTree for MemoryTree {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn root(&self) -> RemoteNode {
        RemoteNode::root(self.root.clone())
    }

    async fn children(&self, node: &RemoteNode) -> Result<Vec<RemoteNode>> {
        let entry = self.container(node)?;
        entry
            .children
            .values()
            .map(|id| self.entry(id).map(|child| child.node.clone()))
            .collect()
    }

    async fn child(&self, parent: &RemoteNode, name: &str) -> Result<Option<RemoteNode>> {
        let entry = self.container(parent)?;
        Ok(entry
            .children
            .get(name)
            .and_then(|id| self.entries.get(id))
            .map(|child| child.node.clone()))
    }

    async fn download(
        &mut self,
        node: &RemoteNode,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64> {
        let entry = self.entry(&node.id)?;
        if !entry.node.is_file() {
            return Err(Error::not_a_file(&entry.path));
        }
        let content = entry.content.clone();
        let path = entry.path.display().to_string();
        let _ = self.probe.downloads.fetch_add(1, Ordering::SeqCst);

        let delay = self.probe.download_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.probe.take_failure() {
            sink.write_all(&content[..content.len() / 2]).await?;
            warn!("memory tree: injected download failure for {target_path}", target_path: path);
            return Err(Error::Other(format!("injected download failure: {}", path)));
        }

        sink.write_all(&content).await?;
        debug!("memory tree: downloaded {target_path}", target_path: path);
        Ok(content.len() as u64)
    }

    async fn upload(&mut self, parent: &RemoteNode, name: &str, source: &Path) -> Result<RemoteNode> {
        let _ = self.container(parent)?;
        let content = tokio::fs::read(source).await?;
        let node = self.add(&parent.id, name, NodeKind::File, content)?;
        let _ = self.probe.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(node)
    }

    async fn delete(&mut self, node: &RemoteNode) -> Result<()> {
        if node.id == self.root {
            return Err(Error::RootImmutable);
        }
        let parent = self
            .entries
            .values()
            .find(|entry| entry.children.get(&node.name) == Some(&node.id))
            .map(|entry| entry.node.id.clone())
            .ok_or_else(|| Error::not_found(format!("<node {}>", node.id)))?;
        if let Some(parent_entry) = self.entries.get_mut(&parent) {
            let _ = parent_entry.children.remove(&node.name);
        }
        self.remove_subtree(&node.id);
        let _ = self.probe.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_dir(&mut self, parent: &RemoteNode, name: &str) -> Result<RemoteNode> {
        let _ = self.container(parent)?;
        let node = self.add(&parent.id, name, NodeKind::Folder, Vec::new())?;
        let _ = self.probe.folders_created.fetch_add(1, Ordering::SeqCst);
        Ok(node)
    }
}
