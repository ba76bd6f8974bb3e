// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use crate::node::{NodeId, RemoteNode, validate_name};
use crate::session::Credentials;
use crate::tree::RemoteTree;
use async_trait::async_trait;
use diagnostics::*;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWrite;

/// A remote tree backed by a host directory.
///
/// Node ids are paths relative to the root (the root itself is the empty
/// id). Entries that are neither regular files nor directories, and names
/// that are not valid UTF-8, are invisible.
pub struct HostTree {
    root_path: PathBuf,
    user: String,
}

impl HostTree {
    /// Opens a session on `root_path`.
    ///
    /// The credentials are checked once here. The directory must exist.
    pub async fn connect<P: AsRef<Path>>(root_path: P, credentials: &Credentials) -> Result<Self> {
        if credentials.user.is_empty() {
            return Err(Error::authentication("user is empty"));
        }
        if credentials.password.is_empty() {
            return Err(Error::authentication("password is empty"));
        }

        let root_path = root_path.as_ref();
        let canonical = tokio::fs::canonicalize(root_path).await.map_err(|e| {
            Error::Other(format!(
                "Host root '{}' cannot be resolved: {}",
                root_path.display(),
                e
            ))
        })?;
        if !tokio::fs::metadata(&canonical).await?.is_dir() {
            return Err(Error::not_a_folder(&canonical));
        }

        let user = credentials.user.clone();
        let root = canonical.display().to_string();
        info!("host tree: {user} connected to {root}", user: user, root: root);
        Ok(Self {
            root_path: canonical,
            user,
        })
    }

    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    fn host_path(&self, node: &RemoteNode) -> PathBuf {
        if node.id.as_str().is_empty() {
            self.root_path.clone()
        } else {
            self.root_path.join(node.id.as_str())
        }
    }

    fn child_id(parent: &RemoteNode, name: &str) -> NodeId {
        if parent.id.as_str().is_empty() {
            NodeId::new(name)
        } else {
            NodeId::new(format!("{}/{}", parent.id, name))
        }
    }

    fn require_folder(&self, node: &RemoteNode) -> Result<PathBuf> {
        let path = self.host_path(node);
        if !node.is_folder() {
            return Err(Error::not_a_folder(&path));
        }
        Ok(path)
    }

    async fn node_at(&self, parent: &RemoteNode, name: &str) -> Result<Option<RemoteNode>> {
        let path = self.host_path(parent).join(name);
        let meta = match tokio::fs::symlink_metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let id = Self::child_id(parent, name);
        if meta.is_dir() {
            Ok(Some(RemoteNode::folder(id, name)))
        } else if meta.is_file() {
            Ok(Some(RemoteNode::file(id, name, meta.len(), None)))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl RemoteTree for HostTree {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn root(&self) -> RemoteNode {
        RemoteNode::root(NodeId::new(""))
    }

    async fn children(&self, node: &RemoteNode) -> Result<Vec<RemoteNode>> {
        let dir = self.require_folder(node)?;
        let mut read_dir = tokio::fs::read_dir(&dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        names.sort();

        let mut children = Vec::with_capacity(names.len());
        for name in names {
            if let Some(child) = self.node_at(node, &name).await? {
                children.push(child);
            }
        }
        Ok(children)
    }

    async fn child(&self, parent: &RemoteNode, name: &str) -> Result<Option<RemoteNode>> {
        let _ = self.require_folder(parent)?;
        if validate_name(name).is_err() {
            return Ok(None);
        }
        self.node_at(parent, name).await
    }

    async fn download(
        &mut self,
        node: &RemoteNode,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64> {
        let path = self.host_path(node);
        if !node.is_file() {
            return Err(Error::not_a_file(&path));
        }
        let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::not_found(&path)
            } else {
                e.into()
            }
        })?;
        Ok(tokio::io::copy(&mut file, sink).await?)
    }

    async fn upload(&mut self, parent: &RemoteNode, name: &str, source: &Path) -> Result<RemoteNode> {
        validate_name(name)?;
        let dir = self.require_folder(parent)?;
        let target = dir.join(name);
        if tokio::fs::symlink_metadata(&target).await.is_ok() {
            return Err(Error::already_exists(&target));
        }

        // Land the bytes under a hidden name first so a listing never shows
        // a half-copied file.
        let staging = dir.join(format!(".{}.upload", name));
        let _ = tokio::fs::copy(source, &staging).await?;
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        let size = tokio::fs::metadata(&target).await?.len();
        Ok(RemoteNode::file(Self::child_id(parent, name), name, size, None))
    }

    async fn delete(&mut self, node: &RemoteNode) -> Result<()> {
        if node.is_root() {
            return Err(Error::RootImmutable);
        }
        let path = self.host_path(node);
        if node.is_folder() {
            tokio::fs::remove_dir_all(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn create_dir(&mut self, parent: &RemoteNode, name: &str) -> Result<RemoteNode> {
        validate_name(name)?;
        let dir = self.require_folder(parent)?;
        let target = dir.join(name);
        tokio::fs::create_dir(&target).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                Error::already_exists(&target)
            } else {
                e.into()
            }
        })?;
        Ok(RemoteNode::folder(Self::child_id(parent, name), name))
    }
}
