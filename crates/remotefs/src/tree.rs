// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::Result;
use crate::node::RemoteNode;
use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncWrite;

/// Client interface for a hierarchical remote store.
///
/// Implementations are not assumed to be safe for concurrent use. Callers go
/// through [`crate::Session`], which serializes every call.
#[async_trait]
pub trait RemoteTree: Send + Sync {
    /// Downcast support for accessing concrete implementation methods
    fn as_any(&self) -> &dyn std::any::Any;

    fn root(&self) -> RemoteNode;

    /// Lists the children of a root or folder node
    async fn children(&self, node: &RemoteNode) -> Result<Vec<RemoteNode>>;

    /// Looks up one name under a root or folder node
    async fn child(&self, parent: &RemoteNode, name: &str) -> Result<Option<RemoteNode>>;

    /// Writes the content of a file node to `sink`, returning the byte count
    async fn download(
        &mut self,
        node: &RemoteNode,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64>;

    /// Creates a new file named `name` under `parent` from a local file
    async fn upload(&mut self, parent: &RemoteNode, name: &str, source: &Path)
    -> Result<RemoteNode>;

    async fn delete(&mut self, node: &RemoteNode) -> Result<()>;

    async fn create_dir(&mut self, parent: &RemoteNode, name: &str) -> Result<RemoteNode>;
}
