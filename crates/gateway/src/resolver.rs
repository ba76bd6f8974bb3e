// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{GatewayError, Result};
use crate::path::RequestPath;
use diagnostics::*;
use remotefs::{RemoteNode, RemoteTree, Session};
use std::path::PathBuf;

/// Maps request paths onto remote nodes and onto cache files
#[derive(Debug, Clone)]
pub struct PathResolver {
    session: Session,
    cache_root: PathBuf,
}

impl PathResolver {
    pub fn new<P: Into<PathBuf>>(session: Session, cache_root: P) -> Self {
        Self {
            session,
            cache_root: cache_root.into(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Resolves a request path to the node it names.
    ///
    /// The root is returned for a path with no segments. A missing segment
    /// anywhere along the way is `NotFound`, and so is descending below a file.
    pub async fn resolve(&self, path: &RequestPath) -> Result<RemoteNode> {
        let tree = self.session.lock().await;
        lookup(&**tree, path.segments())
            .await?
            .ok_or_else(|| GatewayError::NotFound(path.to_string()))
    }

    /// The canonical cache file for a request path. Pure; touches nothing.
    #[must_use]
    pub fn cache_path(&self, path: &RequestPath) -> PathBuf {
        path.segments()
            .iter()
            .fold(self.cache_root.clone(), |acc, segment| acc.join(segment))
    }
}

/// Ordered descent from the root, one segment at a time.
///
/// Callers must hold the session lock for the duration.
pub async fn lookup(tree: &dyn RemoteTree, segments: &[String]) -> Result<Option<RemoteNode>> {
    let mut node = tree.root();
    for segment in segments {
        if !node.is_folder() {
            return Ok(None);
        }
        match tree.child(&node, segment).await? {
            Some(child) => node = child,
            None => return Ok(None),
        }
    }
    Ok(Some(node))
}

/// Resolves a folder path, creating each missing folder under its parent.
///
/// Existing folders are reused, so a path that already exists causes no
/// creation calls. A file in the way is an error. Callers must hold the
/// session lock for the duration.
pub async fn ensure_folder_path(
    tree: &mut dyn RemoteTree,
    segments: &[String],
) -> Result<RemoteNode> {
    let mut node = tree.root();
    for (depth, segment) in segments.iter().enumerate() {
        node = match tree.child(&node, segment).await? {
            Some(child) if child.is_folder() => child,
            Some(_) => {
                let prefix = format!("/{}", segments[..=depth].join("/"));
                return Err(remotefs::Error::not_a_folder(prefix).into());
            }
            None => {
                let created = tree.create_dir(&node, segment).await?;
                let prefix = format!("/{}", segments[..=depth].join("/"));
                debug!("created remote folder {prefix}", prefix: prefix);
                created
            }
        };
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use remotefs::MemoryTree;

    fn segments(path: &str) -> Vec<String> {
        RequestPath::parse(path).unwrap().segments().to_vec()
    }

    fn resolver_with(tree: MemoryTree) -> PathResolver {
        PathResolver::new(Session::new(tree), "/var/cache/gate")
    }

    #[tokio::test]
    async fn test_resolve_root() {
        let resolver = resolver_with(MemoryTree::new());
        let node = resolver
            .resolve(&RequestPath::parse("/").unwrap())
            .await
            .unwrap();
        assert!(node.is_root());
    }

    #[tokio::test]
    async fn test_resolve_nested_file() {
        let mut tree = MemoryTree::new();
        let file = tree.insert_file("/a/b/c.txt", b"c").unwrap();
        let resolver = resolver_with(tree);

        let node = resolver
            .resolve(&RequestPath::parse("/a/b/c.txt").unwrap())
            .await
            .unwrap();
        assert_eq!(node, file);

        let folder = resolver
            .resolve(&RequestPath::parse("/a/b/").unwrap())
            .await
            .unwrap();
        assert!(folder.is_folder());
    }

    #[tokio::test]
    async fn test_resolve_missing() {
        let mut tree = MemoryTree::new();
        let _ = tree.insert_file("/a/file", b"f").unwrap();
        let resolver = resolver_with(tree);

        for missing in ["/nope", "/a/nope", "/nope/file", "/a/file/below"] {
            let err = resolver
                .resolve(&RequestPath::parse(missing).unwrap())
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::NotFound(_)), "{}", missing);
        }
    }

    #[test]
    fn test_cache_path() {
        let resolver = resolver_with(MemoryTree::new());
        assert_eq!(
            resolver.cache_path(&RequestPath::parse("/a//b/c.txt").unwrap()),
            PathBuf::from("/var/cache/gate/a/b/c.txt")
        );
        assert_eq!(
            resolver.cache_path(&RequestPath::parse("/").unwrap()),
            PathBuf::from("/var/cache/gate")
        );
    }

    #[tokio::test]
    async fn test_ensure_folder_path_creates_parent_first() {
        let mut tree = MemoryTree::new();
        let probe = tree.probe();

        let node = ensure_folder_path(&mut tree, &segments("/a/b/c"))
            .await
            .unwrap();
        assert_eq!(node.name, "c");
        assert_eq!(probe.folders_created(), 3);

        let root = tree.root();
        let a = tree.child(&root, "a").await.unwrap().unwrap();
        let b = tree.child(&a, "b").await.unwrap().unwrap();
        assert_eq!(tree.child(&b, "c").await.unwrap(), Some(node));
    }

    #[tokio::test]
    async fn test_ensure_folder_path_is_idempotent() {
        let mut tree = MemoryTree::new();
        let probe = tree.probe();

        let first = ensure_folder_path(&mut tree, &segments("/x/y"))
            .await
            .unwrap();
        let second = ensure_folder_path(&mut tree, &segments("/x/y"))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(probe.folders_created(), 2);

        // Extending an existing prefix only creates the new tail
        let _ = ensure_folder_path(&mut tree, &segments("/x/y/z"))
            .await
            .unwrap();
        assert_eq!(probe.folders_created(), 3);
    }

    #[tokio::test]
    async fn test_ensure_folder_path_root() {
        let mut tree = MemoryTree::new();
        let node = ensure_folder_path(&mut tree, &[]).await.unwrap();
        assert!(node.is_root());
        assert_eq!(tree.probe().folders_created(), 0);
    }

    #[tokio::test]
    async fn test_ensure_folder_path_file_in_the_way() {
        let mut tree = MemoryTree::new();
        let _ = tree.insert_file("/a/blocker", b"x").unwrap();
        let err = ensure_folder_path(&mut tree, &segments("/a/blocker/c"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Remote(remotefs::Error::NotAFolder(_))
        ));
    }
}
