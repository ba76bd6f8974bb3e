// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::cache::create_private_dir_all;
use crate::error::{GatewayError, Result};
use crate::path::RequestPath;
use crate::resolver::{PathResolver, ensure_folder_path};
use diagnostics::*;
use remotefs::RemoteNode;

/// Stores request bodies locally and pushes them into the remote tree
#[derive(Debug, Clone)]
pub struct UploadCoordinator {
    resolver: PathResolver,
}

impl UploadCoordinator {
    #[must_use]
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// Writes `content` at `path`, replacing any file already there.
    ///
    /// The content lands in the local cache first and is then uploaded.
    /// Missing folders are created, an existing file is deleted before the
    /// upload, and an existing folder is left alone and reported. The remote
    /// steps run under a single session lock. Nothing is rolled back on
    /// failure: if the upload fails after the delete, the old file is gone.
    pub async fn store(&self, path: &RequestPath, content: &[u8]) -> Result<RemoteNode> {
        self.store_inner(path, content)
            .await
            .map_err(|e| GatewayError::upload(path.as_str(), e))
    }

    async fn store_inner(&self, path: &RequestPath, content: &[u8]) -> Result<RemoteNode> {
        let (parents, name) = path
            .split_last()
            .ok_or_else(|| GatewayError::InvalidPath(path.to_string()))?;

        let local = self.resolver.cache_path(path);
        if let Some(dir) = local.parent() {
            create_private_dir_all(dir).await?;
        }
        tokio::fs::write(&local, content)
            .await
            .map_err(|e| GatewayError::local_io(&local, e))?;

        let mut tree = self.resolver.session().lock().await;
        let folder = ensure_folder_path(&mut **tree, parents).await?;

        if let Some(existing) = tree.child(&folder, name).await? {
            if existing.is_folder() {
                return Err(remotefs::Error::not_a_file(path.as_str()).into());
            }
            tree.delete(&existing).await?;
            let target = path.as_str();
            debug!("deleted previous remote file {target}", target: target);
        }

        let node = tree.upload(&folder, name, &local).await?;
        let target = path.as_str();
        let size = content.len();
        info!("stored {target} ({size} bytes)", target: target, size: size);
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remotefs::{MemoryTree, RemoteTree, Session};
    use tempfile::TempDir;
    use warp::http::StatusCode;

    struct Fixture {
        dir: TempDir,
        session: Session,
        uploader: UploadCoordinator,
    }

    fn fixture(tree: MemoryTree) -> Fixture {
        let dir = TempDir::new().unwrap();
        let session = Session::new(tree);
        let resolver = PathResolver::new(session.clone(), dir.path().join("cache"));
        Fixture {
            dir,
            session,
            uploader: UploadCoordinator::new(resolver),
        }
    }

    fn path(p: &str) -> RequestPath {
        RequestPath::parse(p).unwrap()
    }

    async fn remote_content(session: &Session, p: &str) -> Option<Vec<u8>> {
        let tree = session.lock().await;
        tree.as_any()
            .downcast_ref::<MemoryTree>()
            .unwrap()
            .content_at(p)
    }

    #[tokio::test]
    async fn test_store_top_level() {
        let fx = fixture(MemoryTree::new());
        let node = fx.uploader.store(&path("/top.txt"), b"top").await.unwrap();
        assert_eq!(node.name, "top.txt");
        assert_eq!(node.size, 3);
        assert_eq!(remote_content(&fx.session, "/top.txt").await.unwrap(), b"top");
        assert_eq!(
            std::fs::read(fx.dir.path().join("cache").join("top.txt")).unwrap(),
            b"top"
        );
    }

    #[tokio::test]
    async fn test_store_creates_missing_folders() {
        let tree = MemoryTree::new();
        let probe = tree.probe();
        let fx = fixture(tree);

        let _ = fx
            .uploader
            .store(&path("/a/b/c/file.txt"), b"hello")
            .await
            .unwrap();
        assert_eq!(probe.folders_created(), 3);
        assert_eq!(
            remote_content(&fx.session, "/a/b/c/file.txt").await.unwrap(),
            b"hello"
        );
    }

    #[tokio::test]
    async fn test_restore_replaces_single_file() {
        let tree = MemoryTree::new();
        let probe = tree.probe();
        let fx = fixture(tree);

        let _ = fx.uploader.store(&path("/a/b/f"), b"one").await.unwrap();
        let _ = fx.uploader.store(&path("/a/b/f"), b"two").await.unwrap();

        assert_eq!(probe.folders_created(), 2);
        assert_eq!(probe.deletes(), 1);
        assert_eq!(probe.uploads(), 2);
        assert_eq!(remote_content(&fx.session, "/a/b/f").await.unwrap(), b"two");

        let tree = fx.session.lock().await;
        let root = tree.root();
        let a = tree.child(&root, "a").await.unwrap().unwrap();
        let b = tree.child(&a, "b").await.unwrap().unwrap();
        let named_f: Vec<_> = tree
            .children(&b)
            .await
            .unwrap()
            .into_iter()
            .filter(|n| n.name == "f")
            .collect();
        assert_eq!(named_f.len(), 1);
    }

    #[tokio::test]
    async fn test_store_root_is_invalid() {
        let fx = fixture(MemoryTree::new());
        let err = fx.uploader.store(&path("/"), b"x").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_onto_folder_fails_and_keeps_folder() {
        let mut tree = MemoryTree::new();
        let _ = tree.insert_file("/docs/inner.txt", b"inner").unwrap();
        let probe = tree.probe();
        let fx = fixture(tree);

        let err = fx.uploader.store(&path("/docs"), b"x").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(probe.deletes(), 0);
        assert_eq!(
            remote_content(&fx.session, "/docs/inner.txt").await.unwrap(),
            b"inner"
        );
    }

    #[tokio::test]
    async fn test_store_below_file_fails() {
        let mut tree = MemoryTree::new();
        let _ = tree.insert_file("/plain", b"p").unwrap();
        let fx = fixture(tree);

        let err = fx.uploader.store(&path("/plain/child"), b"x").await.unwrap_err();
        match err {
            GatewayError::Upload { path, source } => {
                assert_eq!(path, "/plain/child");
                assert!(matches!(*source, GatewayError::Remote(_) | GatewayError::LocalIo { .. }));
            }
            other => panic!("expected upload error, got {:?}", other),
        }
    }
}
