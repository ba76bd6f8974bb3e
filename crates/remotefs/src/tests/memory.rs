use crate::error::Error;
use crate::memory::MemoryTree;
use crate::node::NodeKind;
use crate::tree::RemoteTree;
use std::time::Duration;

#[tokio::test]
async fn test_insert_and_list() {
    let mut tree = MemoryTree::new();
    let _ = tree.insert_file("/b.txt", b"bee").unwrap();
    let _ = tree.insert_file("/a/inner.txt", b"inner").unwrap();

    let root = tree.root();
    let names: Vec<_> = tree
        .children(&root)
        .await
        .unwrap()
        .into_iter()
        .map(|n| (n.name, n.kind))
        .collect();
    assert_eq!(
        names,
        vec![
            ("a".to_string(), NodeKind::Folder),
            ("b.txt".to_string(), NodeKind::File)
        ]
    );
}

#[tokio::test]
async fn test_child_lookup() {
    let mut tree = MemoryTree::new();
    let file = tree.insert_file("/docs/readme", b"hello").unwrap();

    let root = tree.root();
    let docs = tree.child(&root, "docs").await.unwrap().unwrap();
    assert!(docs.is_folder());
    let found = tree.child(&docs, "readme").await.unwrap().unwrap();
    assert_eq!(found, file);
    assert_eq!(found.size, 5);
    assert!(found.hash.is_some());
    assert!(tree.child(&docs, "missing").await.unwrap().is_none());

    // A file has no children to look up
    let err = tree.child(&found, "x").await.unwrap_err();
    assert!(matches!(err, Error::NotAFolder(_)));
}

#[tokio::test]
async fn test_download_counts() {
    let mut tree = MemoryTree::new();
    let file = tree.insert_file("/data.bin", b"0123456789").unwrap();
    let probe = tree.probe();

    let mut sink = Vec::new();
    let written = tree.download(&file, &mut sink).await.unwrap();
    assert_eq!(written, 10);
    assert_eq!(sink, b"0123456789");
    assert_eq!(probe.downloads(), 1);
}

#[tokio::test]
async fn test_injected_failure_is_one_shot() {
    let mut tree = MemoryTree::new();
    let file = tree.insert_file("/data.bin", b"0123456789").unwrap();
    let probe = tree.probe();
    probe.fail_downloads(1);

    let mut sink = Vec::new();
    assert!(tree.download(&file, &mut sink).await.is_err());
    assert_eq!(sink.len(), 5);

    let mut sink = Vec::new();
    assert!(tree.download(&file, &mut sink).await.is_ok());
    assert_eq!(sink, b"0123456789");
    assert_eq!(probe.downloads(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_download_delay() {
    let mut tree = MemoryTree::new();
    let file = tree.insert_file("/slow", b"zzz").unwrap();
    tree.probe().set_download_delay(Duration::from_secs(5));

    let started = tokio::time::Instant::now();
    let mut sink = Vec::new();
    let _ = tree.download(&file, &mut sink).await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(5));
}

#[tokio::test]
async fn test_create_dir_and_upload() {
    let mut tree = MemoryTree::new();
    let probe = tree.probe();
    let root = tree.root();

    let dir = tree.create_dir(&root, "up").await.unwrap();
    let err = tree.create_dir(&root, "up").await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));

    let local = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(local.path(), b"uploaded").unwrap();
    let node = tree.upload(&dir, "f.txt", local.path()).await.unwrap();
    assert!(node.is_file());
    assert_eq!(tree.content_at("/up/f.txt").unwrap(), b"uploaded");

    let err = tree.upload(&dir, "f.txt", local.path()).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));

    assert_eq!(probe.folders_created(), 1);
    assert_eq!(probe.uploads(), 1);
}

#[tokio::test]
async fn test_delete() {
    let mut tree = MemoryTree::new();
    let file = tree.insert_file("/x/y/z.txt", b"z").unwrap();
    let root = tree.root();

    tree.delete(&file).await.unwrap();
    assert!(tree.content_at("/x/y/z.txt").is_none());

    let x = tree.child(&root, "x").await.unwrap().unwrap();
    tree.delete(&x).await.unwrap();
    assert!(tree.children(&root).await.unwrap().is_empty());

    assert!(matches!(tree.delete(&root).await, Err(Error::RootImmutable)));
    assert_eq!(tree.probe().deletes(), 2);
}

#[tokio::test]
async fn test_invalid_names_rejected() {
    let mut tree = MemoryTree::new();
    let root = tree.root();
    assert!(matches!(
        tree.create_dir(&root, "..").await,
        Err(Error::InvalidName(_))
    ));
    assert!(tree.insert_file("/", b"").is_err());
}
