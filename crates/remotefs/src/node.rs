// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

/// Opaque identifier for a node, assigned by the tree client
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Sequential ids in the same friendly width the memory tree prints
    #[must_use]
    pub fn from_sequence(n: u64) -> Self {
        if n <= 0xFFFF {
            Self(format!("{:04X}", n))
        } else if n <= 0xFFFF_FFFF {
            Self(format!("{:08X}", n))
        } else {
            Self(format!("{:016X}", n))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Folder,
    File,
}

impl NodeKind {
    /// Roots and folders both hold children
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Folder)
    }
}

/// A transient copy of one entry in the remote hierarchy.
///
/// Values are snapshots handed out by lookups. Holding one does not keep the
/// remote entry alive, and mutating the tree always goes through the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    /// Content identity for files, when the backend computes one
    pub hash: Option<String>,
    pub size: u64,
}

impl RemoteNode {
    #[must_use]
    pub fn root(id: NodeId) -> Self {
        Self {
            id,
            kind: NodeKind::Root,
            name: String::new(),
            hash: None,
            size: 0,
        }
    }

    pub fn folder<S: Into<String>>(id: NodeId, name: S) -> Self {
        Self {
            id,
            kind: NodeKind::Folder,
            name: name.into(),
            hash: None,
            size: 0,
        }
    }

    pub fn file<S: Into<String>>(id: NodeId, name: S, size: u64, hash: Option<String>) -> Self {
        Self {
            id,
            kind: NodeKind::File,
            name: name.into(),
            hash,
            size,
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::Root
    }

    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.kind.is_container()
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }
}

/// Checks a single path segment before it is used as a node name
pub fn validate_name(name: &str) -> crate::Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(crate::Error::invalid_name(name));
    }
    Ok(())
}
