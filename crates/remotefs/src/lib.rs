// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Client-side view of a hierarchical remote store.
//!
//! The gateway talks to the store only through [`RemoteTree`], always under
//! the single [`Session`] lock. Two trees are provided: [`MemoryTree`] for
//! tests and [`HostTree`], which serves a host directory.

mod error;
mod hostmount;
mod memory;
mod node;
mod session;
mod tree;

pub use error::{Error, Result};
pub use hostmount::HostTree;
pub use memory::{MemoryProbe, MemoryTree};
pub use node::{NodeId, NodeKind, RemoteNode, validate_name};
pub use session::{Credentials, Session};
pub use tree::RemoteTree;

#[cfg(test)]
mod tests;
