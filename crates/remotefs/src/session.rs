// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::tree::RemoteTree;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// The two secrets a remote store requires at login
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new<U: Into<String>, P: Into<String>>(user: U, password: P) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated remote tree shared by the whole process.
///
/// All access happens under one mutex: lookups, listings, transfers and tree
/// mutations are serialized. Cloning shares the same client.
#[derive(Clone)]
pub struct Session(Arc<Mutex<Box<dyn RemoteTree>>>);

impl Session {
    pub fn new<T: RemoteTree + 'static>(tree: T) -> Self {
        Self(Arc::new(Mutex::new(Box::new(tree))))
    }

    /// Enters the serialization point. Hold the guard for as long as a
    /// sequence of calls must not interleave with other requests.
    pub async fn lock(&self) -> MutexGuard<'_, Box<dyn RemoteTree>> {
        self.0.lock().await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}
