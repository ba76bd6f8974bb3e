// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP gateway over a remote tree.
//!
//! GET on a folder returns an HTML listing, GET on a file streams a locally
//! cached copy (downloaded once, however many requests arrive together), and
//! PUT stores a file, creating folders and replacing what was there.

pub mod cache;
pub mod config;
pub mod error;
pub mod listing;
pub mod lock;
pub mod path;
pub mod resolver;
pub mod server;
pub mod upload;

pub use cache::{CacheStats, CachedFile, DownloadCache, prepare_cache_root};
pub use config::{GatewayConfig, create_example_config, load_config, validate_config};
pub use error::{GatewayError, Result};
pub use path::RequestPath;
pub use resolver::PathResolver;
pub use server::{Gateway, GetOutcome, bind, routes, serve};
pub use upload::UploadCoordinator;
