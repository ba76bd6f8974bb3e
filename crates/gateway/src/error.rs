// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};
use std::time::Duration;
use warp::http::StatusCode;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Invalid request path: {0}")]
    InvalidPath(String),

    #[error("Timed out after {waited:?} waiting for the download of {path}")]
    DownloadTimeout { path: String, waited: Duration },

    #[error("Download of {0} was abandoned before it completed")]
    FetchAbandoned(String),

    #[error("Remote tree error: {0}")]
    Remote(#[from] remotefs::Error),

    #[error("Local I/O error at {}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload of {path} failed: {source}")]
    Upload {
        path: String,
        #[source]
        source: Box<GatewayError>,
    },
}

impl GatewayError {
    pub fn local_io<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        GatewayError::LocalIo {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn upload<S: Into<String>>(path: S, source: GatewayError) -> Self {
        GatewayError::Upload {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// The HTTP status a client sees for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            GatewayError::DownloadTimeout { .. } => StatusCode::REQUEST_TIMEOUT,
            GatewayError::Upload { source, .. } if matches!(**source, GatewayError::InvalidPath(_)) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::FetchAbandoned(_)
            | GatewayError::Remote(_)
            | GatewayError::LocalIo { .. }
            | GatewayError::Upload { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
