// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors reported by a remote tree client
#[derive(Debug)]
pub enum Error {
    NotFound(PathBuf),
    NotAFolder(PathBuf),
    NotAFile(PathBuf),
    AlreadyExists(PathBuf),
    InvalidName(String),
    Authentication(String),
    RootImmutable,
    Io(std::io::Error),
    Other(String),
}

impl Error {
    pub fn not_found<P: AsRef<Path>>(path: P) -> Self {
        Error::NotFound(path.as_ref().to_path_buf())
    }

    pub fn not_a_folder<P: AsRef<Path>>(path: P) -> Self {
        Error::NotAFolder(path.as_ref().to_path_buf())
    }

    pub fn not_a_file<P: AsRef<Path>>(path: P) -> Self {
        Error::NotAFile(path.as_ref().to_path_buf())
    }

    pub fn already_exists<P: AsRef<Path>>(path: P) -> Self {
        Error::AlreadyExists(path.as_ref().to_path_buf())
    }

    pub fn invalid_name<S: AsRef<str>>(name: S) -> Self {
        Error::InvalidName(name.as_ref().into())
    }

    pub fn authentication<S: AsRef<str>>(msg: S) -> Self {
        Error::Authentication(msg.as_ref().into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::NotFound(path) => write!(f, "Node not found: {}", path.display()),
            Error::NotAFolder(path) => write!(f, "Not a folder: {}", path.display()),
            Error::NotAFile(path) => write!(f, "Not a file: {}", path.display()),
            Error::AlreadyExists(path) => write!(f, "Entry already exists: {}", path.display()),
            Error::InvalidName(name) => write!(f, "Invalid node name: {:?}", name),
            Error::Authentication(msg) => write!(f, "Authentication failed: {}", msg),
            Error::RootImmutable => write!(f, "The root node cannot be modified"),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}
