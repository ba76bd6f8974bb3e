// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{GatewayError, Result};
use percent_encoding::percent_decode_str;

/// A request path split into its non-empty segments.
///
/// `display` keeps the decoded path as the client sent it (it is what the
/// listing heading shows); `segments` drives lookups and cache placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    display: String,
    segments: Vec<String>,
}

impl RequestPath {
    /// Percent-decodes and splits a raw URL path.
    ///
    /// `.` and `..` segments are rejected: they would step outside the cache
    /// root when the path is mapped onto the local filesystem.
    pub fn parse(raw: &str) -> Result<Self> {
        let decoded = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|_| GatewayError::InvalidPath(raw.to_string()))?;
        let display = if decoded.starts_with('/') {
            decoded.to_string()
        } else {
            format!("/{}", decoded)
        };

        let mut segments = Vec::new();
        for segment in display.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." || segment.contains('\0') {
                return Err(GatewayError::InvalidPath(display));
            }
            segments.push(segment.to_string());
        }

        Ok(Self { display, segments })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.display
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Splits into parent segments and the final name, if there is one
    #[must_use]
    pub fn split_last(&self) -> Option<(&[String], &str)> {
        self.segments
            .split_last()
            .map(|(name, parents)| (parents, name.as_str()))
    }
}

impl std::fmt::Display for RequestPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_forms() {
        assert!(RequestPath::parse("/").unwrap().is_root());
        assert!(RequestPath::parse("").unwrap().is_root());
        assert!(RequestPath::parse("//").unwrap().is_root());
        assert_eq!(RequestPath::parse("").unwrap().as_str(), "/");
    }

    #[test]
    fn test_empty_segments_discarded() {
        let path = RequestPath::parse("/a//b/c/").unwrap();
        assert_eq!(path.segments(), ["a", "b", "c"]);
        assert_eq!(path.as_str(), "/a//b/c/");
    }

    #[test]
    fn test_percent_decoding() {
        let path = RequestPath::parse("/my%20docs/r%C3%A9sum%C3%A9.txt").unwrap();
        assert_eq!(path.segments(), ["my docs", "résumé.txt"]);
        assert_eq!(path.as_str(), "/my docs/résumé.txt");
    }

    #[test]
    fn test_dot_segments_rejected() {
        assert!(matches!(
            RequestPath::parse("/a/../etc/passwd"),
            Err(GatewayError::InvalidPath(_))
        ));
        assert!(RequestPath::parse("/a/./b").is_err());
        assert!(RequestPath::parse("/a/%2E%2E/b").is_err());
        assert!(RequestPath::parse("/bad%FF").is_err());
    }

    #[test]
    fn test_split_last() {
        let path = RequestPath::parse("/a/b/file.txt").unwrap();
        let (parents, name) = path.split_last().unwrap();
        assert_eq!(parents, ["a", "b"]);
        assert_eq!(name, "file.txt");
        assert!(RequestPath::parse("/").unwrap().split_last().is_none());
    }
}
