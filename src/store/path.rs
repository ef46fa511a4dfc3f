//! Validated document paths
//!
//! A `TreePath` addresses a node in the document tree as a sequence of
//! slash-separated segments (`accounts/u1/posts/p1`). Segments must be
//! non-empty and must not contain any of `. # $ [ ]` (or `/`, which is the
//! separator). The empty path addresses the root of the tree.

use crate::store::error::{StoreError, StoreResult};
use std::fmt;
use std::str::FromStr;

/// Characters that may not appear in a path segment
pub const FORBIDDEN_CHARS: &[char] = &['.', '#', '$', '[', ']'];

/// Maximum number of segments in a path
pub const MAX_DEPTH: usize = 32;

/// A validated path into the document tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreePath {
    segments: Vec<String>,
}

impl TreePath {
    /// The root path (zero segments)
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse and validate a slash-separated path
    ///
    /// Leading and trailing slashes are tolerated; the empty string (or a
    /// bare `/`) parses to the root.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            validate_segment(segment)?;
            segments.push(segment.to_string());
        }

        if segments.len() > MAX_DEPTH {
            return Err(StoreError::InvalidPath(format!(
                "path depth {} exceeds maximum {}",
                segments.len(),
                MAX_DEPTH
            )));
        }

        Ok(Self { segments })
    }

    /// Path segments in order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Final segment, if any
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    /// Parent path (None for the root)
    pub fn parent(&self) -> Option<TreePath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(TreePath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Extend with one validated child segment
    pub fn child(&self, segment: &str) -> StoreResult<TreePath> {
        validate_segment(segment)?;
        if self.segments.len() + 1 > MAX_DEPTH {
            return Err(StoreError::InvalidPath(format!(
                "path depth {} exceeds maximum {}",
                self.segments.len() + 1,
                MAX_DEPTH
            )));
        }
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(TreePath { segments })
    }

    /// Whether `prefix` is a segment-wise prefix of this path
    ///
    /// The root is a prefix of everything.
    pub fn starts_with(&self, prefix: &TreePath) -> bool {
        if prefix.segments.len() > self.segments.len() {
            return false;
        }
        self.segments[..prefix.segments.len()] == prefix.segments[..]
    }
}

/// Validate a single path segment
fn validate_segment(segment: &str) -> StoreResult<()> {
    if segment.is_empty() {
        return Err(StoreError::InvalidPath("empty segment".to_string()));
    }
    if segment.contains('/') {
        return Err(StoreError::InvalidPath(format!(
            "segment '{}' contains '/'",
            segment
        )));
    }
    if let Some(c) = segment.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(StoreError::InvalidPath(format!(
            "segment '{}' contains forbidden character '{}'",
            segment, c
        )));
    }
    Ok(())
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl FromStr for TreePath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TreePath::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let path = TreePath::parse("accounts/u1/posts/p1").unwrap();
        assert_eq!(path.depth(), 4);
        assert_eq!(path.segments()[0], "accounts");
        assert_eq!(path.leaf(), Some("p1"));
        assert_eq!(path.to_string(), "accounts/u1/posts/p1");
    }

    #[test]
    fn test_parse_root() {
        assert!(TreePath::parse("").unwrap().is_root());
        assert!(TreePath::parse("/").unwrap().is_root());
        assert_eq!(TreePath::root().to_string(), "");
    }

    #[test]
    fn test_parse_trims_slashes() {
        let path = TreePath::parse("/groups/rustaceans/").unwrap();
        assert_eq!(path.depth(), 2);
        assert_eq!(path.to_string(), "groups/rustaceans");
    }

    #[test]
    fn test_forbidden_characters() {
        for bad in ["accounts/u.1", "a#b", "price$", "tags[0]", "x]y"] {
            assert!(
                matches!(TreePath::parse(bad), Err(StoreError::InvalidPath(_))),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_empty_segment_rejected() {
        assert!(matches!(
            TreePath::parse("accounts//posts"),
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_max_depth() {
        let deep = vec!["x"; MAX_DEPTH].join("/");
        assert!(TreePath::parse(&deep).is_ok());

        let too_deep = vec!["x"; MAX_DEPTH + 1].join("/");
        assert!(matches!(
            TreePath::parse(&too_deep),
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_parent_and_child() {
        let path = TreePath::parse("accounts/u1").unwrap();
        let posts = path.child("posts").unwrap();
        assert_eq!(posts.to_string(), "accounts/u1/posts");
        assert_eq!(posts.parent().unwrap(), path);
        assert_eq!(TreePath::root().parent(), None);
        assert!(path.child("bad#segment").is_err());
    }

    #[test]
    fn test_starts_with() {
        let root = TreePath::root();
        let prefix = TreePath::parse("accounts/u1").unwrap();
        let full = TreePath::parse("accounts/u1/posts/p1").unwrap();
        let other = TreePath::parse("accounts/u10").unwrap();

        assert!(full.starts_with(&prefix));
        assert!(full.starts_with(&root));
        assert!(prefix.starts_with(&prefix));
        assert!(!prefix.starts_with(&full));
        // "accounts/u10" must not match the "accounts/u1" prefix
        assert!(!other.starts_with(&prefix));
    }
}
