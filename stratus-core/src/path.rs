//! Virtual path type for the filesystem façade
//!
//! Paths are absolute, `/`-separated and normalized at construction.
//! The path namespace is partitioned per user; a `VirtualPath` never
//! touches the local filesystem.

use crate::error::{Result, StratusError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized absolute path rooted at `/`
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VirtualPath(String);

impl VirtualPath {
    /// The root path `/`
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse and normalize a path
    ///
    /// Rejects relative paths, empty components, `.`/`..` and embedded NUL.
    pub fn parse(path: &str) -> Result<Self> {
        if !path.starts_with('/') {
            return Err(StratusError::InvalidPath(format!(
                "path must be absolute: {path:?}"
            )));
        }
        if path.contains('\0') {
            return Err(StratusError::InvalidPath("path contains NUL".to_string()));
        }

        let mut components = Vec::new();
        for part in path.split('/') {
            match part {
                "" => continue, // collapses doubled and trailing slashes
                "." | ".." => {
                    return Err(StratusError::InvalidPath(format!(
                        "path must not contain {part:?}: {path:?}"
                    )))
                }
                _ => components.push(part),
            }
        }

        if components.is_empty() {
            return Ok(Self::root());
        }
        Ok(Self(format!("/{}", components.join("/"))))
    }

    /// The path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Final component of the path; `None` for root
    pub fn name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }

    /// Parent directory; `None` for root
    pub fn parent(&self) -> Option<VirtualPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Append a single component
    pub fn join(&self, name: &str) -> Result<VirtualPath> {
        if name.is_empty() || name.contains('/') {
            return Err(StratusError::InvalidPath(format!(
                "invalid path component: {name:?}"
            )));
        }
        if self.is_root() {
            Self::parse(&format!("/{name}"))
        } else {
            Self::parse(&format!("{}/{name}", self.0))
        }
    }

    /// Proper ancestors, nearest first, ending with root
    ///
    /// `/a/b/c` yields `/a/b`, `/a`, `/`.
    pub fn ancestors(&self) -> Vec<VirtualPath> {
        let mut out = Vec::new();
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            out.push(parent.clone());
            current = parent;
        }
        out
    }

    /// True if `self` is `other` or lies below it
    pub fn starts_with(&self, other: &VirtualPath) -> bool {
        if other.is_root() {
            return true;
        }
        self.0 == other.0 || self.0.starts_with(&format!("{}/", other.0))
    }
}

impl fmt::Debug for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtualPath({})", self.0)
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for VirtualPath {
    type Error = StratusError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VirtualPath> for String {
    fn from(path: VirtualPath) -> Self {
        path.0
    }
}

impl std::str::FromStr for VirtualPath {
    type Err = StratusError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_normalize() {
        assert_eq!(VirtualPath::parse("/").unwrap().as_str(), "/");
        assert_eq!(VirtualPath::parse("/a/b").unwrap().as_str(), "/a/b");
        assert_eq!(VirtualPath::parse("//a///b/").unwrap().as_str(), "/a/b");
    }

    #[test]
    fn test_parse_rejects_bad_paths() {
        assert!(VirtualPath::parse("relative").is_err());
        assert!(VirtualPath::parse("/a/../b").is_err());
        assert!(VirtualPath::parse("/a/./b").is_err());
        assert!(VirtualPath::parse("/a\0b").is_err());
    }

    #[test]
    fn test_parent_and_name() {
        let path = VirtualPath::parse("/a/b/c").unwrap();
        assert_eq!(path.name(), Some("c"));
        assert_eq!(path.parent().unwrap().as_str(), "/a/b");

        let top = VirtualPath::parse("/a").unwrap();
        assert_eq!(top.parent().unwrap().as_str(), "/");

        assert_eq!(VirtualPath::root().parent(), None);
        assert_eq!(VirtualPath::root().name(), None);
    }

    #[test]
    fn test_join() {
        let base = VirtualPath::parse("/a").unwrap();
        assert_eq!(base.join("b").unwrap().as_str(), "/a/b");
        assert_eq!(VirtualPath::root().join("x").unwrap().as_str(), "/x");
        assert!(base.join("b/c").is_err());
        assert!(base.join("").is_err());
    }

    #[test]
    fn test_ancestors() {
        let path = VirtualPath::parse("/a/b/c").unwrap();
        let ancestors: Vec<String> = path
            .ancestors()
            .into_iter()
            .map(|p| p.as_str().to_string())
            .collect();
        assert_eq!(ancestors, vec!["/a/b", "/a", "/"]);
    }

    #[test]
    fn test_starts_with() {
        let a = VirtualPath::parse("/a").unwrap();
        let ab = VirtualPath::parse("/a/b").unwrap();
        let ax = VirtualPath::parse("/ax").unwrap();

        assert!(ab.starts_with(&a));
        assert!(a.starts_with(&VirtualPath::root()));
        assert!(!ax.starts_with(&a));
        assert!(!a.starts_with(&ab));
    }
}
