//! Image references as harvested from workloads or the static list.

use std::fmt;

/// An opaque container image reference (`registry/repo:tag` or `repo@digest`).
///
/// References compare by exact string value. No normalization happens, so
/// `nginx` and `docker.io/library/nginx:latest` are distinct images here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference(String);

impl ImageReference {
    /// The reference as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the reference starts with `prefix`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Whether the reference contains `fragment` anywhere (e.g. a registry host).
    pub fn mentions(&self, fragment: &str) -> bool {
        self.0.contains(fragment)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ImageReference {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

impl From<&str> for ImageReference {
    fn from(reference: &str) -> Self {
        Self(reference.to_string())
    }
}
