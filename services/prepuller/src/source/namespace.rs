//! Namespace resolution for cluster discovery.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::PrepullError;

/// Sentinel accepted in `NAMESPACES` for "every namespace".
pub const ALL_NAMESPACES: &str = "*";

/// A single list target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Namespace {
    /// Cluster-wide list.
    All,
    /// One named namespace.
    Named(String),
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::All => f.write_str(ALL_NAMESPACES),
            Namespace::Named(name) => f.write_str(name),
        }
    }
}

/// Ordered namespaces to harvest, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceSet(Vec<Namespace>);

impl NamespaceSet {
    /// Resolve namespaces from the override, or from the service-account file.
    ///
    /// An override that holds no names after trimming is fatal, as is an
    /// unreadable or empty service-account file.
    pub fn resolve(
        override_value: Option<&str>,
        namespace_file: &Path,
    ) -> Result<Self, PrepullError> {
        match override_value {
            Some(value) => Self::parse_override(value),
            None => Self::from_service_account(namespace_file),
        }
    }

    /// Parse a comma-separated override.
    pub fn parse_override(value: &str) -> Result<Self, PrepullError> {
        let namespaces: Vec<Namespace> = crate::config::split_list(value)
            .into_iter()
            .map(|name| {
                if name == ALL_NAMESPACES {
                    Namespace::All
                } else {
                    Namespace::Named(name)
                }
            })
            .collect();

        if namespaces.is_empty() {
            return Err(PrepullError::NamespacesEmpty);
        }
        Ok(Self(namespaces))
    }

    fn from_service_account(path: &Path) -> Result<Self, PrepullError> {
        let contents = fs::read_to_string(path).map_err(|e| PrepullError::NamespaceUnresolved {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let name = contents.trim();
        if name.is_empty() {
            return Err(PrepullError::NamespaceUnresolved {
                path: path.to_path_buf(),
                detail: "file is empty".to_string(),
            });
        }
        Ok(Self(vec![Namespace::Named(name.to_string())]))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Namespace> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_override_preserves_order_and_wildcard() {
        let set = NamespaceSet::parse_override("team-a, *,team-b").unwrap();
        let namespaces: Vec<_> = set.iter().cloned().collect();
        assert_eq!(
            namespaces,
            vec![
                Namespace::Named("team-a".to_string()),
                Namespace::All,
                Namespace::Named("team-b".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_override_is_fatal() {
        for value in ["", " ", ",", " , "] {
            let err = NamespaceSet::parse_override(value).unwrap_err();
            assert_eq!(err.reason_code(), "namespaces_empty");
        }
    }

    #[test]
    fn test_override_wins_over_file() {
        let dir = tempdir().unwrap();
        let set = NamespaceSet::resolve(Some("prod"), &dir.path().join("missing")).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next(), Some(&Namespace::Named("prod".to_string())));
    }

    #[test]
    fn test_service_account_file_is_trimmed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("namespace");
        fs::write(&path, "harpoon\n").unwrap();

        let set = NamespaceSet::resolve(None, &path).unwrap();
        assert_eq!(set.iter().next(), Some(&Namespace::Named("harpoon".to_string())));
    }

    #[test]
    fn test_missing_service_account_file_is_fatal() {
        let dir = tempdir().unwrap();
        let err = NamespaceSet::resolve(None, &dir.path().join("namespace")).unwrap_err();
        assert_eq!(err.reason_code(), "namespace_unresolved");
    }

    #[test]
    fn test_blank_service_account_file_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("namespace");
        fs::write(&path, "  \n").unwrap();

        let err = NamespaceSet::resolve(None, &path).unwrap_err();
        assert_eq!(err.reason_code(), "namespace_unresolved");
    }

    #[test]
    fn test_display() {
        assert_eq!(Namespace::All.to_string(), "*");
        assert_eq!(Namespace::Named("kube-system".to_string()).to_string(), "kube-system");
    }
}
