use crate::error::{InstallError, Result};
use crate::types::ReleaseCatalog;
use semver::{Version, VersionReq};

pub fn parse_version(input: &str) -> Result<Version> {
    Version::parse(input).map_err(|source| InstallError::InvalidVersion {
        input: input.to_string(),
        source,
    })
}

pub fn parse_range(input: &str) -> Result<VersionReq> {
    VersionReq::parse(input).map_err(|source| InstallError::InvalidRange {
        input: input.to_string(),
        source,
    })
}

/// What a selector asks for once it has been parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// A fully specified version; only that exact version satisfies it.
    Exact(Version),
    Range(VersionReq),
}

impl Constraint {
    /// Exact versions win over ranges: `1.8.0` means `=1.8.0`, not `^1.8.0`.
    pub fn parse(selector: &str) -> Result<Self> {
        match Version::parse(selector) {
            Ok(version) => Ok(Constraint::Exact(version)),
            Err(_) => parse_range(selector).map(Constraint::Range),
        }
    }

    pub fn contains(&self, version: &Version) -> bool {
        match self {
            Constraint::Exact(exact) => exact == version,
            Constraint::Range(range) => range.matches(version),
        }
    }
}

/// Catalog versions, newest first.
pub fn sorted_descending(catalog: &ReleaseCatalog) -> Vec<&Version> {
    let mut versions: Vec<&Version> = catalog.keys().collect();
    versions.sort_by(|a, b| b.cmp(a));
    versions
}

/// Pick the newest catalog version satisfying `constraint`.
pub fn select<'a>(
    selector: &str,
    constraint: &Constraint,
    catalog: &'a ReleaseCatalog,
) -> Result<(&'a Version, &'a String)> {
    let versions = sorted_descending(catalog);
    let chosen = versions
        .iter()
        .copied()
        .find(|version| constraint.contains(version));

    match chosen.and_then(|version| catalog.get_key_value(version)) {
        Some(entry) => {
            tracing::debug!("Resolved {} to {}", selector, entry.0);
            Ok(entry)
        }
        None => Err(InstallError::NoCompatibleVersion {
            selector: selector.to_string(),
            candidates: versions.iter().map(|v| v.to_string()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    fn catalog(versions: &[&str]) -> ReleaseCatalog {
        versions
            .iter()
            .map(|v| {
                (
                    Version::parse(v).unwrap(),
                    format!("tgz+https://example.com/jdk-{}.tgz", v),
                )
            })
            .collect()
    }

    #[test]
    fn test_version_round_trips() {
        for input in ["1.8.0", "9.0.4", "1.8.0-rc.1", "11.0.2+9", "1.2.3-beta.2+build.5"] {
            let version = parse_version(input).unwrap();
            assert_eq!(version.to_string(), input);
            assert_eq!(parse_version(&version.to_string()).unwrap(), version);
        }
    }

    #[test]
    fn test_invalid_version_and_range() {
        assert!(matches!(
            parse_version("1.8"),
            Err(InstallError::InvalidVersion { .. })
        ));
        assert!(matches!(
            parse_range("not a range"),
            Err(InstallError::InvalidRange { .. })
        ));
        assert!(matches!(
            Constraint::parse(">>1"),
            Err(InstallError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_total_order() {
        let versions: Vec<Version> = ["1.8.0", "1.8.1", "9.0.0", "1.8.0-rc.1", "1.8.0"]
            .iter()
            .map(|v| parse_version(v).unwrap())
            .collect();
        for a in &versions {
            for b in &versions {
                let relations = [a < b, a == b, a > b];
                assert_eq!(relations.iter().filter(|r| **r).count(), 1);
                assert_eq!(a == b, a.cmp(b) == Ordering::Equal);
            }
        }
    }

    #[test]
    fn test_descending_scan_matches_ascending_reverse_scan() {
        let catalog = catalog(&["1.8.0", "1.8.1", "9.0.0", "1.7.5", "1.8.2-ea"]);
        let constraint = Constraint::parse("^1.7").unwrap();

        let first_descending = sorted_descending(&catalog)
            .into_iter()
            .find(|v| constraint.contains(v))
            .cloned();

        let mut ascending: Vec<&Version> = catalog.keys().collect();
        ascending.sort();
        let last_ascending = ascending
            .into_iter()
            .rev()
            .find(|v| constraint.contains(v))
            .cloned();

        assert_eq!(first_descending, last_ascending);
        assert_eq!(first_descending, Some(Version::new(1, 8, 1)));
    }

    #[test]
    fn test_caret_range_prefers_newest_match() {
        let catalog = catalog(&["1.8.0", "1.8.1", "9.0.0"]);
        let constraint = Constraint::parse("^1.8.0").unwrap();
        let (version, url) = select("^1.8.0", &constraint, &catalog).unwrap();
        assert_eq!(version.to_string(), "1.8.1");
        assert_eq!(url, "tgz+https://example.com/jdk-1.8.1.tgz");
    }

    #[test]
    fn test_exact_selector_does_not_float() {
        let catalog = catalog(&["1.8.0", "1.8.1"]);
        let constraint = Constraint::parse("1.8.0").unwrap();
        assert_eq!(constraint, Constraint::Exact(Version::new(1, 8, 0)));
        let (version, _) = select("1.8.0", &constraint, &catalog).unwrap();
        assert_eq!(version.to_string(), "1.8.0");
    }

    #[test]
    fn test_no_match_lists_every_candidate() {
        let catalog = catalog(&["1.8.0", "9.0.0", "1.8.1"]);
        let constraint = Constraint::parse("^10").unwrap();
        let err = select("^10", &constraint, &catalog).unwrap_err();
        match &err {
            InstallError::NoCompatibleVersion {
                selector,
                candidates,
            } => {
                assert_eq!(selector, "^10");
                assert_eq!(candidates, &["9.0.0", "1.8.1", "1.8.0"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            err.to_string(),
            "No compatible version found for ^10\nValid install targets: 9.0.0, 1.8.1, 1.8.0"
        );
    }

    #[test]
    fn test_empty_catalog_fails() {
        let catalog = ReleaseCatalog::new();
        let constraint = Constraint::parse("*").unwrap();
        assert!(matches!(
            select("*", &constraint, &catalog),
            Err(InstallError::NoCompatibleVersion { .. })
        ));
    }
}
