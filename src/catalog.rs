//! Collaborators the installer consults: what is already installed locally,
//! and which versions can be fetched.

use crate::error::{InstallError, Result};
use crate::types::{PlatformInfo, ReleaseCatalog};
use semver::Version;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

pub trait InstalledVersions {
    fn installed(&self) -> Result<Vec<Version>>;
}

pub trait CatalogSource {
    async fn fetch(&self) -> Result<ReleaseCatalog>;
}

/// Versions present under `<root>/jdk`.
pub struct LocalInstalls {
    root: PathBuf,
}

impl LocalInstalls {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl InstalledVersions for LocalInstalls {
    fn installed(&self) -> Result<Vec<Version>> {
        let jdk_dir = self.root.join("jdk");
        let entries = match fs::read_dir(&jdk_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            match Version::parse(&name) {
                Ok(version) => versions.push(version),
                Err(_) => tracing::debug!("Ignoring {} in {}", name, jdk_dir.display()),
            }
        }
        versions.sort_by(|a, b| b.cmp(a));
        Ok(versions)
    }
}

/// `{ "<os>": { "<arch>": { "<version>": "<archiveType>+<url>" } } }`
type IndexDocument = HashMap<String, HashMap<String, HashMap<String, String>>>;

/// Catalog published as a JSON index at a configured URL.
pub struct RemoteIndex {
    url: Option<String>,
    platform: PlatformInfo,
}

impl RemoteIndex {
    pub fn new(url: Option<String>, platform: PlatformInfo) -> Self {
        Self { url, platform }
    }

    fn select(&self, mut index: IndexDocument) -> ReleaseCatalog {
        let entries = index
            .remove(&self.platform.os)
            .and_then(|mut by_arch| by_arch.remove(&self.platform.arch))
            .unwrap_or_default();

        entries
            .into_iter()
            .filter_map(|(version, source)| match Version::parse(&version) {
                Ok(version) => Some((version, source)),
                Err(e) => {
                    tracing::debug!("Skipping index entry {}: {}", version, e);
                    None
                }
            })
            .collect()
    }
}

impl CatalogSource for RemoteIndex {
    async fn fetch(&self) -> Result<ReleaseCatalog> {
        let url = self.url.as_deref().ok_or_else(|| {
            InstallError::Catalog(
                "no index configured; set JDKMAN_INDEX_URL or index_url in config.json".to_string(),
            )
        })?;
        tracing::debug!("Fetching release index from: {}", url);

        let response = reqwest::Client::new()
            .get(url)
            .header("User-Agent", format!("jdkman/{}", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .map_err(|source| InstallError::Http {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(InstallError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let index: IndexDocument = response
            .json()
            .await
            .map_err(|e| InstallError::Catalog(format!("{} is not a valid index: {}", url, e)))?;
        Ok(self.select(index))
    }
}
