use crate::catalog::{CatalogSource, InstalledVersions};
use crate::config::Settings;
use crate::download::Downloader;
use crate::error::{InstallError, Result};
use crate::platform::{PlatformInstaller, Strategy};
use crate::shell::{CommandRunner, ShellRunner};
use crate::types::{HostOs, ReleaseCatalog, SourceDescriptor};
use crate::version::{parse_version, select, Constraint};
use semver::Version;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// A parsed install selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `<version>=<qualified url>`: install exactly this artifact.
    Pinned { version: Version, source: String },
    Constraint(Constraint),
}

impl Selector {
    /// `=` also appears in range operators (`>=9`), so only a right-hand
    /// side that looks like a URL makes a pin.
    pub fn parse(selector: &str) -> Result<Self> {
        match selector
            .split_once('=')
            .filter(|(_, source)| source.contains("://"))
        {
            Some((version, source)) => Ok(Selector::Pinned {
                version: parse_version(version)?,
                source: source.to_string(),
            }),
            None => Constraint::parse(selector).map(Selector::Constraint),
        }
    }

    pub fn exact_version(&self) -> Option<&Version> {
        match self {
            Selector::Pinned { version, .. } => Some(version),
            Selector::Constraint(Constraint::Exact(version)) => Some(version),
            Selector::Constraint(Constraint::Range(_)) => None,
        }
    }
}

/// Where the artifact to extract lives for the duration of an install.
enum Staged {
    Local(PathBuf),
    Downloaded(TempPath),
}

impl Staged {
    fn path(&self) -> &Path {
        match self {
            Staged::Local(path) => path.as_path(),
            Staged::Downloaded(path) => &**path,
        }
    }

    /// Keep a downloaded file around past the end of the install.
    fn keep(self) {
        if let Staged::Downloaded(path) = self {
            match path.keep() {
                Ok(kept) => tracing::warn!("Keeping downloaded file {} for inspection", kept.display()),
                Err(e) => tracing::warn!("Could not keep downloaded file: {}", e),
            }
        }
    }
}

pub struct Installer<L, C, R = ShellRunner> {
    root: PathBuf,
    settings: Settings,
    installed: L,
    catalog: C,
    runner: R,
    host_os: String,
}

impl<L, C> Installer<L, C, ShellRunner>
where
    L: InstalledVersions,
    C: CatalogSource,
{
    pub fn new(root: impl Into<PathBuf>, settings: Settings, installed: L, catalog: C) -> Self {
        Self {
            root: root.into(),
            settings,
            installed,
            catalog,
            runner: ShellRunner,
            host_os: std::env::consts::OS.to_string(),
        }
    }
}

impl<L, C, R> Installer<L, C, R>
where
    L: InstalledVersions,
    C: CatalogSource,
    R: CommandRunner,
{
    #[cfg(test)]
    pub fn with_runner<R2: CommandRunner>(self, runner: R2) -> Installer<L, C, R2> {
        Installer {
            root: self.root,
            settings: self.settings,
            installed: self.installed,
            catalog: self.catalog,
            runner,
            host_os: self.host_os,
        }
    }

    #[cfg(test)]
    pub fn with_host_os(mut self, os: impl Into<String>) -> Self {
        self.host_os = os.into();
        self
    }

    /// Install whatever `selector` resolves to and return the concrete version.
    ///
    /// Already-installed exact versions are returned without touching the
    /// network. On failure nothing is left under `<root>/jdk/<version>`.
    pub async fn install(&self, selector: &str) -> Result<String> {
        let request = Selector::parse(selector)?;

        if let Some(version) = request.exact_version() {
            if self.installed.installed()?.contains(version) {
                tracing::info!("{} is already installed", version);
                return Ok(version.to_string());
            }
        }

        let (version, qualified) = match request {
            Selector::Pinned { version, source } => (version, source),
            Selector::Constraint(constraint) => {
                let catalog: ReleaseCatalog = self.catalog.fetch().await?;
                let (version, source) = select(selector, &constraint, &catalog)?;
                (version.clone(), source.clone())
            }
        };

        let source = SourceDescriptor::parse(&qualified)?;
        let os = HostOs::from_name(&self.host_os)?;
        let archive = source
            .archive_type()
            .ok_or_else(|| InstallError::UnsupportedArchive {
                archive: source.qualifier.clone(),
                os: os.to_string(),
            })?;
        Strategy::select(os, archive)?;

        let staged = self.acquire(&version, &source).await?;
        let installer = PlatformInstaller::new(&self.root, &self.runner);
        match installer.install(os, &version.to_string(), staged.path(), archive) {
            Ok(_) => Ok(version.to_string()),
            Err(e) => {
                if self.settings.keep_failed_downloads {
                    staged.keep();
                }
                Err(e)
            }
        }
    }

    async fn acquire(&self, version: &Version, source: &SourceDescriptor) -> Result<Staged> {
        if let Some(path) = source.local_path() {
            return Ok(Staged::Local(path));
        }
        tracing::info!("Downloading {} ({})", version, source.url);
        let downloader = Downloader::new(&self.settings.download)?;
        let path = downloader.download(&source.url).await?;
        Ok(Staged::Downloaded(path))
    }
}
