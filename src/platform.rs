use crate::error::{InstallError, Result};
use crate::extract::{extract_bin, extract_dmg, extract_tgz, extract_zip};
use crate::shell::CommandRunner;
use crate::types::{ArchiveType, HostOs, PlatformInfo};
use std::fs;
use std::path::{Path, PathBuf};

pub fn get_system_info() -> PlatformInfo {
    let os = match std::env::consts::OS {
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    };
    PlatformInfo { os, arch }
}

/// One extraction routine per supported (os, archive type) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Tarball,
    SelfExtracting,
    Zip,
    DiskImage,
}

impl Strategy {
    pub fn select(os: HostOs, archive: ArchiveType) -> Result<Self> {
        match (os, archive) {
            (HostOs::Linux, ArchiveType::Bin) => Ok(Strategy::SelfExtracting),
            (HostOs::Linux, ArchiveType::Tgz) => Ok(Strategy::Tarball),
            (HostOs::Linux, ArchiveType::Zip) => Ok(Strategy::Zip),
            (HostOs::Darwin, ArchiveType::Dmg) => Ok(Strategy::DiskImage),
            (HostOs::Darwin, ArchiveType::Zip) => Ok(Strategy::Zip),
            (HostOs::Linux, ArchiveType::Dmg)
            | (HostOs::Darwin, ArchiveType::Tgz)
            | (HostOs::Darwin, ArchiveType::Bin) => Err(InstallError::UnsupportedArchive {
                archive: archive.to_string(),
                os: os.to_string(),
            }),
        }
    }
}

/// Directory expected to hold `bin/java` for an install rooted at `target`.
pub fn home_dir(os: HostOs, target: &Path) -> PathBuf {
    match os {
        HostOs::Linux => target.to_path_buf(),
        HostOs::Darwin => target.join("Contents").join("Home"),
    }
}

pub fn validate_home(home: &Path) -> Result<()> {
    if home.join("bin").join("java").exists() {
        Ok(())
    } else {
        Err(InstallError::MissingJava {
            home: home.to_path_buf(),
        })
    }
}

pub struct PlatformInstaller<'a, R: ?Sized> {
    root: &'a Path,
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> PlatformInstaller<'a, R> {
    pub fn new(root: &'a Path, runner: &'a R) -> Self {
        Self { root, runner }
    }

    pub fn target_dir(&self, version: &str) -> PathBuf {
        self.root.join("jdk").join(version)
    }

    /// Extract `source` into `<root>/jdk/<version>` and check the result.
    ///
    /// On any failure the whole version directory is removed so a broken
    /// install never shows up as installed. Returns the validated home dir.
    pub fn install(
        &self,
        os: HostOs,
        version: &str,
        source: &Path,
        archive: ArchiveType,
    ) -> Result<PathBuf> {
        let strategy = Strategy::select(os, archive)?;
        let target = self.target_dir(version);
        let home = home_dir(os, &target);

        let result = self
            .extract(strategy, source, &target, &home)
            .and_then(|_| validate_home(&home));

        if let Err(e) = result {
            if target.exists() {
                tracing::debug!("Removing partial install at {}", target.display());
                if let Err(cleanup) = fs::remove_dir_all(&target) {
                    tracing::warn!("Failed to remove {}: {}", target.display(), cleanup);
                }
            }
            return Err(e);
        }

        tracing::info!("Installed {} to {}", version, target.display());
        Ok(home)
    }

    fn extract(&self, strategy: Strategy, source: &Path, target: &Path, home: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        match strategy {
            Strategy::Tarball => extract_tgz(source, target),
            Strategy::SelfExtracting => extract_bin(self.runner, source, target),
            Strategy::Zip => extract_zip(source, home),
            Strategy::DiskImage => extract_dmg(self.runner, source, target),
        }
    }
}
