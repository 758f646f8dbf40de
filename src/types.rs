use crate::error::{InstallError, Result};
use regex::Regex;
use semver::Version;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Version → qualified source (`<archiveType>+<url>`).
pub type ReleaseCatalog = HashMap<Version, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveType {
    Dmg,
    Zip,
    Tgz,
    Bin,
}

impl ArchiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveType::Dmg => "dmg",
            ArchiveType::Zip => "zip",
            ArchiveType::Tgz => "tgz",
            ArchiveType::Bin => "bin",
        }
    }
}

impl fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host operating systems an install can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    Darwin,
}

impl HostOs {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "linux" => Ok(HostOs::Linux),
            "macos" | "darwin" => Ok(HostOs::Darwin),
            other => Err(InstallError::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HostOs::Linux => "linux",
            HostOs::Darwin => "darwin",
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Raw qualifier as written before the first `+`.
    pub qualifier: String,
    pub url: String,
}

fn qualified_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\w+[+]\w+://").expect("static pattern is valid"))
}

impl SourceDescriptor {
    /// Split `<archiveType>+<scheme>://...` on its first `+`.
    ///
    /// The qualifier is mandatory; it is never guessed from the file extension.
    pub fn parse(qualified: &str) -> Result<Self> {
        if !qualified_url_pattern().is_match(qualified) {
            return Err(InstallError::MissingQualifier {
                url: qualified.to_string(),
            });
        }
        let (qualifier, url) = qualified
            .split_once('+')
            .ok_or_else(|| InstallError::MissingQualifier {
                url: qualified.to_string(),
            })?;
        Ok(SourceDescriptor {
            qualifier: qualifier.to_string(),
            url: url.to_string(),
        })
    }

    /// Archive type named by the qualifier, if it is one we know how to extract.
    pub fn archive_type(&self) -> Option<ArchiveType> {
        match self.qualifier.as_str() {
            "dmg" => Some(ArchiveType::Dmg),
            "zip" => Some(ArchiveType::Zip),
            "tgz" => Some(ArchiveType::Tgz),
            "bin" => Some(ArchiveType::Bin),
            _ => None,
        }
    }

    /// Path on disk for `file://` sources; `None` for anything to download.
    pub fn local_path(&self) -> Option<PathBuf> {
        self.url.strip_prefix("file://").map(PathBuf::from)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
}
