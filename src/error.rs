use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("'{input}' is not a valid version: {source}")]
    InvalidVersion {
        input: String,
        source: semver::Error,
    },

    #[error("'{input}' is not a valid version range: {source}")]
    InvalidRange {
        input: String,
        source: semver::Error,
    },

    #[error("No compatible version found for {selector}\nValid install targets: {}", .candidates.join(", "))]
    NoCompatibleVersion {
        selector: String,
        candidates: Vec<String>,
    },

    #[error("URL must contain qualifier, e.g. tgz+http://... (got '{url}')")]
    MissingQualifier { url: String },

    #[error("{archive} is not supported on {os}")]
    UnsupportedArchive { archive: String, os: String },

    #[error("{0} OS is not supported")]
    UnsupportedPlatform(String),

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    #[error("Request to {url} failed with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Too many redirects (more than {max}) while fetching {url}")]
    TooManyRedirects { url: String, max: usize },

    #[error("Invalid redirect from {url}: {reason}")]
    InvalidRedirect { url: String, reason: String },

    #[error("'{command}' failed: {reason}")]
    Command { command: String, reason: String },

    #[error("Failed to extract {}: {source}", .archive.display())]
    Archive {
        archive: PathBuf,
        source: io::Error,
    },

    #[error("Failed to extract {}: {source}", .archive.display())]
    Zip {
        archive: PathBuf,
        source: zip::result::ZipError,
    },

    #[error(
        "{}/bin/java wasn't found. If you believe this is an error - please file an issue \
         (specify OS and version/URL you tried to install)",
        .home.display()
    )]
    MissingJava { home: PathBuf },

    #[error("Could not fetch release catalog: {0}")]
    Catalog(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, InstallError>;
