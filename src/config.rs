use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = ".jdkman";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LICENSE_COOKIE: &str = "oraclelicense=accept-securebackup-cookie";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownloadSettings {
    /// Cap on a whole download, body transfer included, not just the response.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Re-send the original request headers on every redirect hop.
    #[serde(default = "default_carry_headers")]
    pub carry_headers_on_redirect: bool,
    /// Cookie some vendor download endpoints require before serving a JDK.
    #[serde(default = "default_license_cookie")]
    pub license_cookie: Option<String>,
    /// Where in-flight downloads are written; the system temp dir when unset.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    3600
}
fn default_connect_timeout_secs() -> u64 {
    30
}
fn default_max_redirects() -> usize {
    10
}
fn default_carry_headers() -> bool {
    true
}
fn default_license_cookie() -> Option<String> {
    Some(LICENSE_COOKIE.to_string())
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_redirects: default_max_redirects(),
            carry_headers_on_redirect: default_carry_headers(),
            license_cookie: default_license_cookie(),
            temp_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub index_url: Option<String>,
    #[serde(default)]
    pub keep_failed_downloads: bool,
    #[serde(default)]
    pub download: DownloadSettings,
}

pub fn get_install_root() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("JDKMAN_DIR") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let path = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
        .join(APP_DIR_NAME);
    tracing::debug!("Install root: {}", path.display());
    Ok(path)
}

fn parse_flag(value: &str) -> bool {
    value.to_lowercase() == "true" || value == "1"
}

pub fn load_settings(root: &Path) -> Result<Settings> {
    let config_path = root.join(CONFIG_FILE_NAME);

    let mut settings = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Could not read config file at {}", config_path.display()))?;
        serde_json::from_str(&content).with_context(|| "Could not parse config file as JSON")?
    } else {
        Settings::default()
    };

    if let Ok(url) = std::env::var("JDKMAN_INDEX_URL") {
        settings.index_url = Some(url);
    }

    if let Ok(timeout) = std::env::var("JDKMAN_DOWNLOAD_TIMEOUT") {
        if let Ok(secs) = timeout.parse::<u64>() {
            settings.download.timeout_secs = secs;
        }
    }

    if let Ok(keep) = std::env::var("JDKMAN_KEEP_FAILED_DOWNLOADS") {
        settings.keep_failed_downloads = parse_flag(&keep);
    }

    Ok(settings)
}
