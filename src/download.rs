use crate::config::DownloadSettings;
use crate::error::{InstallError, Result};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, LOCATION};
use reqwest::{redirect, Client, Response, Url};
use std::io::Write;
use std::time::Duration;
use tempfile::TempPath;

/// Fetches artifacts into private temporary files.
///
/// Redirects are followed by hand rather than by reqwest so that the headers
/// of the original request (including the license cookie) are carried onto
/// every hop, cross-host ones included.
pub struct Downloader {
    client: Client,
    settings: DownloadSettings,
}

impl Downloader {
    pub fn new(settings: &DownloadSettings) -> Result<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .user_agent(format!("jdkman/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| InstallError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    fn initial_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &self.settings.license_cookie {
            match HeaderValue::from_str(cookie) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(_) => tracing::warn!("Ignoring malformed license cookie {:?}", cookie),
            }
        }
        headers
    }

    async fn send(&self, url: &Url, headers: &HeaderMap) -> Result<Response> {
        self.client
            .get(url.clone())
            .headers(headers.clone())
            .send()
            .await
            .map_err(|source| InstallError::Http {
                url: url.to_string(),
                source,
            })
    }

    /// GET `url`, following up to `max_redirects` redirects.
    async fn fetch(&self, url: &str) -> Result<Response> {
        let mut current = Url::parse(url).map_err(|e| InstallError::InvalidRedirect {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let original = self.initial_headers();
        let mut headers = original.clone();
        let mut hops = 0;

        loop {
            let response = self.send(&current, &headers).await?;
            let status = response.status();
            if !status.is_redirection() {
                if !status.is_success() {
                    return Err(InstallError::HttpStatus {
                        url: current.to_string(),
                        status,
                    });
                }
                return Ok(response);
            }

            if hops >= self.settings.max_redirects {
                return Err(InstallError::TooManyRedirects {
                    url: url.to_string(),
                    max: self.settings.max_redirects,
                });
            }
            hops += 1;

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| InstallError::InvalidRedirect {
                    url: current.to_string(),
                    reason: format!("{} without a Location header", status),
                })?;
            let next = current
                .join(location)
                .map_err(|e| InstallError::InvalidRedirect {
                    url: current.to_string(),
                    reason: e.to_string(),
                })?;
            tracing::debug!("Following {} redirect to {}", status.as_u16(), next);

            if !self.settings.carry_headers_on_redirect {
                headers = HeaderMap::new();
            }
            current = next;
        }
    }

    /// Stream `url` into a fresh temporary file and return its path.
    ///
    /// The file is deleted when the returned [`TempPath`] is dropped.
    pub async fn download(&self, url: &str) -> Result<TempPath> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("jdkman-d-");
        let mut tmp = match &self.settings.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        tracing::debug!("Saving {} to {}", url, tmp.path().display());

        let response = self.fetch(url).await?;
        let total_size = response.content_length().unwrap_or(0);

        let pb = if total_size > 0 {
            let pb = ProgressBar::new(total_size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::new_spinner()
        };
        pb.set_message("Downloading");

        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| InstallError::Http {
                url: url.to_string(),
                source,
            })?;
            tmp.as_file_mut().write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }
        tmp.as_file_mut().flush()?;

        pb.finish_with_message("Download complete");
        Ok(tmp.into_temp_path())
    }
}
