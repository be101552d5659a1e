//! Locator resolution and byte transport.

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::LoadError;

/// Read buffer size for streamed HTTP bodies.
const CHUNK_SIZE: usize = 64 * 1024;
/// Upper bound on the up-front allocation trusted from `Content-Length`.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Where an asset's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Absolute `http`/`https` URL.
    Http(String),
    /// Local filesystem path.
    File(PathBuf),
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn is_http(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Split an absolute URL into `scheme://authority` and the remainder.
fn split_origin(url: &str) -> (&str, &str) {
    let after_scheme = url.find("://").map_or(0, |i| i + 3);
    match url[after_scheme..].find(&['/', '?', '#'][..]) {
        Some(i) => url.split_at(after_scheme + i),
        None => (url, ""),
    }
}

/// Collapse `.` and `..` segments of an absolute URL path.
fn normalize_path(path: &str) -> String {
    let (path, suffix) = match path.find(&['?', '#'][..]) {
        Some(i) => path.split_at(i),
        None => (path, ""),
    };
    let mut segments: Vec<&str> = Vec::new();
    let parts: Vec<&str> = path.split('/').skip(1).collect();
    for (i, part) in parts.iter().enumerate() {
        let last = i + 1 == parts.len();
        match *part {
            "." => {
                if last {
                    segments.push("");
                }
            }
            ".." => {
                let _ = segments.pop();
                if last {
                    segments.push("");
                }
            }
            other => segments.push(other),
        }
    }
    format!("/{}{suffix}", segments.join("/"))
}

/// Resolve an asset URL against an optional base.
///
/// Absolute `http(s)` URLs are kept as-is and `file://` URLs become paths.
/// With an `http(s)` base, protocol-relative URLs take the base scheme,
/// root-relative URLs join the base origin and other URLs join the base
/// path's directory. A non-URL base is treated as a directory. Without a
/// base, anything else is a filesystem path.
#[must_use]
pub fn resolve_url(url: &str, base: Option<&str>) -> Locator {
    let url = url.trim();
    if is_http(url) {
        return Locator::Http(url.to_owned());
    }
    if let Some(path) = url.strip_prefix("file://") {
        return Locator::File(PathBuf::from(path));
    }
    let Some(base) = base.map(str::trim).filter(|b| !b.is_empty()) else {
        return Locator::File(PathBuf::from(url));
    };
    if !is_http(base) {
        return Locator::File(PathBuf::from(base).join(url));
    }

    let (origin, base_path) = split_origin(base);
    if let Some(rest) = url.strip_prefix("//") {
        let scheme = &origin[..origin.find("://").unwrap_or(0)];
        return Locator::Http(format!("{scheme}://{rest}"));
    }
    if url.starts_with('/') {
        return Locator::Http(format!("{origin}{}", normalize_path(url)));
    }
    let base_path = base_path
        .find(&['?', '#'][..])
        .map_or(base_path, |i| &base_path[..i]);
    let dir = base_path.rfind('/').map_or("/", |i| &base_path[..=i]);
    Locator::Http(format!("{origin}{}", normalize_path(&format!("{dir}{url}"))))
}

/// Byte transport for asset loads. Runs on the loader thread.
pub trait Fetch: Send + Sync {
    /// Fetch the complete payload at `locator`, reporting download
    /// progress in `0.0..=1.0` when the total size is known.
    ///
    /// # Errors
    ///
    /// [`LoadError::Network`] for transport failures and non-2xx statuses,
    /// [`LoadError::Timeout`] when the request exceeds its deadline.
    fn fetch(
        &self,
        locator: &Locator,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Vec<u8>, LoadError>;
}

/// Default [`Fetch`]: HTTP(S) via ureq, local paths via `std::fs`.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Fetcher whose requests fail with [`LoadError::Timeout`] after
    /// `timeout` in total.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }

    fn fetch_http(
        &self,
        url: &str,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Vec<u8>, LoadError> {
        let response = self.agent.get(url).call().map_err(map_ureq_error)?;
        let total = response.body().content_length().filter(|&n| n > 0);
        let mut reader = response.into_body().into_reader();

        let capacity = total.map_or(0, |n| n.min(MAX_PREALLOC)) as usize;
        let mut bytes = Vec::with_capacity(capacity);
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let n = reader.read(&mut chunk).map_err(map_io_error)?;
            if n == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..n]);
            if let Some(total) = total {
                progress((bytes.len() as f64 / total as f64).min(1.0) as f32);
            }
        }
        Ok(bytes)
    }
}

impl Fetch for HttpFetcher {
    fn fetch(
        &self,
        locator: &Locator,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Vec<u8>, LoadError> {
        let bytes = match locator {
            Locator::Http(url) => self.fetch_http(url, progress)?,
            Locator::File(path) => std::fs::read(path).map_err(|e| {
                LoadError::Network(format!("{}: {e}", path.display()))
            })?,
        };
        progress(1.0);
        Ok(bytes)
    }
}

fn map_ureq_error(e: ureq::Error) -> LoadError {
    match e {
        ureq::Error::StatusCode(code) => LoadError::Network(format!("HTTP status {code}")),
        ureq::Error::Timeout(_) => LoadError::Timeout,
        ureq::Error::Io(io) => map_io_error(io),
        other => LoadError::Network(other.to_string()),
    }
}

fn map_io_error(e: std::io::Error) -> LoadError {
    if e.kind() == std::io::ErrorKind::TimedOut {
        LoadError::Timeout
    } else {
        LoadError::Network(e.to_string())
    }
}
