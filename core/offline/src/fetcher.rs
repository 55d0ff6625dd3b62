//! Network access for the offline worker.

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::http::{CachedResponse, Request};
use nightops_common::{Error, Result};

/// Source of network responses.
///
/// An `Err` means the network itself failed (no connectivity); HTTP error
/// statuses are returned as responses.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<CachedResponse>;
}

/// Serves requests from a local directory, mapping the URL path onto it.
///
/// Path segments are percent-decoded. Missing files answer 404. A path
/// escaping the root, or one that does not decode to UTF-8, answers 403.
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    /// Serve files below `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, url_path: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for segment in url_path.split('/') {
            let decoded = percent_decode_str(segment).decode_utf8().ok()?;
            // A decoded segment must still name exactly one path element.
            let mut components = Path::new(decoded.as_ref()).components();
            match (components.next(), components.next()) {
                (None, _) | (Some(Component::CurDir), None) => {}
                (Some(Component::Normal(part)), None) => path.push(part),
                _ => return None,
            }
        }
        if url_path.is_empty() || url_path.ends_with('/') {
            path.push("index.html");
        }
        Some(path)
    }
}

#[async_trait]
impl Fetcher for DirFetcher {
    async fn fetch(&self, request: &Request) -> Result<CachedResponse> {
        let path = match self.resolve(request.url.path()) {
            Some(path) => path,
            None => return Ok(CachedResponse::new(403, "Forbidden")),
        };

        match fs::read(&path).await {
            Ok(bytes) => Ok(CachedResponse::ok(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(CachedResponse::new(404, "Not Found"))
            }
            Err(e) => Err(Error::StorageUnavailable(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
