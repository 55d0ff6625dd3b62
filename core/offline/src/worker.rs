//! Cache-first offline worker for the application shell.

use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::CacheStorage;
use crate::fetcher::Fetcher;
use crate::http::{CachedResponse, Method, Request};
use nightops_common::{Error, Result};

/// Default cache name prefix.
pub const CACHE_PREFIX: &str = "nightops";

/// Current cache version. Bumping it retires older caches on activation.
pub const CACHE_VERSION: u32 = 1;

/// Application shell assets, relative to the origin.
pub const DEFAULT_ASSETS: &[&str] = &[
    "./",
    "./index.html",
    "./styles.css",
    "./app.js",
    "./db.js",
    "./crypto.js",
    "./manifest.webmanifest",
    "./icons/icon-192.png",
    "./icons/icon-512.png",
];

/// Build the versioned cache name `<prefix>-v<version>`.
pub fn cache_name(prefix: &str, version: u32) -> String {
    format!("{}-v{}", prefix, version)
}

/// Intercepts requests, serving cached assets first and the network second.
pub struct OfflineWorker {
    cache_name: String,
    origin: Url,
    assets: Vec<Url>,
    storage: Arc<CacheStorage>,
}

impl OfflineWorker {
    /// Create a worker for `origin` with the default asset list.
    ///
    /// # Errors
    /// - `InvalidInput` if `origin` or an asset path does not parse
    pub fn new(origin: &str, storage: Arc<CacheStorage>) -> Result<Self> {
        Self::with_assets(origin, DEFAULT_ASSETS, storage)
    }

    /// Create a worker with an explicit asset list.
    pub fn with_assets(origin: &str, assets: &[&str], storage: Arc<CacheStorage>) -> Result<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| Error::InvalidInput(format!("Invalid origin '{}': {}", origin, e)))?;
        let assets = assets
            .iter()
            .map(|asset| {
                origin
                    .join(asset)
                    .map_err(|e| Error::InvalidInput(format!("Invalid asset '{}': {}", asset, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            cache_name: cache_name(CACHE_PREFIX, CACHE_VERSION),
            origin,
            assets,
            storage,
        })
    }

    /// Override the cache name (prefix and version).
    pub fn with_cache_version(mut self, prefix: &str, version: u32) -> Self {
        self.cache_name = cache_name(prefix, version);
        self
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn assets(&self) -> &[Url] {
        &self.assets
    }

    pub fn storage(&self) -> &Arc<CacheStorage> {
        &self.storage
    }

    /// Pre-cache every asset into the current cache, fetching concurrently.
    ///
    /// All-or-nothing: nothing is stored unless every asset fetched with a
    /// success status.
    ///
    /// # Errors
    /// - The fetcher's error if the network fails
    /// - `NotFound` if an asset answers with a non-success status
    pub async fn install(&self, fetcher: &dyn Fetcher) -> Result<usize> {
        let fetches = self.assets.iter().map(|url| async move {
            let request = Request {
                method: Method::Get,
                url: url.clone(),
            };
            let response = fetcher.fetch(&request).await?;
            if !response.is_success() {
                return Err(Error::NotFound(format!(
                    "Asset {} answered {}",
                    url, response.status
                )));
            }
            Ok::<_, Error>((request.cache_key().to_string(), response))
        });
        let fetched = try_join_all(fetches).await?;

        let count = fetched.len();
        self.storage.put_all(&self.cache_name, fetched).await;
        info!(cache = %self.cache_name, assets = count, "Offline worker installed");
        Ok(count)
    }

    /// Delete every cache except the current one. Returns the purged names.
    pub async fn activate(&self) -> Vec<String> {
        self.storage.open(&self.cache_name).await;

        let mut purged = Vec::new();
        for name in self.storage.keys().await {
            if name != self.cache_name && self.storage.delete(&name).await {
                purged.push(name);
            }
        }

        info!(cache = %self.cache_name, purged = purged.len(), "Offline worker activated");
        purged
    }

    /// Answer a request.
    ///
    /// Non-GET requests are not intercepted (`None`). GET requests are served
    /// from any cache, then from the network; successful same-origin network
    /// responses are cached. A network failure yields 503 "Offline".
    pub async fn handle(&self, request: &Request, fetcher: &dyn Fetcher) -> Option<CachedResponse> {
        if request.method != Method::Get {
            return None;
        }

        if let Some(cached) = self.storage.match_key(request.cache_key()).await {
            debug!(url = %request.url, "Cache hit");
            return Some(cached);
        }

        match fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() && request.url.origin() == self.origin.origin() {
                    self.storage
                        .put(&self.cache_name, request.cache_key(), response.clone())
                        .await;
                }
                Some(response)
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, "Network unavailable");
                Some(CachedResponse::offline())
            }
        }
    }

    /// Delete every cache. Returns how many were removed.
    pub async fn purge_all(&self) -> usize {
        let mut purged = 0;
        for name in self.storage.keys().await {
            if self.storage.delete(&name).await {
                purged += 1;
            }
        }
        info!(purged, "Offline caches purged");
        purged
    }
}
