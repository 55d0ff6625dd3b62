//! Offline asset caching for NightOps.
//!
//! A cache-first worker for the application shell: assets are pre-cached on
//! install, stale cache versions are swept on activation, and GET requests
//! fall back to a synthetic 503 when the network is gone.

pub mod cache;
pub mod fetcher;
pub mod http;
pub mod worker;

pub use cache::CacheStorage;
pub use fetcher::{DirFetcher, Fetcher};
pub use http::{CachedResponse, Method, Request, OFFLINE_STATUS};
pub use worker::{cache_name, OfflineWorker, CACHE_PREFIX, CACHE_VERSION, DEFAULT_ASSETS};
