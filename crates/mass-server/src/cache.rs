//! Last-known-good route cache.
//!
//! Written on every successful fetch or upload, read when the route source is
//! unavailable. The analysis pipeline never touches it.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use mass_core::RouteDocument;

#[derive(Debug, Clone)]
pub struct CachedRoute {
    pub document: RouteDocument,
    /// Source name or upload filename.
    pub origin: String,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct RouteCache {
    entry: RwLock<Option<CachedRoute>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, document: RouteDocument, origin: impl Into<String>) {
        let cached = CachedRoute {
            document,
            origin: origin.into(),
            fetched_at: Utc::now(),
        };
        *self.entry.write().unwrap_or_else(PoisonError::into_inner) = Some(cached);
    }

    pub fn latest(&self) -> Option<RouteDocument> {
        self.snapshot().map(|cached| cached.document)
    }

    pub fn snapshot(&self) -> Option<CachedRoute> {
        self.entry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_route(&self) -> bool {
        self.entry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot().map(|cached| cached.fetched_at)
    }

    pub fn origin(&self) -> Option<String> {
        self.snapshot().map(|cached| cached.origin)
    }
}
