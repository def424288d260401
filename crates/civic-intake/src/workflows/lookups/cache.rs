use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::domain::{active_entries, Locale, LookupEntity, LookupKind};
use crate::backend::{BackendError, IntakeBackend};
use crate::cache::ReadThroughCache;

/// Read-through cache over the reference-data endpoints.
///
/// Entries are filtered to active rows and sorted when fetched, then kept for the
/// life of the process. Failed fetches are not cached.
pub struct LookupCache<B> {
    backend: Arc<B>,
    entries: ReadThroughCache<(LookupKind, Locale), Vec<LookupEntity>>,
}

impl<B> LookupCache<B>
where
    B: IntakeBackend + 'static,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            entries: ReadThroughCache::default(),
        }
    }

    pub async fn fetch(
        &self,
        kind: LookupKind,
        locale: Locale,
    ) -> Result<Vec<LookupEntity>, BackendError> {
        let key = (kind, locale);
        if let Some(hit) = self.entries.get(&key) {
            return Ok(hit);
        }

        let sort = format!("{},asc", locale.display_order_field());
        let fetched = self.backend.fetch_lookups(kind, &sort).await?;
        let active = active_entries(fetched, locale, Utc::now());
        debug!(%kind, %locale, entries = active.len(), "cached lookup table");
        self.entries.insert(key, active.clone());
        Ok(active)
    }

    pub fn cached_tables(&self) -> usize {
        self.entries.len()
    }
}
