
mod error;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::cache::{self, Cache};
use crate::metrics_provider::METRICS_PROVIDER;
use crate::upstream::{Resource, Upstream};

pub use error::Error;

/// Character lookups, read-through cached when a cache backend is configured.
///
/// A lookup checks the cache first. On a miss it fetches from upstream, writes the value back
/// under the same key and returns it. The write-back is awaited but its failure is only
/// logged. A failing cache read fails the lookup; there is no fallback to upstream.
#[derive(Debug)]
pub struct CharacterStore {
    upstream: Arc<dyn Upstream>,
    cache: Option<Arc<dyn Cache>>,
    cache_ttl: Option<u64>,
}

impl CharacterStore {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        cache: Option<Arc<dyn Cache>>,
        cache_ttl: Option<u64>,
    ) -> Self {
        Self {
            upstream,
            cache,
            cache_ttl,
        }
    }

    pub async fn list_characters(&self) -> Result<Value, Error> {
        self.get(&Resource::Characters).await
    }

    pub async fn get_character(&self, id: &str) -> Result<Value, Error> {
        self.get(&Resource::character(id)).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, resource: &Resource) -> Result<Value, Error> {
        let Some(cache) = &self.cache else {
            return Ok(self.upstream.fetch(resource).await?);
        };

        let key = resource.cache_key();

        if let Some(value) = cache::retrieve::<Value>(cache.as_ref(), &key).await? {
            Self::record_lookup("hit");
            return Ok(value);
        }

        Self::record_lookup("miss");
        debug!("Cache miss for key {key}, fetching {resource} from upstream");
        let value = self.upstream.fetch(resource).await?;

        if let Err(error) = cache::store(cache.as_ref(), &key, &value, self.cache_ttl).await {
            warn!("Unable to populate cache for key {key}: {error}");
        }

        Ok(value)
    }

    fn record_lookup(result: &str) {
        METRICS_PROVIDER
            .metric_cache_lookups_total
            .with_label_values(&[result])
            .inc();
    }
}
