use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::info;

use crate::cache::{Cache, Error};

type Entry = (String, Option<Instant>);

fn is_live(expiry: Option<Instant>, now: Instant) -> bool {
    expiry.is_none_or(|expiry| expiry > now)
}

#[derive(Debug)]
pub struct Backend {
    store: Arc<RwLock<HashMap<String, Entry>>>,
    counter: Arc<AtomicUsize>,
}

impl Backend {
    pub fn new() -> Self {
        info!("Using in-memory cache store");
        Backend {
            store: Arc::new(RwLock::new(HashMap::new())),
            counter: Arc::new(AtomicUsize::new(0)),
        }
    }

    async fn cleanup_expired(&self) {
        let mut store = self.store.write().await;
        let now = Instant::now();
        store.retain(|_, &mut (_, expiry)| is_live(expiry, now));
    }

    async fn maybe_cleanup(&self) {
        let count = self.counter.fetch_add(1, Ordering::Relaxed);

        if count % 1000 == 0 {
            self.cleanup_expired().await;
        }
    }
}

#[async_trait]
impl Cache for Backend {
    async fn store_value(
        &self,
        key: &str,
        value: &str,
        expires_in: Option<u64>,
    ) -> Result<(), Error> {
        self.maybe_cleanup().await;

        let expiry = expires_in.map(|secs| Instant::now() + Duration::from_secs(secs));

        let mut store = self.store.write().await;
        store.insert(key.to_string(), (value.to_string(), expiry));
        Ok(())
    }

    async fn retrieve_value(&self, key: &str) -> Result<Option<String>, Error> {
        self.maybe_cleanup().await;

        let store = self.store.read().await;
        if let Some((value, expiry)) = store.get(key) {
            if is_live(*expiry, Instant::now()) {
                return Ok(Some(value.clone()));
            }
        }

        Ok(None)
    }
}
