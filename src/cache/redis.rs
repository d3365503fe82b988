use crate::cache::{Cache, Error};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::Deserialize;
use std::fmt;
use tokio::sync::OnceCell;
use tracing::info;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BackendConfig {
    pub url: String,
    #[serde(default)]
    pub key_prefix: String,
}

pub struct Backend {
    client: redis::Client,
    // opened on first use, then shared by every operation
    connection: OnceCell<ConnectionManager>,
    key_prefix: String,
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("client", &self.client)
            .field("connected", &self.connection.initialized())
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl Backend {
    pub fn new(config: &BackendConfig) -> Result<Self, Error> {
        info!("Using Redis cache store");
        let client = redis::Client::open(config.url.as_str())?;
        Ok(Backend {
            client,
            connection: OnceCell::new(),
            key_prefix: config.key_prefix.clone(),
        })
    }

    async fn get_connection(&self) -> Result<ConnectionManager, Error> {
        let connection = self
            .connection
            .get_or_try_init(|| async {
                info!("Opening Redis connection");
                ConnectionManager::new(self.client.clone()).await
            })
            .await?;

        Ok(connection.clone())
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
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
        let mut conn = self.get_connection().await?;
        let key = self.prefixed(key);

        match expires_in {
            Some(expires_in) => Ok(conn.set_ex(key, value, expires_in).await?),
            None => Ok(conn.set(key, value).await?),
        }
    }

    async fn retrieve_value(&self, key: &str) -> Result<Option<String>, Error> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(self.prefixed(key)).await?;
        Ok(value)
    }
}
