
mod error;
mod resource;

use crate::configuration;
use crate::metrics_provider::METRICS_PROVIDER;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{info, instrument};

pub use error::Error;
pub use resource::{is_path_segment, Resource};

/// Source of truth for character resources
#[async_trait]
pub trait Upstream: Debug + Send + Sync {
    /// Fetch a resource: the `results` array for the collection, the whole body for a
    /// single character.
    async fn fetch(&self, resource: &Resource) -> Result<Value, Error>;
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "Config::default_url")]
    pub url: String,
    #[serde(default = "Config::default_max_redirect")]
    pub max_redirect: u8,
    pub timeout: Option<u64>,
}

impl Config {
    fn default_url() -> String {
        "https://rickandmortyapi.com/api".to_string()
    }

    fn default_max_redirect() -> u8 {
        5
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            max_redirect: Self::default_max_redirect(),
            timeout: None,
        }
    }
}

#[derive(Debug)]
pub struct CharacterApiClient {
    base_url: String,
    client: Client,
}

impl CharacterApiClient {
    pub fn new(config: &Config) -> Result<Self, configuration::Error> {
        let mut client_builder = Client::builder()
            .redirect(Policy::limited(usize::from(config.max_redirect)))
            .use_rustls_tls();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(Duration::from_secs(timeout));
        }

        let client = client_builder.build().map_err(|e| {
            configuration::Error::Http(format!("Failed to build upstream HTTP client: {e}"))
        })?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn location(&self, resource: &Resource) -> Result<String, Error> {
        if let Resource::Character { id } = resource {
            if !is_path_segment(id) {
                return Err(Error::InvalidResource(format!("invalid character id `{id}`")));
            }
        }

        Ok(format!("{}{}", self.base_url, resource.path()))
    }

    async fn get_json(&self, location: &str) -> Result<Value, Error> {
        info!("Requesting from upstream: {location}");

        let response = self
            .client
            .get(location)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let body = response.bytes().await?;
            return Err(Error::Status {
                status: status.as_u16(),
                content_type,
                body: body.to_vec(),
            });
        }

        Ok(response.json::<Value>().await?)
    }

    async fn fetch_resource(&self, resource: &Resource) -> Result<Value, Error> {
        let mut body = self.get_json(&self.location(resource)?).await?;

        match resource {
            Resource::Characters => body
                .get_mut("results")
                .map(Value::take)
                .ok_or_else(|| Error::InvalidPayload("missing `results` field".to_string())),
            Resource::Character { .. } => Ok(body),
        }
    }
}

#[async_trait]
impl Upstream for CharacterApiClient {
    #[instrument(skip(self))]
    async fn fetch(&self, resource: &Resource) -> Result<Value, Error> {
        let result = self.fetch_resource(resource).await;

        let outcome = if result.is_ok() { "success" } else { "error" };
        METRICS_PROVIDER
            .metric_upstream_requests_total
            .with_label_values(&[outcome])
            .inc();

        result
    }
}
