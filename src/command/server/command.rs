use std::sync::Arc;

use argh::FromArgs;
use tracing::info;

use super::listeners::insecure::InsecureListener;
use super::ServerContext;
use crate::cache::{self, Cache};
use crate::character::CharacterStore;
use crate::command::server::error::Error;
use crate::configuration::Configuration;
use crate::upstream::{self, CharacterApiClient, Upstream};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "serve",
    description = "Run the character proxy listener"
)]
pub struct Options {}

pub struct Command {
    listener: InsecureListener,
}

fn build_upstream(config: &upstream::Config) -> Result<Arc<dyn Upstream>, Error> {
    match CharacterApiClient::new(config) {
        Ok(client) => Ok(Arc::new(client)),
        Err(err) => {
            let msg = format!("Failed to initialize upstream client: {err}");
            Err(Error::Initialization(msg))
        }
    }
}

fn build_cache(config: Option<&cache::Config>) -> Result<Option<Arc<dyn Cache>>, Error> {
    let Some(config) = config else {
        info!("No cache configured, every lookup reaches upstream");
        return Ok(None);
    };

    match config.to_backend() {
        Ok(cache) => Ok(Some(cache)),
        Err(err) => {
            let msg = format!("Failed to initialize character cache: {err}");
            Err(Error::Initialization(msg))
        }
    }
}

impl Command {
    pub fn new(config: &Configuration) -> Result<Command, Error> {
        let upstream = build_upstream(&config.upstream)?;
        let cache = build_cache(config.cache.as_ref())?;
        let store = CharacterStore::new(upstream, cache, config.global.cache_ttl);

        let context = ServerContext::new(store);
        let listener = InsecureListener::new(&config.server, context);

        Ok(Command { listener })
    }

    pub async fn run(&self) -> Result<(), Error> {
        self.listener.serve().await
    }
}
