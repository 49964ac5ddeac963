use mongodb::{options::ClientOptions, Client, Database};
use std::sync::Arc;
use tracing::{error, info};

use super::settings::{ConfigError, Settings, StoreBackend};
use crate::repositories::{InMemoryPollStore, PollRepository, PollStore};

pub async fn init_database(uri: &str, db_name: &str) -> mongodb::error::Result<Arc<Database>> {
    let mut client_options = ClientOptions::parse(uri).await.map_err(|e| {
        error!("Failed to parse MongoDB URI: {}", e);
        e
    })?;
    client_options.app_name = Some("PollMaster".to_string());

    let client = Client::with_options(client_options)?;
    let database = client.database(db_name);

    info!("Connected to database `{}`", db_name);
    Ok(Arc::new(database))
}

/// Builds the store selected by `STORE_BACKEND`.
pub async fn init_store(settings: &Settings) -> anyhow::Result<Arc<dyn PollStore>> {
    match settings.store_backend {
        StoreBackend::Memory => {
            info!("Using the in-memory poll store; data is lost on restart");
            Ok(Arc::new(InMemoryPollStore::new()))
        }
        StoreBackend::Mongo => {
            let uri = settings
                .mongo_uri
                .as_deref()
                .ok_or(ConfigError::Missing("MONGO_URI"))?;
            let db = init_database(uri, &settings.database_name).await?;
            let repository = PollRepository::new(db);
            repository.ensure_indexes().await?;
            Ok(Arc::new(repository))
        }
    }
}
