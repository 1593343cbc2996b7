use mongodb::{options::ClientOptions, Client, Database};
use tracing::info;

use crate::config::Config;
use crate::utils::error::{AppError, AppResult};

const DEFAULT_DB_NAME: &str = "polls";

pub async fn init_db(config: &Config) -> AppResult<Database> {
    let mut client_options = ClientOptions::parse(&config.mongodb_uri)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to parse MongoDB URI: {}", e)))?;

    client_options.app_name = Some("PollsBackend".to_string());

    let client = Client::with_options(client_options)
        .map_err(|e| AppError::DatabaseError(format!("Failed to initialize MongoDB client: {}", e)))?;

    let database = match &config.db_name {
        Some(name) => client.database(name),
        None => client
            .default_database()
            .unwrap_or_else(|| client.database(DEFAULT_DB_NAME)),
    };

    info!("Using MongoDB database '{}'", database.name());

    Ok(database)
}
