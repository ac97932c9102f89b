// ABOUTME: Wires configuration into the database, artifact store and email notifier
// ABOUTME: Shared by the server and the one-shot job commands

use std::sync::Arc;

use anyhow::Context;
use sqlx::SqlitePool;
use tracing::info;

use robodesk_api::AppState;
use robodesk_notifications::{HttpEmailNotifier, Notifier};
use robodesk_storage::{db, ArtifactStore, LocalArtifactStore};

use crate::config::Config;

/// Open the database and apply pending migrations
pub async fn open_database(config: &Config) -> anyhow::Result<SqlitePool> {
    info!("Opening database at {}", config.database_path.display());
    db::connect(&config.database_config())
        .await
        .with_context(|| {
            format!(
                "Failed to open database at {}",
                config.database_path.display()
            )
        })
}

pub fn artifact_store(config: &Config) -> Arc<dyn ArtifactStore> {
    let store = LocalArtifactStore::new(&config.artifact_root);
    match &config.artifact_public_url {
        Some(base_url) => Arc::new(store.with_public_base_url(base_url.clone())),
        None => Arc::new(store),
    }
}

pub fn notifier(config: &Config) -> anyhow::Result<Arc<dyn Notifier>> {
    let api_key = config.email_api_key()?;
    let client = HttpEmailNotifier::new(
        config.email_api_url.clone(),
        api_key,
        Some(config.email_timeout),
    )?;
    Ok(Arc::new(client))
}

/// Build the full application state from configuration
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let pool = open_database(config).await?;
    let notifier = notifier(config)?;

    Ok(AppState::new(
        pool,
        artifact_store(config),
        notifier,
        config.service_settings(),
    ))
}
