use anyhow::Context;
use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::main_pool()
        .await
        .context("failed to connect to the projects database")?;

    DatabaseManager::migrate(&pool)
        .await
        .context("failed to apply migrations")?;

    DatabaseManager::close_all().await;

    output_success(
        &output_format,
        "Database migrations applied",
        Some(json!({ "environment": crate::config::config().environment })),
    )
}
