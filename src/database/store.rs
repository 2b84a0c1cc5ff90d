use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::manager::DatabaseError;
use crate::database::models::{
    ExtractionConfig, ExtractionField, NewExtractionField, NewProjectSource, Project, ProjectSource,
};

/// Single-table operations against the storage engine, scoped to one caller.
///
/// Transport and query failures are returned as `Err`. A row that simply does
/// not exist (or is hidden by row-level policy) is `Ok(None)` / an empty list.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get_project_by_id(&self, project_id: Uuid) -> Result<Option<Project>, DatabaseError>;

    /// `Ok(None)` means the engine accepted the insert but returned no row.
    async fn create_project(&self, description: &str) -> Result<Option<Project>, DatabaseError>;

    /// Returns whether a row was removed.
    async fn delete_project(&self, project_id: Uuid) -> Result<bool, DatabaseError>;

    async fn list_project_sources(&self, project_id: Uuid) -> Result<Vec<ProjectSource>, DatabaseError>;

    async fn delete_project_sources(&self, project_id: Uuid) -> Result<(), DatabaseError>;

    /// Generates an id per source. An empty slice is a no-op.
    async fn insert_project_sources(
        &self,
        project_id: Uuid,
        sources: &[NewProjectSource],
    ) -> Result<usize, DatabaseError>;

    async fn find_extraction_config(&self, project_id: Uuid) -> Result<Option<ExtractionConfig>, DatabaseError>;

    /// Fails with `EmptyInsert` if the engine returns no row.
    async fn create_extraction_config(&self, project_id: Uuid) -> Result<ExtractionConfig, DatabaseError>;

    /// Generates an id and timestamp per field. An empty slice is a no-op.
    async fn insert_extraction_fields(
        &self,
        config_id: Uuid,
        fields: &[NewExtractionField],
    ) -> Result<usize, DatabaseError>;

    async fn list_extraction_fields(&self, config_id: Uuid) -> Result<Vec<ExtractionField>, DatabaseError>;

    /// Removes the config and its fields. Deleting a missing config succeeds.
    async fn delete_extraction_config(&self, config_id: Uuid) -> Result<(), DatabaseError>;

    /// Removes every listed field that exists. Unknown ids are ignored.
    async fn delete_extraction_fields(&self, field_ids: &[Uuid]) -> Result<(), DatabaseError>;
}

/// Builds a caller-scoped store for each request
#[async_trait]
pub trait StoreProvider: Send + Sync {
    fn store_for(&self, user: &AuthUser) -> Arc<dyn ProjectStore>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
