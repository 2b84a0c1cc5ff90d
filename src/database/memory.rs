// In-memory store with the same visibility and cascade rules the Postgres
// schema enforces: a caller sees only projects it owns and the rows hanging
// off them, and deleting a parent removes its children.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::manager::DatabaseError;
use crate::database::models::{
    ExtractionConfig, ExtractionField, NewExtractionField, NewProjectSource, Project, ProjectSource,
};
use crate::database::store::{ProjectStore, StoreProvider};

/// Misbehavior that can be injected per store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail as if the storage engine rejected the call
    Error,
    /// Accept an insert but return no row
    EmptyResult,
    Panic,
}

#[derive(Default)]
struct MemoryTables {
    projects: Vec<(Uuid, Project)>,
    sources: Vec<ProjectSource>,
    configs: Vec<ExtractionConfig>,
    fields: Vec<ExtractionField>,
    faults: HashMap<&'static str, Fault>,
}

impl MemoryTables {
    fn owns_project(&self, owner: Uuid, project_id: Uuid) -> bool {
        self.projects.iter().any(|(o, p)| *o == owner && p.id == project_id)
    }

    fn owns_config(&self, owner: Uuid, config_id: Uuid) -> bool {
        self.configs
            .iter()
            .any(|c| c.id == config_id && self.owns_project(owner, c.project_id))
    }

    fn fault(&self, operation: &'static str) -> Result<Option<Fault>, DatabaseError> {
        match self.faults.get(operation).copied() {
            Some(Fault::Error) => Err(DatabaseError::Sqlx(sqlx::Error::Protocol(format!(
                "injected failure in {}",
                operation
            )))),
            Some(Fault::Panic) => panic!("injected panic in {}", operation),
            other => Ok(other),
        }
    }

    fn remove_config(&mut self, config_id: Uuid) {
        self.fields.retain(|f| f.config_id != config_id);
        self.configs.retain(|c| c.id != config_id);
    }
}

/// Shared in-memory database handing out caller-scoped stores
#[derive(Clone, Default)]
pub struct MemoryStoreProvider {
    tables: Arc<RwLock<MemoryTables>>,
}

impl MemoryStoreProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `operation` misbehave
    pub async fn inject(&self, operation: &'static str, fault: Fault) {
        self.tables.write().await.faults.insert(operation, fault);
    }

    pub async fn clear_faults(&self) {
        self.tables.write().await.faults.clear();
    }

    /// Scoped store for a bare user id, for callers without a verified token
    pub fn store_for_user(&self, user_id: Uuid) -> MemoryProjectStore {
        MemoryProjectStore {
            tables: self.tables.clone(),
            owner: user_id,
        }
    }
}

#[async_trait]
impl StoreProvider for MemoryStoreProvider {
    fn store_for(&self, user: &AuthUser) -> Arc<dyn ProjectStore> {
        Arc::new(self.store_for_user(user.user_id))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.tables.read().await.fault("health_check")?;
        Ok(())
    }
}

pub struct MemoryProjectStore {
    tables: Arc<RwLock<MemoryTables>>,
    owner: Uuid,
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn get_project_by_id(&self, project_id: Uuid) -> Result<Option<Project>, DatabaseError> {
        let tables = self.tables.read().await;
        tables.fault("get_project_by_id")?;
        Ok(tables
            .projects
            .iter()
            .find(|(o, p)| *o == self.owner && p.id == project_id)
            .map(|(_, p)| p.clone()))
    }

    async fn create_project(&self, description: &str) -> Result<Option<Project>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.fault("create_project")? == Some(Fault::EmptyResult) {
            return Ok(None);
        }

        let project = Project {
            id: Uuid::new_v4(),
            description: description.to_string(),
            created_at: Utc::now(),
        };
        tables.projects.push((self.owner, project.clone()));
        Ok(Some(project))
    }

    async fn delete_project(&self, project_id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.fault("delete_project")?;
        if !tables.owns_project(self.owner, project_id) {
            return Ok(false);
        }

        tables.projects.retain(|(_, p)| p.id != project_id);
        tables.sources.retain(|s| s.project_id != project_id);
        let config_ids: Vec<Uuid> = tables
            .configs
            .iter()
            .filter(|c| c.project_id == project_id)
            .map(|c| c.id)
            .collect();
        for config_id in config_ids {
            tables.remove_config(config_id);
        }
        Ok(true)
    }

    async fn list_project_sources(&self, project_id: Uuid) -> Result<Vec<ProjectSource>, DatabaseError> {
        let tables = self.tables.read().await;
        tables.fault("list_project_sources")?;
        if !tables.owns_project(self.owner, project_id) {
            return Ok(vec![]);
        }
        Ok(tables
            .sources
            .iter()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn delete_project_sources(&self, project_id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.fault("delete_project_sources")?;
        if tables.owns_project(self.owner, project_id) {
            tables.sources.retain(|s| s.project_id != project_id);
        }
        Ok(())
    }

    async fn insert_project_sources(
        &self,
        project_id: Uuid,
        sources: &[NewProjectSource],
    ) -> Result<usize, DatabaseError> {
        if sources.is_empty() {
            return Ok(0);
        }

        let mut tables = self.tables.write().await;
        tables.fault("insert_project_sources")?;
        if !tables.owns_project(self.owner, project_id) {
            return Err(DatabaseError::PolicyViolation("project_sources"));
        }

        tables.sources.extend(sources.iter().map(|s| ProjectSource {
            id: Uuid::new_v4(),
            project_id,
            backend_name: s.backend_name.clone(),
            backend_query: s.backend_query.clone(),
        }));
        Ok(sources.len())
    }

    async fn find_extraction_config(&self, project_id: Uuid) -> Result<Option<ExtractionConfig>, DatabaseError> {
        let tables = self.tables.read().await;
        tables.fault("find_extraction_config")?;
        if !tables.owns_project(self.owner, project_id) {
            return Ok(None);
        }
        Ok(tables.configs.iter().find(|c| c.project_id == project_id).cloned())
    }

    async fn create_extraction_config(&self, project_id: Uuid) -> Result<ExtractionConfig, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.fault("create_extraction_config")? == Some(Fault::EmptyResult) {
            return Err(DatabaseError::EmptyInsert("extraction_configs"));
        }
        if !tables.owns_project(self.owner, project_id) {
            return Err(DatabaseError::PolicyViolation("extraction_configs"));
        }

        let config = ExtractionConfig {
            id: Uuid::new_v4(),
            project_id,
            created_at: Utc::now(),
        };
        tables.configs.push(config.clone());
        Ok(config)
    }

    async fn insert_extraction_fields(
        &self,
        config_id: Uuid,
        fields: &[NewExtractionField],
    ) -> Result<usize, DatabaseError> {
        if fields.is_empty() {
            return Ok(0);
        }

        let mut tables = self.tables.write().await;
        tables.fault("insert_extraction_fields")?;
        if !tables.owns_config(self.owner, config_id) {
            return Err(DatabaseError::PolicyViolation("extraction_fields"));
        }

        tables.fields.extend(fields.iter().map(|f| ExtractionField {
            id: Uuid::new_v4(),
            config_id,
            field_name: f.field_name.clone(),
            description: f.description.clone(),
            created_at: Utc::now(),
        }));
        Ok(fields.len())
    }

    async fn list_extraction_fields(&self, config_id: Uuid) -> Result<Vec<ExtractionField>, DatabaseError> {
        let tables = self.tables.read().await;
        tables.fault("list_extraction_fields")?;
        if !tables.owns_config(self.owner, config_id) {
            return Ok(vec![]);
        }
        Ok(tables
            .fields
            .iter()
            .filter(|f| f.config_id == config_id)
            .cloned()
            .collect())
    }

    async fn delete_extraction_config(&self, config_id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.fault("delete_extraction_config")?;
        if tables.owns_config(self.owner, config_id) {
            tables.remove_config(config_id);
        }
        Ok(())
    }

    async fn delete_extraction_fields(&self, field_ids: &[Uuid]) -> Result<(), DatabaseError> {
        if field_ids.is_empty() {
            return Ok(());
        }

        let mut tables = self.tables.write().await;
        tables.fault("delete_extraction_fields")?;
        let owned: Vec<Uuid> = tables
            .fields
            .iter()
            .filter(|f| field_ids.contains(&f.id) && tables.owns_config(self.owner, f.config_id))
            .map(|f| f.id)
            .collect();
        tables.fields.retain(|f| !owned.contains(&f.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_source(name: &str) -> NewProjectSource {
        NewProjectSource {
            backend_name: name.to_string(),
            backend_query: "query".to_string(),
        }
    }

    fn new_field(name: &str) -> NewExtractionField {
        NewExtractionField {
            field_name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn lookup_of_missing_project_is_absence_not_error() {
        let provider = MemoryStoreProvider::new();
        let store = provider.store_for_user(Uuid::new_v4());
        assert_eq!(store.get_project_by_id(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn projects_are_only_visible_to_their_owner() {
        let provider = MemoryStoreProvider::new();
        let alice = provider.store_for_user(Uuid::new_v4());
        let bob = provider.store_for_user(Uuid::new_v4());

        let project = alice.create_project("alice's").await.unwrap().unwrap();
        assert!(bob.get_project_by_id(project.id).await.unwrap().is_none());
        assert!(!bob.delete_project(project.id).await.unwrap());
        assert!(alice.get_project_by_id(project.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn inserting_under_a_foreign_project_violates_policy() {
        let provider = MemoryStoreProvider::new();
        let alice = provider.store_for_user(Uuid::new_v4());
        let bob = provider.store_for_user(Uuid::new_v4());
        let project = alice.create_project("alice's").await.unwrap().unwrap();

        let err = bob
            .insert_project_sources(project.id, &[new_source("arXiv")])
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::PolicyViolation("project_sources")));
    }

    #[tokio::test]
    async fn empty_batches_are_no_ops() {
        let provider = MemoryStoreProvider::new();
        let store = provider.store_for_user(Uuid::new_v4());
        // Unknown parents are fine when nothing is written
        assert_eq!(store.insert_project_sources(Uuid::new_v4(), &[]).await.unwrap(), 0);
        assert_eq!(store.insert_extraction_fields(Uuid::new_v4(), &[]).await.unwrap(), 0);
        store.delete_extraction_fields(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn deleting_a_project_cascades_to_children() {
        let provider = MemoryStoreProvider::new();
        let store = provider.store_for_user(Uuid::new_v4());
        let project = store.create_project("p").await.unwrap().unwrap();
        store
            .insert_project_sources(project.id, &[new_source("arXiv"), new_source("PubMed")])
            .await
            .unwrap();
        let config = store.create_extraction_config(project.id).await.unwrap();
        store
            .insert_extraction_fields(config.id, &[new_field("title")])
            .await
            .unwrap();

        assert!(store.delete_project(project.id).await.unwrap());

        let tables = provider.tables.read().await;
        assert!(tables.sources.is_empty());
        assert!(tables.configs.is_empty());
        assert!(tables.fields.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_config_twice_succeeds() {
        let provider = MemoryStoreProvider::new();
        let store = provider.store_for_user(Uuid::new_v4());
        let project = store.create_project("p").await.unwrap().unwrap();
        let config = store.create_extraction_config(project.id).await.unwrap();
        store
            .insert_extraction_fields(config.id, &[new_field("title"), new_field("authors")])
            .await
            .unwrap();

        store.delete_extraction_config(config.id).await.unwrap();
        store.delete_extraction_config(config.id).await.unwrap();

        assert!(store.find_extraction_config(project.id).await.unwrap().is_none());
        assert!(provider.tables.read().await.fields.is_empty());
    }

    #[tokio::test]
    async fn field_ids_get_generated_per_row() {
        let provider = MemoryStoreProvider::new();
        let store = provider.store_for_user(Uuid::new_v4());
        let project = store.create_project("p").await.unwrap().unwrap();
        let config = store.create_extraction_config(project.id).await.unwrap();
        store
            .insert_extraction_fields(config.id, &[new_field("a"), new_field("b")])
            .await
            .unwrap();

        let fields = store.list_extraction_fields(config.id).await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_ne!(fields[0].id, fields[1].id);
        assert!(fields.iter().all(|f| f.config_id == config.id));
    }

    #[tokio::test]
    async fn injected_faults_surface_as_errors_or_empty_results() {
        let provider = MemoryStoreProvider::new();
        let store = provider.store_for_user(Uuid::new_v4());

        provider.inject("create_project", Fault::EmptyResult).await;
        assert!(store.create_project("p").await.unwrap().is_none());

        provider.inject("get_project_by_id", Fault::Error).await;
        let err = store.get_project_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_storage_failure());

        provider.clear_faults().await;
        assert!(store.create_project("p").await.unwrap().is_some());
    }
}
