// Postgres-backed store. Every operation runs in its own transaction that
// first installs the caller's JWT claims and role, so the row-level policies
// in migrations/ decide what the statement may see or change.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    ExtractionConfig, ExtractionField, NewExtractionField, NewProjectSource, Project, ProjectSource,
};
use crate::database::store::{ProjectStore, StoreProvider};

pub struct PgStoreProvider {
    pool: PgPool,
    default_role: String,
    log_queries: bool,
}

impl PgStoreProvider {
    pub fn new(pool: PgPool, default_role: impl Into<String>, log_queries: bool) -> Self {
        Self {
            pool,
            default_role: default_role.into(),
            log_queries,
        }
    }

    /// Provider over the shared pool, configured from the global config
    pub async fn from_config() -> Result<Self, DatabaseError> {
        let cfg = &crate::config::config().database;
        let pool = DatabaseManager::main_pool().await?;
        Ok(Self::new(pool, cfg.rls_role.clone(), cfg.enable_query_logging))
    }
}

#[async_trait]
impl StoreProvider for PgStoreProvider {
    fn store_for(&self, user: &AuthUser) -> Arc<dyn ProjectStore> {
        let role = user.role.clone().unwrap_or_else(|| self.default_role.clone());
        Arc::new(PgProjectStore {
            pool: self.pool.clone(),
            user: user.clone(),
            role,
            log_queries: self.log_queries,
        })
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

pub struct PgProjectStore {
    pool: PgPool,
    user: AuthUser,
    role: String,
    log_queries: bool,
}

impl PgProjectStore {
    /// Open a transaction acting as the caller
    async fn begin(&self, operation: &str) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        if self.log_queries {
            tracing::debug!(user_id = %self.user.user_id, role = %self.role, "{}", operation);
        }

        let claims = serde_json::to_string(&self.user.claims)?;
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT set_config('request.jwt.claims', $1, true), set_config('role', $2, true)")
            .bind(claims)
            .bind(&self.role)
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn get_project_by_id(&self, project_id: Uuid) -> Result<Option<Project>, DatabaseError> {
        let mut tx = self.begin("get_project_by_id").await?;
        let project = sqlx::query_as::<_, Project>(
            "SELECT id, description, created_at FROM projects WHERE id = $1",
        )
        .bind(project_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(project)
    }

    async fn create_project(&self, description: &str) -> Result<Option<Project>, DatabaseError> {
        let mut tx = self.begin("create_project").await?;
        let project = sqlx::query_as::<_, Project>(
            "INSERT INTO projects (id, description, created_at)
             VALUES ($1, $2, $3)
             RETURNING id, description, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(description)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(project)
    }

    async fn delete_project(&self, project_id: Uuid) -> Result<bool, DatabaseError> {
        let mut tx = self.begin("delete_project").await?;
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_project_sources(&self, project_id: Uuid) -> Result<Vec<ProjectSource>, DatabaseError> {
        let mut tx = self.begin("list_project_sources").await?;
        let sources = sqlx::query_as::<_, ProjectSource>(
            "SELECT id, project_id, backend_name, backend_query
             FROM project_sources
             WHERE project_id = $1
             ORDER BY backend_name, backend_query",
        )
        .bind(project_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(sources)
    }

    async fn delete_project_sources(&self, project_id: Uuid) -> Result<(), DatabaseError> {
        let mut tx = self.begin("delete_project_sources").await?;
        sqlx::query("DELETE FROM project_sources WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
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

        let mut tx = self.begin("insert_project_sources").await?;
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO project_sources (id, project_id, backend_name, backend_query) ");
        qb.push_values(sources, |mut row, source| {
            row.push_bind(Uuid::new_v4())
                .push_bind(project_id)
                .push_bind(source.backend_name.clone())
                .push_bind(source.backend_query.clone());
        });
        let result = qb.build().execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(result.rows_affected() as usize)
    }

    async fn find_extraction_config(&self, project_id: Uuid) -> Result<Option<ExtractionConfig>, DatabaseError> {
        let mut tx = self.begin("find_extraction_config").await?;
        let config = sqlx::query_as::<_, ExtractionConfig>(
            "SELECT id, project_id, created_at FROM extraction_configs WHERE project_id = $1 LIMIT 1",
        )
        .bind(project_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(config)
    }

    async fn create_extraction_config(&self, project_id: Uuid) -> Result<ExtractionConfig, DatabaseError> {
        let mut tx = self.begin("create_extraction_config").await?;
        let config = sqlx::query_as::<_, ExtractionConfig>(
            "INSERT INTO extraction_configs (id, project_id, created_at)
             VALUES ($1, $2, $3)
             RETURNING id, project_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DatabaseError::EmptyInsert("extraction_configs"))?;
        tx.commit().await?;
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

        let mut tx = self.begin("insert_extraction_fields").await?;
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO extraction_fields (id, config_id, field_name, description, created_at) ",
        );
        qb.push_values(fields, |mut row, field| {
            row.push_bind(Uuid::new_v4())
                .push_bind(config_id)
                .push_bind(field.field_name.clone())
                .push_bind(field.description.clone())
                .push_bind(Utc::now());
        });
        let result = qb.build().execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(result.rows_affected() as usize)
    }

    async fn list_extraction_fields(&self, config_id: Uuid) -> Result<Vec<ExtractionField>, DatabaseError> {
        let mut tx = self.begin("list_extraction_fields").await?;
        let fields = sqlx::query_as::<_, ExtractionField>(
            "SELECT id, config_id, field_name, description, created_at
             FROM extraction_fields
             WHERE config_id = $1
             ORDER BY created_at, field_name",
        )
        .bind(config_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(fields)
    }

    async fn delete_extraction_config(&self, config_id: Uuid) -> Result<(), DatabaseError> {
        let mut tx = self.begin("delete_extraction_config").await?;
        sqlx::query("DELETE FROM extraction_fields WHERE config_id = $1")
            .bind(config_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM extraction_configs WHERE id = $1")
            .bind(config_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_extraction_fields(&self, field_ids: &[Uuid]) -> Result<(), DatabaseError> {
        if field_ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.begin("delete_extraction_fields").await?;
        sqlx::query("DELETE FROM extraction_fields WHERE id = ANY($1)")
            .bind(field_ids)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
