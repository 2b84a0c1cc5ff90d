use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::api::{
    AddExtractionFieldsRequest, AddExtractionFieldsResponse, CreateExtractionConfigRequest,
    CreateExtractionConfigResponse, CreateProjectRequest, CreateProjectResponse, CreateProjectSourcesRequest,
    CreateProjectSourcesResponse, DeleteExtractionConfigRequest, DeleteExtractionConfigResponse,
    DeleteExtractionFieldsRequest, DeleteExtractionFieldsResponse, DeleteProjectRequest, DeleteProjectResponse,
    ExtractionConfigResponse, GetProjectRequest, GetProjectResponse, ListProjectSourcesResponse, ResponseStatus,
    StatusResponse,
};
use crate::database::models::{NewExtractionField, NewProjectSource};
use crate::database::{DatabaseError, ProjectStore};
use crate::services::errors::{ServiceError, ServiceResult};

/// Project use cases over a caller-scoped store.
///
/// Each method returns `Ok` for every expected outcome, including "not found"
/// reported through the response status. Store failures and panics become
/// `ServiceError::Internal` tagged with the operation name.
pub struct ProjectService {
    store: Arc<dyn ProjectStore>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }

    pub async fn create_project(&self, request: CreateProjectRequest) -> ServiceResult<CreateProjectResponse> {
        const OP: &str = "creation";
        guarded(OP, async move {
            let created = self
                .store
                .create_project(&request.description)
                .await
                .map_err(translate(OP))?;

            Ok(match created {
                Some(project) => CreateProjectResponse {
                    project_id: project.id,
                    description: project.description,
                    created_at: Some(project.created_at),
                    status: ResponseStatus::Success,
                },
                None => {
                    warn!("Project insert returned no row; reporting degraded result");
                    CreateProjectResponse {
                        project_id: Uuid::nil(),
                        description: request.description,
                        created_at: None,
                        status: ResponseStatus::Degraded,
                    }
                }
            })
        })
        .await
    }

    pub async fn get_project(&self, request: GetProjectRequest) -> ServiceResult<GetProjectResponse> {
        const OP: &str = "fetch";
        guarded(OP, async move {
            let found = self
                .store
                .get_project_by_id(request.project_id)
                .await
                .map_err(translate(OP))?;

            Ok(match found {
                Some(project) => GetProjectResponse {
                    project_id: project.id,
                    description: project.description,
                    created_at: Some(project.created_at),
                    status: ResponseStatus::Success,
                },
                None => {
                    debug!(project_id = %request.project_id, "Project not found");
                    GetProjectResponse {
                        project_id: request.project_id,
                        description: String::new(),
                        created_at: None,
                        status: ResponseStatus::NotFound,
                    }
                }
            })
        })
        .await
    }

    pub async fn delete_project(&self, request: DeleteProjectRequest) -> ServiceResult<DeleteProjectResponse> {
        const OP: &str = "deletion";
        guarded(OP, async move {
            let removed = self
                .store
                .delete_project(request.project_id)
                .await
                .map_err(translate(OP))?;

            Ok(StatusResponse::new(if removed {
                ResponseStatus::Success
            } else {
                ResponseStatus::NotFound
            }))
        })
        .await
    }

    /// Replace every source of a project with `request.sources`.
    ///
    /// The delete and the insert are separate store calls: a failure between
    /// them leaves the project with no sources.
    pub async fn create_project_sources(
        &self,
        request: CreateProjectSourcesRequest,
    ) -> ServiceResult<CreateProjectSourcesResponse> {
        const OP: &str = "source creation";
        guarded(OP, async move {
            let project_id = request.project_id;
            if self
                .store
                .get_project_by_id(project_id)
                .await
                .map_err(translate(OP))?
                .is_none()
            {
                return Ok(CreateProjectSourcesResponse {
                    project_id,
                    source_count: 0,
                    status: ResponseStatus::NotFound,
                });
            }

            let sources: Vec<NewProjectSource> = request.sources.into_iter().map(Into::into).collect();

            self.store
                .delete_project_sources(project_id)
                .await
                .map_err(translate(OP))?;
            let source_count = self
                .store
                .insert_project_sources(project_id, &sources)
                .await
                .map_err(translate(OP))?;

            Ok(CreateProjectSourcesResponse {
                project_id,
                source_count,
                status: ResponseStatus::Success,
            })
        })
        .await
    }

    pub async fn list_project_sources(&self, project_id: Uuid) -> ServiceResult<ListProjectSourcesResponse> {
        const OP: &str = "source listing";
        guarded(OP, async move {
            if self
                .store
                .get_project_by_id(project_id)
                .await
                .map_err(translate(OP))?
                .is_none()
            {
                return Ok(ListProjectSourcesResponse {
                    project_id,
                    sources: vec![],
                    status: ResponseStatus::NotFound,
                });
            }

            let sources = self
                .store
                .list_project_sources(project_id)
                .await
                .map_err(translate(OP))?;

            Ok(ListProjectSourcesResponse {
                project_id,
                sources,
                status: ResponseStatus::Success,
            })
        })
        .await
    }

    /// Create the project's extraction config together with its initial fields.
    ///
    /// A project that already has a config is rejected. Config and fields are
    /// written by separate store calls without a shared transaction.
    pub async fn create_extraction_config(
        &self,
        request: CreateExtractionConfigRequest,
    ) -> ServiceResult<CreateExtractionConfigResponse> {
        const OP: &str = "extraction config creation";
        guarded(OP, async move {
            let existing = self
                .store
                .find_extraction_config(request.project_id)
                .await
                .map_err(translate(OP))?;
            if existing.is_some() {
                warn!(project_id = %request.project_id, "Extraction config already exists");
                return Err(ServiceError::internal(format!(
                    "Extraction config already exists for project {}",
                    request.project_id
                )));
            }

            let config = self
                .store
                .create_extraction_config(request.project_id)
                .await
                .map_err(translate(OP))?;

            let fields: Vec<NewExtractionField> = request.fields.into_iter().map(Into::into).collect();
            let field_count = self
                .store
                .insert_extraction_fields(config.id, &fields)
                .await
                .map_err(translate(OP))?;

            Ok(CreateExtractionConfigResponse {
                config_id: config.id,
                field_count,
                status: ResponseStatus::Success,
            })
        })
        .await
    }

    /// Fetch the project's config and fields. Absence is a `NotFound` error,
    /// unlike `get_project` which reports it through the response status.
    pub async fn get_extraction_config(&self, project_id: Uuid) -> ServiceResult<ExtractionConfigResponse> {
        const OP: &str = "extraction config fetch";
        guarded(OP, async move {
            let config = self
                .store
                .find_extraction_config(project_id)
                .await
                .map_err(translate(OP))?
                .ok_or_else(|| ServiceError::not_found("Extraction config for project", Some(project_id)))?;

            let fields = self
                .store
                .list_extraction_fields(config.id)
                .await
                .map_err(translate(OP))?;

            Ok(ExtractionConfigResponse {
                config_id: config.id,
                project_id: config.project_id,
                created_at: config.created_at,
                fields,
                status: ResponseStatus::Success,
            })
        })
        .await
    }

    /// Append fields to a config. The config is not checked first; a missing
    /// or foreign config surfaces as a store failure.
    pub async fn add_extraction_fields(
        &self,
        config_id: Uuid,
        request: AddExtractionFieldsRequest,
    ) -> ServiceResult<AddExtractionFieldsResponse> {
        const OP: &str = "extraction field insertion";
        guarded(OP, async move {
            let fields: Vec<NewExtractionField> = request.fields.into_iter().map(Into::into).collect();
            self.store
                .insert_extraction_fields(config_id, &fields)
                .await
                .map_err(translate(OP))?;
            Ok(StatusResponse::new(ResponseStatus::Success))
        })
        .await
    }

    pub async fn delete_extraction_config(
        &self,
        request: DeleteExtractionConfigRequest,
    ) -> ServiceResult<DeleteExtractionConfigResponse> {
        const OP: &str = "extraction config deletion";
        guarded(OP, async move {
            let Some(config) = self
                .store
                .find_extraction_config(request.project_id)
                .await
                .map_err(translate(OP))?
            else {
                return Ok(StatusResponse::new(ResponseStatus::NotFound));
            };

            self.store
                .delete_extraction_config(config.id)
                .await
                .map_err(translate(OP))?;
            Ok(StatusResponse::new(ResponseStatus::Success))
        })
        .await
    }

    /// Delete fields by id. Reports success whether or not any id matched.
    pub async fn delete_extraction_fields(
        &self,
        request: DeleteExtractionFieldsRequest,
    ) -> ServiceResult<DeleteExtractionFieldsResponse> {
        const OP: &str = "extraction field deletion";
        guarded(OP, async move {
            self.store
                .delete_extraction_fields(&request.field_ids)
                .await
                .map_err(translate(OP))?;
            Ok(StatusResponse::new(ResponseStatus::Success))
        })
        .await
    }
}

/// Map a store failure to an internal service error naming the operation
fn translate(operation: &'static str) -> impl Fn(DatabaseError) -> ServiceError {
    move |err| {
        error!(operation, error = %err, "Project store call failed");
        if err.is_storage_failure() {
            ServiceError::internal(format!("Database error during {}: {}", operation, err))
        } else {
            ServiceError::internal(format!("Unhandled error during {}: {}", operation, err))
        }
    }
}

/// Run a use case, turning a panic inside it into an internal error
async fn guarded<T, F>(operation: &'static str, use_case: F) -> ServiceResult<T>
where
    F: Future<Output = ServiceResult<T>>,
{
    match AssertUnwindSafe(use_case).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let detail = panic_detail(panic.as_ref());
            error!(operation, detail = %detail, "Use case panicked");
            Err(ServiceError::internal(format!("Unhandled error during {}: {}", operation, detail)))
        }
    }
}

fn panic_detail(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ExtractionFieldRequest, ProjectSourceRequest};
    use crate::database::{Fault, MemoryStoreProvider};

    fn service() -> (ProjectService, MemoryStoreProvider) {
        let provider = MemoryStoreProvider::new();
        let service = ProjectService::new(Arc::new(provider.store_for_user(Uuid::new_v4())));
        (service, provider)
    }

    fn source(name: &str, query: &str) -> ProjectSourceRequest {
        ProjectSourceRequest {
            backend_name: name.to_string(),
            backend_query: query.to_string(),
        }
    }

    fn field(name: &str, description: Option<&str>) -> ExtractionFieldRequest {
        ExtractionFieldRequest {
            field_name: name.to_string(),
            description: description.map(str::to_string),
        }
    }

    async fn create(service: &ProjectService, description: &str) -> Uuid {
        service
            .create_project(CreateProjectRequest {
                description: description.to_string(),
            })
            .await
            .unwrap()
            .project_id
    }

    fn assert_internal_prefix(err: ServiceError, prefix: &str) {
        match err {
            ServiceError::Internal { detail } => {
                assert!(detail.starts_with(prefix), "unexpected detail: {}", detail)
            }
            other => panic!("expected internal error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_same_description() {
        let (service, _) = service();
        let created = service
            .create_project(CreateProjectRequest {
                description: "Testing Project".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.status, ResponseStatus::Success);
        assert!(created.created_at.is_some());
        assert_ne!(created.project_id, Uuid::nil());

        let fetched = service
            .get_project(GetProjectRequest {
                project_id: created.project_id,
            })
            .await
            .unwrap();
        assert_eq!(fetched.status, ResponseStatus::Success);
        assert_eq!(fetched.description, "Testing Project");
        assert_eq!(fetched.project_id, created.project_id);
    }

    #[tokio::test]
    async fn create_with_empty_insert_result_is_degraded() {
        let (service, provider) = service();
        provider.inject("create_project", Fault::EmptyResult).await;

        let response = service
            .create_project(CreateProjectRequest {
                description: "Should degrade".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.status, ResponseStatus::Degraded);
        assert_eq!(response.project_id, Uuid::nil());
        assert_eq!(response.description, "Should degrade");
        assert!(response.created_at.is_none());
    }

    #[tokio::test]
    async fn create_failure_is_internal_database_error() {
        let (service, provider) = service();
        provider.inject("create_project", Fault::Error).await;

        let err = service
            .create_project(CreateProjectRequest {
                description: "Will fail".to_string(),
            })
            .await
            .unwrap_err();
        assert_internal_prefix(err, "Database error during creation");
    }

    #[tokio::test]
    async fn get_missing_project_reports_not_found_status() {
        let (service, _) = service();
        let project_id = Uuid::new_v4();
        let response = service.get_project(GetProjectRequest { project_id }).await.unwrap();
        assert_eq!(response.status, ResponseStatus::NotFound);
        assert_eq!(response.project_id, project_id);
        assert_eq!(response.description, "");
    }

    #[tokio::test]
    async fn get_failure_is_internal_error() {
        let (service, provider) = service();
        provider.inject("get_project_by_id", Fault::Error).await;
        let err = service
            .get_project(GetProjectRequest {
                project_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert_internal_prefix(err, "Database error during fetch");
    }

    #[tokio::test]
    async fn panicking_store_becomes_unhandled_error() {
        let (service, provider) = service();
        provider.inject("get_project_by_id", Fault::Panic).await;
        let err = service
            .get_project(GetProjectRequest {
                project_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert_internal_prefix(err, "Unhandled error during fetch: injected panic");
    }

    #[tokio::test]
    async fn delete_reports_success_then_not_found() {
        let (service, _) = service();
        let project_id = create(&service, "Project to delete").await;

        let first = service.delete_project(DeleteProjectRequest { project_id }).await.unwrap();
        assert_eq!(first.status, ResponseStatus::Success);

        let second = service.delete_project(DeleteProjectRequest { project_id }).await.unwrap();
        assert_eq!(second.status, ResponseStatus::NotFound);
    }

    #[tokio::test]
    async fn delete_failure_is_internal_error() {
        let (service, provider) = service();
        provider.inject("delete_project", Fault::Error).await;
        let err = service
            .delete_project(DeleteProjectRequest {
                project_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert_internal_prefix(err, "Database error during deletion");
    }

    #[tokio::test]
    async fn sources_replace_previous_set() {
        let (service, _) = service();
        let project_id = create(&service, "Source test project").await;

        let first = service
            .create_project_sources(CreateProjectSourcesRequest {
                project_id,
                sources: vec![source("arXiv", "AI"), source("PubMed", "genetics"), source("Scholar", "ml")],
            })
            .await
            .unwrap();
        assert_eq!(first.source_count, 3);
        assert_eq!(first.status, ResponseStatus::Success);

        let second = service
            .create_project_sources(CreateProjectSourcesRequest {
                project_id,
                sources: vec![source("arXiv", "LLM")],
            })
            .await
            .unwrap();
        assert_eq!(second.source_count, 1);

        let listed = service.list_project_sources(project_id).await.unwrap();
        assert_eq!(listed.status, ResponseStatus::Success);
        assert_eq!(listed.sources.len(), 1);
        assert_eq!(listed.sources[0].backend_name, "arXiv");
        assert_eq!(listed.sources[0].backend_query, "LLM");
    }

    #[tokio::test]
    async fn sources_for_missing_project_report_not_found() {
        let (service, _) = service();
        let response = service
            .create_project_sources(CreateProjectSourcesRequest {
                project_id: Uuid::new_v4(),
                sources: vec![source("Test", "query")],
            })
            .await
            .unwrap();
        assert_eq!(response.status, ResponseStatus::NotFound);
        assert_eq!(response.source_count, 0);

        let listed = service.list_project_sources(Uuid::new_v4()).await.unwrap();
        assert_eq!(listed.status, ResponseStatus::NotFound);
    }

    // Replacing sources is not atomic: a failed insert after the delete leaves
    // the project with no sources at all.
    #[tokio::test]
    async fn failed_source_insert_leaves_no_sources() {
        let (service, provider) = service();
        let project_id = create(&service, "Failing insert test").await;
        service
            .create_project_sources(CreateProjectSourcesRequest {
                project_id,
                sources: vec![source("arXiv", "AI")],
            })
            .await
            .unwrap();

        provider.inject("insert_project_sources", Fault::Error).await;
        let err = service
            .create_project_sources(CreateProjectSourcesRequest {
                project_id,
                sources: vec![source("Fail", "fail")],
            })
            .await
            .unwrap_err();
        assert_internal_prefix(err, "Database error during source creation");

        provider.clear_faults().await;
        let listed = service.list_project_sources(project_id).await.unwrap();
        assert!(listed.sources.is_empty());
    }

    #[tokio::test]
    async fn create_extraction_config_with_fields() {
        let (service, _) = service();
        let project_id = create(&service, "p").await;

        let response = service
            .create_extraction_config(CreateExtractionConfigRequest {
                project_id,
                fields: vec![field("title", Some("The title field")), field("authors", None)],
            })
            .await
            .unwrap();
        assert_eq!(response.field_count, 2);
        assert_eq!(response.status, ResponseStatus::Success);

        let fetched = service.get_extraction_config(project_id).await.unwrap();
        assert_eq!(fetched.config_id, response.config_id);
        let names: Vec<&str> = fetched.fields.iter().map(|f| f.field_name.as_str()).collect();
        assert_eq!(names, vec!["title", "authors"]);
        assert_eq!(fetched.fields[0].description.as_deref(), Some("The title field"));
        assert_eq!(fetched.fields[1].description, None);
    }

    #[tokio::test]
    async fn second_extraction_config_is_rejected_regardless_of_fields() {
        let (service, _) = service();
        let project_id = create(&service, "p").await;
        service
            .create_extraction_config(CreateExtractionConfigRequest {
                project_id,
                fields: vec![],
            })
            .await
            .unwrap();

        for fields in [vec![], vec![field("title", None)]] {
            let err = service
                .create_extraction_config(CreateExtractionConfigRequest { project_id, fields })
                .await
                .unwrap_err();
            assert!(!err.is_not_found());
            assert_internal_prefix(err, "Extraction config already exists");
        }
    }

    // Config and fields are written separately: a failed field insert leaves
    // the config behind without fields.
    #[tokio::test]
    async fn failed_field_insert_leaves_empty_config() {
        let (service, provider) = service();
        let project_id = create(&service, "p").await;
        provider.inject("insert_extraction_fields", Fault::Error).await;

        let err = service
            .create_extraction_config(CreateExtractionConfigRequest {
                project_id,
                fields: vec![field("title", None)],
            })
            .await
            .unwrap_err();
        assert_internal_prefix(err, "Database error during extraction config creation");

        provider.clear_faults().await;
        let fetched = service.get_extraction_config(project_id).await.unwrap();
        assert!(fetched.fields.is_empty());
    }

    #[tokio::test]
    async fn empty_config_insert_result_is_internal_error() {
        let (service, provider) = service();
        let project_id = create(&service, "p").await;
        provider.inject("create_extraction_config", Fault::EmptyResult).await;

        let err = service
            .create_extraction_config(CreateExtractionConfigRequest {
                project_id,
                fields: vec![],
            })
            .await
            .unwrap_err();
        assert_internal_prefix(err, "Database error during extraction config creation");
    }

    #[tokio::test]
    async fn get_missing_extraction_config_is_not_found_error() {
        let (service, _) = service();
        let project_id = create(&service, "p").await;
        let err = service.get_extraction_config(project_id).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains(&project_id.to_string()));
    }

    #[tokio::test]
    async fn add_extraction_fields_appends() {
        let (service, _) = service();
        let project_id = create(&service, "p").await;
        let config_id = service
            .create_extraction_config(CreateExtractionConfigRequest {
                project_id,
                fields: vec![field("title", None)],
            })
            .await
            .unwrap()
            .config_id;

        let response = service
            .add_extraction_fields(
                config_id,
                AddExtractionFieldsRequest {
                    fields: vec![field("abstract", None)],
                },
            )
            .await
            .unwrap();
        assert_eq!(response.status, ResponseStatus::Success);

        let fetched = service.get_extraction_config(project_id).await.unwrap();
        assert_eq!(fetched.fields.len(), 2);
    }

    #[tokio::test]
    async fn add_fields_to_unknown_config_is_internal_error() {
        let (service, _) = service();
        let err = service
            .add_extraction_fields(
                Uuid::new_v4(),
                AddExtractionFieldsRequest {
                    fields: vec![field("fail", None)],
                },
            )
            .await
            .unwrap_err();
        assert_internal_prefix(err, "Database error during extraction field insertion");
    }

    #[tokio::test]
    async fn delete_extraction_config_removes_config_and_fields() {
        let (service, _) = service();
        let project_id = create(&service, "p").await;
        service
            .create_extraction_config(CreateExtractionConfigRequest {
                project_id,
                fields: vec![field("title", None)],
            })
            .await
            .unwrap();

        let response = service
            .delete_extraction_config(DeleteExtractionConfigRequest { project_id })
            .await
            .unwrap();
        assert_eq!(response.status, ResponseStatus::Success);
        assert!(service.get_extraction_config(project_id).await.unwrap_err().is_not_found());

        let again = service
            .delete_extraction_config(DeleteExtractionConfigRequest { project_id })
            .await
            .unwrap();
        assert_eq!(again.status, ResponseStatus::NotFound);
    }

    #[tokio::test]
    async fn delete_extraction_config_failure_is_internal_error() {
        let (service, provider) = service();
        let project_id = create(&service, "p").await;
        service
            .create_extraction_config(CreateExtractionConfigRequest {
                project_id,
                fields: vec![],
            })
            .await
            .unwrap();
        provider.inject("delete_extraction_config", Fault::Error).await;

        let err = service
            .delete_extraction_config(DeleteExtractionConfigRequest { project_id })
            .await
            .unwrap_err();
        assert_internal_prefix(err, "Database error during extraction config deletion");
    }

    #[tokio::test]
    async fn delete_extraction_fields_succeeds_for_known_and_unknown_ids() {
        let (service, _) = service();
        let project_id = create(&service, "p").await;
        service
            .create_extraction_config(CreateExtractionConfigRequest {
                project_id,
                fields: vec![field("title", None), field("authors", None)],
            })
            .await
            .unwrap();
        let fields = service.get_extraction_config(project_id).await.unwrap().fields;

        let response = service
            .delete_extraction_fields(DeleteExtractionFieldsRequest {
                field_ids: vec![fields[0].id],
            })
            .await
            .unwrap();
        assert_eq!(response.status, ResponseStatus::Success);
        let remaining = service.get_extraction_config(project_id).await.unwrap().fields;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].field_name, "authors");

        let none_matched = service
            .delete_extraction_fields(DeleteExtractionFieldsRequest {
                field_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
            })
            .await
            .unwrap();
        assert_eq!(none_matched.status, ResponseStatus::Success);
    }

    #[tokio::test]
    async fn delete_extraction_fields_failure_is_internal_error() {
        let (service, provider) = service();
        provider.inject("delete_extraction_fields", Fault::Error).await;
        let err = service
            .delete_extraction_fields(DeleteExtractionFieldsRequest {
                field_ids: vec![Uuid::new_v4()],
            })
            .await
            .unwrap_err();
        assert_internal_prefix(err, "Database error during extraction field deletion");
    }
}
