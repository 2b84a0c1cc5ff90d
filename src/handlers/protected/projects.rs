use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::api::{
    CreateProjectRequest, CreateProjectResponse, CreateProjectSourcesRequest, CreateProjectSourcesResponse,
    DeleteProjectRequest, DeleteProjectResponse, GetProjectRequest, GetProjectResponse,
    ListProjectSourcesResponse, ProjectSourceRequest,
};
use crate::app::AppState;
use crate::auth::AuthUser;
use crate::middleware::{respond, ApiResult};

/// POST /projects/ - Create a project owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<CreateProjectResponse> {
    respond(state.project_service(&user).create_project(request).await)
}

/// GET /projects/:project_id - 200 with status NOT_FOUND when absent
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<GetProjectResponse> {
    respond(
        state
            .project_service(&user)
            .get_project(GetProjectRequest { project_id })
            .await,
    )
}

/// DELETE /projects/:project_id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<DeleteProjectResponse> {
    respond(
        state
            .project_service(&user)
            .delete_project(DeleteProjectRequest { project_id })
            .await,
    )
}

/// POST /projects/:project_id/sources - Replace the project's source set
pub async fn sources_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(sources): Json<Vec<ProjectSourceRequest>>,
) -> ApiResult<CreateProjectSourcesResponse> {
    respond(
        state
            .project_service(&user)
            .create_project_sources(CreateProjectSourcesRequest { project_id, sources })
            .await,
    )
}

/// GET /projects/:project_id/sources
pub async fn sources_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<ListProjectSourcesResponse> {
    respond(state.project_service(&user).list_project_sources(project_id).await)
}
