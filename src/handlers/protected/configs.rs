use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::api::{
    AddExtractionFieldsRequest, AddExtractionFieldsResponse, CreateExtractionConfigRequest,
    CreateExtractionConfigResponse, DeleteExtractionConfigRequest, DeleteExtractionConfigResponse,
    DeleteExtractionFieldsRequest, DeleteExtractionFieldsResponse, ExtractionConfigResponse,
};
use crate::app::AppState;
use crate::auth::AuthUser;
use crate::middleware::{respond, ApiResult};

/// POST /projects/configs/ - Create a project's extraction config with fields
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateExtractionConfigRequest>,
) -> ApiResult<CreateExtractionConfigResponse> {
    respond(state.project_service(&user).create_extraction_config(request).await)
}

/// GET /projects/configs/by-project/:project_id - 404 when the project has no config
pub async fn get_by_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<ExtractionConfigResponse> {
    respond(state.project_service(&user).get_extraction_config(project_id).await)
}

/// DELETE /projects/configs/by-project/:project_id
pub async fn delete_by_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<DeleteExtractionConfigResponse> {
    respond(
        state
            .project_service(&user)
            .delete_extraction_config(DeleteExtractionConfigRequest { project_id })
            .await,
    )
}

/// POST /projects/configs/:config_id/fields
pub async fn fields_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(config_id): Path<Uuid>,
    Json(request): Json<AddExtractionFieldsRequest>,
) -> ApiResult<AddExtractionFieldsResponse> {
    respond(
        state
            .project_service(&user)
            .add_extraction_fields(config_id, request)
            .await,
    )
}

/// DELETE /projects/configs/:config_id/fields - Body lists the field ids.
/// The config id only scopes the route; deletion is by field id.
pub async fn fields_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(_config_id): Path<Uuid>,
    Json(request): Json<DeleteExtractionFieldsRequest>,
) -> ApiResult<DeleteExtractionFieldsResponse> {
    respond(
        state
            .project_service(&user)
            .delete_extraction_fields(request)
            .await,
    )
}
