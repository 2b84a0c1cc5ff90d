// Request and response bodies for the /projects routes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ResponseStatus;
use crate::database::models::{ExtractionField, NewExtractionField, NewProjectSource, ProjectSource};

// Projects

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub description: String,
}

/// Returned by create and get. A degraded create carries the nil id; a missing
/// project on get echoes the requested id with an empty description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub project_id: Uuid,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub status: ResponseStatus,
}

pub type CreateProjectResponse = ProjectResponse;
pub type GetProjectResponse = ProjectResponse;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetProjectRequest {
    pub project_id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeleteProjectRequest {
    pub project_id: Uuid,
}

/// Body for every operation that reports nothing but an outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: ResponseStatus,
}

impl StatusResponse {
    pub fn new(status: ResponseStatus) -> Self {
        Self { status }
    }
}

pub type DeleteProjectResponse = StatusResponse;

// Sources

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSourceRequest {
    pub backend_name: String,
    pub backend_query: String,
}

impl From<ProjectSourceRequest> for NewProjectSource {
    fn from(req: ProjectSourceRequest) -> Self {
        Self {
            backend_name: req.backend_name,
            backend_query: req.backend_query,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectSourcesRequest {
    pub project_id: Uuid,
    pub sources: Vec<ProjectSourceRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProjectSourcesResponse {
    pub project_id: Uuid,
    pub source_count: usize,
    pub status: ResponseStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListProjectSourcesResponse {
    pub project_id: Uuid,
    pub sources: Vec<ProjectSource>,
    pub status: ResponseStatus,
}

// Extraction configs

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionFieldRequest {
    pub field_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<ExtractionFieldRequest> for NewExtractionField {
    fn from(req: ExtractionFieldRequest) -> Self {
        Self {
            field_name: req.field_name,
            description: req.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExtractionConfigRequest {
    pub project_id: Uuid,
    #[serde(default)]
    pub fields: Vec<ExtractionFieldRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateExtractionConfigResponse {
    pub config_id: Uuid,
    pub field_count: usize,
    pub status: ResponseStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfigResponse {
    pub config_id: Uuid,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub fields: Vec<ExtractionField>,
    pub status: ResponseStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeleteExtractionConfigRequest {
    pub project_id: Uuid,
}

pub type DeleteExtractionConfigResponse = StatusResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddExtractionFieldsRequest {
    pub fields: Vec<ExtractionFieldRequest>,
}

pub type AddExtractionFieldsResponse = StatusResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteExtractionFieldsRequest {
    pub field_ids: Vec<Uuid>,
}

pub type DeleteExtractionFieldsResponse = StatusResponse;
