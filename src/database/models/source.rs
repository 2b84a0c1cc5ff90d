use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProjectSource {
    pub id: Uuid,
    pub project_id: Uuid,
    pub backend_name: String,
    pub backend_query: String,
}

/// Source values supplied by a caller; the id is generated at insertion time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProjectSource {
    pub backend_name: String,
    pub backend_query: String,
}
