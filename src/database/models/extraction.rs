use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// At most one per project; the rule is checked by the service, not the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExtractionConfig {
    pub id: Uuid,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExtractionField {
    pub id: Uuid,
    pub config_id: Uuid,
    pub field_name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Field values supplied by a caller; id and created_at are generated at insertion time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExtractionField {
    pub field_name: String,
    pub description: Option<String>,
}
