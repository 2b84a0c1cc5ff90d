use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A research project. Ownership is held by the database (`owner_id`) and
/// enforced by row-level policies, so it is not carried here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
