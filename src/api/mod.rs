pub mod projects;

pub use projects::*;

use serde::{Deserialize, Serialize};

/// Outcome reported in response bodies, separate from the HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    NotFound,
    /// The operation nominally succeeded but returned incomplete data
    Degraded,
}
