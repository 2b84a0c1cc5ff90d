use thiserror::Error;

/// Failures a use case reports to its caller. Expected conditions never
/// escape a use case any other way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{resource} not found{}", .resource_id.as_ref().map(|id| format!(": {}", id)).unwrap_or_default())]
    NotFound {
        resource: String,
        resource_id: Option<String>,
    },

    /// Reserved for policy violations surfaced explicitly rather than through row filtering
    #[error("Not authorized to {action}{}", .resource.as_ref().map(|r| format!(" {}", r)).unwrap_or_default())]
    NotAuthorized {
        action: String,
        resource: Option<String>,
    },

    #[error("Internal error: {detail}")]
    Internal { detail: String },
}

impl ServiceError {
    pub fn not_found(resource: impl Into<String>, resource_id: Option<impl ToString>) -> Self {
        ServiceError::NotFound {
            resource: resource.into(),
            resource_id: resource_id.map(|id| id.to_string()),
        }
    }

    pub fn not_authorized(action: impl Into<String>, resource: Option<impl Into<String>>) -> Self {
        ServiceError::NotAuthorized {
            action: action.into(),
            resource: resource.map(Into::into),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        ServiceError::Internal { detail: detail.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
