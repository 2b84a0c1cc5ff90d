pub mod errors;
pub mod project_service;

pub use errors::{ServiceError, ServiceResult};
pub use project_service::ProjectService;
