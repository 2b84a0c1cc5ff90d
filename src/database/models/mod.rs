pub mod extraction;
pub mod project;
pub mod source;

pub use extraction::{ExtractionConfig, ExtractionField, NewExtractionField};
pub use project::Project;
pub use source::{NewProjectSource, ProjectSource};
