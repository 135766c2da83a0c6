pub mod config;
pub mod error;
pub mod types;

pub use error::{FileRole, TransformError, TransformResult};
pub use types::{TransformOutcome, TransformRequest, WorkerCount, WorkerReport};
