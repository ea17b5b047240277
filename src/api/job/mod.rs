pub mod models;
pub mod dto;
pub mod handlers;
pub mod service;

// Re-export commonly used types
pub use models::{NewJob, PriorityUpdate, StatusUpdate};
pub use service::JobService;
