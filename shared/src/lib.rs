//! Shared types for the ClearView booking platform
//!
//! Common types used across the backend and its API surface: catalog
//! definitions, schedule value types, request payloads and response
//! structures.

pub mod models;
pub mod request;
pub mod response;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{DayOverview, ServiceDefinition, TimeSlot};
pub use request::PaginationQuery;
pub use response::Paginated;
