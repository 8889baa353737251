//! Persisted entity models
//!
//! SurrealDB document shapes. IDs use `RecordId` with string-friendly
//! (de)serialization via [`serde_helpers`].

pub mod blocked_slot;
pub mod booking;
pub mod contact;
pub mod serde_helpers;

// Re-exports
pub use blocked_slot::*;
pub use booking::*;
pub use contact::*;
