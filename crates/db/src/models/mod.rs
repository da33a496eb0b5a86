//! Persisted model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the insert DTOs the repositories accept.

pub mod api_key;
pub mod job;
pub mod status;
