//! Repository layer.
//!
//! `ApiKeyRepo` follows the zero-sized-struct convention (async methods
//! taking `&PgPool` first). `PgJobStore` instead holds the pool so it can
//! implement the [`JobStore`](crate::store::JobStore) trait object the
//! orchestrator is built against.

pub mod api_key_repo;
pub mod job_repo;

pub use api_key_repo::ApiKeyRepo;
pub use job_repo::PgJobStore;
