/// Jobs are keyed by UUID so identifiers are safe to hand out in URLs and
/// webhook payloads without leaking insertion order.
pub type JobId = uuid::Uuid;

/// Token minted for a single dispatch attempt of a job.
///
/// Every (re-)dispatch gets a fresh token; conditional updates compare it so
/// a superseded attempt can no longer touch the job.
pub type ExecutionToken = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
