/// Generation runs are identified by a random UUID created at
/// invocation time.
pub type RunId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
