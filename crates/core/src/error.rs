#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Composition failed: {0}")]
    Composition(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
