/// Domain errors shared by every glacier crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// `{0}` names the missing thing, e.g. "Glacier 'Khumbu Glacier'".
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
