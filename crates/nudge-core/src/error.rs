use thiserror::Error;

/// Failures the conversation surfaces to its consumer. Extraction
/// misses and deletes of unknown ids are deliberately absent: both
/// resolve to silent no-ops, never errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Transport or parse failure on the primary response path. Fatal
    /// to the current cycle.
    #[error("generation failed: {0}")]
    Generation(String),

    /// The entity store could not complete an operation.
    #[error("storage failure: {0}")]
    Storage(String),
}
