use serde::Serialize;

// ============================================================================
// Error Taxonomy
// ============================================================================
//
// Validation     - rejected before any mutation
// Conflict       - recoverable by the caller with different input or state
// NotFound       - the referenced record does not exist
// Forbidden      - the caller may not act on the record
// Infrastructure - storage failure, nothing from the call persisted
//
// Nothing inside the ledger retries; retries are the caller's decision.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Forbidden,
    Infrastructure,
}

/// Implemented by every domain error so outer layers can map it without
/// matching on individual variants.
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}
