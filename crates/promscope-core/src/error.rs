//! Shared error type across promscope crates.

use thiserror::Error;

/// Coarse error classes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Descriptor or collector rejected at registration time.
    Registration,
    /// One collector failed during a gather; siblings are unaffected.
    Collection,
    /// Gatherers disagree on a family schema; the whole gather fails.
    Merge,
    /// Snapshot could not be serialized.
    Encoding,
    /// Invalid configuration.
    Config,
    /// Misuse of a metric handle (negative counter delta, wrong arity).
    Usage,
}

impl ErrorClass {
    /// String representation used in logs and HTTP error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Registration => "REGISTRATION",
            ErrorClass::Collection => "COLLECTION",
            ErrorClass::Merge => "MERGE",
            ErrorClass::Encoding => "ENCODING",
            ErrorClass::Config => "CONFIG",
            ErrorClass::Usage => "USAGE",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PromscopeError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PromscopeError {
    #[error("invalid metric name: {0:?}")]
    InvalidName(String),
    #[error("invalid label name: {0:?}")]
    InvalidLabelName(String),
    #[error("label {0:?} is declared both as variable and const label")]
    LabelCollision(String),
    #[error("duplicate label name: {0:?}")]
    DuplicateLabel(String),
    #[error("descriptor {0:?} has variable labels, use a vector")]
    UnexpectedLabels(String),
    #[error("inconsistent label cardinality for {name:?}: expected {expected} values, got {got}")]
    Cardinality {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("label {label:?} missing or unknown for {name:?}")]
    LabelMismatch { name: String, label: String },
    #[error("counter cannot decrease (delta {0})")]
    NegativeDelta(f64),

    #[error("collector {0:?} describes no metrics")]
    NoDescriptors(String),
    #[error("duplicate metrics collector registration attempted ({0})")]
    AlreadyRegistered(String),
    #[error("descriptor conflict: {0}")]
    DescriptorConflict(String),
    #[error("pedantic check failed: {0}")]
    Pedantic(String),

    #[error("collect failed for {collector:?}: {reason}")]
    Collect { collector: String, reason: String },
    #[error("assessment failed: {0}")]
    Assessment(String),
    #[error("inconsistent sample for {name:?}: {detail}")]
    InconsistentSample { name: String, detail: String },
    #[error("series {0} was collected before with the same name and label values")]
    DuplicateSeries(String),

    #[error("family {name:?} has conflicting schemas across gatherers: {detail}")]
    SchemaConflict { name: String, detail: String },

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("invalid config: {0}")]
    Config(String),
}

impl PromscopeError {
    /// Map an error to its stable class.
    pub fn class(&self) -> ErrorClass {
        match self {
            PromscopeError::InvalidName(_)
            | PromscopeError::InvalidLabelName(_)
            | PromscopeError::LabelCollision(_)
            | PromscopeError::DuplicateLabel(_)
            | PromscopeError::NoDescriptors(_)
            | PromscopeError::AlreadyRegistered(_)
            | PromscopeError::DescriptorConflict(_)
            | PromscopeError::Pedantic(_) => ErrorClass::Registration,
            PromscopeError::UnexpectedLabels(_)
            | PromscopeError::Cardinality { .. }
            | PromscopeError::LabelMismatch { .. }
            | PromscopeError::NegativeDelta(_) => ErrorClass::Usage,
            PromscopeError::Collect { .. }
            | PromscopeError::Assessment(_)
            | PromscopeError::InconsistentSample { .. }
            | PromscopeError::DuplicateSeries(_) => ErrorClass::Collection,
            PromscopeError::SchemaConflict { .. } => ErrorClass::Merge,
            PromscopeError::Encode(_) => ErrorClass::Encoding,
            PromscopeError::Config(_) => ErrorClass::Config,
        }
    }
}
