use thiserror::Error;

/// Errors reported by the binding surface and the loaders.
///
/// The tree algorithms themselves never fail: invalid server paths are skipped
/// and every other problem ends up as an error string on a leaf.
#[derive(Error, Debug)]
pub enum FormError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field is not a scalar field: {0}")]
    NotALeaf(String),

    #[error("field is not a repeatable group: {0}")]
    NotAGroup(String),

    #[error("index {index} out of bounds for group {group} (len {len})")]
    IndexOutOfBounds {
        group: String,
        index: usize,
        len: usize,
    },

    #[error("operation requires a sub-form view")]
    UnboundScope,

    #[error("no tokio runtime available to schedule validation")]
    NoRuntime,

    #[error("invalid schema: {0}")]
    Schema(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T, E = FormError> = std::result::Result<T, E>;
