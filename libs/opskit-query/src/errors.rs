/// Rejected listing input. Every variant is user-correctable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("malformed query: {0}")]
    MalformedQuery(String),

    #[error("invalid sortOrder '{0}', expected ASC or DESC")]
    InvalidSortOrder(String),

    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("invalid limits: {0}")]
    InvalidLimits(&'static str),
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedQuery(msg.into())
    }

    pub(crate) fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}
