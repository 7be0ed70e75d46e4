use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Unsupported sort column: {0}")]
    InvalidSortColumn(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidParameter { field: &'static str, value: String },

    #[error("Invalid date for {field}: {value}")]
    InvalidDate { field: &'static str, value: String },
}

impl QueryError {
    /// Query-string parameter the error refers to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            QueryError::InvalidIdentifier(_) => None,
            QueryError::InvalidSortColumn(_) => Some("sortBy"),
            QueryError::InvalidParameter { field, .. } => Some(field),
            QueryError::InvalidDate { field, .. } => Some(field),
        }
    }
}
