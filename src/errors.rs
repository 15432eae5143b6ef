use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("Invalid value for `{option}`: {detail}")]
    InvalidOption { option: &'static str, detail: String },

    #[error("Invalid field path: {0}")]
    InvalidFieldPath(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Collection not found: {0}")]
    NoSuchCollection(String),

    #[error("Collection already exists: {0}")]
    CollectionAlreadyExists(String),

    #[error("Index not found: {0}")]
    NoSuchIndex(String),

    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl DbError {
    pub(crate) fn option(option: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidOption { option, detail: detail.into() }
    }

    /// True for malformed requests: these are never retried and never partially executed.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSelector(_)
                | Self::InvalidOperator(_)
                | Self::InvalidOption { .. }
                | Self::InvalidFieldPath(_)
                | Self::InvalidRequest(_)
                | Self::Json(_)
        )
    }

    /// HTTP-equivalent status for the surrounding service.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            _ if self.is_client_error() => 400,
            Self::NoSuchCollection(_) | Self::NoSuchIndex(_) => 404,
            Self::CollectionAlreadyExists(_) | Self::IndexAlreadyExists(_) => 409,
            _ => 500,
        }
    }
}

impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_400() {
        let e = DbError::option("limit", "must be a non-negative integer");
        assert!(e.is_client_error());
        assert_eq!(e.status_code(), 400);
        assert_eq!(e.to_string(), "Invalid value for `limit`: must be a non-negative integer");
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(DbError::from(json).status_code(), 400);
    }

    #[test]
    fn other_errors_keep_their_status() {
        assert_eq!(DbError::NoSuchCollection("c".into()).status_code(), 404);
        assert_eq!(DbError::IndexAlreadyExists("i".into()).status_code(), 409);
        assert_eq!(DbError::Io("disk".into()).status_code(), 500);
        assert!(!DbError::Io("disk".into()).is_client_error());
    }
}
