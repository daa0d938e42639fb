use thiserror::Error;

/// Postgres SQLSTATE for `unique_violation`, passed through by the row API.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Errors returned by the backend client.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("backend returned {status} for {context}: {message}")]
    Api {
        status: u16,
        /// SQLSTATE or API error code, e.g. `"23505"`.
        code: Option<String>,
        message: String,
        details: Option<String>,
        hint: Option<String>,
        context: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A write that should have returned a row returned none.
    #[error("backend returned no rows for {context}")]
    EmptyResponse { context: String },

    #[error("invalid backend URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl BackendError {
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            BackendError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            BackendError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for duplicate-row errors (duplicate favorite, duplicate cart
    /// variant set).
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        self.code() == Some(UNIQUE_VIOLATION)
    }

    /// The backend's own message, as shown to shoppers for unclassified
    /// failures.
    #[must_use]
    pub fn raw_message(&self) -> String {
        match self {
            BackendError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: Option<&str>) -> BackendError {
        BackendError::Api {
            status: 409,
            code: code.map(str::to_owned),
            message: "duplicate key value violates unique constraint".to_owned(),
            details: None,
            hint: None,
            context: "insert into favorites".to_owned(),
        }
    }

    #[test]
    fn unique_violation_is_detected_by_code() {
        assert!(api(Some("23505")).is_unique_violation());
        assert!(!api(Some("23503")).is_unique_violation());
        assert!(!api(None).is_unique_violation());
    }

    #[test]
    fn raw_message_prefers_backend_message() {
        assert_eq!(
            api(None).raw_message(),
            "duplicate key value violates unique constraint"
        );
        let empty = BackendError::EmptyResponse {
            context: "insert into cart".to_owned(),
        };
        assert_eq!(
            empty.raw_message(),
            "backend returned no rows for insert into cart"
        );
    }
}
