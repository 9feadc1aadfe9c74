//! Store error types.
//!
//! Store errors are reported by the gateway implementation. They carry the
//! store's short error code so callers (and retry policies living in the
//! gateway) can tell malformed requests from transient capacity problems.

use std::fmt;

/// Well-known store error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum StoreErrorCode {
    /// Table or index not found.
    ResourceNotFoundException,
    /// Condition check failed.
    ConditionalCheckFailedException,
    /// Provisioned throughput exceeded.
    ProvisionedThroughputExceededException,
    /// Request limit exceeded.
    RequestLimitExceeded,
    /// Request was throttled.
    ThrottlingException,
    /// Validation error (malformed expression, unused placeholder, ...).
    #[default]
    ValidationException,
    /// Serialization error.
    SerializationException,
    /// Internal server error.
    InternalServerError,
    /// Access denied.
    AccessDeniedException,
}

impl StoreErrorCode {
    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceNotFoundException => "ResourceNotFoundException",
            Self::ConditionalCheckFailedException => "ConditionalCheckFailedException",
            Self::ProvisionedThroughputExceededException => {
                "ProvisionedThroughputExceededException"
            }
            Self::RequestLimitExceeded => "RequestLimitExceeded",
            Self::ThrottlingException => "ThrottlingException",
            Self::ValidationException => "ValidationException",
            Self::SerializationException => "SerializationException",
            Self::InternalServerError => "InternalServerError",
            Self::AccessDeniedException => "AccessDeniedException",
        }
    }

    /// Parse a short code, or the suffix of a fully-qualified `__type` string
    /// such as `com.amazonaws.dynamodb.v20120810#ResourceNotFoundException`.
    #[must_use]
    pub fn from_type(error_type: &str) -> Option<Self> {
        let short = error_type.rsplit('#').next().unwrap_or(error_type);
        match short {
            "ResourceNotFoundException" => Some(Self::ResourceNotFoundException),
            "ConditionalCheckFailedException" => Some(Self::ConditionalCheckFailedException),
            "ProvisionedThroughputExceededException" => {
                Some(Self::ProvisionedThroughputExceededException)
            }
            "RequestLimitExceeded" => Some(Self::RequestLimitExceeded),
            "ThrottlingException" => Some(Self::ThrottlingException),
            "ValidationException" => Some(Self::ValidationException),
            "SerializationException" => Some(Self::SerializationException),
            "InternalServerError" => Some(Self::InternalServerError),
            "AccessDeniedException" => Some(Self::AccessDeniedException),
            _ => None,
        }
    }

    /// Whether a request failing with this code may succeed when retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProvisionedThroughputExceededException
                | Self::RequestLimitExceeded
                | Self::ThrottlingException
                | Self::InternalServerError
        )
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::InternalServerError => http::StatusCode::INTERNAL_SERVER_ERROR,
            _ => http::StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error reported by the store gateway.
#[derive(Debug)]
pub struct StoreError {
    /// The error code.
    pub code: StoreErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying transport or SDK error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl StoreError {
    /// Create a store error with a custom message.
    #[must_use]
    pub fn with_message(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether the failed request may be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_fully_qualified_error_type() {
        let code = StoreErrorCode::from_type(
            "com.amazonaws.dynamodb.v20120810#ConditionalCheckFailedException",
        );
        assert_eq!(code, Some(StoreErrorCode::ConditionalCheckFailedException));
        assert_eq!(
            StoreErrorCode::from_type("ThrottlingException"),
            Some(StoreErrorCode::ThrottlingException)
        );
        assert_eq!(StoreErrorCode::from_type("Nope"), None);
    }

    #[test]
    fn test_should_classify_capacity_errors_as_retryable() {
        assert!(StoreErrorCode::ProvisionedThroughputExceededException.is_retryable());
        assert!(
            StoreError::with_message(StoreErrorCode::InternalServerError, "boom").is_retryable()
        );
        assert!(
            !StoreError::with_message(StoreErrorCode::ValidationException, "bad expression")
                .is_retryable()
        );
    }

    #[test]
    fn test_should_format_code_and_message() {
        let err = StoreError::with_message(
            StoreErrorCode::ResourceNotFoundException,
            "Requested resource not found",
        );
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "StoreError(ResourceNotFoundException): Requested resource not found"
        );
    }

    #[test]
    fn test_should_expose_transport_error_as_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "connection timed out");
        let err = StoreError::with_message(StoreErrorCode::InternalServerError, "request failed")
            .with_source(io);
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "connection timed out");
        assert_eq!(err.status_code, http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
