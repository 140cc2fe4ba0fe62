//! Shared error type across remguard crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed message.
    BadRequest,
    /// Auth failed.
    AuthFailed,
    /// Endpoint is not registered.
    UnknownEndpoint,
    /// Registration rejected by configuration checks.
    ConfigInvalid,
    /// External filter unavailable or failing.
    FilterFailed,
    /// Handler returned an error.
    HandlerFailed,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::UnknownEndpoint => "UNKNOWN_ENDPOINT",
            ClientCode::ConfigInvalid => "CONFIG_INVALID",
            ClientCode::FilterFailed => "FILTER_FAILED",
            ClientCode::HandlerFailed => "HANDLER_FAILED",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GuardError>;

/// Unified error type used by core and gateway.
///
/// Policy violations are *not* errors; they are reported as
/// [`RejectReason`] values so that a hostile call can never unwind into
/// the handler or the transport.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),
    #[error("auth failed")]
    AuthFailed,
    #[error("filter: {0}")]
    Filter(String),
    #[error("handler: {0}")]
    Handler(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl GuardError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            GuardError::BadRequest(_) => ClientCode::BadRequest,
            GuardError::Config(_) => ClientCode::ConfigInvalid,
            GuardError::UnknownEndpoint(_) => ClientCode::UnknownEndpoint,
            GuardError::AuthFailed => ClientCode::AuthFailed,
            GuardError::Filter(_) => ClientCode::FilterFailed,
            GuardError::Handler(_) => ClientCode::HandlerFailed,
            GuardError::Internal(_) => ClientCode::Internal,
        }
    }
}

/// Why a call was rejected before reaching its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// NaN or infinite number while invalid numbers are blocked.
    InvalidNumber,
    /// Number outside the configured inclusive range.
    OutOfRange,
    /// Negative or positive number where that sign is disallowed.
    SignNotAllowed,
    /// Kind or host tag not in the configured allow-list.
    TypeNotAllowed,
    /// String length outside the configured inclusive range.
    LengthOutOfRange,
    /// Text filter flagged the string, failed, or timed out.
    ContentRejected,
    /// Table nesting deeper than the scanner permits.
    TooDeep,
    /// Table with more entries than the scanner permits.
    TooManyKeys,
    /// Caller is still inside the endpoint's cooldown window.
    Throttled,
    /// Buffer too large once decompressed, or its size could not be read.
    BufferRejected,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::InvalidNumber => "INVALID_NUMBER",
            RejectReason::OutOfRange => "OUT_OF_RANGE",
            RejectReason::SignNotAllowed => "SIGN_NOT_ALLOWED",
            RejectReason::TypeNotAllowed => "TYPE_NOT_ALLOWED",
            RejectReason::LengthOutOfRange => "LENGTH_OUT_OF_RANGE",
            RejectReason::ContentRejected => "CONTENT_REJECTED",
            RejectReason::TooDeep => "TOO_DEEP",
            RejectReason::TooManyKeys => "TOO_MANY_KEYS",
            RejectReason::Throttled => "THROTTLED",
            RejectReason::BufferRejected => "BUFFER_REJECTED",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
