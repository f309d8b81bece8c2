//! Error types for the Lumen client.
//!
//! The library reports failures through [`Error`] via `thiserror`.
//! App crates (cli) wrap this with `color-eyre` for rich diagnostics.

use std::time::Duration;

use serde::Deserialize;

/// Top-level error type for all client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The engine answered with a structured error payload.
    #[error("engine error ({code}): {message}")]
    Engine {
        code: ErrorCode,
        message: String,
        error_type: String,
        link: Option<String>,
    },

    /// Transport-level HTTP failure (connection, TLS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The engine answered with a non-success status and no decodable payload.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// A response body did not match the expected shape.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    /// A request body or query parameter could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    /// An update did not reach a terminal status within the wait deadline.
    #[error("timed out after {waited:?} waiting for update {update_id}")]
    Timeout { update_id: u64, waited: Duration },

    /// The configured host is not a valid HTTP(S) URL.
    #[error("invalid host '{host}': {message}")]
    InvalidHost { host: String, message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap a decode failure with the URL it came from.
    pub(crate) fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Create an invalid-host error from any displayable message.
    pub(crate) fn invalid_host(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidHost {
            host: host.into(),
            message: message.into(),
        }
    }

    /// True if this is an engine error carrying the given code.
    pub fn is_code(&self, code: ErrorCode) -> bool {
        matches!(self, Self::Engine { code: c, .. } if *c == code)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable error codes returned by the engine in `errorCode`.
///
/// Codes the client does not know are preserved in [`ErrorCode::Unknown`]
/// rather than dropped, so callers can still match on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    IndexNotFound,
    IndexAlreadyExists,
    InvalidIndexUid,
    DocumentNotFound,
    MissingPrimaryKey,
    PrimaryKeyInferenceFailed,
    InvalidApiKey,
    MissingAuthorizationHeader,
    BadParameter,
    BadRequest,
    PayloadTooLarge,
    UnsupportedMediaType,
    Internal,
    Maintenance,
    Unknown(String),
}

impl ErrorCode {
    /// Parse a wire code string. Never fails; unrecognized codes become
    /// [`ErrorCode::Unknown`].
    pub fn from_wire(code: &str) -> Self {
        match code {
            "index_not_found" => Self::IndexNotFound,
            "index_already_exists" => Self::IndexAlreadyExists,
            "invalid_index_uid" => Self::InvalidIndexUid,
            "document_not_found" => Self::DocumentNotFound,
            "missing_primary_key" => Self::MissingPrimaryKey,
            "primary_key_inference_failed" => Self::PrimaryKeyInferenceFailed,
            "invalid_api_key" => Self::InvalidApiKey,
            "missing_authorization_header" => Self::MissingAuthorizationHeader,
            "bad_parameter" => Self::BadParameter,
            "bad_request" => Self::BadRequest,
            "payload_too_large" => Self::PayloadTooLarge,
            "unsupported_media_type" => Self::UnsupportedMediaType,
            "internal" => Self::Internal,
            "maintenance" => Self::Maintenance,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The wire representation of this code.
    pub fn as_wire(&self) -> &str {
        match self {
            Self::IndexNotFound => "index_not_found",
            Self::IndexAlreadyExists => "index_already_exists",
            Self::InvalidIndexUid => "invalid_index_uid",
            Self::DocumentNotFound => "document_not_found",
            Self::MissingPrimaryKey => "missing_primary_key",
            Self::PrimaryKeyInferenceFailed => "primary_key_inference_failed",
            Self::InvalidApiKey => "invalid_api_key",
            Self::MissingAuthorizationHeader => "missing_authorization_header",
            Self::BadParameter => "bad_parameter",
            Self::BadRequest => "bad_request",
            Self::PayloadTooLarge => "payload_too_large",
            Self::UnsupportedMediaType => "unsupported_media_type",
            Self::Internal => "internal",
            Self::Maintenance => "maintenance",
            Self::Unknown(code) => code,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

// ---------------------------------------------------------------------------
// Wire error payload
// ---------------------------------------------------------------------------

/// The JSON body the engine sends with error statuses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EngineErrorBody {
    pub message: String,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_link: Option<String>,
}

impl From<EngineErrorBody> for Error {
    fn from(body: EngineErrorBody) -> Self {
        Self::Engine {
            code: ErrorCode::from_wire(body.error_code.as_deref().unwrap_or("internal")),
            message: body.message,
            error_type: body.error_type.unwrap_or_else(|| "internal_error".into()),
            link: body.error_link,
        }
    }
}
