// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error and Result implementations.

use std::fmt;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;

/// Kind of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Unsupported or incompatible API version.
    UnsupportedVersion,

    /// Requested authentication system is not registered.
    AuthSystemNotFound,

    /// Requested service endpoint was not found.
    EndpointNotFound,

    /// More than one endpoint matched the filters.
    AmbiguousEndpoints,

    /// Identity service returned an unusable response.
    AuthorizationFailure,

    /// Authentication failure.
    ///
    /// Maps to HTTP 401.
    AuthenticationFailed,

    /// Access denied.
    ///
    /// Maps to HTTP 403.
    AccessDenied,

    /// Invalid value passed to one of paremeters.
    ///
    /// May be result of HTTP 400.
    InvalidInput,

    /// Requested resource was not found.
    ///
    /// Roughly maps to HTTP 404 and 410.
    ResourceNotFound,

    /// Request returned more items than expected.
    TooManyItems,

    /// Conflict in the request.
    Conflict,

    /// Quota or rate limit exceeded.
    ///
    /// Maps to HTTP 413.
    OverLimit,

    /// The server does not implement the request.
    ///
    /// Maps to HTTP 501.
    NotImplemented,

    /// Any other HTTP 4xx error.
    ClientError,

    /// Internal server error.
    ///
    /// Maps to HTTP 5xx codes.
    InternalServerError,

    /// Connection to the server could not be established.
    ConnectionError,

    /// Operation has reached the specified time out.
    OperationTimedOut,

    /// Response received from the server is malformed.
    InvalidResponse,

    /// Configuration is missing or cannot be used.
    InvalidConfig,

    /// Invalid command line usage.
    CommandError,

    /// Protocol-level error reported by underlying HTTP library.
    ProtocolError,
}

/// Error from a Block Storage call.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    status: Option<StatusCode>,
    message: Option<String>,
    request_id: Option<String>,
}

/// Result of a Block Storage call.
pub type Result<T> = ::std::result::Result<T, Error>;

const REQUEST_ID_HEADERS: &[&str] = &["x-openstack-request-id", "x-compute-request-id"];

impl Error {
    /// Create a new error of the provided kind.
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Error {
        Error {
            kind,
            status: None,
            message: Some(message.into()),
            request_id: None,
        }
    }

    /// Create with providing all details.
    pub fn new_with_details(
        kind: ErrorKind,
        status: Option<StatusCode>,
        message: Option<String>,
        request_id: Option<String>,
    ) -> Error {
        Error {
            kind,
            status,
            message,
            request_id,
        }
    }

    /// Create an error from an HTTP response with status >= 400.
    pub fn from_response(
        status: StatusCode,
        headers: &HeaderMap,
        body: Option<&Value>,
        text: &str,
    ) -> Error {
        let request_id = REQUEST_ID_HEADERS
            .iter()
            .filter_map(|name| headers.get(*name))
            .filter_map(|value| value.to_str().ok())
            .map(String::from)
            .next();

        let message = body
            .and_then(extract_message)
            .or_else(|| {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .or_else(|| status.canonical_reason().map(String::from));

        Error::new_with_details(ErrorKind::from_status(status), Some(status), message, request_id)
    }

    /// Error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status code (if any).
    #[inline]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Error message (if any).
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Request ID reported by the server (if any).
    #[inline]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Helper - error of kind EndpointNotFound.
    pub(crate) fn new_endpoint_not_found<D: fmt::Display>(service_type: D) -> Error {
        Error::new(
            ErrorKind::EndpointNotFound,
            format!("Endpoint for service {} was not found", service_type),
        )
    }

    /// Helper - error of kind CommandError.
    pub(crate) fn new_command_error<S: Into<String>>(message: S) -> Error {
        Error::new(ErrorKind::CommandError, message)
    }
}

/// Servers wrap the message in a single object keyed by the fault name.
fn extract_message(body: &Value) -> Option<String> {
    let obj = body.as_object()?;
    let fault = if obj.len() == 1 {
        obj.values().next()?
    } else {
        body
    };

    let msg = fault.get("message").and_then(Value::as_str)?;
    match fault.get("details").and_then(Value::as_str) {
        Some(details) if !details.is_empty() => Some(format!("{} ({})", msg, details)),
        _ => Some(msg.to_string()),
    }
}

impl ErrorKind {
    /// Short description of the error kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedVersion => "Unsupported or incompatible API version",
            ErrorKind::AuthSystemNotFound => "Authentication system was not found",
            ErrorKind::EndpointNotFound => "Requested endpoint was not found",
            ErrorKind::AmbiguousEndpoints => "Found more than one valid endpoint",
            ErrorKind::AuthorizationFailure => "Cannot authorize API client",
            ErrorKind::AuthenticationFailed => "Failed to authenticate",
            ErrorKind::AccessDenied => "Access to the resource is denied",
            ErrorKind::InvalidInput => "Input value(s) are invalid or missing",
            ErrorKind::ResourceNotFound => "Requested resource was not found",
            ErrorKind::TooManyItems => "Request returned too many items",
            ErrorKind::Conflict => "Requested cannot be fulfilled due to a conflict",
            ErrorKind::OverLimit => "Requested limit exceeded",
            ErrorKind::NotImplemented => "Requested operation is not implemented",
            ErrorKind::ClientError => "Request was rejected by the server",
            ErrorKind::InternalServerError => "Internal server error or bad gateway",
            ErrorKind::ConnectionError => "Cannot connect to the server",
            ErrorKind::OperationTimedOut => "Time out reached while waiting for the operation",
            ErrorKind::InvalidResponse => "Received invalid response",
            ErrorKind::InvalidConfig => "Invalid or missing configuration",
            ErrorKind::CommandError => "Invalid command",
            ErrorKind::ProtocolError => "Error when accessing the server",
        }
    }

    /// Error kind matching an HTTP status code.
    pub fn from_status(status: StatusCode) -> ErrorKind {
        match status {
            StatusCode::BAD_REQUEST => ErrorKind::InvalidInput,
            StatusCode::UNAUTHORIZED => ErrorKind::AuthenticationFailed,
            StatusCode::FORBIDDEN => ErrorKind::AccessDenied,
            StatusCode::NOT_FOUND | StatusCode::GONE => ErrorKind::ResourceNotFound,
            StatusCode::NOT_ACCEPTABLE => ErrorKind::UnsupportedVersion,
            StatusCode::CONFLICT => ErrorKind::Conflict,
            StatusCode::PAYLOAD_TOO_LARGE => ErrorKind::OverLimit,
            StatusCode::NOT_IMPLEMENTED => ErrorKind::NotImplemented,
            c if c.is_server_error() => ErrorKind::InternalServerError,
            c if c.is_client_error() => ErrorKind::ClientError,
            _ => ErrorKind::InvalidResponse,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.message {
            Some(ref msg) => write!(f, "{}", msg)?,
            None => write!(f, "{}", self.kind)?,
        }

        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status.as_u16())?;
        }

        if let Some(ref request_id) = self.request_id {
            write!(f, " (Request-ID: {})", request_id)?;
        }

        Ok(())
    }
}

impl ::std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Error {
        let kind = if value.is_timeout() {
            ErrorKind::OperationTimedOut
        } else if value.is_connect() {
            ErrorKind::ConnectionError
        } else if value.is_decode() {
            ErrorKind::InvalidResponse
        } else if let Some(status) = value.status() {
            ErrorKind::from_status(status)
        } else {
            ErrorKind::ProtocolError
        };

        Error::new_with_details(kind, value.status(), Some(value.to_string()), None)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Error {
        Error::new(ErrorKind::InvalidResponse, value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Error {
        Error::new(
            ErrorKind::CommandError,
            format!("Cannot write output: {}", value),
        )
    }
}

#[cfg(test)]
pub mod test {
    use reqwest::header::{HeaderMap, HeaderValue};
    use reqwest::StatusCode;
    use serde_json::json;

    use super::{Error, ErrorKind};

    #[test]
    fn test_from_response_fault_body() {
        let body = json!({"badRequest": {"message": "Invalid volume size", "code": 400}});
        let err = Error::from_response(StatusCode::BAD_REQUEST, &HeaderMap::new(), Some(&body), "");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.message(), Some("Invalid volume size"));
        assert_eq!(err.to_string(), "Invalid volume size (HTTP 400)");
    }

    #[test]
    fn test_from_response_request_id() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-openstack-request-id", HeaderValue::from_static("req-1234"));
        let body = json!({"itemNotFound": {"message": "Volume could not be found", "code": 404}});
        let err = Error::from_response(StatusCode::NOT_FOUND, &headers, Some(&body), "");
        assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
        assert_eq!(err.request_id(), Some("req-1234"));
        assert_eq!(
            err.to_string(),
            "Volume could not be found (HTTP 404) (Request-ID: req-1234)"
        );
    }

    #[test]
    fn test_from_response_plain_text() {
        let err = Error::from_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &HeaderMap::new(),
            None,
            "Service Unavailable\n",
        );
        assert_eq!(err.kind(), ErrorKind::InternalServerError);
        assert_eq!(err.message(), Some("Service Unavailable"));
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[test]
    fn test_from_response_empty() {
        let err = Error::from_response(StatusCode::IM_A_TEAPOT, &HeaderMap::new(), None, "");
        assert_eq!(err.kind(), ErrorKind::ClientError);
        assert_eq!(err.message(), Some("I'm a teapot"));
    }

    #[test]
    fn test_kind_from_status() {
        assert_eq!(ErrorKind::from_status(StatusCode::UNAUTHORIZED), ErrorKind::AuthenticationFailed);
        assert_eq!(ErrorKind::from_status(StatusCode::FORBIDDEN), ErrorKind::AccessDenied);
        assert_eq!(ErrorKind::from_status(StatusCode::CONFLICT), ErrorKind::Conflict);
        assert_eq!(ErrorKind::from_status(StatusCode::PAYLOAD_TOO_LARGE), ErrorKind::OverLimit);
        assert_eq!(ErrorKind::from_status(StatusCode::NOT_IMPLEMENTED), ErrorKind::NotImplemented);
        assert_eq!(ErrorKind::from_status(StatusCode::BAD_GATEWAY), ErrorKind::InternalServerError);
    }
}
