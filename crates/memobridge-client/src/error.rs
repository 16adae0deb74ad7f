//! Mapping of HTTP outcomes to memobridge errors.

use memobridge_core::Error;
use reqwest::StatusCode;

/// Convert a non-200 response into an error.
///
/// `404` means the referenced entity is absent; every other status is a
/// rejection carrying the response text (or the canonical reason when the
/// body is empty).
pub fn status_error(status: StatusCode, body: &str, what: &str) -> Error {
    if status == StatusCode::NOT_FOUND {
        return Error::NotFound(what.to_string());
    }
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_string()
    } else {
        body.trim().to_string()
    };
    Error::rejected(status.as_u16(), message)
}

/// Convert a transport failure into an error.
pub fn transport_error(err: reqwest::Error, what: &str) -> Error {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    Error::RemoteUnavailable(format!("{} {}: {}", what, kind, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found() {
        let err = status_error(StatusCode::NOT_FOUND, "", "note 5");
        assert!(matches!(err, Error::NotFound(ref what) if what == "note 5"));
    }

    #[test]
    fn test_rejected_keeps_body() {
        let err = status_error(StatusCode::BAD_REQUEST, " bad visibility ", "note");
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "Remote rejected request (400): bad visibility");
    }

    #[test]
    fn test_rejected_empty_body_uses_reason() {
        let err = status_error(StatusCode::UNAUTHORIZED, "", "tags");
        assert_eq!(err.to_string(), "Remote rejected request (401): Unauthorized");
    }

    #[test]
    fn test_non_200_success_is_rejected() {
        let err = status_error(StatusCode::CREATED, "", "note");
        assert_eq!(err.status(), Some(201));
    }
}
