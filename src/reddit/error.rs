//! Categorization of Reddit API failures.
//!
//! Reddit reports failures three ways:
//!
//! - HTTP status codes (429 and 5xx are transient, 404 is not-found)
//! - Transport errors from `reqwest` (timeouts and connection failures are transient)
//! - A `json.errors` array on a 200 response for form endpoints, e.g.
//!   `[["RATELIMIT", "you are doing that too much. try again in 9 minutes.", "ratelimit"]]`

use std::time::Duration;

use reqwest::StatusCode;

use crate::effects::{PlatformError, PlatformErrorKind};

/// Maps an HTTP status to an error kind.
pub fn classify_status(status: StatusCode) -> PlatformErrorKind {
    match status.as_u16() {
        404 => PlatformErrorKind::NotFound,
        // Expired or revoked token; the client refreshes it before the retry.
        401 => PlatformErrorKind::Transient,
        408 | 429 => PlatformErrorKind::Transient,
        code if (500..600).contains(&code) => PlatformErrorKind::Transient,
        _ => PlatformErrorKind::Permanent,
    }
}

/// Builds an error from a non-success response.
pub fn from_status(status: StatusCode, body: &str) -> PlatformError {
    let message = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, truncate(body, 200))
    };
    let error = match classify_status(status) {
        PlatformErrorKind::Transient => PlatformError::transient(message),
        PlatformErrorKind::NotFound => PlatformError::not_found(message),
        PlatformErrorKind::Permanent => PlatformError::permanent(message),
    };
    error.with_status(status.as_u16())
}

/// Builds an error from a transport failure.
pub fn from_reqwest(err: reqwest::Error) -> PlatformError {
    if let Some(status) = err.status() {
        let message = err.to_string();
        return from_status(status, &message).with_source(err);
    }
    let message = err.to_string();
    let error = if err.is_timeout() || err.is_connect() || err.is_request() {
        PlatformError::transient(message)
    } else if err.is_decode() {
        PlatformError::permanent(format!("malformed response: {}", message))
    } else {
        PlatformError::transient(message)
    };
    error.with_source(err)
}

/// Builds an error from the `json.errors` array of a form endpoint.
///
/// Returns `None` if the array is empty.
pub fn from_api_errors(errors: &[Vec<serde_json::Value>]) -> Option<PlatformError> {
    let first = errors.first()?;
    let code = first.first().and_then(|v| v.as_str()).unwrap_or("UNKNOWN");
    let explanation = first.get(1).and_then(|v| v.as_str()).unwrap_or("");
    let message = format!("{}: {}", code, explanation);

    let error = match code {
        "RATELIMIT" => {
            let error = PlatformError::transient(message);
            match parse_retry_hint(explanation) {
                Some(delay) => error.with_retry_after(delay),
                None => error,
            }
        }
        "DELETED_COMMENT" | "DELETED_LINK" | "USER_DOESNT_EXIST" | "NO_THING_ID" => {
            PlatformError::not_found(message)
        }
        _ => PlatformError::permanent(message),
    };
    Some(error)
}

/// Extracts "try again in N minutes/seconds" from a rate-limit explanation.
pub fn parse_retry_hint(explanation: &str) -> Option<Duration> {
    let lower = explanation.to_lowercase();
    let idx = lower.find("try again in ")?;
    let rest = &lower[idx + "try again in ".len()..];
    let mut words = rest.split_whitespace();
    let amount: u64 = words.next()?.parse().ok()?;
    let unit = words.next()?;
    if unit.starts_with("second") {
        Some(Duration::from_secs(amount))
    } else if unit.starts_with("minute") {
        Some(Duration::from_secs(amount * 60))
    } else if unit.starts_with("millisecond") {
        Some(Duration::from_millis(amount))
    } else {
        None
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_classification() {
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            PlatformErrorKind::Transient
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY),
            PlatformErrorKind::Transient
        );
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED),
            PlatformErrorKind::Transient
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND),
            PlatformErrorKind::NotFound
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN),
            PlatformErrorKind::Permanent
        );
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST),
            PlatformErrorKind::Permanent
        );
    }

    #[test]
    fn from_status_keeps_code() {
        let err = from_status(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(err.status_code, Some(503));
        assert_eq!(err.kind, PlatformErrorKind::Transient);
    }

    #[test]
    fn retry_hint_parsing() {
        assert_eq!(
            parse_retry_hint("you are doing that too much. try again in 9 minutes."),
            Some(Duration::from_secs(540))
        );
        assert_eq!(
            parse_retry_hint("Take a break for 5 seconds. Try again in 5 seconds."),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            parse_retry_hint("try again in 1 minute."),
            Some(Duration::from_secs(60))
        );
        assert_eq!(parse_retry_hint("slow down"), None);
        assert_eq!(parse_retry_hint("try again in a while"), None);
    }

    #[test]
    fn ratelimit_api_error_is_transient_with_hint() {
        let errors = vec![vec![
            json!("RATELIMIT"),
            json!("you are doing that too much. try again in 2 minutes."),
            json!("ratelimit"),
        ]];
        let err = from_api_errors(&errors).unwrap();
        assert_eq!(err.kind, PlatformErrorKind::Transient);
        assert_eq!(err.retry_after, Some(Duration::from_secs(120)));
    }

    #[test]
    fn deleted_thing_is_not_found() {
        let errors = vec![vec![json!("DELETED_COMMENT"), json!("that comment has been deleted")]];
        assert!(from_api_errors(&errors).unwrap().is_not_found());
    }

    #[test]
    fn other_api_errors_are_permanent() {
        let errors = vec![vec![json!("TOO_LONG"), json!("this is too long")]];
        assert_eq!(
            from_api_errors(&errors).unwrap().kind,
            PlatformErrorKind::Permanent
        );
        assert!(from_api_errors(&[]).is_none());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("short", 200), "short");
    }
}
