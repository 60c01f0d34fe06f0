use std::time::Duration;

use archivist::{
    Error,
    spotify::client::{parse_retry_after, retry_delay, status_error},
};
use reqwest::StatusCode;

#[test]
fn test_retry_delay_doubles_up_to_cap() {
    let initial = Duration::from_secs(1);
    let max = Duration::from_secs(60);

    assert_eq!(retry_delay(1, initial, max), Duration::from_secs(1));
    assert_eq!(retry_delay(2, initial, max), Duration::from_secs(2));
    assert_eq!(retry_delay(4, initial, max), Duration::from_secs(8));
    assert_eq!(retry_delay(10, initial, max), max);
    assert_eq!(retry_delay(64, initial, max), max);
}

#[test]
fn test_parse_retry_after() {
    assert_eq!(parse_retry_after(Some(" 7 ")), Some(Duration::from_secs(7)));
    assert_eq!(parse_retry_after(Some("soon")), None);
    assert_eq!(parse_retry_after(None), None);
}

#[test]
fn test_status_error_mapping() {
    let body = r#"{"error": {"status": 404, "message": "Resource not found"}}"#;
    match status_error(StatusCode::NOT_FOUND, body) {
        Error::NotFound(message) => assert_eq!(message, "Resource not found"),
        other => panic!("unexpected {other:?}"),
    }

    assert!(matches!(
        status_error(StatusCode::BAD_REQUEST, "bad description"),
        Error::Validation(m) if m == "bad description"
    ));
    assert!(matches!(
        status_error(StatusCode::UNAUTHORIZED, ""),
        Error::Auth(_)
    ));
    assert!(matches!(
        status_error(StatusCode::FORBIDDEN, "nope"),
        Error::Api { status: 403, .. }
    ));
}

#[test]
fn test_transient_errors() {
    let rate_limited = Error::Api {
        status: 429,
        message: String::new(),
    };
    let unavailable = Error::Api {
        status: 503,
        message: String::new(),
    };
    let forbidden = Error::Api {
        status: 403,
        message: String::new(),
    };

    assert!(rate_limited.is_transient());
    assert!(unavailable.is_transient());
    assert!(!forbidden.is_transient());
    assert!(!Error::NotFound("x".to_string()).is_transient());
    assert!(!Error::Validation("x".to_string()).is_transient());
    assert!(Error::NotFound("x".to_string()).is_not_found());
}
