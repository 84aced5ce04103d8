//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use core_runtime::Error;

// A global subscriber can only be installed once per process, so both the
// first and the second call live in the same test.
#[test]
fn test_init_logging_only_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_spans(false);

    init_logging(config.clone()).expect("first initialization succeeds");

    tracing::info!(target: "core_sync", pages = 1, "logging initialized");

    let second = init_logging(config);
    assert!(matches!(second, Err(Error::Config(_))));
}

#[test]
fn test_redaction_of_credentials() {
    assert_eq!(redact_if_sensitive("access_token", "ya29.a0"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("refresh_token", "1//0g"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("client_secret", "GOCSPX"), "[REDACTED]");
}

#[test]
fn test_redaction_keeps_identifiers() {
    assert_eq!(redact_if_sensitive("file_id", "1a2b3c"), "1a2b3c");
    assert_eq!(redact_if_sensitive("checksum", "d41d8cd9"), "d41d8cd9");
    assert!(!redact_if_sensitive("owner", "alice@example.com").contains("example.com"));
}
