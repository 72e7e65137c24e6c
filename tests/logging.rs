#![allow(clippy::unwrap_used)]

use hotline_protocol::config::LoggingConfig;
use hotline_protocol::error::ProtocolError;
use hotline_protocol::utils::logging::init_logging;

// One test per binary: the subscriber is process-global
#[test]
fn test_init_logging_once() {
    let config = LoggingConfig {
        json_format: true,
        span_events: true,
        ..LoggingConfig::default()
    };
    init_logging(&config).unwrap();

    assert!(matches!(
        init_logging(&LoggingConfig::default()),
        Err(ProtocolError::ConfigError(_))
    ));
}
