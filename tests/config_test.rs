use std::time::Duration;
use trackwatch::config::{Config, MAX_POLL_INTERVAL_MS};

#[test]
fn default_config_is_valid() {
    Config::default().validate().unwrap();
}

#[test]
fn poll_interval_bounds_are_enforced() {
    let mut config = Config::default();

    config.poll_interval_ms = 0;
    assert!(config.validate().is_err());

    config.poll_interval_ms = MAX_POLL_INTERVAL_MS;
    config.validate().unwrap();

    config.poll_interval_ms = u64::MAX;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("at most"));
    assert_eq!(
        config.poll_interval(),
        Duration::from_millis(MAX_POLL_INTERVAL_MS)
    );
}
