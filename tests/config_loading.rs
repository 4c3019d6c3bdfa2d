#![forbid(unsafe_code)]

use std::fs;

use tracebus::TracerConfig;

#[test]
fn config_loads_from_a_toml_file_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tracebus.toml");
    fs::write(
        &path,
        r#"
hostname = "host-a"
process_name = "svc"
buffer_flush_interval_ms = 25
announce_interval_ms = 1000
announce_iface = "127.0.0.1"
announce_mcast_addr = "225.0.0.1:64042"
"#,
    )
    .expect("write config");

    let cfg = TracerConfig::from_toml_file(&path).expect("parses");
    assert_eq!(cfg.hostname, "host-a");
    assert_eq!(cfg.process_name, "svc");
    assert_eq!(cfg.buffer_flush_interval_ms, 25);
    assert_eq!(cfg.announce_iface.as_deref(), Some("127.0.0.1"));
    assert_eq!(cfg.flags, 0, "flags defaults to 0 when absent from the document");
}

#[test]
fn missing_file_is_reported_as_a_read_error() {
    let err = TracerConfig::from_toml_file(std::path::Path::new("/nonexistent/tracebus.toml")).unwrap_err();
    assert!(matches!(err, tracebus::runtime::TracerConfigError::Read));
}

#[test]
fn malformed_document_is_reported_as_a_parse_error() {
    let err = TracerConfig::from_toml_str("this is not valid toml = = =").unwrap_err();
    assert!(matches!(err, tracebus::runtime::TracerConfigError::Parse));
}
