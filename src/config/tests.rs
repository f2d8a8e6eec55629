use super::settings::Settings;
use super::{load_config, load_config_from};
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.server.ws_path, "/ws");
    assert!(settings.relay.echo_to_sender);
    assert_eq!(settings.log.path, "pairsub_log");
    assert_eq!(settings.log.level, "info");
    assert_eq!(settings.bind_addr(), "127.0.0.1:8080");
}

#[test]
#[serial]
fn load_config_without_sources_uses_defaults() {
    temp_env::with_vars_unset(
        [
            "PAIRSUB_SERVER__HOST",
            "PAIRSUB_SERVER__PORT",
            "PAIRSUB_SERVER__WS_PATH",
            "PAIRSUB_RELAY__ECHO_TO_SENDER",
            "PAIRSUB_LOG__PATH",
            "PAIRSUB_LOG__LEVEL",
        ],
        || {
            let cfg = load_config().expect("load_config failed");
            assert_eq!(cfg.server.port, 8080);
            assert!(cfg.relay.echo_to_sender);
        },
    );
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("relay.toml");
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [relay]
        echo_to_sender = false

        [log]
        path = "/var/lib/pairsub"
    "#;
    fs::write(&path, toml).expect("write config file");

    let cfg = load_config_from(path.to_str().unwrap()).expect("load_config failed");
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 9000);
    // untouched keys keep their defaults
    assert_eq!(cfg.server.ws_path, "/ws");
    assert!(!cfg.relay.echo_to_sender);
    assert_eq!(cfg.log.path, "/var/lib/pairsub");
    assert_eq!(cfg.log.level, "info");
}

#[test]
#[serial]
fn environment_overrides_file() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("relay.toml");
    fs::write(&path, "[server]\nport = 9000\n").expect("write config file");

    temp_env::with_vars(
        [
            ("PAIRSUB_SERVER__PORT", Some("9100")),
            ("PAIRSUB_RELAY__ECHO_TO_SENDER", Some("false")),
            ("PAIRSUB_LOG__LEVEL", Some("debug")),
        ],
        || {
            let cfg = load_config_from(path.to_str().unwrap()).expect("load_config failed");
            assert_eq!(cfg.server.port, 9100);
            assert!(!cfg.relay.echo_to_sender);
            assert_eq!(cfg.log.level, "debug");
        },
    );
}
