//! Configuration discovery, layering, and typed-view integration tests.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use assert_fs::prelude::*;
use rclonectl_core::{Config, ConfigError, ConfigSource, DaemonConfig};
use rstest::rstest;

// ---------------------------------------------------------------------------
// 1. Discovery
// ---------------------------------------------------------------------------

#[test]
fn explicit_missing_path_is_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let missing = dir.path().join("nope.ini");
    let err = Config::load_at(Some(&missing), None, None).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("nope.ini"));
}

#[test]
fn cwd_file_wins_over_config_dir() {
    let cwd = assert_fs::TempDir::new().expect("cwd");
    let xdg = assert_fs::TempDir::new().expect("xdg");
    cwd.child("rclone-ctl.ini")
        .write_str("[rclone]\nrc_user = from-cwd\n")
        .unwrap();
    xdg.child("rclone-ctl/rclone-ctl.ini")
        .write_str("[rclone]\nrc_user = from-xdg\n")
        .unwrap();

    let (cfg, diagnostics) = Config::load_at(None, Some(cwd.path()), Some(xdg.path())).unwrap();
    assert_eq!(cfg.get("rclone", "rc_user").unwrap(), "from-cwd");
    assert_eq!(cfg.path(), Some(cwd.path().join("rclone-ctl.ini").as_path()));
    assert!(diagnostics.is_empty());
}

#[test]
fn config_dir_is_used_when_cwd_has_no_file() {
    let cwd = assert_fs::TempDir::new().expect("cwd");
    let xdg = assert_fs::TempDir::new().expect("xdg");
    xdg.child("rclone-ctl/rclone-ctl.ini")
        .write_str("[rclone]\nrc_user = from-xdg\n")
        .unwrap();

    let (cfg, _) = Config::load_at(None, Some(cwd.path()), Some(xdg.path())).unwrap();
    assert_eq!(cfg.get("rclone", "rc_user").unwrap(), "from-xdg");
}

#[test]
fn no_file_falls_back_to_defaults_with_a_warning() {
    let cwd = assert_fs::TempDir::new().expect("cwd");
    let (cfg, diagnostics) = Config::load_at(None, Some(cwd.path()), None).unwrap();
    assert!(cfg.path().is_none());
    assert_eq!(cfg.get("rclone", "exec_file").unwrap(), "rclone");
    assert_eq!(diagnostics.warnings().len(), 1);
    assert!(diagnostics.warnings()[0].contains("defaults"));
}

#[test]
fn unparsable_file_reports_its_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("broken.ini");
    fs::write(&path, "[rclone\nexec_file = x\n").unwrap();
    let err = Config::load_at(Some(&path), None, None).unwrap_err();
    assert!(matches!(err, ConfigError::Load { .. }), "got: {err}");
    assert!(err.to_string().contains("broken.ini"));
}

// ---------------------------------------------------------------------------
// 2. DaemonConfig view
// ---------------------------------------------------------------------------

#[test]
fn daemon_config_from_defaults() {
    let cfg = Config::defaults().unwrap();
    let daemon = DaemonConfig::from_source(&cfg).unwrap();
    assert_eq!(daemon.exec_file, PathBuf::from("rclone"));
    assert_eq!(daemon.pid_file, PathBuf::from("/tmp/rclone-ctl/rclone-ctl.pid"));
    assert_eq!(daemon.grace_period, Duration::from_secs(3));
    assert_eq!(daemon.rc_timeout, Duration::from_secs(30));
    assert_eq!(daemon.endpoint().base_url, "http://localhost:5572/");
    assert_eq!(
        daemon.launch_args(),
        vec![
            "rcd",
            "--cache-dir=/tmp/rclone-ctl",
            "--rc-addr=localhost:5572",
            "--rc-user=u-rclone-ctl",
            "--rc-pass=forty-two",
        ]
    );
}

#[test]
fn daemon_config_reads_tuning_keys() {
    let (cfg, _) = Config::from_ini_str(
        "[rclone-ctl]\ngrace_period_ms = 250\nrc_timeout_secs = 5\n",
    )
    .unwrap();
    let daemon = DaemonConfig::from_source(&cfg).unwrap();
    assert_eq!(daemon.grace_period, Duration::from_millis(250));
    assert_eq!(daemon.rc_timeout, Duration::from_secs(5));
}

#[rstest]
#[case("grace_period_ms = soon")]
#[case("grace_period_ms = -1")]
#[case("rc_timeout_secs = 1.5")]
#[case("rc_timeout_secs = 0")]
fn daemon_config_rejects_bad_numbers(#[case] line: &str) {
    let (cfg, _) = Config::from_ini_str(&format!("[rclone-ctl]\n{line}\n")).unwrap();
    let err = DaemonConfig::from_source(&cfg).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }), "got: {err}");
}

#[test]
fn zero_grace_period_is_allowed() {
    let (cfg, _) = Config::from_ini_str("[rclone-ctl]\ngrace_period_ms = 0\n").unwrap();
    let daemon = DaemonConfig::from_source(&cfg).unwrap();
    assert_eq!(daemon.grace_period, Duration::ZERO);
}

#[test]
fn mixed_case_unit_section_survives_loading() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("rclone-ctl.ini")
        .write_str("[unit:WebDav]\nProtocol = webdav\n")
        .unwrap();
    let (cfg, diagnostics) = Config::load_at(None, Some(dir.path()), None).unwrap();
    assert!(diagnostics.is_empty(), "got: {:?}", diagnostics.warnings());
    assert_eq!(cfg.sections(), vec!["rclone", "rclone-ctl", "unit:WebDav"]);
    assert_eq!(cfg.get("unit:WebDav", "protocol").unwrap(), "webdav");
}
