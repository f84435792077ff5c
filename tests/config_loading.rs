// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;

use dirwatch::config::loader::{load_and_validate, load_from_path};
use dirwatch::config::{DEFAULT_BUFFER_SIZE, WatchSpec};
use dirwatch::errors::DirwatchError;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn defaults_apply_when_config_section_is_missing() {
    let file = config_file(
        r#"
[[watch]]
path = "src"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(
        cfg.watches(),
        vec![WatchSpec {
            path: PathBuf::from("src"),
            recursive: true,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }]
    );
}

#[test]
fn section_defaults_and_overrides_combine() {
    let file = config_file(
        r#"
[config]
buffer_size = 2
recursive = false

[[watch]]
path = "a"

[[watch]]
path = "b"
recursive = true
buffer_size = 0
"#,
    );

    let specs = load_and_validate(file.path()).unwrap().watches();
    assert_eq!(
        specs,
        vec![
            WatchSpec {
                path: PathBuf::from("a"),
                recursive: false,
                buffer_size: 2,
            },
            WatchSpec {
                path: PathBuf::from("b"),
                recursive: true,
                buffer_size: 0,
            },
        ]
    );
}

#[test]
fn raw_load_skips_validation() {
    let file = config_file("[config]\nbuffer_size = 5\n");

    let raw = load_from_path(file.path()).unwrap();
    assert_eq!(raw.config.buffer_size, 5);
    assert!(raw.watch.is_empty());

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, DirwatchError::ConfigError(_)));
}

#[test]
fn duplicate_paths_are_rejected() {
    let file = config_file(
        r#"
[[watch]]
path = "src"

[[watch]]
path = "src"
"#,
    );

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, DirwatchError::ConfigError(msg) if msg.contains("duplicate")));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = config_file("[[watch]\npath = ");

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, DirwatchError::TomlError(_)));
}

#[test]
fn negative_buffer_size_is_a_toml_error() {
    let file = config_file("[[watch]]\npath = \"x\"\nbuffer_size = -1\n");

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, DirwatchError::TomlError(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, DirwatchError::IoError(_)));
}
