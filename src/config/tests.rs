use std::{io::Write, time::Duration};

use config::Environment;
use rstest::{fixture, rstest};
use tempfile::NamedTempFile;

use super::*;
use crate::{
    frame::{DiscardFrames, Endianness, FrameError, FrameReader, FrameSource, LengthFormat},
    server::DEFAULT_MAX_FRAME_LENGTH,
    session::DEFAULT_QUEUE_SIZE,
};

const SAMPLE: &str = r#"
[server]
addr = "0.0.0.0:9000"
mode = "pro"

[log]
level = "info"

[session]
queue_size = 128
read_timeout = "30s"

[frame]
prefix_width = 4
big_endian = "yes"
max_length = "64k"

[pool]
init_size = 8
max_size = 32

[limits]
retries = "3"
ratio = 0.5
hosts = "a, b ,c"
"#;

#[fixture]
#[allow(unused_braces)]
fn sample() -> Settings { Settings::from_toml(SAMPLE).expect("valid toml") }

fn toml_file(text: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    file.write_all(text.as_bytes()).expect("write config");
    file
}

#[rstest]
fn typed_accessors(sample: Settings) {
    assert_eq!(sample.string("server", "addr").expect("addr"), "0.0.0.0:9000");
    assert_eq!(sample.int("limits", "retries").expect("int"), 3);
    assert_eq!(sample.uint("pool", "max_size").expect("uint"), 32);
    assert!((sample.float("limits", "ratio").expect("float") - 0.5).abs() < f64::EPSILON);
    assert!(sample.bool("frame", "big_endian").expect("bool"));
    assert_eq!(
        sample.duration("session", "read_timeout").expect("duration"),
        Duration::from_secs(30)
    );
    assert_eq!(sample.byte_size("frame", "max_length").expect("size"), 64 * 1024);
    assert_eq!(sample.list("limits", "hosts").expect("list"), vec!["a", "b", "c"]);
}

#[rstest]
fn missing_and_invalid_values(sample: Settings) {
    assert!(matches!(
        sample.string("server", "nope"),
        Err(ConfigError::MissingKey { ref section, ref key }) if section == "server" && key == "nope"
    ));
    assert!(matches!(
        sample.uint("server", "mode"),
        Err(ConfigError::InvalidValue { ref key, ref value, .. }) if key == "server.mode" && value == "pro"
    ));
    assert!(!sample.contains("nope", "addr"));
}

#[rstest]
fn server_config_reads_every_section(sample: Settings) {
    let cfg = ServerConfig::from_settings(&sample).expect("server config");
    assert_eq!(cfg.addr, "0.0.0.0:9000");
    assert_eq!(cfg.mode, "pro");
    assert_eq!(cfg.log.level, "info");
    assert_eq!(cfg.log.name, "app");
    assert_eq!(cfg.queue_size, 128);
    assert_eq!(cfg.read_timeout, Some(Duration::from_secs(30)));
    assert_eq!(cfg.length_format(), LengthFormat::new(4, Endianness::Big));
    assert_eq!(cfg.max_frame_length, Some(64 * 1024));
    assert_eq!(cfg.pool, PoolConfig { init_size: 8, max_size: 32 });

    let connector = cfg.connector_config();
    assert_eq!(connector.queue_size, 128);
    assert_eq!(connector.format, cfg.length_format());
}

#[test]
fn empty_config_uses_defaults() {
    let cfg = ServerConfig::from_settings(&Settings::default()).expect("defaults");
    assert_eq!(cfg, ServerConfig::default());
    assert_eq!(cfg.addr, "127.0.0.1:7000");
    assert_eq!(cfg.log.root, "../");
    assert_eq!(cfg.queue_size, DEFAULT_QUEUE_SIZE);
    assert_eq!(cfg.max_frame_length, Some(DEFAULT_MAX_FRAME_LENGTH));
}

#[tokio::test]
async fn wide_prefixes_keep_a_finite_frame_cap() {
    let settings = Settings::from_toml("[frame]\nprefix_width = 4\n").expect("valid toml");
    let cfg = ServerConfig::from_settings(&settings).expect("server config");
    let connector = cfg.connector_config();
    assert_eq!(connector.max_frame_length, Some(DEFAULT_MAX_FRAME_LENGTH));

    let wire: &[u8] = &[0xFF, 0xFF, 0xFF, 0x7F];
    let mut reader = FrameReader::new(wire, DiscardFrames).with_format(connector.format);
    if let Some(max) = connector.max_frame_length {
        reader.set_max_frame_length(max);
    }
    let err = reader.read().await.expect_err("must reject");
    assert!(matches!(
        err,
        FrameError::FrameTooLarge { len: 0x7FFF_FFFF, max } if max == DEFAULT_MAX_FRAME_LENGTH
    ));
}

#[rstest]
#[case("0")]
#[case("-3")]
fn non_positive_queue_size_falls_back(#[case] size: &str) {
    let settings = Settings::from_toml(&format!("[session]\nqueue_size = {size}\n")).expect("toml");
    let cfg = ServerConfig::from_settings(&settings).expect("config");
    assert_eq!(cfg.queue_size, DEFAULT_QUEUE_SIZE);
}

#[test]
fn prefix_width_out_of_range_is_rejected() {
    let settings = Settings::from_toml("[frame]\nprefix_width = 9\n").expect("toml");
    assert!(matches!(
        ServerConfig::from_settings(&settings),
        Err(ConfigError::InvalidValue { ref key, .. }) if key == "frame.prefix_width"
    ));
}

#[test]
fn load_reads_files_and_environment_overrides() {
    let file = toml_file("[server]\naddr = \"127.0.0.1:1\"\nmode = \"dev\"\n");
    let env = Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .source(Some(
            [("WIRESESSION_SERVER__ADDR".to_owned(), "10.0.0.1:2".to_owned())]
                .into_iter()
                .collect(),
        ));
    let settings = Settings::load_with_env(file.path(), env).expect("load");
    assert_eq!(settings.string("server", "addr").expect("addr"), "10.0.0.1:2");
    assert_eq!(settings.string("server", "mode").expect("mode"), "dev");
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = Settings::load(dir.path().join("absent.toml")).expect_err("missing file");
    assert!(matches!(err, ConfigError::Source(_)));
}
