use super::load::{InvalidSetting, default_config_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_shellac_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("SHELLAC_CONFIG_PATH", "/tmp/shellac-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/shellac-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("shellac")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("shellac")
            .join("config.toml")
    );
}

#[test]
fn defaults_are_valid() {
    let s = Settings::default();
    assert!(s.validate().is_ok());
    assert_eq!(s.playback.poll_interval_ms, 500);
    assert!(!s.playback.repeat);
    assert_eq!(s.rating.attribution_tag, "shellac");
    assert_eq!(s.logging.level, "info");
    assert!(s.logging.file.is_none());
}

#[test]
fn validate_rejects_tiny_poll_interval_and_empty_columns() {
    let mut s = Settings::default();
    s.playback.poll_interval_ms = 10;
    assert_eq!(s.validate(), Err(InvalidSetting::PollInterval(10)));

    let mut s = Settings::default();
    s.ui.columns.clear();
    assert_eq!(s.validate(), Err(InvalidSetting::NoColumns));

    let mut s = Settings::default();
    s.library.extensions = vec![" ".into()];
    assert_eq!(s.validate(), Err(InvalidSetting::NoExtensions));
}

#[test]
fn settings_load_from_config_file_and_parse_aliases() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
repeat = true
poll_interval_ms = 250

[rating]
attribution_tag = "me@example.com"

[ui]
header_text = "hello"
columns = ["title", "score", "file"]
now_playing_fields = ["artist", "title"]
now_playing_separator = " • "

[logging]
level = "debug"
file = "/tmp/shellac.log"

[library]
extensions = ["mp3"]
recursive = false
include_hidden = false
follow_links = false
max_depth = 3
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("SHELLAC_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("SHELLAC__PLAYBACK__POLL_INTERVAL_MS");

    let s = Settings::load().unwrap();
    assert!(s.playback.repeat);
    assert_eq!(s.playback.poll_interval_ms, 250);
    assert_eq!(s.rating.attribution_tag, "me@example.com");
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(
        s.ui.columns,
        vec![TrackColumn::Title, TrackColumn::Rating, TrackColumn::Filename]
    );
    assert_eq!(
        s.ui.now_playing_fields,
        vec![TrackDisplayField::Artist, TrackDisplayField::Title]
    );
    assert_eq!(s.ui.now_playing_separator, " • ");
    assert_eq!(s.logging.level, "debug");
    assert_eq!(
        s.logging.file.as_deref(),
        Some(std::path::Path::new("/tmp/shellac.log"))
    );
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(!s.library.recursive);
    assert!(!s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(s.library.max_depth, Some(3));
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
poll_interval_ms = 250
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("SHELLAC_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("SHELLAC__PLAYBACK__POLL_INTERVAL_MS", "1000");

    let s = Settings::load().unwrap();
    assert_eq!(s.playback.poll_interval_ms, 1000);
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let _g1 = EnvGuard::set(
        "SHELLAC_CONFIG_PATH",
        dir.path().join("absent.toml").to_str().unwrap(),
    );
    let _g2 = EnvGuard::remove("SHELLAC__PLAYBACK__POLL_INTERVAL_MS");

    let s = Settings::load().unwrap();
    assert_eq!(s.playback.poll_interval_ms, 500);
    assert_eq!(s.ui.columns, UiSettings::default().columns);
}
