use pitboss_core::chat::StateStorage;
use pitboss_core::config::Settings;
use pitboss_core::constants;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.completion.endpoint, constants::completion::DEFAULT_ENDPOINT);
    assert_eq!(settings.completion.timeout_secs, None);
    assert_eq!(settings.reveal.chunk_chars, 3);
    assert_eq!(settings.reveal.interval_ms, 15);
    assert!(settings.chat.cancel_stale_turns);
    assert!(settings.profile_hint().is_none());
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::load_from(&dir.path().join("absent.toml"));
    assert_eq!(settings.completion.endpoint, constants::completion::DEFAULT_ENDPOINT);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[completion]\nendpoint = \"https://example.test/api/pitboss\"\ntimeout_secs = 20\n\n[profile]\ndisplay_name = \"  Sam  \"\n",
    )
    .unwrap();

    let settings = Settings::load_from(&path);
    assert_eq!(settings.completion.endpoint, "https://example.test/api/pitboss");
    assert_eq!(settings.completion.timeout_secs, Some(20));
    assert_eq!(settings.reveal.chunk_chars, 3);
    assert!(settings.chat.cancel_stale_turns);

    let hint = settings.profile_hint().unwrap();
    assert_eq!(hint.name, None);
    assert_eq!(hint.display_name.as_deref(), Some("Sam"));
    assert_eq!(hint.label(), Some("Sam"));
}

#[test]
fn test_profile_label_falls_back_to_name() {
    let mut settings = Settings::default();
    assert!(settings.profile_hint().is_none());

    settings.profile.name = "sam.k".into();
    assert_eq!(settings.profile_hint().unwrap().label(), Some("sam.k"));

    settings.profile.display_name = "Sam".into();
    assert_eq!(settings.profile_hint().unwrap().label(), Some("Sam"));
}

#[test]
fn test_malformed_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[completion\nendpoint = ").unwrap();

    let settings = Settings::load_from(&path);
    assert_eq!(settings.completion.endpoint, constants::completion::DEFAULT_ENDPOINT);
}

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut settings = Settings::default();
    settings.reveal.chunk_chars = 8;
    settings.chat.cancel_stale_turns = false;
    settings.storage.state_dir = Some(dir.path().join("state"));
    settings.save_to(&path).unwrap();

    let loaded = Settings::load_from(&path);
    assert_eq!(loaded.reveal.chunk_chars, 8);
    assert!(!loaded.chat.cancel_stale_turns);
    assert_eq!(loaded.state_dir(), Some(dir.path().join("state")));
}

#[test]
fn test_reveal_schedule_clamps() {
    let mut settings = Settings::default();
    settings.reveal.chunk_chars = 0;
    settings.reveal.interval_ms = 0;

    let schedule = settings.reveal_schedule();
    assert_eq!(schedule.chunk_chars(), 1);
    assert_eq!(schedule.interval(), Duration::from_millis(1));
}

#[test]
fn test_build_storage_uses_state_dir() {
    let dir = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.storage.state_dir = Some(dir.path().join("state"));

    let storage = settings.build_storage();
    storage.write("probe", "{}").unwrap();
    assert!(dir.path().join("state").join("probe.json").exists());
}

#[test]
fn test_build_completion_client() {
    let mut settings = Settings::default();
    settings.completion.endpoint = "http://127.0.0.1:9/api".into();
    settings.completion.timeout_secs = Some(3);

    let client = settings.build_completion_client().unwrap();
    assert_eq!(client.endpoint(), "http://127.0.0.1:9/api");
}
