use super::*;

fn env_of(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

#[test]
fn defaults_point_at_local_stub_server() {
    let settings = settings_from(None, env_of(&[]), &Overrides::default()).expect("settings");
    assert_eq!(settings.homework_api_base.as_str(), "http://127.0.0.1:3001/");
    assert_eq!(settings.evaluation_api_base, settings.homework_api_base);
    assert_eq!(settings.request_timeout, Duration::from_secs(30));
}

#[test]
fn file_then_env_then_flags() {
    let file = r#"
homework_api_base = "http://homework.local:3001"
evaluation_api_base = "http://scoring.local:8000"
request_timeout_ms = "5000"
"#;

    let from_file = settings_from(Some(file), env_of(&[]), &Overrides::default()).expect("file");
    assert_eq!(from_file.homework_api_base.host_str(), Some("homework.local"));
    assert_eq!(from_file.request_timeout, Duration::from_millis(5000));

    let from_env = settings_from(
        Some(file),
        env_of(&[
            ("EVALUATION_API_BASE", "http://env-scoring:8000"),
            ("APP__REQUEST_TIMEOUT_MS", "1500"),
        ]),
        &Overrides::default(),
    )
    .expect("env");
    assert_eq!(from_env.evaluation_api_base.host_str(), Some("env-scoring"));
    assert_eq!(from_env.homework_api_base.host_str(), Some("homework.local"));
    assert_eq!(from_env.request_timeout, Duration::from_millis(1500));

    let from_flags = settings_from(
        Some(file),
        env_of(&[("EVALUATION_API_BASE", "http://env-scoring:8000")]),
        &Overrides {
            evaluation_api: Some("https://flag-scoring".into()),
            timeout_ms: Some(250),
            ..Overrides::default()
        },
    )
    .expect("flags");
    assert_eq!(from_flags.evaluation_api_base.host_str(), Some("flag-scoring"));
    assert_eq!(from_flags.request_timeout, Duration::from_millis(250));
}

#[test]
fn rejects_invalid_urls_and_schemes() {
    let err = settings_from(
        None,
        env_of(&[("HOMEWORK_API_BASE", "not a url")]),
        &Overrides::default(),
    )
    .expect_err("invalid url");
    assert!(err.to_string().contains("homework_api_base"));

    let err = settings_from(
        None,
        env_of(&[]),
        &Overrides {
            evaluation_api: Some("ftp://scoring.local".into()),
            ..Overrides::default()
        },
    )
    .expect_err("bad scheme");
    assert!(err.to_string().contains("http or https"));
}

#[test]
fn rejects_zero_or_garbage_timeout() {
    assert!(settings_from(
        None,
        env_of(&[("APP__REQUEST_TIMEOUT_MS", "soon")]),
        &Overrides::default()
    )
    .is_err());
    assert!(settings_from(
        None,
        env_of(&[]),
        &Overrides {
            timeout_ms: Some(0),
            ..Overrides::default()
        }
    )
    .is_err());
}
