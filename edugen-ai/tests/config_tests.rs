//! API key resolution and settings (env-mutating, serialized)

use edugen_ai::config::{
    resolve_gemini_api_key, resolve_youtube_api_key, ServiceSettings, GEMINI_KEY_ENV_VAR,
    YOUTUBE_KEY_ENV_VAR,
};
use edugen_ai::credential::Credential;
use edugen_ai::PipelineOptions;
use edugen_common::config::{load_toml_config, TomlConfig};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::time::Duration;

fn clear_env() {
    env::remove_var(GEMINI_KEY_ENV_VAR);
    env::remove_var(YOUTUBE_KEY_ENV_VAR);
}

#[test]
#[serial]
fn env_key_wins_over_toml() {
    clear_env();
    env::set_var(GEMINI_KEY_ENV_VAR, "from-env");
    let config = TomlConfig {
        gemini_api_key: Some("from-toml".into()),
        ..Default::default()
    };

    assert_eq!(resolve_gemini_api_key(&config).as_deref(), Some("from-env"));
    clear_env();
}

#[test]
#[serial]
fn toml_key_used_when_env_is_unset() {
    clear_env();
    let config = TomlConfig {
        youtube_api_key: Some("yt-from-toml".into()),
        ..Default::default()
    };

    assert_eq!(resolve_youtube_api_key(&config).as_deref(), Some("yt-from-toml"));
    assert_eq!(resolve_gemini_api_key(&config), None);
}

#[test]
#[serial]
fn whitespace_env_key_is_ignored() {
    clear_env();
    env::set_var(GEMINI_KEY_ENV_VAR, "   ");
    let config = TomlConfig {
        gemini_api_key: Some("from-toml".into()),
        ..Default::default()
    };

    assert_eq!(resolve_gemini_api_key(&config).as_deref(), Some("from-toml"));
    clear_env();
}

#[test]
#[serial]
fn settings_resolve_from_toml_file() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
gemini_api_key = "toml-key"

[server]
port = 6000

[models]
text_model = "gemini-custom"

[timeouts]
request_secs = 45
operation_secs = 300
poll_interval_secs = 2
"#
    )
    .unwrap();
    let config = load_toml_config(file.path()).unwrap();

    let settings = ServiceSettings::resolve(&config);
    assert_eq!(settings.port, 6000);
    assert_eq!(settings.bind_address, "127.0.0.1");
    assert_eq!(settings.gemini.text_model, "gemini-custom");
    assert_eq!(settings.gemini_api_key, Some(Credential::new("toml-key")));
    assert_eq!(settings.youtube_api_key, None);

    let options = PipelineOptions::from(&settings);
    assert_eq!(options.request_timeout, Duration::from_secs(45));
    assert_eq!(options.operation_budget, Duration::from_secs(300));
    assert_eq!(options.poll_interval, Duration::from_secs(2));
}
