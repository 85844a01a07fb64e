use ferrowiki::core::config::{ConfigLoader, EngineConfig};
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

// Loading consults process-global environment variables, so tests in this
// binary serialize on one lock instead of racing the env-mutating test.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn missing_file_yields_defaults() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = TempDir::new().unwrap();
    let config = ConfigLoader::load_from_workspace(dir.path()).unwrap();
    assert_eq!(config.engine.application_name, "ferrowiki");
    assert!(config.plugins.enabled);
    assert!(config.approvals.page_save_approver.is_none());
}

#[test]
fn file_values_override_defaults() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("ferrowiki.toml"),
        r#"
[engine]
application_name = "CompanyWiki"
release_version = "2.4.0"

[plugins]
enabled = false
max_body_chars = 1024

[modules]
allow_incompatible = true

[approvals]
page_save_approver = "admin"

[filters]
profanity_words = ["darn", "heck"]
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_workspace(dir.path()).unwrap();
    assert_eq!(config.engine.application_name, "CompanyWiki");
    assert_eq!(config.engine.release_version, "2.4.0");
    assert!(!config.plugins.enabled);
    assert_eq!(config.plugins.max_body_chars, 1024);
    assert!(config.modules.allow_incompatible);
    assert_eq!(config.approvals.page_save_approver.as_deref(), Some("admin"));
    assert_eq!(config.filters.profanity_words, vec!["darn", "heck"]);
}

#[test]
fn partial_file_keeps_defaults_for_missing_sections() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("ferrowiki.toml"),
        r#"
[approvals]
profile_save_approver = "admin"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_workspace(dir.path()).unwrap();
    assert!(config.plugins.enabled);
    assert_eq!(config.plugins.max_body_chars, 65_536);
    assert_eq!(
        config.approvals.profile_save_approver.as_deref(),
        Some("admin")
    );
    assert!(config.approvals.page_save_approver.is_none());
}

#[test]
fn malformed_toml_is_an_error() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("ferrowiki.toml"), "[engine\nbroken").unwrap();
    assert!(ConfigLoader::load_from_workspace(dir.path()).is_err());
}

#[test]
fn invalid_release_version_fails_validation() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("ferrowiki.toml"),
        r#"
[engine]
release_version = "not-a-version"
"#,
    )
    .unwrap();
    assert!(ConfigLoader::load_from_workspace(dir.path()).is_err());
}

#[test]
fn blank_approver_fails_validation() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("ferrowiki.toml"),
        r#"
[approvals]
page_save_approver = "  "
"#,
    )
    .unwrap();
    let err = ConfigLoader::load_from_workspace(dir.path()).unwrap_err();
    assert!(err.to_string().contains("page_save_approver"));
}

// Environment overrides share process-global state, so every env-dependent
// assertion lives in this one test.
#[test]
fn env_vars_override_file_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("ferrowiki.toml"),
        r#"
[engine]
application_name = "FromFile"

[approvals]
page_save_approver = "file-admin"
"#,
    )
    .unwrap();

    std::env::set_var("FERROWIKI_APPLICATION_NAME", "FromEnv");
    std::env::set_var("FERROWIKI_PLUGINS_ENABLED", "false");
    std::env::set_var("FERROWIKI_PAGE_SAVE_APPROVER", "");
    let config = ConfigLoader::load_from_workspace(dir.path()).unwrap();
    std::env::remove_var("FERROWIKI_APPLICATION_NAME");
    std::env::remove_var("FERROWIKI_PLUGINS_ENABLED");
    std::env::remove_var("FERROWIKI_PAGE_SAVE_APPROVER");

    assert_eq!(config.engine.application_name, "FromEnv");
    assert!(!config.plugins.enabled);
    // An empty approver env var disables approval entirely.
    assert!(config.approvals.page_save_approver.is_none());
}

#[test]
fn env_var_documentation_covers_every_override() {
    let _guard = ENV_LOCK.lock().unwrap();
    let docs = ConfigLoader::env_var_documentation();
    for var in [
        "FERROWIKI_APPLICATION_NAME",
        "FERROWIKI_RELEASE_VERSION",
        "FERROWIKI_PLUGINS_ENABLED",
        "FERROWIKI_MODULES_ALLOW_INCOMPATIBLE",
        "FERROWIKI_PAGE_SAVE_APPROVER",
        "FERROWIKI_PROFILE_SAVE_APPROVER",
    ] {
        assert!(docs.iter().any(|line| line.contains(var)), "missing {}", var);
    }
}

#[test]
fn default_config_serializes_round_trip() {
    let _guard = ENV_LOCK.lock().unwrap();
    let config = EngineConfig::default();
    let text = toml::to_string(&config).unwrap();
    let back: EngineConfig = toml::from_str(&text).unwrap();
    assert_eq!(back.engine.application_name, config.engine.application_name);
    assert_eq!(back.plugins.max_body_chars, config.plugins.max_body_chars);
}
