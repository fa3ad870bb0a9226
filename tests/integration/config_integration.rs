//! Integration tests for the configuration system

use exercise_forge::config::{ConfigLoader, ForgeConfig};
use exercise_forge::exercise::Category;
use exercise_forge::provider::ProviderType;
use tempfile::TempDir;

use crate::integration::with_env;

fn write_workspace_file(root: &std::path::Path, name: &str, body: &str) {
    let dir = root.join("config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), body).unwrap();
}

#[test]
fn env_specific_file_overrides_base_file() {
    let temp_dir = TempDir::new().unwrap();
    write_workspace_file(
        temp_dir.path(),
        "config.toml",
        r#"
        [oracle]
        level = "A2"
        call_timeout_secs = 30
        "#,
    );
    write_workspace_file(
        temp_dir.path(),
        "staging.toml",
        r#"
        [oracle]
        level = "B1"
        "#,
    );

    let config = with_env(&[("FORGE_ENV", Some("staging"))], || {
        ConfigLoader::load_with_global(temp_dir.path(), None).unwrap()
    });
    assert_eq!(config.oracle.level, "B1");
    assert_eq!(config.oracle.call_timeout_secs, 30);
}

#[test]
fn environment_variables_override_files() {
    let temp_dir = TempDir::new().unwrap();
    write_workspace_file(
        temp_dir.path(),
        "config.toml",
        r#"
        [provider]
        model = "from-file"

        [generation]
        max_attempts = 2
        "#,
    );

    let config = with_env(
        &[
            ("FORGE__PROVIDER__MODEL", Some("from-env")),
            ("FORGE__GENERATION__MAX_ATTEMPTS", Some("7")),
        ],
        || ConfigLoader::load_with_global(temp_dir.path(), None).unwrap(),
    );
    assert_eq!(config.provider.model, "from-env");
    assert_eq!(config.generation.max_attempts, 7);
}

#[test]
fn explicit_file_replaces_workspace_files() {
    let temp_dir = TempDir::new().unwrap();
    write_workspace_file(
        temp_dir.path(),
        "config.toml",
        r#"
        [server]
        bind = "127.0.0.1:1111"
        "#,
    );
    let explicit = temp_dir.path().join("explicit.toml");
    std::fs::write(
        &explicit,
        r#"
        [provider]
        provider_type = "local_custom"
        endpoint = "http://127.0.0.1:8080/v1"

        [[generation.categories]]
        category = "fill_in_blank"
        quota = 10
        "#,
    )
    .unwrap();

    let config = with_env(&[], || ConfigLoader::load_from_file(&explicit).unwrap());
    assert_eq!(config.server.bind, ForgeConfig::default().server.bind);
    assert_eq!(config.provider.provider_type, ProviderType::LocalCustom);
    let plan = config.generation.plan();
    assert_eq!(plan.categories.len(), 1);
    assert_eq!(plan.categories[0].category, Category::FillInBlank);
    assert_eq!(plan.total_target(), 10);
    assert!(config.validate().is_ok());
}

#[test]
fn invalid_values_surface_as_validation_errors() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("bad.toml");
    std::fs::write(
        &file,
        r#"
        [[generation.categories]]
        category = "matching"
        quota = 0
        "#,
    )
    .unwrap();

    let config = with_env(&[], || ConfigLoader::load_from_file(&file).unwrap());
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().starts_with("Generation:"));
}

#[test]
fn unknown_category_fails_to_load() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("bad.toml");
    std::fs::write(
        &file,
        r#"
        [[generation.categories]]
        category = "essay"
        quota = 3
        "#,
    )
    .unwrap();
    assert!(with_env(&[], || ConfigLoader::load_from_file(&file)).is_err());
}
