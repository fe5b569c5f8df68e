use ponder::config::Config;

#[test]
fn test_config_load_applies_defaults() {
    let _env_lock = ponder::test_support::ENV_LOCK.blocking_lock();
    for var in [
        "PONDER_ENGINE_BIN",
        "PONDER_RESOLVER_BIN",
        "PONDER_ENGINE_PATH",
        "PONDER_HOME",
        "PONDER_MODEL",
    ] {
        std::env::remove_var(var);
    }

    let config = Config::load().expect("load");
    assert_eq!(config.engine_bin, "ollama");
    assert_eq!(config.resolver_bin, "/usr/bin/which");
    assert!(config.search_path.contains("/usr/bin"));
    assert!(config.model.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_load_reads_model_override() {
    let _env_lock = ponder::test_support::ENV_LOCK.blocking_lock();
    std::env::set_var("PONDER_MODEL", "  llama3:8b  ");

    let config = Config::load().expect("load");
    assert_eq!(config.model.as_deref(), Some("llama3:8b"));

    std::env::remove_var("PONDER_MODEL");
}

#[test]
fn test_config_validation_rejects_empty_engine_bin() {
    let mut config = Config::with_engine_bin("ollama");
    config.engine_bin = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_rejects_empty_search_path() {
    let mut config = Config::with_engine_bin("ollama");
    config.search_path = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_spawn_env_mirrors_configured_values() {
    let mut config = Config::with_engine_bin("ollama");
    config.search_path = "/opt/engine/bin".to_string();
    config.home_dir = "/var/engine-home".to_string();

    let env = config.spawn_env();
    assert_eq!(env.path, "/opt/engine/bin");
    assert_eq!(env.home, "/var/engine-home");
}
