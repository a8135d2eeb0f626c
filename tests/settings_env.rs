use leadership4dx_lib::config::{Settings, StorageBackend};

// One test per binary: the process environment is shared between test threads.
#[test]
fn settings_load_from_process_environment() {
    let vars = [
        ("JWT_SECRET", "env-secret"),
        ("PORT", "9321"),
        ("STORAGE_BACKEND", "memory"),
        ("ANTHROPIC_API_KEY", "sk-ant-env"),
        ("DEFAULT_AI_PROVIDER", "ANTHROPIC"),
        ("AI_TIMEOUT_SECS", "15"),
        ("OPENAI_API_KEY", ""),
    ];
    for (key, value) in vars {
        std::env::set_var(key, value);
    }

    let settings = Settings::load().unwrap();

    for (key, _) in vars {
        std::env::remove_var(key);
    }

    assert_eq!(settings.jwt_secret, "env-secret");
    assert_eq!(settings.port, 9321);
    assert_eq!(settings.storage_backend, StorageBackend::Memory);
    assert_eq!(settings.anthropic_api_key.as_deref(), Some("sk-ant-env"));
    assert_eq!(settings.default_ai_provider, "anthropic");
    assert_eq!(settings.ai_timeout_secs, 15);
    assert!(settings.openai_api_key.is_none());
    assert_eq!(settings.openai_model, "gpt-4.1-mini");

    assert!(Settings::load().is_err(), "JWT_SECRET was removed");
}
