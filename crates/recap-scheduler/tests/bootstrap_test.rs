use std::path::PathBuf;

use recap_scheduler::bootstrap::{build_controller, build_invoker, connect_store};
use recap_scheduler::config::LlmProvider;
use recap_scheduler::Config;

fn default_config() -> Config {
    Config::from_file("config/default.toml").unwrap()
}

#[test]
fn test_default_config_file_loads() {
    let config = default_config();
    assert_eq!(config.scheduler.interval_secs, 3600);
    assert_eq!(config.summary.threshold.get(), 10);
    assert_eq!(config.scheduler.collection, "summary");
    assert_eq!(config.llm.model(), "gpt-4o-mini");
    assert_eq!(config.llm.provider, LlmProvider::OpenAI);
    assert_eq!(config.store_url, "redis://127.0.0.1:6379");
}

#[tokio::test]
async fn test_memory_store_bootstrap() {
    let mut config = default_config();
    config.store_url = "memory://".to_string();

    let store = connect_store(&config).await.unwrap();
    assert_eq!(store.backend_name(), "memory");
}

#[tokio::test]
async fn test_unknown_store_scheme_fails() {
    let mut config = default_config();
    config.store_url = "ftp://example.com".to_string();
    assert!(connect_store(&config).await.is_err());
}

#[test]
fn test_invoker_requires_api_key() {
    let mut config = default_config();
    assert!(build_invoker(&config).is_err());

    config.openai_api_key = Some("sk-test".to_string());
    assert!(build_invoker(&config).is_ok());
}

#[test]
fn test_gemini_invoker_needs_its_own_key() {
    let mut config = default_config();
    config.llm.provider = LlmProvider::Gemini;
    config.llm.model = None;
    config.openai_api_key = Some("sk-test".to_string());
    let err = build_invoker(&config).err().unwrap();
    assert!(err.to_string().contains("GEMINI_API_KEY"));

    config.gemini_api_key = Some("g-test".to_string());
    assert!(build_invoker(&config).is_ok());
    assert_eq!(config.llm.model(), "gemini-2.0-flash");
}

#[tokio::test]
async fn test_controller_with_schema_file() {
    let mut config = default_config();
    config.store_url = "memory://".to_string();
    config.openai_api_key = Some("sk-test".to_string());
    config.summary.schema_path = Some(PathBuf::from("config/schema_summary.json"));

    let store = connect_store(&config).await.unwrap();
    let llm = build_invoker(&config).unwrap();
    let controller = build_controller(&config, store, llm).unwrap();
    assert_eq!(controller.threshold(), 10);

    let counts = controller.count_new_sessions().await.unwrap();
    assert_eq!(counts.new_sessions, 0);
}

#[tokio::test]
async fn test_missing_schema_file_fails() {
    let mut config = default_config();
    config.store_url = "memory://".to_string();
    config.openai_api_key = Some("sk-test".to_string());
    config.summary.schema_path = Some(PathBuf::from("config/does_not_exist.json"));

    let store = connect_store(&config).await.unwrap();
    let llm = build_invoker(&config).unwrap();
    assert!(build_controller(&config, store, llm).is_err());
}
