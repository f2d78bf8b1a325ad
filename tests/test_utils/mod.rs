//! Test utilities for integration tests
use krishna::ai::chat::{Chat, ChatBuilder};
use krishna::core::AppConfig;
use krishna::core::config::API_KEY_VAR;
use krishna::openai::OpenAiClient;

pub const SUCCESS_BODY: &str = r#"{"choices":[{"message":{"content":"hello"}}]}"#;

/// Config pointing at `api_hostname` without reading the process
/// environment.
pub fn test_config(api_hostname: &str) -> AppConfig {
    let mut config = AppConfig::from_lookup(|key| {
        (key == API_KEY_VAR).then(|| String::from("test-api-key"))
    })
    .expect("Failed to build test config");
    config.openai_api_hostname = api_hostname.to_string();
    config
}

/// Creates a chat session that talks to `api_hostname`, usually the
/// URL of a `mockito` server.
pub fn test_chat(api_hostname: &str) -> Chat {
    let client = OpenAiClient::from_config(&test_config(api_hostname));
    ChatBuilder::new(Box::new(client)).build()
}
