#![allow(dead_code)]

use assistant_service::config::{
    AnalysisConfig, AnalysisLayout, AskConfig, AssistantConfig, ProviderSettings, SecurityConfig,
};
use assistant_service::services::providers::mock::MockChatProvider;
use assistant_service::services::providers::ChatProvider;
use assistant_service::startup::{AppState, Application};
use secrecy::Secret;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

pub fn test_config() -> AssistantConfig {
    AssistantConfig {
        common: service_core::config::Config {
            port: 0,
            ..Default::default()
        },
        openai: ProviderSettings {
            name: "OpenAI".to_string(),
            api_key: Secret::new("test-api-key".to_string()),
            base_url: "http://127.0.0.1:9".to_string(),
            model: "gpt-4o-mini".to_string(),
        },
        deepseek: None,
        analysis: AnalysisConfig {
            timeout_secs: 1,
            concurrency: 2,
            layout: AnalysisLayout::Detailed,
            max_upload_bytes: 64 * 1024,
        },
        ask: AskConfig {
            timeout_secs: 1,
            llm_fallback: true,
        },
        security: SecurityConfig::default(),
        otlp_endpoint: None,
    }
}

/// Spawn the application on a random port with scripted providers.
pub async fn spawn_app(
    config: AssistantConfig,
    vision: Arc<MockChatProvider>,
    ask: Option<Arc<MockChatProvider>>,
) -> TestApp {
    let ask = ask.map(|p| p as Arc<dyn ChatProvider>);
    let state = AppState::new(config, vision, ask);

    let app = Application::build_with_state(state)
        .await
        .expect("Failed to build application");
    let port = app.port();

    tokio::spawn(app.run_until_stopped());

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

pub fn image_part(bytes: Vec<u8>, file_name: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str("image/jpeg")
        .expect("valid mime type")
}
