use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";

const DEFAULT_ANALYZE_TIMEOUT_SECS: u64 = 45;
const DEFAULT_ANALYZE_CONCURRENCY: usize = 2;
/// 20MB multipart limit for image batches.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_ASK_TIMEOUT_SECS: u64 = 110;

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub common: core_config::Config,
    pub openai: ProviderSettings,
    /// Text-only provider for `/ask`; falls back to `openai` when unset.
    pub deepseek: Option<ProviderSettings>,
    pub analysis: AnalysisConfig,
    pub ask: AskConfig,
    pub security: SecurityConfig,
    pub otlp_endpoint: Option<String>,
}

/// Connection settings for an OpenAI-compatible chat-completion API.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Vendor name used in user-facing error notes ("Timeout mot OpenAI.").
    pub name: String,
    pub api_key: Secret<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub timeout_secs: u64,
    pub concurrency: usize,
    pub layout: AnalysisLayout,
    pub max_upload_bytes: usize,
}

impl AnalysisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct AskConfig {
    pub timeout_secs: u64,
    pub llm_fallback: bool,
}

impl AskConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SecurityConfig {
    /// Empty means any origin is mirrored back.
    pub allowed_origins: Vec<String>,
}

/// Shape of the labeled bullet list returned for each image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisLayout {
    /// Seven lines: product, serial/model, L/B/H, weight, uncertainty.
    #[default]
    Detailed,
    /// Five lines: product, L/B/H, weight.
    Compact,
}

impl std::str::FromStr for AnalysisLayout {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detailed" => Ok(AnalysisLayout::Detailed),
            "compact" => Ok(AnalysisLayout::Compact),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "ANALYZE_LAYOUT must be 'detailed' or 'compact', got '{}'",
                other
            ))),
        }
    }
}

impl AssistantConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = common_config.is_production();

        let openai = openai_settings(is_prod)?;

        let deepseek = match env::var("DEEPSEEK_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Some(ProviderSettings {
                name: "DeepSeek".to_string(),
                api_key: Secret::new(key),
                base_url: get_env("DEEPSEEK_BASE_URL", Some(DEFAULT_DEEPSEEK_BASE_URL), false)?,
                model: get_env("DEEPSEEK_MODEL", Some(DEFAULT_DEEPSEEK_MODEL), false)?,
            }),
            _ => None,
        };

        let concurrency = parse_env("ANALYZE_CONCURRENCY", DEFAULT_ANALYZE_CONCURRENCY)?;

        Ok(AssistantConfig {
            common: common_config,
            openai,
            deepseek,
            analysis: AnalysisConfig {
                timeout_secs: parse_env("ANALYZE_TIMEOUT_SECS", DEFAULT_ANALYZE_TIMEOUT_SECS)?,
                concurrency: concurrency.max(1),
                layout: match env::var("ANALYZE_LAYOUT") {
                    Ok(value) => value.parse()?,
                    Err(_) => AnalysisLayout::default(),
                },
                max_upload_bytes: parse_env("ANALYZE_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            },
            ask: AskConfig {
                timeout_secs: parse_env("ASK_TIMEOUT_SECS", DEFAULT_ASK_TIMEOUT_SECS)?,
                llm_fallback: parse_env("ASK_LLM_FALLBACK", true)?,
            },
            security: SecurityConfig {
                allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                    .map(|v| split_list(&v))
                    .unwrap_or_default(),
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
        })
    }

    /// Provider settings used by `/ask` when no category matches.
    pub fn ask_provider(&self) -> Option<&ProviderSettings> {
        use secrecy::ExposeSecret;

        self.deepseek.as_ref().or_else(|| {
            (!self.openai.api_key.expose_secret().is_empty()).then_some(&self.openai)
        })
    }
}

/// Only the API key is mandatory in production; endpoint and model keep
/// their defaults.
fn openai_settings(is_prod: bool) -> Result<ProviderSettings, AppError> {
    Ok(ProviderSettings {
        name: "OpenAI".to_string(),
        api_key: Secret::new(get_env("OPENAI_API_KEY", Some(""), is_prod)?),
        base_url: get_env("OPENAI_BASE_URL", Some(DEFAULT_OPENAI_BASE_URL), false)?,
        model: get_env("OPENAI_MODEL", Some(DEFAULT_OPENAI_MODEL), false)?,
    })
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
        }),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
