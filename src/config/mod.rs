#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::gemini::DEFAULT_API_BASE_URL;
use crate::core::query::DEFAULT_MODEL;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::ConfigError;
use crate::utils::validation::{
    validate_model_name, validate_non_empty_string, validate_range, validate_url, Validate,
};
use toml_config::{has_placeholder, TomlConfig};

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const MODEL_ENV: &str = "GEMINI_MODEL";
pub const BASE_URL_ENV: &str = "GEMINI_API_BASE_URL";

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// 命令列參數，優先於配置檔與環境變數
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub api_base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_upload_bytes: Option<u64>,
}

#[cfg(feature = "cli")]
impl From<&cli::CliConfig> for ConfigOverrides {
    fn from(cli: &cli::CliConfig) -> Self {
        Self {
            model: cli.model.clone(),
            api_base_url: cli.api_base_url.clone(),
            timeout_seconds: cli.timeout_seconds,
            max_upload_bytes: cli.max_upload_bytes,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub request_timeout_seconds: Option<u64>,
    pub max_upload_bytes: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl AppConfig {
    /// 僅從環境變數載入，除 API 金鑰外皆有預設值
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(None, &ConfigOverrides::default(), |name| {
            std::env::var(name).ok()
        })
    }

    /// 依序合併命令列、配置檔與 `lookup`（環境變數）
    ///
    /// 找不到可用的 API 金鑰時立即回傳 `MissingApiKey`。
    pub fn resolve<F>(
        file: Option<&TomlConfig>,
        overrides: &ConfigOverrides,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini = file.and_then(|f| f.gemini.clone()).unwrap_or_default();
        let upload = file.and_then(|f| f.upload.clone()).unwrap_or_default();
        let usable = |value: &String| !value.trim().is_empty() && !has_placeholder(value);

        let api_key = gemini
            .api_key
            .filter(usable)
            .or_else(|| lookup(API_KEY_ENV).filter(usable))
            .ok_or_else(|| ConfigError::MissingApiKey {
                var: API_KEY_ENV.to_string(),
            })?;

        let model = overrides
            .model
            .clone()
            .or(gemini.model)
            .or_else(|| lookup(MODEL_ENV).filter(usable))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_base_url = overrides
            .api_base_url
            .clone()
            .or(gemini.base_url)
            .or_else(|| lookup(BASE_URL_ENV).filter(usable))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let request_timeout_seconds = overrides
            .timeout_seconds
            .or(gemini.timeout_seconds)
            .or(Some(DEFAULT_TIMEOUT_SECONDS));

        let max_upload_bytes = overrides
            .max_upload_bytes
            .or(upload.max_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Ok(Self {
            api_key: api_key.trim().to_string(),
            model,
            api_base_url,
            request_timeout_seconds,
            max_upload_bytes,
        })
    }
}

impl ConfigProvider for AppConfig {
    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn request_timeout_seconds(&self) -> Option<u64> {
        self.request_timeout_seconds
    }

    fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validate_non_empty_string("api_key", &self.api_key)?;
        validate_model_name("model", &self.model)?;
        validate_url("api_base_url", &self.api_base_url)?;
        if let Some(timeout) = self.request_timeout_seconds {
            validate_range("timeout_seconds", timeout, 1, 3600)?;
        }
        validate_range("max_upload_bytes", self.max_upload_bytes, 1, 1024 * 1024 * 1024)?;

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}
