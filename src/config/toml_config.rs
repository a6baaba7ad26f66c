use crate::utils::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 可選的 TOML 配置檔，例如
///
/// ```toml
/// [gemini]
/// api_key = "${GOOGLE_API_KEY}"
/// model = "gemini-2.5-flash-lite"
/// timeout_seconds = 60
///
/// [upload]
/// max_bytes = 10485760
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub gemini: Option<GeminiSection>,
    pub upload: Option<UploadSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiSection {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadSection {
    pub max_bytes: Option<u64>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Parse {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content, |name| std::env::var(name).ok())
    }

    /// 從 TOML 字串解析配置，先以 `lookup` 替換 `${VAR}` 佔位符
    ///
    /// 找不到的變數保持原樣。
    pub fn from_toml_str<F>(content: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let processed = substitute_env_vars(content, lookup)?;
        toml::from_str(&processed).map_err(|e| ConfigError::Parse {
            message: format!("TOML parsing error: {}", e),
        })
    }
}

fn substitute_env_vars<F>(content: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // 使用正規表達式匹配 ${VAR_NAME} 格式
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::Parse {
        message: e.to_string(),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
    });

    Ok(result.into_owned())
}

/// 值中是否仍有未替換的 `${VAR}` 佔位符
pub fn has_placeholder(value: &str) -> bool {
    value.contains("${")
}
