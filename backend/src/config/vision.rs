use serde::{Deserialize, Serialize};

/// 视觉模型接入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// OpenAI 兼容接口基础URL
    pub api_base: String,
    /// 模型名称
    pub model: String,
    /// 直接配置的API密钥（为空时读取环境变量）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// 存放API密钥的环境变量名
    pub api_key_env: String,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
    /// 响应最大token数
    pub max_tokens: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            max_tokens: 50,
        }
    }
}

impl VisionConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.api_base.is_empty() {
            return Err("视觉模型 api_base 不能为空".to_string());
        }

        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err("视觉模型 api_base 必须以 http:// 或 https:// 开头".to_string());
        }

        if self.model.trim().is_empty() {
            return Err("视觉模型名称不能为空".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("请求超时必须大于0".to_string());
        }

        if self.max_tokens == 0 {
            return Err("max_tokens 必须大于0".to_string());
        }

        Ok(())
    }

    /// 获取完整的API URL
    pub fn get_api_url(&self, endpoint: &str) -> String {
        let base = self.api_base.trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        format!("{}/{}", base, endpoint)
    }

    /// 解析API密钥：优先使用配置值，其次读取环境变量
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .or_else(|| {
                std::env::var(&self.api_key_env)
                    .ok()
                    .map(|key| key.trim().to_string())
                    .filter(|key| !key.is_empty())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vision_config_is_valid() {
        assert!(VisionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_api_base() {
        let config = VisionConfig {
            api_base: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_get_api_url() {
        let config = VisionConfig {
            api_base: "http://localhost:8000/v1/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.get_api_url("/chat/completions"),
            "http://localhost:8000/v1/chat/completions"
        );
    }

    #[test]
    fn test_resolve_api_key_prefers_config_value() {
        let config = VisionConfig {
            api_key: Some("  sk-config  ".to_string()),
            api_key_env: "ORAL_SCREEN_TEST_UNSET_KEY_VAR".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-config"));
    }

    #[test]
    fn test_resolve_api_key_missing() {
        let config = VisionConfig {
            api_key: Some("   ".to_string()),
            api_key_env: "ORAL_SCREEN_TEST_UNSET_KEY_VAR".to_string(),
            ..Default::default()
        };
        assert!(config.resolve_api_key().is_none());
    }
}
