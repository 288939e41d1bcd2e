use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value as JsonValue, json};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::{
    config::VisionConfig,
    error::{AppError, AppResult},
    image_processing::NormalizedImage,
};

/// 发送给视觉模型的固定指令
pub const ASSESSMENT_PROMPT: &str = "You are assisting with oral cavity screening. \
Look at this photograph of the inside of a mouth and classify it. \
Respond with exactly one line in the form <Category>,<Confidence> \
where <Category> is Normal or Suspicious and <Confidence> is a decimal number between 0 and 1. \
Do not add any other text.";

/// 远程视觉评估接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssessmentClient: Send + Sync {
    /// 发送规范化后的图像，返回模型的原始文本回复
    async fn assess(&self, image: &NormalizedImage) -> AppResult<String>;
}

/// OpenAI 兼容的 chat/completions 视觉客户端
#[derive(Clone)]
pub struct OpenAiVisionClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
}

impl std::fmt::Debug for OpenAiVisionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiVisionClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"***")
            .finish()
    }
}

impl OpenAiVisionClient {
    /// 创建客户端；未配置API密钥时立即失败
    pub fn new(config: &VisionConfig) -> AppResult<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            AppError::config(format!(
                "未配置视觉模型API密钥，请设置 vision.api_key 或环境变量 {}",
                config.api_key_env
            ))
        })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.get_api_url("chat/completions"),
            model: config.model.clone(),
            api_key,
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_payload(&self, image: &NormalizedImage) -> JsonValue {
        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": ASSESSMENT_PROMPT },
                    { "type": "image_url", "image_url": { "url": image.data_url() } }
                ]
            }]
        })
    }
}

/// 从 chat/completions 响应中取出第一条回复文本
fn extract_content(data: &JsonValue) -> AppResult<String> {
    if let Some(api_error) = data.get("error") {
        let message = api_error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("未知错误");
        return Err(AppError::assessment_unavailable(format!(
            "视觉模型返回错误: {}",
            message
        )));
    }

    data.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::assessment_unavailable("视觉模型响应缺少 choices[0].message.content"))
}

#[async_trait]
impl AssessmentClient for OpenAiVisionClient {
    async fn assess(&self, image: &NormalizedImage) -> AppResult<String> {
        info!(
            model = %self.model,
            width = image.width,
            height = image.height,
            "请求视觉模型评估"
        );
        debug!(bytes = image.bytes.len(), "图像负载大小");

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.build_payload(image))
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() { "请求超时" } else { "请求失败" };
                error!(error = %e, "视觉模型{}", reason);
                AppError::assessment_unavailable(format!("视觉模型{}: {}", reason, e))
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AppError::assessment_unavailable(format!("读取视觉模型响应失败: {}", e)))?;
        debug!(len = text.len(), "视觉模型响应长度");

        if !status.is_success() {
            let preview = text.chars().take(200).collect::<String>();
            error!(%status, preview = %preview, "视觉模型请求失败");
            return Err(AppError::assessment_unavailable(format!(
                "视觉模型请求失败: status={}, body_preview={}",
                status, preview
            )));
        }

        let data: JsonValue = serde_json::from_str(&text).map_err(|e| {
            AppError::assessment_unavailable(format!("视觉模型返回了非JSON响应: {}", e))
        })?;

        extract_content(&data)
    }
}
