//! Chat Splitter - 通过文本生成服务拆分场景
//!
//! 实现 SceneSplitterPort trait，通过 HTTP 调用 OpenAI 风格的
//! chat completions 接口，把叙述拆分为逐行编号的场景脚本，
//! 再交给领域层解析器还原为场景列表
//!
//! 外部文本生成 API:
//! POST {base_url}/v1/chat/completions
//! Request: {"model", "messages", "max_tokens", "temperature"}  (JSON)
//! Response: choices[0].message.content

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{SceneSplitterPort, SplitError};
use crate::domain::parse_scene_script;

/// 凭据缺失时提示的环境变量名
const CREDENTIAL_ENV: &str = "OPENAI_API_KEY";

/// 系统提示词：逐字保留，不加演绎
const SPLIT_SYSTEM_PROMPT: &str = "You are a helpful assistant that breaks down dream \
descriptions into clear, simple scenes. Keep each scene exactly as the dreamer describes it, \
without adding extra interpretations or embellishments.";

/// 构造用户提示词：编号 "Scene N:" 格式，每场景 1-2 句，保持原始顺序
fn build_user_prompt(narration: &str) -> String {
    format!(
        "Break this dream description into simple, clear scenes.\n\n\
         Important:\n\
         - Keep each scene exactly as described in the original text\n\
         - Don't add extra details or interpretations\n\
         - Maintain the original sequence of events\n\
         - Use simple, clear language\n\
         - Each scene should be 1-2 sentences maximum\n\n\
         Dream to process:\n{}\n\n\
         Format: Number each scene (Scene 1:, Scene 2:, etc.) and keep descriptions simple \
         and true to the original.",
        narration
    )
}

/// Chat completions 请求体 (JSON)
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// Chat completions 响应体
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

/// Chat Splitter 配置
#[derive(Debug, Clone)]
pub struct ChatSplitterConfig {
    /// 文本生成服务凭据（与转写服务同一提供方）
    pub api_key: String,
    /// 文本生成服务基础 URL
    pub base_url: String,
    /// 拆分模型
    pub model: String,
    /// 采样温度（低温偏向确定性的逐字输出）
    pub temperature: f32,
    /// 输出 token 上限
    pub max_tokens: u32,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for ChatSplitterConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4.1-nano-2025-04-14".to_string(),
            temperature: 0.3,
            max_tokens: 1000,
            timeout_secs: 60,
        }
    }
}

impl ChatSplitterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }
}

/// Chat Splitter 客户端
pub struct ChatSplitter {
    client: Client,
    config: ChatSplitterConfig,
}

impl ChatSplitter {
    /// 创建新的 Chat Splitter
    pub fn new(config: ChatSplitterConfig) -> Result<Self, SplitError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SplitError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取 chat completions URL
    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }
}

#[async_trait]
impl SceneSplitterPort for ChatSplitter {
    async fn split(&self, narration: &str) -> Result<Vec<String>, SplitError> {
        // 凭据缺失在首次调用时暴露
        if self.config.api_key.is_empty() {
            return Err(SplitError::MissingCredential(CREDENTIAL_ENV));
        }

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SPLIT_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_user_prompt(narration),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        tracing::debug!(
            url = %self.completions_url(),
            narration_len = narration.len(),
            model = %self.config.model,
            "Sending scene split request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SplitError::Timeout
                } else if e.is_connect() {
                    SplitError::NetworkError(format!(
                        "Cannot connect to text generation service: {}",
                        e
                    ))
                } else {
                    SplitError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SplitError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let envelope: ChatCompletionResponse = response.json().await.map_err(|e| {
            SplitError::InvalidResponse(format!("Failed to parse completion: {}", e))
        })?;

        let content = envelope
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SplitError::InvalidResponse("no choices in response".to_string()))?;

        // 零可用行是合法返回，由调用方按空场景集终止
        let scenes = parse_scene_script(&content);

        tracing::info!(scene_count = scenes.len(), "Narration split into scenes");

        Ok(scenes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ChatSplitterConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com");
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.max_tokens, 1000);
    }

    #[test]
    fn test_user_prompt_embeds_narration() {
        let prompt = build_user_prompt("I was flying over a city");
        assert!(prompt.contains("I was flying over a city"));
        assert!(prompt.contains("Scene 1:"));
        assert!(prompt.contains("Maintain the original sequence of events"));
    }

    #[tokio::test]
    async fn test_missing_credential_surfaces_at_first_use() {
        let splitter = ChatSplitter::new(ChatSplitterConfig::default()).unwrap();
        let result = splitter.split("a dream").await;
        assert!(matches!(result, Err(SplitError::MissingCredential(_))));
    }
}
