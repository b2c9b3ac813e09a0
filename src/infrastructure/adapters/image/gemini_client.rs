//! Gemini Image Client - 调用外部图像生成服务
//!
//! 实现 ImageGeneratorPort trait，通过 HTTP 调用 Gemini 风格的
//! generateContent 接口。所有失败（传输、错误响应体、无图像的响应）
//! 在这里统一折叠为 GenerationResult::Failure，重试决策属于调用方
//!
//! 外部图像生成 API:
//! POST {base_url}/v1beta/models/{model}:generateContent?key={api_key}
//! Request: {"contents", "generationConfig", "safety_settings"}  (JSON)
//! Response: candidates[0].content.parts[*].inlineData.data (base64)，
//! 或错误信封 {"error": {"message": "..."}}

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{GenerationResult, ImageGeneratorPort};

/// 凭据缺失时提示的环境变量名
const CREDENTIAL_ENV: &str = "GOOGLE_API_KEY";

// 固定采样参数
const TEMPERATURE: f32 = 0.85;
const TOP_P: f32 = 0.9;
const TOP_K: u32 = 45;
const MAX_OUTPUT_TOKENS: u32 = 2048;

/// 中等及以上强度一律拦截的内容类别
const BLOCKED_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
];
const BLOCK_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

/// 固定的写实摄影风格模板
fn enhance_prompt(prompt: &str) -> String {
    format!(
        "A clear, realistic photograph of: {}\n\n\
         Style: Natural and realistic\n\
         Quality: High detail\n\
         Perspective: Normal eye level\n\
         Lighting: Clear and natural",
        prompt
    )
}

// ============================================================================
// 请求体
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

fn build_request(prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: enhance_prompt(prompt),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            top_p: TOP_P,
            top_k: TOP_K,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        },
        safety_settings: BLOCKED_CATEGORIES
            .iter()
            .map(|category| SafetySetting {
                category,
                threshold: BLOCK_THRESHOLD,
            })
            .collect(),
    }
}

// ============================================================================
// 响应体
// ============================================================================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

/// 错误信封 {"error": {"message": "..."}}
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// 响应分类：成功信封到封闭变体的唯一转换点
///
/// - 首个候选的 parts 中存在内联图像 payload，解码成功则为 Image
/// - 有候选但没有图像部件，按固定文案报失败
/// - 没有候选，按固定文案报失败
fn classify_response(response: GenerateContentResponse) -> GenerationResult {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return GenerationResult::Failure("no candidates in response".to_string());
    };

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    let Some(inline) = parts.into_iter().find_map(|p| p.inline_data) else {
        return GenerationResult::Failure("no image generated in response".to_string());
    };

    match BASE64.decode(inline.data.as_bytes()) {
        Ok(bytes) => GenerationResult::Image(bytes),
        Err(e) => GenerationResult::Failure(format!("invalid image payload: {}", e)),
    }
}

/// 从结构化错误体提取 error.message，缺失时回退到通用传输错误文本
fn extract_error_message(body: &str, fallback: String) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .unwrap_or(fallback)
}

// ============================================================================
// 客户端
// ============================================================================

/// Gemini 图像客户端配置
#[derive(Debug, Clone)]
pub struct GeminiImageClientConfig {
    /// 图像服务凭据（拼接在 URL query 中）
    pub api_key: String,
    /// 图像服务基础 URL
    pub base_url: String,
    /// 图像生成模型
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for GeminiImageClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash-image-preview".to_string(),
            timeout_secs: 120,
        }
    }
}

impl GeminiImageClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Gemini 图像客户端
pub struct GeminiImageClient {
    client: Client,
    config: GeminiImageClientConfig,
}

impl GeminiImageClient {
    /// 创建新的 Gemini 图像客户端
    pub fn new(config: GeminiImageClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// 获取生成 URL（含凭据，禁止写入日志）
    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.config.api_key
        )
    }
}

#[async_trait]
impl ImageGeneratorPort for GeminiImageClient {
    async fn generate(&self, prompt: &str, context: Option<&[u8]>) -> GenerationResult {
        // context 为图像条件生成预留，当前没有调用方填充
        let _ = context;

        // 凭据缺失在首次调用时暴露
        if self.config.api_key.is_empty() {
            return GenerationResult::Failure(format!(
                "Image credential not configured. Set {} or the matching config entry.",
                CREDENTIAL_ENV
            ));
        }

        let request = build_request(prompt);

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending image generation request"
        );

        let response = match self.client.post(self.generate_url()).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                let message = if e.is_timeout() {
                    "Request timeout".to_string()
                } else if e.is_connect() {
                    format!("Cannot connect to image service: {}", e)
                } else {
                    e.to_string()
                };
                tracing::warn!(error = %message, "Image generation transport failed");
                return GenerationResult::Failure(message);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let fallback = if body.is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, body)
            };
            let message = extract_error_message(&body, fallback);
            tracing::warn!(status = %status, error = %message, "Image generation rejected");
            return GenerationResult::Failure(message);
        }

        let envelope: GenerateContentResponse = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) => {
                return GenerationResult::Failure(format!("invalid response envelope: {}", e));
            }
        };

        let result = classify_response(envelope);
        match &result {
            GenerationResult::Image(bytes) => {
                tracing::info!(image_size = bytes.len(), "Image generated");
            }
            GenerationResult::Failure(reason) => {
                // 诊断细节只进操作日志，不回显给用户
                tracing::warn!(reason = %reason, "No image in generation response");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_inline_payload_decoded_exactly() {
        let encoded = BASE64.encode(b"dream-pixels");
        let response = parse(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "here is your image"},
                        {"inlineData": {"data": encoded}}
                    ]
                }
            }]
        }));

        assert_eq!(
            classify_response(response),
            GenerationResult::Image(b"dream-pixels".to_vec())
        );
    }

    #[test]
    fn test_candidate_without_image_part() {
        let response = parse(json!({
            "candidates": [{
                "content": {"parts": [{"text": "refused"}]}
            }]
        }));

        assert_eq!(
            classify_response(response),
            GenerationResult::Failure("no image generated in response".to_string())
        );
    }

    #[test]
    fn test_candidate_without_content() {
        let response = parse(json!({"candidates": [{}]}));

        assert_eq!(
            classify_response(response),
            GenerationResult::Failure("no image generated in response".to_string())
        );
    }

    #[test]
    fn test_no_candidates() {
        let response = parse(json!({}));

        assert_eq!(
            classify_response(response),
            GenerationResult::Failure("no candidates in response".to_string())
        );
    }

    #[test]
    fn test_invalid_base64_reported_as_failure() {
        let response = parse(json!({
            "candidates": [{
                "content": {"parts": [{"inlineData": {"data": "!!not-base64!!"}}]}
            }]
        }));

        assert!(matches!(
            classify_response(response),
            GenerationResult::Failure(reason) if reason.starts_with("invalid image payload")
        ));
    }

    #[test]
    fn test_error_message_extracted_from_envelope() {
        let body = r#"{"error": {"message": "quota exceeded", "code": 429}}"#;
        let message = extract_error_message(body, "HTTP 429".to_string());
        assert_eq!(message, "quota exceeded");
    }

    #[test]
    fn test_error_message_falls_back_on_plain_body() {
        let message = extract_error_message("upstream exploded", "HTTP 502: upstream exploded".to_string());
        assert_eq!(message, "HTTP 502: upstream exploded");
    }

    #[test]
    fn test_enhanced_prompt_wraps_scene_text() {
        let enhanced = enhance_prompt("a red balloon over the sea");
        assert!(enhanced.starts_with("A clear, realistic photograph of: a red balloon over the sea"));
        assert!(enhanced.contains("Lighting: Clear and natural"));
    }

    #[test]
    fn test_request_serializes_expected_shape() {
        let request = build_request("a forest");
        let value = serde_json::to_value(&request).unwrap();

        assert!(value["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("a forest"));
        assert_eq!(value["generationConfig"]["topK"], 45);
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(value["safety_settings"].as_array().unwrap().len(), 3);
        assert_eq!(
            value["safety_settings"][0]["threshold"],
            "BLOCK_MEDIUM_AND_ABOVE"
        );
    }

    #[test]
    fn test_config_default() {
        let config = GeminiImageClientConfig::default();
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(config.model, "gemini-2.5-flash-image-preview");
        assert_eq!(config.timeout_secs, 120);
    }
}
