//! Whisper HTTP Client - 调用外部语音转写服务
//!
//! 实现 TranscriberPort trait，通过 HTTP 调用 OpenAI 风格的转写接口
//!
//! 外部 STT API:
//! POST {base_url}/v1/audio/transcriptions
//! Request: multipart/form-data (file + model + response_format=text)
//! Response: text/plain 转写文本

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;

use crate::application::ports::{TranscriberPort, TranscriptionError};
use crate::domain::dream::AudioClip;

/// 凭据缺失时提示的环境变量名
const CREDENTIAL_ENV: &str = "OPENAI_API_KEY";

/// Whisper 客户端配置
#[derive(Debug, Clone)]
pub struct WhisperClientConfig {
    /// 转写服务凭据
    pub api_key: String,
    /// 转写服务基础 URL
    pub base_url: String,
    /// 转写模型
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for WhisperClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com".to_string(),
            model: "whisper-1".to_string(),
            timeout_secs: 120,
        }
    }
}

impl WhisperClientConfig {
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

/// Whisper HTTP 客户端
///
/// 通过 HTTP 调用外部语音转写服务
pub struct WhisperClient {
    client: Client,
    config: WhisperClientConfig,
}

impl WhisperClient {
    /// 创建新的 Whisper 客户端
    pub fn new(config: WhisperClientConfig) -> Result<Self, TranscriptionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranscriptionError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取转写 URL
    fn transcriptions_url(&self) -> String {
        format!("{}/v1/audio/transcriptions", self.config.base_url)
    }

    /// 获取健康检查 URL
    fn health_url(&self) -> String {
        format!("{}/v1/models", self.config.base_url)
    }
}

#[async_trait]
impl TranscriberPort for WhisperClient {
    async fn transcribe(&self, clip: AudioClip) -> Result<String, TranscriptionError> {
        // 凭据缺失在首次调用时暴露，不在启动时校验
        if self.config.api_key.is_empty() {
            return Err(TranscriptionError::MissingCredential(CREDENTIAL_ENV));
        }

        let (data, filename) = clip.into_parts();

        tracing::debug!(
            url = %self.transcriptions_url(),
            audio_size = data.len(),
            filename = %filename,
            "Sending transcription request"
        );

        // filename 仅向服务传递容器格式提示
        let form = Form::new()
            .part("file", Part::bytes(data).file_name(filename))
            .text("model", self.config.model.clone())
            .text("response_format", "text");

        let response = self
            .client
            .post(self.transcriptions_url())
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranscriptionError::Timeout
                } else if e.is_connect() {
                    TranscriptionError::NetworkError(format!(
                        "Cannot connect to transcription service: {}",
                        e
                    ))
                } else {
                    TranscriptionError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let transcript = response.text().await.map_err(|e| {
            TranscriptionError::InvalidResponse(format!("Failed to read transcript: {}", e))
        })?;

        tracing::info!(
            transcript_len = transcript.len(),
            "Transcription completed"
        );

        Ok(transcript.trim().to_string())
    }

    async fn health_check(&self) -> bool {
        if self.config.api_key.is_empty() {
            return false;
        }

        match self
            .client
            .get(self.health_url())
            .bearer_auth(&self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = WhisperClientConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com");
        assert_eq!(config.model, "whisper-1");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_config_builder() {
        let config = WhisperClientConfig::new("sk-test").with_timeout(60);
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.timeout_secs, 60);
    }

    #[tokio::test]
    async fn test_missing_credential_surfaces_at_first_use() {
        let client = WhisperClient::new(WhisperClientConfig::default()).unwrap();
        let clip = AudioClip::new(vec![0u8; 8], "dream.wav").unwrap();

        let result = client.transcribe(clip).await;
        assert!(matches!(
            result,
            Err(TranscriptionError::MissingCredential(_))
        ));
    }
}
