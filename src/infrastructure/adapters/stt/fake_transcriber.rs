//! Fake Transcriber - 用于测试的转写客户端
//!
//! 始终返回固定的转写文本，不实际调用转写服务

use async_trait::async_trait;

use crate::application::ports::{TranscriberPort, TranscriptionError};
use crate::domain::dream::AudioClip;

/// Fake Transcriber 配置
#[derive(Debug, Clone)]
pub struct FakeTranscriberConfig {
    /// 固定返回的转写文本
    pub transcript: String,
    /// 模拟的转写延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeTranscriberConfig {
    fn default() -> Self {
        Self {
            transcript: "I was flying over a city, then I landed in a forest".to_string(),
            latency_ms: 200,
        }
    }
}

/// Fake Transcriber
///
/// 用于测试，始终返回配置的固定文本
pub struct FakeTranscriber {
    config: FakeTranscriberConfig,
}

impl FakeTranscriber {
    pub fn new(config: FakeTranscriberConfig) -> Self {
        tracing::info!(
            transcript_len = config.transcript.len(),
            latency_ms = config.latency_ms,
            "FakeTranscriber initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeTranscriberConfig::default())
    }
}

#[async_trait]
impl TranscriberPort for FakeTranscriber {
    async fn transcribe(&self, clip: AudioClip) -> Result<String, TranscriptionError> {
        tracing::debug!(
            audio_size = clip.len(),
            filename = %clip.filename(),
            "FakeTranscriber: returning fixed transcript"
        );

        // 模拟转写延迟
        tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;

        Ok(self.config.transcript.clone())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
