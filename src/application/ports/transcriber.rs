//! Transcriber Port - 语音转写引擎抽象
//!
//! 定义语音转写的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::dream::AudioClip;

/// 转写错误
///
/// 转写失败对整个请求是致命的，调用方不在此层重试
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Transcription credential not configured. Set {0} or the matching config entry.")]
    MissingCredential(&'static str),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Transcriber Port
///
/// 外部语音转写服务的抽象接口
#[async_trait]
pub trait TranscriberPort: Send + Sync {
    /// 把上传的音频转写为叙述文本
    ///
    /// 音频只被消费一次；filename 仅向服务传递容器格式提示。
    /// 返回的文本不保证长度与内容。
    async fn transcribe(&self, clip: AudioClip) -> Result<String, TranscriptionError>;

    /// 检查转写服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
