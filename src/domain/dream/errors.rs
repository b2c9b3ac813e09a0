//! Dream Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DreamError {
    #[error("梦境请求不存在: {0}")]
    NotFound(String),

    #[error("无效的音频: {0}")]
    InvalidAudio(String),

    #[error("无效的渲染模式: {0}")]
    InvalidMode(String),

    /// 场景拆分成功但没有可用场景，整个请求终止
    #[error("No scenes were identified. Please try with a longer or more detailed description.")]
    EmptySceneSet,
}
