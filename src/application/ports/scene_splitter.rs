//! Scene Splitter Port - 场景拆分抽象
//!
//! 定义叙述文本到场景列表的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

/// 场景拆分错误
///
/// 只覆盖远程调用本身的失败。"拆出零个场景"是合法的成功返回，
/// 由调用方按空场景集处理，不在此处伪造错误。
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Scene splitter credential not configured. Set {0} or the matching config entry.")]
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

/// Scene Splitter Port
///
/// 把叙述文本拆分为有序的场景描述列表
#[async_trait]
pub trait SceneSplitterPort: Send + Sync {
    /// 拆分叙述为场景
    ///
    /// 结果顺序与叙述中事件顺序一致；每个场景去除首尾空白后非空。
    async fn split(&self, narration: &str) -> Result<Vec<String>, SplitError>;
}
