//! Image Generator Port - 图像生成引擎抽象
//!
//! 定义单条提示词到图像的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;

/// 单次生成尝试的结果
///
/// 适配器边界上的封闭变体：传输失败、错误响应体、无图像的响应
/// 统一折叠为 `Failure`，下游只对这两种情况做匹配，不再探测响应形状。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    /// 解码后的图像字节
    Image(Vec<u8>),
    /// 失败原因（面向操作者的诊断文本）
    Failure(String),
}

impl GenerationResult {
    pub fn is_image(&self) -> bool {
        matches!(self, GenerationResult::Image(_))
    }
}

/// 单个场景重试循环结束后的终态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// 某次尝试成功，携带图像字节
    Success(Vec<u8>),
    /// 重试预算耗尽，携带最后一次失败原因
    Exhausted(String),
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success(_))
    }
}

/// Image Generator Port
///
/// 外部图像生成服务的抽象接口
#[async_trait]
pub trait ImageGeneratorPort: Send + Sync {
    /// 为一条提示词请求一张图像
    ///
    /// `context` 为图像条件生成预留，当前没有调用方填充，始终为 None。
    /// 失败以 `GenerationResult::Failure` 返回，不作为 Err 传播，
    /// 重试决策属于调用方。
    async fn generate(&self, prompt: &str, context: Option<&[u8]>) -> GenerationResult;
}
