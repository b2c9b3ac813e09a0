//! Fake Image Client - 用于测试的图像生成客户端
//!
//! 始终返回固定的图像字节，不实际调用图像服务

use async_trait::async_trait;

use crate::application::ports::{GenerationResult, ImageGeneratorPort};

/// 1x1 透明 PNG，固定返回值的默认图
const PLACEHOLDER_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Fake Image Client 配置
#[derive(Debug, Clone)]
pub struct FakeImageClientConfig {
    /// 固定返回的图像字节
    pub image_data: Vec<u8>,
    /// 模拟的生成延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeImageClientConfig {
    fn default() -> Self {
        use base64::engine::general_purpose::STANDARD as BASE64;
        use base64::Engine as _;

        Self {
            image_data: BASE64
                .decode(PLACEHOLDER_PNG_BASE64)
                .expect("placeholder png is valid base64"),
            latency_ms: 200,
        }
    }
}

/// Fake Image Client
///
/// 用于测试，始终返回配置的固定图像
pub struct FakeImageClient {
    config: FakeImageClientConfig,
}

impl FakeImageClient {
    pub fn new(config: FakeImageClientConfig) -> Self {
        tracing::info!(
            image_size = config.image_data.len(),
            latency_ms = config.latency_ms,
            "FakeImageClient initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeImageClientConfig::default())
    }
}

#[async_trait]
impl ImageGeneratorPort for FakeImageClient {
    async fn generate(&self, prompt: &str, _context: Option<&[u8]>) -> GenerationResult {
        tracing::debug!(
            prompt_len = prompt.len(),
            "FakeImageClient: returning fixed image"
        );

        // 模拟生成延迟
        tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;

        GenerationResult::Image(self.config.image_data.clone())
    }
}
