//! Image Adapters - 图像生成适配器

mod fake_image_client;
mod gemini_client;

pub use fake_image_client::{FakeImageClient, FakeImageClientConfig};
pub use gemini_client::{GeminiImageClient, GeminiImageClientConfig};
