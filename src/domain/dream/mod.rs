//! Dream Context - 梦境请求限界上下文
//!
//! 职责:
//! - 梦境请求标识与渲染模式
//! - 上传音频的格式约束
//! - 请求级错误定义

mod errors;
mod value_objects;

pub use errors::DreamError;
pub use value_objects::{AudioClip, DreamId, RenderMode, SUPPORTED_AUDIO_EXTENSIONS};
