//! Domain Layer - 领域层
//!
//! 包含一个限界上下文:
//! - Dream Context: 梦境请求管理
//!
//! 以及共享的场景脚本解析器

pub mod dream;

// 共享的场景脚本解析器
mod scene_script;

pub use scene_script::parse_scene_script;
