//! Reverie - 梦境可视化服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Dream Context: 梦境请求上下文
//! - 场景脚本解析器
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Transcriber, SceneSplitter, ImageGenerator, DreamManager）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: DreamManager 内存实现
//! - Worker: RenderWorker 后台渲染流水线（转写 -> 拆分 -> 逐场景生成）
//! - Adapters: Whisper / Chat Splitter / Gemini Image 客户端
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
