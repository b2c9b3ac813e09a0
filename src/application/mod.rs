//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Transcriber、SceneSplitter、ImageGenerator、DreamManager）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    handlers::TransformDreamHandler, TransformDreamCommand, TransformDreamResponse,
};

pub use error::ApplicationError;

pub use ports::{
    // Dream manager
    DreamManagerPort,
    DreamRequest,
    DreamState,
    DreamStoreError,
    SceneSlot,
    SceneState,
    // Image generator
    GenerationOutcome,
    GenerationResult,
    ImageGeneratorPort,
    // Scene splitter
    SceneSplitterPort,
    SplitError,
    // Transcriber
    TranscriberPort,
    TranscriptionError,
};

pub use queries::{
    handlers::{GetDreamHandler, GetSceneImageHandler},
    GetDreamQuery,
    GetSceneImageQuery,
    GetSceneImageResponse,
};
