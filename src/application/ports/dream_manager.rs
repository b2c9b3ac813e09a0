//! Dream Manager Port - 梦境请求管理
//!
//! 定义请求生命周期管理的抽象接口，具体实现在 infrastructure/memory 层。
//! 所有状态只存活在单次请求的生命周期内，过期后整体清除。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::dream::{AudioClip, DreamId, RenderMode};

/// Dream Manager 错误
#[derive(Debug, Error)]
pub enum DreamStoreError {
    #[error("Dream request not found: {0}")]
    NotFound(String),

    #[error("Dream request already exists: {0}")]
    AlreadyExists(String),

    #[error("Scene index out of range: {0}")]
    SceneOutOfRange(u32),
}

/// 请求生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DreamState {
    /// 已入队，等待处理
    Queued,
    /// 正在转写音频
    Transcribing,
    /// 正在拆分场景
    Splitting,
    /// 正在逐场景生成图像
    Rendering,
    /// 处理结束（允许部分场景失败）
    Completed,
    /// 请求级失败（转写失败、拆分失败、空场景集）
    Failed,
}

impl DreamState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DreamState::Queued => "queued",
            DreamState::Transcribing => "transcribing",
            DreamState::Splitting => "splitting",
            DreamState::Rendering => "rendering",
            DreamState::Completed => "completed",
            DreamState::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(DreamState::Queued),
            "transcribing" => Some(DreamState::Transcribing),
            "splitting" => Some(DreamState::Splitting),
            "rendering" => Some(DreamState::Rendering),
            "completed" => Some(DreamState::Completed),
            "failed" => Some(DreamState::Failed),
            _ => None,
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, DreamState::Completed | DreamState::Failed)
    }
}

/// 场景槽位状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneState {
    Pending,
    Generating,
    Ready,
    Failed,
}

impl SceneState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneState::Pending => "pending",
            SceneState::Generating => "generating",
            SceneState::Ready => "ready",
            SceneState::Failed => "failed",
        }
    }
}

/// 单个场景的跟踪记录
///
/// 图像字节不放在槽位里，由实现按 (dream_id, scene_index) 单独存取
#[derive(Debug, Clone)]
pub struct SceneSlot {
    pub index: u32,
    pub prompt: String,
    pub state: SceneState,
    /// 已消耗的生成尝试次数
    pub attempts: u32,
    pub error: Option<String>,
}

impl SceneSlot {
    pub fn new(index: u32, prompt: String) -> Self {
        Self {
            index,
            prompt,
            state: SceneState::Pending,
            attempts: 0,
            error: None,
        }
    }
}

/// 梦境转换请求
#[derive(Debug, Clone)]
pub struct DreamRequest {
    pub dream_id: String,
    pub mode: RenderMode,
    pub filename: String,
    pub state: DreamState,
    pub narration: Option<String>,
    pub scenes: Vec<SceneSlot>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DreamRequest {
    pub fn new(mode: RenderMode, filename: impl Into<String>) -> Self {
        Self {
            dream_id: DreamId::new().to_string(),
            mode,
            filename: filename.into(),
            state: DreamState::Queued,
            narration: None,
            scenes: Vec::new(),
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// 已渲染成功的场景数
    pub fn ready_count(&self) -> usize {
        self.scenes
            .iter()
            .filter(|s| s.state == SceneState::Ready)
            .count()
    }

    /// 重试耗尽的场景数
    pub fn failed_count(&self) -> usize {
        self.scenes
            .iter()
            .filter(|s| s.state == SceneState::Failed)
            .count()
    }
}

/// Dream Manager Port
///
/// 管理梦境请求的生命周期，所有状态存储在内存中
pub trait DreamManagerPort: Send + Sync {
    /// 提交请求并入队处理，音频随请求一起暂存
    fn submit(&self, request: DreamRequest, audio: AudioClip) -> Result<String, DreamStoreError>;

    /// 取出待转写音频（消费语义，取出后即从存储移除）
    fn take_audio(&self, dream_id: &str) -> Option<AudioClip>;

    /// 获取请求快照
    fn get(&self, dream_id: &str) -> Option<DreamRequest>;

    /// 设置请求状态
    fn set_state(&self, dream_id: &str, state: DreamState) -> Result<(), DreamStoreError>;

    /// 标记请求级失败并记录错误
    fn set_failed(&self, dream_id: &str, error: String) -> Result<(), DreamStoreError>;

    /// 记录转写结果
    fn set_narration(&self, dream_id: &str, narration: String) -> Result<(), DreamStoreError>;

    /// 按拆分结果初始化场景槽位（顺序即场景顺序）
    fn init_scenes(&self, dream_id: &str, prompts: Vec<String>) -> Result<(), DreamStoreError>;

    /// 标记场景进入生成中，并累计一次尝试
    fn set_scene_generating(&self, dream_id: &str, scene_index: u32) -> Result<(), DreamStoreError>;

    /// 标记场景成功并存储图像
    fn set_scene_ready(
        &self,
        dream_id: &str,
        scene_index: u32,
        image: Vec<u8>,
    ) -> Result<(), DreamStoreError>;

    /// 标记场景重试耗尽
    fn set_scene_failed(
        &self,
        dream_id: &str,
        scene_index: u32,
        error: String,
    ) -> Result<(), DreamStoreError>;

    /// 获取场景图像字节
    fn get_image(&self, dream_id: &str, scene_index: u32) -> Option<Vec<u8>>;

    /// 移除请求及其所有图像
    fn remove(&self, dream_id: &str);

    /// 清理超过 max_age 的请求，返回清理数量
    fn cleanup_expired(&self, max_age: chrono::Duration) -> usize;
}
