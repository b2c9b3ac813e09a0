//! Application State
//!
//! 包含 HTTP 层用到的端口与 Command/Query Handlers

use std::sync::Arc;

use crate::application::{
    // Ports
    DreamManagerPort,
    // Query handlers
    GetDreamHandler,
    GetSceneImageHandler,
    // Command handlers
    TransformDreamHandler,
};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
///
/// DreamManager 为内存实现，HTTP 层读取快照，Worker 负责写入
pub struct AppState {
    // ========== Ports ==========
    pub dream_manager: Arc<dyn DreamManagerPort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub transform_dream_handler: TransformDreamHandler,

    // ========== Query Handlers ==========
    pub get_dream_handler: GetDreamHandler,
    pub get_scene_image_handler: GetSceneImageHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        dream_manager: Arc<dyn DreamManagerPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            // Ports
            dream_manager: dream_manager.clone(),
            event_publisher: event_publisher.clone(),

            // Command handlers
            transform_dream_handler: TransformDreamHandler::new(dream_manager.clone()),

            // Query handlers
            get_dream_handler: GetDreamHandler::new(dream_manager.clone()),
            get_scene_image_handler: GetSceneImageHandler::new(dream_manager.clone()),
        }
    }
}
