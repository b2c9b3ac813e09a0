//! HTTP Routes
//!
//! API 路由定义
//!
//! API Endpoints:
//! - /api/ping            GET   健康检查
//! - /api/dream/transform POST  上传叙述音频（异步处理，进度通过 WS 推送）
//! - /api/dream/get       POST  获取请求快照（状态、叙述、场景列表）
//! - /api/dream/image     POST  获取场景图像
//! - /ws/dream/{id}       WS    Dream WebSocket（进度事件）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/dream/:dream_id", get(handlers::websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/dream", dream_routes())
}

/// Dream 路由
fn dream_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/transform", post(handlers::transform_dream))
        .route("/get", post(handlers::get_dream))
        .route("/image", post(handlers::get_scene_image))
}
