//! WebSocket Handler
//!
//! 每个梦境请求一条事件通道，进度事件（转写完成、场景列表、
//! 逐场景状态、重试告警、最终结果）在产生时立即推送

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::infrastructure::http::state::AppState;

/// Dream WebSocket 连接处理（用于进度事件通知）
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(dream_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_dream_socket(socket, dream_id, state))
}

async fn handle_dream_socket(socket: WebSocket, dream_id: String, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // 验证请求存在
    if state.dream_manager.get(&dream_id).is_none() {
        tracing::warn!(dream_id = %dream_id, "WebSocket connection rejected: unknown dream request");
        let _ = sender.close().await;
        return;
    }

    // 注册事件接收器
    let mut event_rx = state.event_publisher.register_dream(&dream_id);

    tracing::info!(dream_id = %dream_id, "WebSocket connected");

    let dream_id_for_forward = dream_id.clone();
    let dream_id_for_receive = dream_id.clone();
    let dream_id_for_cleanup = dream_id.clone();

    // 事件转发任务
    let forward_task = tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(
                    dream_id = %dream_id_for_forward,
                    error = %e,
                    "Failed to send WebSocket message"
                );
                break;
            }
        }
    });

    // 接收客户端消息（心跳与关闭）
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Ping(_)) => {
                    // 自动响应 pong（由 axum 处理）
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(dream_id = %dream_id_for_receive, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(dream_id = %dream_id_for_receive, error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    // 等待任一任务完成
    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    // 清理
    state.event_publisher.unregister_dream(&dream_id_for_cleanup);
    tracing::info!(dream_id = %dream_id_for_cleanup, "WebSocket disconnected");
}
