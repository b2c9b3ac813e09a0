//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现：逐场景的结果在产生时立即推给前端，
//! 用户不需要等整个序列结束

use crate::application::ports::DreamState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// WebSocket 事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 请求生命周期状态变更
    DreamStateChanged {
        dream_id: String,
        state: String,
    },
    /// 转写完成，携带叙述文本
    TranscriptReady {
        dream_id: String,
        narration: String,
    },
    /// 场景拆分完成，携带有序场景列表
    ScenesReady {
        dream_id: String,
        scenes: Vec<String>,
    },
    /// 场景状态变更
    SceneStateChanged {
        dream_id: String,
        scene_index: u32,
        state: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// 场景单次尝试失败，进入退避重试
    SceneRetrying {
        dream_id: String,
        scene_index: u32,
        attempt: u32,
        error: String,
    },
    /// 请求处理结束（允许部分场景失败）
    DreamCompleted {
        dream_id: String,
        ready_count: usize,
        failed_count: usize,
    },
    /// 请求级失败（转写失败、拆分失败、空场景集）
    DreamFailed {
        dream_id: String,
        error: String,
    },
}

/// 事件发布器
pub struct EventPublisher {
    /// dream_id -> broadcast sender
    dream_channels: DashMap<String, broadcast::Sender<WsEvent>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            dream_channels: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 注册请求的事件通道
    pub fn register_dream(&self, dream_id: &str) -> broadcast::Receiver<WsEvent> {
        if let Some(sender) = self.dream_channels.get(dream_id) {
            return sender.subscribe();
        }

        let (tx, rx) = broadcast::channel(100);
        self.dream_channels.insert(dream_id.to_string(), tx);
        rx
    }

    /// 取消注册请求
    pub fn unregister_dream(&self, dream_id: &str) {
        self.dream_channels.remove(dream_id);
    }

    /// 获取请求的事件接收器
    pub fn subscribe(&self, dream_id: &str) -> Option<broadcast::Receiver<WsEvent>> {
        self.dream_channels.get(dream_id).map(|s| s.subscribe())
    }

    /// 发布请求状态变更事件
    pub fn publish_dream_state(&self, dream_id: &str, state: DreamState) {
        self.publish_to_dream(
            dream_id,
            WsEvent::DreamStateChanged {
                dream_id: dream_id.to_string(),
                state: state.as_str().to_string(),
            },
        );
    }

    /// 发布转写完成事件
    pub fn publish_transcript_ready(&self, dream_id: &str, narration: &str) {
        self.publish_to_dream(
            dream_id,
            WsEvent::TranscriptReady {
                dream_id: dream_id.to_string(),
                narration: narration.to_string(),
            },
        );
    }

    /// 发布场景拆分完成事件
    pub fn publish_scenes_ready(&self, dream_id: &str, scenes: &[String]) {
        self.publish_to_dream(
            dream_id,
            WsEvent::ScenesReady {
                dream_id: dream_id.to_string(),
                scenes: scenes.to_vec(),
            },
        );
    }

    /// 发布场景进入生成中事件
    pub fn publish_scene_generating(&self, dream_id: &str, scene_index: u32) {
        self.publish_to_dream(
            dream_id,
            WsEvent::SceneStateChanged {
                dream_id: dream_id.to_string(),
                scene_index,
                state: "generating".to_string(),
                error: None,
            },
        );
    }

    /// 发布场景完成事件
    pub fn publish_scene_ready(&self, dream_id: &str, scene_index: u32) {
        self.publish_to_dream(
            dream_id,
            WsEvent::SceneStateChanged {
                dream_id: dream_id.to_string(),
                scene_index,
                state: "ready".to_string(),
                error: None,
            },
        );
    }

    /// 发布场景重试耗尽事件
    pub fn publish_scene_failed(&self, dream_id: &str, scene_index: u32, error: &str) {
        self.publish_to_dream(
            dream_id,
            WsEvent::SceneStateChanged {
                dream_id: dream_id.to_string(),
                scene_index,
                state: "failed".to_string(),
                error: Some(error.to_string()),
            },
        );
    }

    /// 发布场景单次尝试失败事件
    pub fn publish_scene_retrying(
        &self,
        dream_id: &str,
        scene_index: u32,
        attempt: u32,
        error: &str,
    ) {
        self.publish_to_dream(
            dream_id,
            WsEvent::SceneRetrying {
                dream_id: dream_id.to_string(),
                scene_index,
                attempt,
                error: error.to_string(),
            },
        );
    }

    /// 发布请求完成事件
    pub fn publish_dream_completed(&self, dream_id: &str, ready_count: usize, failed_count: usize) {
        self.publish_to_dream(
            dream_id,
            WsEvent::DreamCompleted {
                dream_id: dream_id.to_string(),
                ready_count,
                failed_count,
            },
        );
    }

    /// 发布请求失败事件
    pub fn publish_dream_failed(&self, dream_id: &str, error: &str) {
        self.publish_to_dream(
            dream_id,
            WsEvent::DreamFailed {
                dream_id: dream_id.to_string(),
                error: error.to_string(),
            },
        );
    }

    /// 发布事件到指定请求
    fn publish_to_dream(&self, dream_id: &str, event: WsEvent) {
        if let Some(sender) = self.dream_channels.get(dream_id) {
            if let Err(e) = sender.send(event) {
                tracing::debug!(
                    dream_id = %dream_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_delivered_in_order() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.register_dream("dream-1");

        publisher.publish_transcript_ready("dream-1", "a narration");
        publisher.publish_scene_retrying("dream-1", 0, 1, "no candidates in response");
        publisher.publish_dream_completed("dream-1", 2, 1);

        assert!(matches!(
            rx.recv().await.unwrap(),
            WsEvent::TranscriptReady { narration, .. } if narration == "a narration"
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            WsEvent::SceneRetrying { attempt: 1, .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            WsEvent::DreamCompleted { ready_count: 2, failed_count: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_publish_without_channel_is_noop() {
        let publisher = EventPublisher::new();
        // 没有注册的请求不报错，只丢弃
        publisher.publish_dream_failed("unknown", "boom");
    }

    #[test]
    fn test_event_wire_shape() {
        let event = WsEvent::SceneStateChanged {
            dream_id: "d".to_string(),
            scene_index: 2,
            state: "failed".to_string(),
            error: Some("quota exceeded".to_string()),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "SceneStateChanged");
        assert_eq!(json["data"]["scene_index"], 2);
        assert_eq!(json["data"]["error"], "quota exceeded");
    }
}
