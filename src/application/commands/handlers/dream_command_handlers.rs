//! Dream Command Handlers

use std::sync::Arc;

use crate::application::commands::dream_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{DreamManagerPort, DreamRequest};
use crate::domain::dream::{AudioClip, RenderMode};

/// TransformDream Handler - 受理上传并入队异步处理
pub struct TransformDreamHandler {
    dream_manager: Arc<dyn DreamManagerPort>,
}

impl TransformDreamHandler {
    pub fn new(dream_manager: Arc<dyn DreamManagerPort>) -> Self {
        Self { dream_manager }
    }

    pub async fn handle(
        &self,
        cmd: TransformDreamCommand,
    ) -> Result<TransformDreamResponse, ApplicationError> {
        // 解析渲染模式
        let mode = RenderMode::from_str(&cmd.mode)
            .ok_or_else(|| ApplicationError::validation(format!("Invalid mode: {}", cmd.mode)))?;

        // 校验音频（非空、受支持的容器格式）
        let clip = AudioClip::new(cmd.audio_data, cmd.filename)
            .map_err(ApplicationError::validation)?;

        let request = DreamRequest::new(mode, clip.filename());
        let audio_size = clip.len();

        let dream_id = self
            .dream_manager
            .submit(request, clip)
            .map_err(|e| ApplicationError::internal(e.to_string()))?;

        tracing::info!(
            dream_id = %dream_id,
            mode = mode.as_str(),
            audio_size = audio_size,
            "Dream transform request queued"
        );

        Ok(TransformDreamResponse {
            dream_id,
            state: "queued".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{DreamState, DreamStoreError};
    use crate::domain::dream::AudioClip;
    use dashmap::DashMap;

    /// 只记录提交的最小实现
    struct RecordingManager {
        requests: DashMap<String, DreamRequest>,
    }

    impl RecordingManager {
        fn new() -> Self {
            Self {
                requests: DashMap::new(),
            }
        }
    }

    impl DreamManagerPort for RecordingManager {
        fn submit(
            &self,
            request: DreamRequest,
            _audio: AudioClip,
        ) -> Result<String, DreamStoreError> {
            let id = request.dream_id.clone();
            self.requests.insert(id.clone(), request);
            Ok(id)
        }

        fn take_audio(&self, _dream_id: &str) -> Option<AudioClip> {
            None
        }

        fn get(&self, dream_id: &str) -> Option<DreamRequest> {
            self.requests.get(dream_id).map(|r| r.clone())
        }

        fn set_state(&self, _: &str, _: DreamState) -> Result<(), DreamStoreError> {
            Ok(())
        }

        fn set_failed(&self, _: &str, _: String) -> Result<(), DreamStoreError> {
            Ok(())
        }

        fn set_narration(&self, _: &str, _: String) -> Result<(), DreamStoreError> {
            Ok(())
        }

        fn init_scenes(&self, _: &str, _: Vec<String>) -> Result<(), DreamStoreError> {
            Ok(())
        }

        fn set_scene_generating(&self, _: &str, _: u32) -> Result<(), DreamStoreError> {
            Ok(())
        }

        fn set_scene_ready(&self, _: &str, _: u32, _: Vec<u8>) -> Result<(), DreamStoreError> {
            Ok(())
        }

        fn set_scene_failed(&self, _: &str, _: u32, _: String) -> Result<(), DreamStoreError> {
            Ok(())
        }

        fn get_image(&self, _: &str, _: u32) -> Option<Vec<u8>> {
            None
        }

        fn remove(&self, _: &str) {}

        fn cleanup_expired(&self, _: chrono::Duration) -> usize {
            0
        }
    }

    #[tokio::test]
    async fn test_transform_queues_request() {
        let manager = Arc::new(RecordingManager::new());
        let handler = TransformDreamHandler::new(manager.clone());

        let response = handler
            .handle(TransformDreamCommand {
                audio_data: vec![0u8; 64],
                filename: "dream.wav".to_string(),
                mode: "dream_sequence".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.state, "queued");
        let stored = manager.get(&response.dream_id).unwrap();
        assert_eq!(stored.state, DreamState::Queued);
        assert_eq!(stored.mode, RenderMode::DreamSequence);
    }

    #[tokio::test]
    async fn test_transform_rejects_unknown_mode() {
        let handler = TransformDreamHandler::new(Arc::new(RecordingManager::new()));

        let result = handler
            .handle(TransformDreamCommand {
                audio_data: vec![0u8; 64],
                filename: "dream.wav".to_string(),
                mode: "triptych".to_string(),
            })
            .await;

        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_transform_rejects_empty_audio() {
        let handler = TransformDreamHandler::new(Arc::new(RecordingManager::new()));

        let result = handler
            .handle(TransformDreamCommand {
                audio_data: vec![],
                filename: "dream.wav".to_string(),
                mode: "single_image".to_string(),
            })
            .await;

        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
    }
}
