//! In-Memory Dream Manager Implementation

use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::ports::{
    DreamManagerPort, DreamRequest, DreamState, DreamStoreError, SceneSlot, SceneState,
};
use crate::domain::dream::AudioClip;

/// 内存梦境请求管理器
///
/// 请求、待转写音频、场景图像分开存放：
/// 快照查询只克隆轻量的请求记录，不触碰图像字节
pub struct InMemoryDreamManager {
    /// dream_id -> DreamRequest
    requests: DashMap<String, DreamRequest>,
    /// dream_id -> 待转写音频（转写时取出即删除）
    pending_audio: DashMap<String, AudioClip>,
    /// (dream_id, scene_index) -> 图像字节
    images: DashMap<(String, u32), Vec<u8>>,
    /// 渲染队列发送端
    queue_sender: mpsc::Sender<String>,
}

impl InMemoryDreamManager {
    pub fn new(queue_sender: mpsc::Sender<String>) -> Self {
        Self {
            requests: DashMap::new(),
            pending_audio: DashMap::new(),
            images: DashMap::new(),
            queue_sender,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn with_scene<F>(
        &self,
        dream_id: &str,
        scene_index: u32,
        mutate: F,
    ) -> Result<(), DreamStoreError>
    where
        F: FnOnce(&mut SceneSlot),
    {
        let mut request = self
            .requests
            .get_mut(dream_id)
            .ok_or_else(|| DreamStoreError::NotFound(dream_id.to_string()))?;

        let slot = request
            .scenes
            .iter_mut()
            .find(|s| s.index == scene_index)
            .ok_or(DreamStoreError::SceneOutOfRange(scene_index))?;

        mutate(slot);
        Ok(())
    }
}

impl DreamManagerPort for InMemoryDreamManager {
    fn submit(&self, request: DreamRequest, audio: AudioClip) -> Result<String, DreamStoreError> {
        let dream_id = request.dream_id.clone();

        if self.requests.contains_key(&dream_id) {
            return Err(DreamStoreError::AlreadyExists(dream_id));
        }

        self.requests.insert(dream_id.clone(), request);
        self.pending_audio.insert(dream_id.clone(), audio);

        // 发送到渲染队列
        if let Err(e) = self.queue_sender.try_send(dream_id.clone()) {
            tracing::warn!(dream_id = %dream_id, error = %e, "Failed to enqueue dream request");
        }

        tracing::debug!(dream_id = %dream_id, "Dream request submitted");
        Ok(dream_id)
    }

    fn take_audio(&self, dream_id: &str) -> Option<AudioClip> {
        self.pending_audio.remove(dream_id).map(|(_, clip)| clip)
    }

    fn get(&self, dream_id: &str) -> Option<DreamRequest> {
        self.requests.get(dream_id).map(|r| r.clone())
    }

    fn set_state(&self, dream_id: &str, state: DreamState) -> Result<(), DreamStoreError> {
        let mut request = self
            .requests
            .get_mut(dream_id)
            .ok_or_else(|| DreamStoreError::NotFound(dream_id.to_string()))?;

        let old_state = request.state;
        request.state = state;

        if state.is_terminal() {
            request.completed_at = Some(Utc::now());
        }

        tracing::debug!(
            dream_id = %dream_id,
            old_state = ?old_state,
            new_state = ?state,
            "Dream state changed"
        );
        Ok(())
    }

    fn set_failed(&self, dream_id: &str, error: String) -> Result<(), DreamStoreError> {
        let mut request = self
            .requests
            .get_mut(dream_id)
            .ok_or_else(|| DreamStoreError::NotFound(dream_id.to_string()))?;

        request.state = DreamState::Failed;
        request.error_message = Some(error);
        request.completed_at = Some(Utc::now());
        Ok(())
    }

    fn set_narration(&self, dream_id: &str, narration: String) -> Result<(), DreamStoreError> {
        let mut request = self
            .requests
            .get_mut(dream_id)
            .ok_or_else(|| DreamStoreError::NotFound(dream_id.to_string()))?;

        request.narration = Some(narration);
        Ok(())
    }

    fn init_scenes(&self, dream_id: &str, prompts: Vec<String>) -> Result<(), DreamStoreError> {
        let mut request = self
            .requests
            .get_mut(dream_id)
            .ok_or_else(|| DreamStoreError::NotFound(dream_id.to_string()))?;

        request.scenes = prompts
            .into_iter()
            .enumerate()
            .map(|(index, prompt)| SceneSlot::new(index as u32, prompt))
            .collect();
        Ok(())
    }

    fn set_scene_generating(&self, dream_id: &str, scene_index: u32) -> Result<(), DreamStoreError> {
        self.with_scene(dream_id, scene_index, |slot| {
            slot.state = SceneState::Generating;
            slot.attempts += 1;
        })
    }

    fn set_scene_ready(
        &self,
        dream_id: &str,
        scene_index: u32,
        image: Vec<u8>,
    ) -> Result<(), DreamStoreError> {
        self.with_scene(dream_id, scene_index, |slot| {
            slot.state = SceneState::Ready;
            slot.error = None;
        })?;

        self.images
            .insert((dream_id.to_string(), scene_index), image);
        Ok(())
    }

    fn set_scene_failed(
        &self,
        dream_id: &str,
        scene_index: u32,
        error: String,
    ) -> Result<(), DreamStoreError> {
        self.with_scene(dream_id, scene_index, |slot| {
            slot.state = SceneState::Failed;
            slot.error = Some(error);
        })
    }

    fn get_image(&self, dream_id: &str, scene_index: u32) -> Option<Vec<u8>> {
        self.images
            .get(&(dream_id.to_string(), scene_index))
            .map(|bytes| bytes.clone())
    }

    fn remove(&self, dream_id: &str) {
        self.requests.remove(dream_id);
        self.pending_audio.remove(dream_id);
        self.images.retain(|(id, _), _| id != dream_id);
        tracing::debug!(dream_id = %dream_id, "Dream request removed");
    }

    fn cleanup_expired(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let expired: Vec<String> = self
            .requests
            .iter()
            .filter(|entry| now - entry.created_at > max_age)
            .map(|entry| entry.dream_id.clone())
            .collect();

        for dream_id in &expired {
            self.remove(dream_id);
        }

        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "Expired dream requests cleaned up");
        }
        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dream::RenderMode;

    fn new_manager() -> (InMemoryDreamManager, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(100);
        (InMemoryDreamManager::new(tx), rx)
    }

    fn submit_request(manager: &InMemoryDreamManager) -> String {
        let request = DreamRequest::new(RenderMode::DreamSequence, "dream.wav");
        let clip = AudioClip::new(vec![1, 2, 3], "dream.wav").unwrap();
        manager.submit(request, clip).unwrap()
    }

    #[tokio::test]
    async fn test_submit_enqueues_and_stores() {
        let (manager, mut rx) = new_manager();
        let dream_id = submit_request(&manager);

        assert_eq!(rx.try_recv().unwrap(), dream_id);
        let stored = manager.get(&dream_id).unwrap();
        assert_eq!(stored.state, DreamState::Queued);
        assert!(stored.scenes.is_empty());
    }

    #[tokio::test]
    async fn test_audio_consumed_once() {
        let (manager, _rx) = new_manager();
        let dream_id = submit_request(&manager);

        let clip = manager.take_audio(&dream_id);
        assert!(clip.is_some());
        assert_eq!(clip.unwrap().data(), &[1, 2, 3]);

        // 第二次取出为空，音频不跨越转写存活
        assert!(manager.take_audio(&dream_id).is_none());
    }

    #[tokio::test]
    async fn test_scene_lifecycle() {
        let (manager, _rx) = new_manager();
        let dream_id = submit_request(&manager);

        manager
            .init_scenes(&dream_id, vec!["a city".to_string(), "a forest".to_string()])
            .unwrap();

        manager.set_scene_generating(&dream_id, 0).unwrap();
        manager.set_scene_generating(&dream_id, 0).unwrap();
        manager
            .set_scene_ready(&dream_id, 0, vec![0xAA, 0xBB])
            .unwrap();
        manager
            .set_scene_failed(&dream_id, 1, "no candidates in response".to_string())
            .unwrap();

        let request = manager.get(&dream_id).unwrap();
        assert_eq!(request.scenes[0].state, SceneState::Ready);
        assert_eq!(request.scenes[0].attempts, 2);
        assert_eq!(request.scenes[1].state, SceneState::Failed);
        assert_eq!(
            request.scenes[1].error.as_deref(),
            Some("no candidates in response")
        );
        assert_eq!(request.ready_count(), 1);
        assert_eq!(request.failed_count(), 1);

        assert_eq!(manager.get_image(&dream_id, 0), Some(vec![0xAA, 0xBB]));
        assert_eq!(manager.get_image(&dream_id, 1), None);
    }

    #[tokio::test]
    async fn test_scene_index_out_of_range() {
        let (manager, _rx) = new_manager();
        let dream_id = submit_request(&manager);
        manager.init_scenes(&dream_id, vec!["one".to_string()]).unwrap();

        let result = manager.set_scene_generating(&dream_id, 5);
        assert!(matches!(result, Err(DreamStoreError::SceneOutOfRange(5))));
    }

    #[tokio::test]
    async fn test_terminal_state_records_completion_time() {
        let (manager, _rx) = new_manager();
        let dream_id = submit_request(&manager);

        manager.set_state(&dream_id, DreamState::Rendering).unwrap();
        assert!(manager.get(&dream_id).unwrap().completed_at.is_none());

        manager.set_state(&dream_id, DreamState::Completed).unwrap();
        assert!(manager.get(&dream_id).unwrap().completed_at.is_some());
    }

    #[tokio::test]
    async fn test_remove_clears_images() {
        let (manager, _rx) = new_manager();
        let dream_id = submit_request(&manager);
        manager.init_scenes(&dream_id, vec!["one".to_string()]).unwrap();
        manager.set_scene_ready(&dream_id, 0, vec![1]).unwrap();

        manager.remove(&dream_id);

        assert!(manager.get(&dream_id).is_none());
        assert!(manager.get_image(&dream_id, 0).is_none());
        assert!(manager.take_audio(&dream_id).is_none());
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let (manager, _rx) = new_manager();
        let dream_id = submit_request(&manager);

        // 足够大的期限不清理
        assert_eq!(manager.cleanup_expired(Duration::hours(1)), 0);
        assert!(manager.get(&dream_id).is_some());

        // 负期限视为全部过期
        assert_eq!(manager.cleanup_expired(Duration::seconds(-1)), 1);
        assert!(manager.get(&dream_id).is_none());
    }
}
