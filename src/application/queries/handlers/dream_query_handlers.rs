//! Dream Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{DreamManagerPort, DreamRequest, SceneState};
use crate::application::queries::dream_queries::{
    GetDreamQuery, GetSceneImageQuery, GetSceneImageResponse,
};

/// GetDream Handler - 获取请求快照
pub struct GetDreamHandler {
    dream_manager: Arc<dyn DreamManagerPort>,
}

impl GetDreamHandler {
    pub fn new(dream_manager: Arc<dyn DreamManagerPort>) -> Self {
        Self { dream_manager }
    }

    pub fn handle(&self, query: GetDreamQuery) -> Result<DreamRequest, ApplicationError> {
        self.dream_manager
            .get(&query.dream_id)
            .ok_or_else(|| ApplicationError::not_found("Dream request", &query.dream_id))
    }
}

/// GetSceneImage Handler - 获取场景图像数据
pub struct GetSceneImageHandler {
    dream_manager: Arc<dyn DreamManagerPort>,
}

impl GetSceneImageHandler {
    pub fn new(dream_manager: Arc<dyn DreamManagerPort>) -> Self {
        Self { dream_manager }
    }

    pub fn handle(
        &self,
        query: GetSceneImageQuery,
    ) -> Result<GetSceneImageResponse, ApplicationError> {
        let request = self
            .dream_manager
            .get(&query.dream_id)
            .ok_or_else(|| ApplicationError::not_found("Dream request", &query.dream_id))?;

        let slot = request
            .scenes
            .iter()
            .find(|s| s.index == query.scene_index)
            .ok_or_else(|| {
                ApplicationError::validation(format!(
                    "Scene not found: {}:{}",
                    query.dream_id, query.scene_index
                ))
            })?;

        if slot.state != SceneState::Ready {
            return Err(ApplicationError::invalid_state(format!(
                "Scene {} is {}, image not available",
                query.scene_index,
                slot.state.as_str()
            )));
        }

        let image_data = self
            .dream_manager
            .get_image(&query.dream_id, query.scene_index)
            .ok_or_else(|| {
                ApplicationError::internal(format!(
                    "Image missing for ready scene: {}:{}",
                    query.dream_id, query.scene_index
                ))
            })?;

        Ok(GetSceneImageResponse {
            image_data,
            content_type: "image/png".to_string(),
        })
    }
}
