//! Dream Queries - 梦境请求查询定义

/// 查询请求快照（状态、叙述、场景列表）
#[derive(Debug)]
pub struct GetDreamQuery {
    pub dream_id: String,
}

/// 查询单个场景的图像字节
#[derive(Debug)]
pub struct GetSceneImageQuery {
    pub dream_id: String,
    pub scene_index: u32,
}

/// 场景图像查询结果
#[derive(Debug)]
pub struct GetSceneImageResponse {
    pub image_data: Vec<u8>,
    pub content_type: String,
}
