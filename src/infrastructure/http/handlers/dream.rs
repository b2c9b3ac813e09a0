//! Dream HTTP Handlers

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::{
    GetDreamQuery, GetSceneImageQuery, TransformDreamCommand,
};
use crate::domain::dream::AudioClip;
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

/// 异步受理响应 - 立即返回 dream_id，处理进度通过 WS 推送
#[derive(Debug, Serialize)]
pub struct TransformDreamResponseDto {
    pub dream_id: String,
    pub state: String, // "queued"
}

#[derive(Debug, Deserialize)]
pub struct GetDreamRequest {
    pub dream_id: String,
}

#[derive(Debug, Serialize)]
pub struct SceneDto {
    pub index: u32,
    pub prompt: String,
    pub state: String,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DreamResponseDto {
    pub dream_id: String,
    pub mode: String,
    pub state: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub scenes: Vec<SceneDto>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct GetSceneImageRequest {
    pub dream_id: String,
    pub scene_index: u32,
}

// ============================================================================
// Handlers
// ============================================================================

/// 上传梦境叙述音频（异步处理，立即返回，进度通过 WS 通知）
pub async fn transform_dream(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<TransformDreamResponseDto>>, ApiError> {
    let mut mode: Option<String> = None;
    let mut audio_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "mode" => {
                mode = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read mode: {}", e)))?,
                );
            }
            "file" => {
                filename = field.file_name().map(|s| s.to_string());

                // 在读取字节前先校验扩展名，尽早拒绝不支持的格式
                let supported = filename
                    .as_deref()
                    .map(AudioClip::is_supported_filename)
                    .unwrap_or(false);
                if !supported {
                    return Err(ApiError::BadRequest(
                        "Unsupported audio format, expected wav/mp3/m4a".to_string(),
                    ));
                }

                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read audio data: {}", e))
                })?;
                audio_data = Some(bytes.to_vec());
            }
            _ => {
                tracing::debug!(field = %field_name, "Ignoring unknown multipart field");
            }
        }
    }

    let mode = mode.ok_or_else(|| ApiError::BadRequest("Missing field: mode".to_string()))?;
    let audio_data =
        audio_data.ok_or_else(|| ApiError::BadRequest("Missing field: file".to_string()))?;
    let filename =
        filename.ok_or_else(|| ApiError::BadRequest("Missing audio filename".to_string()))?;

    let cmd = TransformDreamCommand {
        audio_data,
        filename,
        mode,
    };

    let result = state.transform_dream_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(TransformDreamResponseDto {
        dream_id: result.dream_id,
        state: result.state,
    })))
}

/// 获取请求快照（状态、叙述、场景列表）
pub async fn get_dream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetDreamRequest>,
) -> Result<Json<ApiResponse<DreamResponseDto>>, ApiError> {
    let query = GetDreamQuery {
        dream_id: req.dream_id,
    };

    let request = state.get_dream_handler.handle(query)?;

    Ok(Json(ApiResponse::success(DreamResponseDto {
        dream_id: request.dream_id,
        mode: request.mode.as_str().to_string(),
        state: request.state.as_str().to_string(),
        filename: request.filename,
        narration: request.narration,
        error: request.error_message,
        scenes: request
            .scenes
            .into_iter()
            .map(|s| SceneDto {
                index: s.index,
                prompt: s.prompt,
                state: s.state.as_str().to_string(),
                attempts: s.attempts,
                error: s.error,
            })
            .collect(),
        created_at: request.created_at.to_rfc3339(),
    })))
}

/// 获取单个场景的图像数据
pub async fn get_scene_image(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetSceneImageRequest>,
) -> Result<Response, ApiError> {
    let query = GetSceneImageQuery {
        dream_id: req.dream_id,
        scene_index: req.scene_index,
    };

    let result = state.get_scene_image_handler.handle(query)?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, result.content_type)
        .header(header::CONTENT_LENGTH, result.image_data.len())
        .body(Body::from(result.image_data))
        .unwrap())
}
