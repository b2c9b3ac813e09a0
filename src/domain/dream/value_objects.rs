//! Dream Context - Value Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 梦境请求唯一标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DreamId(Uuid);

impl DreamId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DreamId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 渲染模式
///
/// SingleImage: 整段叙述直接生成一张图
/// DreamSequence: 先拆分场景，逐场景生成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    SingleImage,
    DreamSequence,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::SingleImage => "single_image",
            RenderMode::DreamSequence => "dream_sequence",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "single_image" => Some(RenderMode::SingleImage),
            "dream_sequence" => Some(RenderMode::DreamSequence),
            _ => None,
        }
    }
}

/// 支持的音频上传格式（扩展名，小写）
pub const SUPPORTED_AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a"];

/// 上传的音频片段
///
/// 只在转写前短暂持有，转写完成后即丢弃
#[derive(Debug, Clone)]
pub struct AudioClip {
    data: Vec<u8>,
    filename: String,
}

impl AudioClip {
    /// 创建音频片段
    ///
    /// 校验数据非空且扩展名受支持；filename 仅用于向转写服务传递容器格式
    pub fn new(data: Vec<u8>, filename: impl Into<String>) -> Result<Self, &'static str> {
        let filename = filename.into();
        if data.is_empty() {
            return Err("音频数据不能为空");
        }
        if !Self::is_supported_filename(&filename) {
            return Err("不支持的音频格式（仅支持 wav/mp3/m4a）");
        }
        Ok(Self { data, filename })
    }

    /// 检查文件名扩展名是否受支持
    pub fn is_supported_filename(filename: &str) -> bool {
        let lower = filename.to_lowercase();
        SUPPORTED_AUDIO_EXTENSIONS
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext)))
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 取出音频数据（消费语义，转写时调用一次）
    pub fn into_parts(self) -> (Vec<u8>, String) {
        (self.data, self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_mode_roundtrip() {
        assert_eq!(RenderMode::from_str("single_image"), Some(RenderMode::SingleImage));
        assert_eq!(RenderMode::from_str("dream_sequence"), Some(RenderMode::DreamSequence));
        assert_eq!(RenderMode::from_str("batch"), None);
        assert_eq!(RenderMode::DreamSequence.as_str(), "dream_sequence");
    }

    #[test]
    fn test_audio_clip_rejects_empty_data() {
        let result = AudioClip::new(vec![], "dream.wav");
        assert!(result.is_err());
    }

    #[test]
    fn test_audio_clip_rejects_unsupported_extension() {
        let result = AudioClip::new(vec![1, 2, 3], "dream.flac");
        assert!(result.is_err());
    }

    #[test]
    fn test_audio_clip_accepts_supported_formats() {
        for name in ["a.wav", "b.mp3", "c.m4a", "D.WAV"] {
            assert!(AudioClip::new(vec![0u8; 16], name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_dream_id_display() {
        let id = DreamId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }
}
