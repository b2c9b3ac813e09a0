//! Dream Commands - 梦境请求命令定义

/// 提交梦境转换请求
///
/// 音频字节与文件名来自上传；mode 为渲染模式字符串
/// （"single_image" | "dream_sequence"），在处理器里解析校验
#[derive(Debug)]
pub struct TransformDreamCommand {
    pub audio_data: Vec<u8>,
    pub filename: String,
    pub mode: String,
}

/// 提交结果 - 立即返回 dream_id，处理完成后通过 WS 通知
#[derive(Debug)]
pub struct TransformDreamResponse {
    pub dream_id: String,
    pub state: String,
}
