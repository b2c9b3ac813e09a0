//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 语音转写配置
    #[serde(default)]
    pub stt: SttConfig,

    /// 场景拆分配置
    #[serde(default)]
    pub splitter: SplitterConfig,

    /// 图像生成配置
    #[serde(default)]
    pub image: ImageConfig,

    /// 渲染编排配置
    #[serde(default)]
    pub render: RenderConfig,

    /// GC 配置
    #[serde(default)]
    pub gc: GcConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            stt: SttConfig::default(),
            splitter: SplitterConfig::default(),
            image: ImageConfig::default(),
            render: RenderConfig::default(),
            gc: GcConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 上传文件最大大小（字节），默认 25MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,

    /// 静态文件服务配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

/// 静态文件服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default = "default_static_enabled")]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,
}

fn default_static_enabled() -> bool {
    false
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: default_static_enabled(),
            dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5080
}

fn default_max_upload_size() -> u64 {
    25 * 1024 * 1024 // 25 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_size: default_max_upload_size(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 语音转写配置
///
/// api_key 为空时回退到进程环境变量 OPENAI_API_KEY；
/// 凭据缺失在首次调用时暴露，不在启动时校验
#[derive(Debug, Clone, Deserialize)]
pub struct SttConfig {
    /// 转写服务凭据
    #[serde(default)]
    pub api_key: String,

    /// 转写服务基础 URL
    #[serde(default = "default_openai_url")]
    pub base_url: String,

    /// 转写模型
    #[serde(default = "default_stt_model")]
    pub model: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_stt_timeout")]
    pub timeout_secs: u64,
}

fn default_openai_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_stt_model() -> String {
    "whisper-1".to_string()
}

fn default_stt_timeout() -> u64 {
    120
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_url(),
            model: default_stt_model(),
            timeout_secs: default_stt_timeout(),
        }
    }
}

/// 场景拆分配置
///
/// 与转写服务同一提供方，api_key 为空时同样回退到 OPENAI_API_KEY
#[derive(Debug, Clone, Deserialize)]
pub struct SplitterConfig {
    /// 文本生成服务凭据
    #[serde(default)]
    pub api_key: String,

    /// 文本生成服务基础 URL
    #[serde(default = "default_openai_url")]
    pub base_url: String,

    /// 拆分模型
    #[serde(default = "default_splitter_model")]
    pub model: String,

    /// 采样温度
    #[serde(default = "default_splitter_temperature")]
    pub temperature: f32,

    /// 输出 token 上限
    #[serde(default = "default_splitter_max_tokens")]
    pub max_tokens: u32,

    /// 请求超时时间（秒）
    #[serde(default = "default_splitter_timeout")]
    pub timeout_secs: u64,
}

fn default_splitter_model() -> String {
    "gpt-4.1-nano-2025-04-14".to_string()
}

fn default_splitter_temperature() -> f32 {
    0.3
}

fn default_splitter_max_tokens() -> u32 {
    1000
}

fn default_splitter_timeout() -> u64 {
    60
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_url(),
            model: default_splitter_model(),
            temperature: default_splitter_temperature(),
            max_tokens: default_splitter_max_tokens(),
            timeout_secs: default_splitter_timeout(),
        }
    }
}

/// 图像生成配置
///
/// api_key 为空时回退到进程环境变量 GOOGLE_API_KEY
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    /// 图像服务凭据
    #[serde(default)]
    pub api_key: String,

    /// 图像服务基础 URL
    #[serde(default = "default_image_url")]
    pub base_url: String,

    /// 图像生成模型
    #[serde(default = "default_image_model")]
    pub model: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_image_timeout")]
    pub timeout_secs: u64,
}

fn default_image_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image-preview".to_string()
}

fn default_image_timeout() -> u64 {
    120
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_image_url(),
            model: default_image_model(),
            timeout_secs: default_image_timeout(),
        }
    }
}

/// 渲染编排配置
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// 场景之间的固定间隔（秒）
    #[serde(default = "default_scene_pacing")]
    pub scene_pacing_secs: u64,

    /// 单场景生成尝试上限
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 失败重试前的固定退避（秒）
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

fn default_scene_pacing() -> u64 {
    2
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    2
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scene_pacing_secs: default_scene_pacing(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

/// GC（请求过期清理）配置
///
/// 请求及其图像只存活在单次请求生命周期内，过期后整体清除
#[derive(Debug, Clone, Deserialize)]
pub struct GcConfig {
    /// 是否启用自动清理
    #[serde(default = "default_gc_enabled")]
    pub enabled: bool,

    /// 清理间隔时间（秒）
    #[serde(default = "default_gc_interval")]
    pub interval_secs: u64,

    /// 请求过期时间（秒）
    #[serde(default = "default_request_expire")]
    pub request_expire_secs: u64,
}

fn default_gc_enabled() -> bool {
    true
}

fn default_gc_interval() -> u64 {
    300 // 5 分钟
}

fn default_request_expire() -> u64 {
    3600 // 1 小时
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            enabled: default_gc_enabled(),
            interval_secs: default_gc_interval(),
            request_expire_secs: default_request_expire(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
