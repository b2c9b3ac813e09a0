//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值
//!
//! 两个服务凭据额外回退到约定俗成的进程环境变量
//! （OPENAI_API_KEY / GOOGLE_API_KEY）

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `REVERIE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `REVERIE_SERVER__HOST=127.0.0.1`
/// - `REVERIE_SERVER__PORT=8080`
/// - `REVERIE_STT__API_KEY=sk-...`
/// - `REVERIE_IMAGE__MODEL=gemini-2.5-flash-image-preview`
///
/// # 返回
/// - `Ok(AppConfig)` - 成功加载的配置
/// - `Err(ConfigError)` - 加载失败
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5080)?
        .set_default("server.max_upload_size", 25 * 1024 * 1024)?
        .set_default("stt.api_key", "")?
        .set_default("stt.base_url", "https://api.openai.com")?
        .set_default("stt.model", "whisper-1")?
        .set_default("stt.timeout_secs", 120)?
        .set_default("splitter.api_key", "")?
        .set_default("splitter.base_url", "https://api.openai.com")?
        .set_default("splitter.model", "gpt-4.1-nano-2025-04-14")?
        .set_default("splitter.temperature", 0.3)?
        .set_default("splitter.max_tokens", 1000)?
        .set_default("splitter.timeout_secs", 60)?
        .set_default("image.api_key", "")?
        .set_default("image.base_url", "https://generativelanguage.googleapis.com")?
        .set_default("image.model", "gemini-2.5-flash-image-preview")?
        .set_default("image.timeout_secs", 120)?
        .set_default("render.scene_pacing_secs", 2)?
        .set_default("render.max_attempts", 3)?
        .set_default("render.retry_delay_secs", 2)?
        .set_default("gc.enabled", true)?
        .set_default("gc.interval_secs", 300)?
        .set_default("gc.request_expire_secs", 3600)?
        .set_default("log.level", "info")?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: REVERIE_
    // 层级分隔符: __ (双下划线)
    // 例如: REVERIE_STT__API_KEY=sk-...
    builder = builder.add_source(
        Environment::with_prefix("REVERIE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let mut app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 6. 凭据回退到约定环境变量；缺失不报错，首次调用时暴露
    apply_credential_fallbacks(&mut app_config);

    // 7. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 凭据回退：配置里没给的 key 从约定俗成的环境变量取
fn apply_credential_fallbacks(config: &mut AppConfig) {
    if config.stt.api_key.is_empty() {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.stt.api_key = key;
        }
    }
    if config.splitter.api_key.is_empty() {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.splitter.api_key = key;
        }
    }
    if config.image.api_key.is_empty() {
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            config.image.api_key = key;
        }
    }
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // 验证端口范围
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    // 验证服务 URL
    if config.stt.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "STT base URL cannot be empty".to_string(),
        ));
    }
    if config.splitter.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Splitter base URL cannot be empty".to_string(),
        ));
    }
    if config.image.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Image base URL cannot be empty".to_string(),
        ));
    }

    // 验证渲染编排参数
    if config.render.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "Render max_attempts cannot be 0".to_string(),
        ));
    }

    // 验证 GC 配置
    if config.gc.enabled && config.gc.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "GC interval cannot be 0 when GC is enabled".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志，凭据只打印是否已配置）
pub fn print_config(config: &AppConfig) {
    let credential = |key: &str| if key.is_empty() { "missing" } else { "configured" };

    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Max Upload Size: {} bytes", config.server.max_upload_size);
    tracing::info!("STT: {} ({})", config.stt.base_url, config.stt.model);
    tracing::info!("STT Credential: {}", credential(&config.stt.api_key));
    tracing::info!("Splitter Model: {}", config.splitter.model);
    tracing::info!("Image: {} ({})", config.image.base_url, config.image.model);
    tracing::info!("Image Credential: {}", credential(&config.image.api_key));
    tracing::info!(
        "Render: pacing {}s, {} attempts, {}s backoff",
        config.render.scene_pacing_secs,
        config.render.max_attempts,
        config.render.retry_delay_secs
    );
    tracing::info!("GC Enabled: {}", config.gc.enabled);
    if config.gc.enabled {
        tracing::info!("GC Interval: {}s", config.gc.interval_secs);
        tracing::info!("Request Expire: {}s", config.gc.request_expire_secs);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5080);
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_image_url() {
        let mut config = AppConfig::default();
        config.image.base_url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_attempts() {
        let mut config = AppConfig::default();
        config.render.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[server]\nport = 8123\n\n[render]\nmax_attempts = 5\n"
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 8123);
        assert_eq!(config.render.max_attempts, 5);
        // 未覆盖的项保持默认值
        assert_eq!(config.render.scene_pacing_secs, 2);
    }
}
