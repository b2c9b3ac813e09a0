//! Reverie - 梦境可视化服务
//!
//! 流水线: 上传叙述音频 -> 语音转写 -> (场景拆分) -> 逐场景图像生成
//! - Domain: dream/ (Bounded Context) + 场景脚本解析器
//! - Application: commands, queries, ports
//! - Infrastructure: http, memory, worker, adapters, events

use std::sync::Arc;

use reverie::application::ports::DreamManagerPort;
use reverie::config::{load_config, print_config};
use reverie::infrastructure::adapters::{
    ChatSplitter, ChatSplitterConfig, GeminiImageClient, GeminiImageClientConfig, WhisperClient,
    WhisperClientConfig,
};
// use reverie::infrastructure::adapters::{FakeImageClient, FakeTranscriber};
use reverie::infrastructure::events::EventPublisher;
use reverie::infrastructure::http::{AppState, HttpServer, ServerConfig};
use reverie::infrastructure::memory::InMemoryDreamManager;
use reverie::infrastructure::worker::{RenderWorker, RenderWorkerConfig};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},reverie={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Reverie - 梦境可视化服务");
    print_config(&config);

    // 创建转写客户端
    let transcriber = Arc::new(WhisperClient::new(WhisperClientConfig {
        api_key: config.stt.api_key.clone(),
        base_url: config.stt.base_url.clone(),
        model: config.stt.model.clone(),
        timeout_secs: config.stt.timeout_secs,
    })?);

    // 创建场景拆分客户端
    let scene_splitter = Arc::new(ChatSplitter::new(ChatSplitterConfig {
        api_key: config.splitter.api_key.clone(),
        base_url: config.splitter.base_url.clone(),
        model: config.splitter.model.clone(),
        temperature: config.splitter.temperature,
        max_tokens: config.splitter.max_tokens,
        timeout_secs: config.splitter.timeout_secs,
    })?);

    // 创建图像生成客户端
    let image_generator = Arc::new(GeminiImageClient::new(GeminiImageClientConfig {
        api_key: config.image.api_key.clone(),
        base_url: config.image.base_url.clone(),
        model: config.image.model.clone(),
        timeout_secs: config.image.timeout_secs,
    })?);

    // // 离线联调用的 Fake 适配器（固定转写文本 + 固定占位图）
    // let transcriber = Arc::new(FakeTranscriber::with_defaults());
    // let image_generator = Arc::new(FakeImageClient::with_defaults());

    // 创建事件发布器
    let event_publisher = Arc::new(EventPublisher::new());

    // 创建渲染队列
    let (task_tx, task_rx) = mpsc::channel(1000);

    // 创建内存 Dream 管理器
    let dream_manager = Arc::new(InMemoryDreamManager::new(task_tx));

    // 创建 RenderWorker
    let worker_config = RenderWorkerConfig {
        scene_pacing_secs: config.render.scene_pacing_secs,
        max_attempts: config.render.max_attempts,
        retry_delay_secs: config.render.retry_delay_secs,
    };
    let worker = RenderWorker::new(
        worker_config,
        task_rx,
        dream_manager.clone(),
        transcriber.clone(),
        scene_splitter.clone(),
        image_generator.clone(),
        event_publisher.clone(),
    );

    // 启动 Worker
    tokio::spawn(worker.run());

    // 启动请求过期清理循环
    if config.gc.enabled {
        let gc_manager = dream_manager.clone();
        let interval_secs = config.gc.interval_secs;
        let expire_secs = config.gc.request_expire_secs as i64;
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs));
            ticker.tick().await; // 第一次 tick 立即返回，跳过
            loop {
                ticker.tick().await;
                let cleaned = gc_manager.cleanup_expired(chrono::Duration::seconds(expire_secs));
                if cleaned > 0 {
                    tracing::info!(cleaned = cleaned, "Expired dream requests removed");
                }
            }
        });
    }

    // 创建 HTTP 服务器
    let static_dir = config
        .server
        .static_files
        .enabled
        .then(|| config.server.static_files.dir.clone());
    let server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_max_upload_size(config.server.max_upload_size)
        .with_static_dir(static_dir);

    let state = AppState::new(dream_manager, event_publisher);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
