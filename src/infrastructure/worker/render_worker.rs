//! Render Worker - Background Dream Rendering Processor

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::application::ports::{
    DreamManagerPort, DreamState, GenerationOutcome, GenerationResult, ImageGeneratorPort,
    SceneSplitterPort, TranscriberPort,
};
use crate::domain::dream::{DreamError, RenderMode};
use crate::infrastructure::events::EventPublisher;
use crate::infrastructure::worker::retry::{generate_with_retry, RetryPolicy};

/// Worker 配置
#[derive(Debug, Clone)]
pub struct RenderWorkerConfig {
    /// 场景之间的固定间隔（秒），避免突发触发图像服务限流
    pub scene_pacing_secs: u64,
    /// 单场景生成尝试上限
    pub max_attempts: u32,
    /// 失败重试前的固定退避（秒）
    pub retry_delay_secs: u64,
}

impl Default for RenderWorkerConfig {
    fn default() -> Self {
        Self {
            scene_pacing_secs: 2,
            max_attempts: 3,
            retry_delay_secs: 2,
        }
    }
}

/// 渲染 Worker
///
/// 后台任务处理器，从队列消费梦境请求并执行
/// 转写 -> (拆分) -> 逐场景生成 的完整流水线。
/// 请求严格串行处理，任意时刻至多一个在途远程调用
pub struct RenderWorker {
    config: RenderWorkerConfig,
    queue_receiver: mpsc::Receiver<String>,
    dream_manager: Arc<dyn DreamManagerPort>,
    transcriber: Arc<dyn TranscriberPort>,
    scene_splitter: Arc<dyn SceneSplitterPort>,
    image_generator: Arc<dyn ImageGeneratorPort>,
    event_publisher: Arc<EventPublisher>,
}

impl RenderWorker {
    pub fn new(
        config: RenderWorkerConfig,
        queue_receiver: mpsc::Receiver<String>,
        dream_manager: Arc<dyn DreamManagerPort>,
        transcriber: Arc<dyn TranscriberPort>,
        scene_splitter: Arc<dyn SceneSplitterPort>,
        image_generator: Arc<dyn ImageGeneratorPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            dream_manager,
            transcriber,
            scene_splitter,
            image_generator,
            event_publisher,
        }
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!(
            scene_pacing_secs = self.config.scene_pacing_secs,
            max_attempts = self.config.max_attempts,
            "RenderWorker started"
        );

        while let Some(dream_id) = self.queue_receiver.recv().await {
            self.process_dream(&dream_id).await;
        }

        tracing::info!("RenderWorker stopped");
    }

    /// 处理单个请求
    async fn process_dream(&self, dream_id: &str) {
        let request = match self.dream_manager.get(dream_id) {
            Some(r) => r,
            None => {
                tracing::warn!(dream_id = %dream_id, "Dream request not found, skipping");
                return;
            }
        };

        // 转写
        let _ = self.dream_manager.set_state(dream_id, DreamState::Transcribing);
        self.event_publisher
            .publish_dream_state(dream_id, DreamState::Transcribing);

        let clip = match self.dream_manager.take_audio(dream_id) {
            Some(c) => c,
            None => {
                self.fail(dream_id, "Audio payload missing or already consumed".to_string());
                return;
            }
        };

        let narration = match self.transcriber.transcribe(clip).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(dream_id = %dream_id, error = %e, "Transcription failed");
                self.fail(dream_id, format!("Error during transcription: {}", e));
                return;
            }
        };

        let _ = self.dream_manager.set_narration(dream_id, narration.clone());
        self.event_publisher
            .publish_transcript_ready(dream_id, &narration);

        match request.mode {
            RenderMode::SingleImage => self.render_single(dream_id, &narration).await,
            RenderMode::DreamSequence => self.render_dream_sequence(dream_id, &narration).await,
        }
    }

    /// 单图模式：整段叙述一次生成，不进入重试循环
    async fn render_single(&self, dream_id: &str, narration: &str) {
        let _ = self
            .dream_manager
            .init_scenes(dream_id, vec![narration.to_string()]);
        let _ = self.dream_manager.set_state(dream_id, DreamState::Rendering);
        self.event_publisher
            .publish_dream_state(dream_id, DreamState::Rendering);

        let _ = self.dream_manager.set_scene_generating(dream_id, 0);
        self.event_publisher.publish_scene_generating(dream_id, 0);

        match self.image_generator.generate(narration, None).await {
            GenerationResult::Image(bytes) => {
                tracing::info!(
                    dream_id = %dream_id,
                    image_size = bytes.len(),
                    "Single image rendered"
                );
                let _ = self.dream_manager.set_scene_ready(dream_id, 0, bytes);
                self.event_publisher.publish_scene_ready(dream_id, 0);
            }
            GenerationResult::Failure(reason) => {
                tracing::error!(dream_id = %dream_id, error = %reason, "Single image generation failed");
                let _ = self
                    .dream_manager
                    .set_scene_failed(dream_id, 0, reason.clone());
                self.event_publisher
                    .publish_scene_failed(dream_id, 0, &reason);
            }
        }

        self.finish(dream_id);
    }

    /// 序列模式：先拆分场景，再逐场景生成
    async fn render_dream_sequence(&self, dream_id: &str, narration: &str) {
        let _ = self.dream_manager.set_state(dream_id, DreamState::Splitting);
        self.event_publisher
            .publish_dream_state(dream_id, DreamState::Splitting);

        let scenes = match self.scene_splitter.split(narration).await {
            Ok(scenes) => scenes,
            Err(e) => {
                tracing::error!(dream_id = %dream_id, error = %e, "Scene split failed");
                self.fail(dream_id, format!("Error processing scenes: {}", e));
                return;
            }
        };

        // 空场景集是请求级终止，此时还没有发出任何生成调用
        if scenes.is_empty() {
            tracing::warn!(dream_id = %dream_id, "No scenes identified in narration");
            self.fail(dream_id, DreamError::EmptySceneSet.to_string());
            return;
        }

        let _ = self.dream_manager.init_scenes(dream_id, scenes.clone());
        self.event_publisher.publish_scenes_ready(dream_id, &scenes);

        let _ = self.dream_manager.set_state(dream_id, DreamState::Rendering);
        self.event_publisher
            .publish_dream_state(dream_id, DreamState::Rendering);

        self.render_sequence(dream_id, &scenes).await;
        self.finish(dream_id);
    }

    /// 逐场景顺序生成，场景之间固定间隔，单场景有界重试
    ///
    /// 每个场景的终态在其重试循环结束时立即上报（状态更新 + WS 事件），
    /// 单场景重试耗尽不中断后续场景。
    /// 返回与场景等长、同序的终态列表
    async fn render_sequence(&self, dream_id: &str, scenes: &[String]) -> Vec<GenerationOutcome> {
        let policy = RetryPolicy {
            max_attempts: self.config.max_attempts,
            backoff: Duration::from_secs(self.config.retry_delay_secs),
        };
        let pacing = Duration::from_secs(self.config.scene_pacing_secs);
        let mut outcomes = Vec::with_capacity(scenes.len());

        for (index, scene) in scenes.iter().enumerate() {
            let scene_index = index as u32;

            // 首个场景之外，生成前固定间隔
            if index > 0 {
                tokio::time::sleep(pacing).await;
            }

            let outcome = generate_with_retry(
                policy,
                || {
                    let _ = self
                        .dream_manager
                        .set_scene_generating(dream_id, scene_index);
                    self.event_publisher
                        .publish_scene_generating(dream_id, scene_index);
                    self.image_generator.generate(scene, None)
                },
                |attempt, reason| {
                    tracing::warn!(
                        dream_id = %dream_id,
                        scene_index = scene_index,
                        attempt = attempt,
                        error = %reason,
                        "Scene generation attempt failed, retrying"
                    );
                    self.event_publisher
                        .publish_scene_retrying(dream_id, scene_index, attempt, reason);
                },
            )
            .await;

            match &outcome {
                GenerationOutcome::Success(bytes) => {
                    tracing::info!(
                        dream_id = %dream_id,
                        scene_index = scene_index,
                        image_size = bytes.len(),
                        "Scene rendered"
                    );
                    let _ = self
                        .dream_manager
                        .set_scene_ready(dream_id, scene_index, bytes.clone());
                    self.event_publisher
                        .publish_scene_ready(dream_id, scene_index);
                }
                GenerationOutcome::Exhausted(reason) => {
                    tracing::error!(
                        dream_id = %dream_id,
                        scene_index = scene_index,
                        error = %reason,
                        "Scene generation exhausted retry budget"
                    );
                    let _ = self
                        .dream_manager
                        .set_scene_failed(dream_id, scene_index, reason.clone());
                    self.event_publisher
                        .publish_scene_failed(dream_id, scene_index, reason);
                }
            }

            outcomes.push(outcome);
        }

        outcomes
    }

    /// 收敛请求终态：允许部分场景失败，整体仍是 Completed
    fn finish(&self, dream_id: &str) {
        let (ready, failed) = self
            .dream_manager
            .get(dream_id)
            .map(|r| (r.ready_count(), r.failed_count()))
            .unwrap_or((0, 0));

        let _ = self.dream_manager.set_state(dream_id, DreamState::Completed);
        self.event_publisher
            .publish_dream_completed(dream_id, ready, failed);

        tracing::info!(
            dream_id = %dream_id,
            ready_count = ready,
            failed_count = failed,
            "Dream request completed"
        );
    }

    /// 请求级失败：转写失败、拆分失败、空场景集
    fn fail(&self, dream_id: &str, error: String) {
        let _ = self.dream_manager.set_failed(dream_id, error.clone());
        self.event_publisher.publish_dream_failed(dream_id, &error);
    }
}
