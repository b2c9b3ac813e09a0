//! Worker - 后台渲染任务处理

mod render_worker;
mod retry;

pub use render_worker::{RenderWorker, RenderWorkerConfig};
pub use retry::{generate_with_retry, RetryPolicy};
