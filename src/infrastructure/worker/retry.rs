//! 有界重试组合子
//!
//! 把逐场景的"手动 sleep 重试循环"表达为独立于具体操作的组合子：
//! 固定尝试上限 + 固定退避间隔，成功立即短路。
//! 失败在这里是值（GenerationResult::Failure），不是异常，
//! 组合子只收敛终态，不决定哪些失败值得重试

use std::future::Future;
use std::time::Duration;

use crate::application::ports::{GenerationOutcome, GenerationResult};

/// 重试策略：尝试上限与固定退避
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// 以有界重试执行一次图像生成操作
///
/// - Image 结果立即收敛为 Success，不消耗剩余尝试
/// - Failure 且还有剩余尝试：先通知 on_retry（1 起算的尝试序号与失败原因），
///   等待固定退避后重试
/// - 最后一次尝试仍失败：以最后一次原因收敛为 Exhausted
///
/// max_attempts 为 0 时不执行任何尝试，直接收敛为 Exhausted
pub async fn generate_with_retry<Op, Fut, Notify>(
    policy: RetryPolicy,
    mut op: Op,
    mut on_retry: Notify,
) -> GenerationOutcome
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = GenerationResult>,
    Notify: FnMut(u32, &str),
{
    let mut last_reason = String::from("no attempts were made");

    for attempt in 0..policy.max_attempts {
        match op().await {
            GenerationResult::Image(bytes) => return GenerationOutcome::Success(bytes),
            GenerationResult::Failure(reason) => {
                if attempt + 1 < policy.max_attempts {
                    on_retry(attempt + 1, &reason);
                    tokio::time::sleep(policy.backoff).await;
                }
                last_reason = reason;
            }
        }
    }

    GenerationOutcome::Exhausted(last_reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    /// 按脚本顺序弹出结果的操作，同时计数调用次数
    struct Script {
        results: RefCell<VecDeque<GenerationResult>>,
        calls: RefCell<u32>,
    }

    impl Script {
        fn new(results: Vec<GenerationResult>) -> Self {
            Self {
                results: RefCell::new(results.into()),
                calls: RefCell::new(0),
            }
        }

        fn next(&self) -> GenerationResult {
            *self.calls.borrow_mut() += 1;
            self.results
                .borrow_mut()
                .pop_front()
                .expect("script exhausted: more calls than scripted results")
        }

        fn calls(&self) -> u32 {
            *self.calls.borrow()
        }
    }

    fn image(bytes: &[u8]) -> GenerationResult {
        GenerationResult::Image(bytes.to_vec())
    }

    fn failure(reason: &str) -> GenerationResult {
        GenerationResult::Failure(reason.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_short_circuits() {
        let script = Script::new(vec![image(b"img")]);
        let start = Instant::now();

        let outcome = generate_with_retry(
            RetryPolicy::default(),
            || {
                let result = script.next();
                async move { result }
            },
            |_, _| panic!("no retry expected"),
        )
        .await;

        assert_eq!(outcome, GenerationOutcome::Success(b"img".to_vec()));
        assert_eq!(script.calls(), 1);
        // 成功路径没有退避等待
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_failure_then_success() {
        let script = Script::new(vec![failure("no candidates in response"), image(b"img")]);
        let retries = RefCell::new(Vec::new());
        let start = Instant::now();

        let outcome = generate_with_retry(
            RetryPolicy::default(),
            || {
                let result = script.next();
                async move { result }
            },
            |attempt, reason| retries.borrow_mut().push((attempt, reason.to_string())),
        )
        .await;

        assert_eq!(outcome, GenerationOutcome::Success(b"img".to_vec()));
        assert_eq!(script.calls(), 2);
        assert_eq!(
            retries.into_inner(),
            vec![(1, "no candidates in response".to_string())]
        );
        // 一次退避
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhausted_keeps_last_reason() {
        let script = Script::new(vec![
            failure("first reason"),
            failure("second reason"),
            failure("last reason"),
        ]);
        let retries = RefCell::new(Vec::new());
        let start = Instant::now();

        let outcome = generate_with_retry(
            RetryPolicy::default(),
            || {
                let result = script.next();
                async move { result }
            },
            |attempt, reason| retries.borrow_mut().push((attempt, reason.to_string())),
        )
        .await;

        // 恰好 3 次尝试，最后一次原因作为终态
        assert_eq!(outcome, GenerationOutcome::Exhausted("last reason".to_string()));
        assert_eq!(script.calls(), 3);
        // 最后一次失败后不再退避，也不再通知
        assert_eq!(
            retries.into_inner(),
            vec![
                (1, "first reason".to_string()),
                (2, "second reason".to_string())
            ]
        );
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_last_attempt_makes_no_fourth_call() {
        let script = Script::new(vec![failure("a"), failure("b"), image(b"late")]);

        let outcome = generate_with_retry(
            RetryPolicy::default(),
            || {
                let result = script.next();
                async move { result }
            },
            |_, _| {},
        )
        .await;

        assert_eq!(outcome, GenerationOutcome::Success(b"late".to_vec()));
        assert_eq!(script.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_exhausts_immediately() {
        let script = Script::new(vec![]);
        let policy = RetryPolicy {
            max_attempts: 0,
            backoff: Duration::from_secs(2),
        };

        let outcome = generate_with_retry(
            policy,
            || {
                let result = script.next();
                async move { result }
            },
            |_, _| {},
        )
        .await;

        assert!(matches!(outcome, GenerationOutcome::Exhausted(_)));
        assert_eq!(script.calls(), 0);
    }
}
