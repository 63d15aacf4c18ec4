//! 链路调度器 - 编排层
//!
//! 把每条链放进有界的工作池中执行，并在外层强制墙钟上限。
//! 超出上限时放弃链路的中间状态，合成 DONE_TIMEOUT 报告。

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{error, warn};

use crate::config::Config;
use crate::models::{ChainReport, ChainRequest, ChainState};
use crate::orchestrator::chain_runner::ChainOrchestrator;

/// 链路调度器
///
/// 各条链之间没有共享的可变状态，并发数由信号量限制
pub struct ChainDispatcher {
    orchestrator: Arc<ChainOrchestrator>,
    permits: Arc<Semaphore>,
    wall_clock_cap: Duration,
}

impl ChainDispatcher {
    /// `max_concurrent` 至少为 1
    pub fn new(
        orchestrator: Arc<ChainOrchestrator>,
        max_concurrent: usize,
        wall_clock_cap: Duration,
    ) -> Self {
        Self {
            orchestrator,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            wall_clock_cap,
        }
    }

    pub fn from_config(config: &Config, orchestrator: Arc<ChainOrchestrator>) -> Self {
        Self::new(
            orchestrator,
            config.max_concurrent_chains,
            config.wall_clock_cap(),
        )
    }

    /// 执行一条链；上限从提交到调度器时开始计算（含排队时间）
    pub async fn dispatch(&self, request: ChainRequest) -> ChainReport {
        let started = Instant::now();
        let started_at = chrono::Local::now().to_rfc3339();
        let start_url = request.start_url.clone();

        let orchestrator = Arc::clone(&self.orchestrator);
        let permits = Arc::clone(&self.permits);
        let mut handle = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.ok()?;
            Some(orchestrator.run(request).await)
        });

        match tokio::time::timeout(self.wall_clock_cap, &mut handle).await {
            Ok(Ok(Some(report))) => report,
            Ok(Ok(None)) => ChainReport::abandoned(
                start_url,
                started_at,
                ChainState::DoneError,
                "工作池已关闭",
                started.elapsed(),
            ),
            Ok(Err(e)) => {
                error!("链任务异常退出 ({}): {}", start_url, e);
                ChainReport::abandoned(
                    start_url,
                    started_at,
                    ChainState::DoneError,
                    format!("链任务异常退出: {}", e),
                    started.elapsed(),
                )
            }
            Err(_) => {
                handle.abort();
                warn!(
                    "⏱️ 超出墙钟上限 {}s，放弃链路: {}",
                    self.wall_clock_cap.as_secs(),
                    start_url
                );
                ChainReport::abandoned(
                    start_url,
                    started_at,
                    ChainState::DoneTimeout,
                    format!("超出墙钟上限 {}s", self.wall_clock_cap.as_secs_f64()),
                    started.elapsed(),
                )
            }
        }
    }

    /// 同时提交多条链，报告顺序与请求顺序一致
    pub async fn dispatch_all(&self, requests: Vec<ChainRequest>) -> Vec<ChainReport> {
        join_all(requests.into_iter().map(|r| self.dispatch(r))).await
    }
}
