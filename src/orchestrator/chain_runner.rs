//! 链路编排器 - 编排层
//!
//! ## 职责
//!
//! 按 "下一步 URL" 串起一个个步骤，直到进入终止状态：
//!
//! ```text
//! RUNNING ──步骤完成且有下一步──▶ AWAITING_NEXT ──未超时──▶ RUNNING
//!    │                                   │
//!    │                                   └──已超时──▶ DONE_TIMEOUT
//!    ├──没有提交端点──▶ DONE_NO_REFERENCE
//!    ├──渲染 / 提交失败──▶ DONE_ERROR
//!    ├──没有下一步──▶ DONE_SUCCESS
//!    └──开始前或步骤中途超时──▶ DONE_TIMEOUT
//! ```
//!
//! 同一个截止时间传入每一步：步骤开始前检查，步骤内部的渲染、下载、提交
//! 都以剩余时间为超时上限。步骤跨过截止时间即以 DONE_TIMEOUT 结束，
//! 已经得到的部分记录保留在报告中。步骤失败不重试。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::StepError;
use crate::models::{
    ChainReport, ChainRequest, ChainState, Credentials, Deadline, StepRecord, SubmissionResult,
};
use crate::services::ContentFetcher;
use crate::workflow::{StepFlow, StepOutcome};

/// 一次求解请求的运行期状态
#[derive(Debug)]
pub struct ChainRun {
    pub start_url: String,
    pub credentials: Credentials,
    pub deadline: Deadline,
    pub completed_steps: Vec<SubmissionResult>,
    state: ChainState,
    records: Vec<StepRecord>,
    error_kind: Option<String>,
    reason: Option<String>,
}

impl ChainRun {
    fn new(request: ChainRequest, deadline: Deadline) -> Self {
        Self {
            start_url: request.start_url,
            credentials: request.credentials,
            deadline,
            completed_steps: Vec::new(),
            state: ChainState::Running,
            records: Vec::new(),
            error_kind: None,
            reason: None,
        }
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    fn transition(&mut self, next: ChainState) {
        debug!("状态: {} → {}", self.state, next);
        self.state = next;
    }

    fn finish(&mut self, state: ChainState, error_kind: Option<&str>, reason: Option<String>) {
        self.transition(state);
        self.error_kind = error_kind.map(str::to_string);
        self.reason = reason;
    }

    fn into_report(self, started_at: String, elapsed: Duration) -> ChainReport {
        ChainReport {
            start_url: self.start_url,
            started_at,
            final_state: self.state,
            error_kind: self.error_kind,
            reason: self.reason,
            steps: self.records,
            steps_completed: self.completed_steps.len(),
            total_elapsed_seconds: elapsed.as_secs_f64(),
        }
    }
}

/// 链路编排器
///
/// 一条链内严格串行，同一时刻只有一个步骤在执行
pub struct ChainOrchestrator {
    flow: StepFlow,
    default_budget: Duration,
}

impl ChainOrchestrator {
    pub fn new(flow: StepFlow, default_budget: Duration) -> Self {
        Self {
            flow,
            default_budget,
        }
    }

    pub fn from_config(config: &Config, fetcher: Arc<dyn ContentFetcher>) -> Result<Self> {
        Ok(Self::new(StepFlow::new(config, fetcher)?, config.chain_budget()))
    }

    /// 运行一条链，截止时间 = 现在 + 预算
    pub async fn run(&self, request: ChainRequest) -> ChainReport {
        let budget = request
            .deadline_budget_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.default_budget);
        self.run_until(request, Deadline::after(budget)).await
    }

    /// 以给定截止时间运行一条链，总会返回完整的报告
    pub async fn run_until(&self, request: ChainRequest, deadline: Deadline) -> ChainReport {
        let started = Instant::now();
        let started_at = chrono::Local::now().to_rfc3339();
        let mut run = ChainRun::new(request, deadline);
        let mut current_url = run.start_url.clone();

        info!(
            "🔗 开始求解: {} (剩余 {:.1}s)",
            current_url,
            deadline.remaining().as_secs_f64()
        );

        while !run.state().is_terminal() {
            let index = run.records.len() + 1;

            if deadline.has_passed() {
                warn!("⏱️ 截止时间已到，不再开始第 {} 步", index);
                run.finish(
                    ChainState::DoneTimeout,
                    None,
                    Some(format!("截止时间已到，第 {} 步未开始", index)),
                );
                break;
            }

            let outcome = match self
                .flow
                .run(index, &current_url, &run.credentials, &deadline)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) if deadline.has_passed() => {
                    warn!("[步骤 #{}] ⏱️ 截止时间内未完成: {}", index, e);
                    run.finish(
                        ChainState::DoneTimeout,
                        None,
                        Some(format!("第 {} 步在截止时间内未完成: {}", index, e)),
                    );
                    break;
                }
                Err(e) => {
                    error!("[步骤 #{}] ❌ {}", index, e);
                    run.finish(ChainState::DoneError, Some(e.kind()), Some(e.to_string()));
                    break;
                }
            };
            run.records.push(outcome.to_record());

            let submission = match outcome {
                StepOutcome::NoReference { step } => {
                    run.finish(
                        ChainState::DoneNoReference,
                        None,
                        Some(format!("{} 未找到提交端点", step)),
                    );
                    break;
                }
                StepOutcome::DeadlineReached { step, stage, .. } => {
                    run.finish(
                        ChainState::DoneTimeout,
                        None,
                        Some(format!("{} 截止时间已到，未进入{}阶段", step, stage)),
                    );
                    break;
                }
                StepOutcome::Submitted { submission, .. } => submission,
            };

            // 提交跨过截止时间时，以超时结束
            let overran = deadline.has_passed();

            if let Some(reason) = submission.failure.clone() {
                if overran {
                    warn!("[步骤 #{}] ⏱️ 提交未在截止时间内完成: {}", index, reason);
                    run.finish(
                        ChainState::DoneTimeout,
                        None,
                        Some(format!("第 {} 步提交未在截止时间内完成: {}", index, reason)),
                    );
                    break;
                }
                let e = StepError::Submission { reason };
                error!("[步骤 #{}] ❌ {}", index, e);
                run.finish(ChainState::DoneError, Some(e.kind()), Some(e.to_string()));
                break;
            }

            let next_url = submission.next_url.clone();
            let rejection = submission.rejection_reason.clone();
            run.completed_steps.push(submission);

            match next_url {
                None if overran => {
                    warn!("⏱️ 第 {} 步完成时已超过截止时间", index);
                    run.finish(
                        ChainState::DoneTimeout,
                        None,
                        Some(format!("第 {} 步完成时已超过截止时间", index)),
                    );
                }
                None => {
                    info!("🎉 第 {} 步后没有下一题，链路结束", index);
                    run.finish(ChainState::DoneSuccess, None, rejection);
                }
                Some(next) => {
                    run.transition(ChainState::AwaitingNext);
                    if deadline.has_passed() {
                        warn!("⏱️ 第 {} 步完成时已超过截止时间，放弃下一步: {}", index, next);
                        run.finish(
                            ChainState::DoneTimeout,
                            None,
                            Some(format!("第 {} 步完成时已超过截止时间", index)),
                        );
                    } else {
                        info!("➡️ 下一题: {}", next);
                        current_url = next;
                        run.transition(ChainState::Running);
                    }
                }
            }
        }

        run.into_report(started_at, started.elapsed())
    }
}
