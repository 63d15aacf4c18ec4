//! 单步处理流程 - 流程层
//!
//! 核心职责：定义"一步"的完整处理流程
//!
//! 流程顺序：
//! 1. 渲染页面
//! 2. 解码隐藏指令
//! 3. 分类 URL（提交端点 / 数据文件）
//! 4. 计算答案
//! 5. 提交
//!
//! 链路截止时间贯穿整个步骤：渲染、下载、提交的超时都不超过剩余时间，
//! 渲染之后、提交之前各检查一次，已过期则不再进入下一阶段

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::StepError;
use crate::models::{AnswerValue, Credentials, Deadline, StepRecord, SubmissionResult};
use crate::services::{
    AnswerEngine, ArtifactFetcher, ContentFetcher, PayloadDecoder, ReferenceClassifier,
    SubmissionClient,
};
use crate::utils::logging::truncate_text;
use crate::workflow::challenge_step::ChallengeStep;

/// 单步处理结果
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// 没有找到提交端点，链路到此为止
    NoReference { step: ChallengeStep },
    /// 已提交（是否送达看 `submission.is_failure()`）
    Submitted {
        step: ChallengeStep,
        answer: AnswerValue,
        submission: SubmissionResult,
    },
    /// 截止时间在步骤中途到达，`stage` 是没能开始的阶段
    DeadlineReached {
        step: ChallengeStep,
        answer: Option<AnswerValue>,
        stage: &'static str,
    },
}

impl StepOutcome {
    pub fn step(&self) -> &ChallengeStep {
        match self {
            StepOutcome::NoReference { step }
            | StepOutcome::Submitted { step, .. }
            | StepOutcome::DeadlineReached { step, .. } => step,
        }
    }

    /// 转成报告中的单步记录
    pub fn to_record(&self) -> StepRecord {
        let step = self.step();
        let (answer, submission) = match self {
            StepOutcome::NoReference { .. } => (None, None),
            StepOutcome::Submitted {
                answer, submission, ..
            } => (Some(answer.clone()), Some(submission.clone())),
            StepOutcome::DeadlineReached { answer, .. } => (answer.clone(), None),
        };
        StepRecord {
            url: step.url().to_string(),
            decoded_instructions: step.decoded_instructions().map(str::to_string),
            submission_endpoint: step.submission_endpoint().map(str::to_string),
            data_file_reference: step.data_file_reference().map(str::to_string),
            answer,
            submission,
        }
    }
}

/// 单步处理流程
///
/// - 编排 fetch → decode → classify → answer → submit
/// - 不做重试
/// - 不关心链路状态，只遵守传入的截止时间
pub struct StepFlow {
    fetcher: Arc<dyn ContentFetcher>,
    decoder: PayloadDecoder,
    classifier: ReferenceClassifier,
    answer_engine: AnswerEngine,
    submission_client: SubmissionClient,
    navigation_timeout: Duration,
}

impl StepFlow {
    /// 创建新的单步流程
    pub fn new(config: &Config, fetcher: Arc<dyn ContentFetcher>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("quiz-chain-solver/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            fetcher,
            decoder: PayloadDecoder::new()?,
            classifier: ReferenceClassifier::new()?,
            answer_engine: AnswerEngine::new(
                ArtifactFetcher::new(
                    http.clone(),
                    config.download_timeout(),
                    config.max_opaque_text_bytes,
                ),
                config.default_answer.clone(),
            ),
            submission_client: SubmissionClient::new(http, config.submit_timeout()),
            navigation_timeout: config.navigation_timeout(),
        })
    }

    pub async fn run(
        &self,
        index: usize,
        url: &str,
        credentials: &Credentials,
        deadline: &Deadline,
    ) -> Result<StepOutcome, StepError> {
        let render_timeout = deadline.cap(self.navigation_timeout);
        info!(
            "[步骤 #{}] 🌐 渲染页面 (超时 {:.1}s): {}",
            index,
            render_timeout.as_secs_f64(),
            url
        );
        let raw_content = self.fetcher.fetch(url, render_timeout).await?;

        let decoded = self.decoder.decode(&raw_content);
        match decoded.as_deref() {
            Some(text) => info!("[步骤 #{}] 🔓 指令: {}", index, truncate_text(text, 120)),
            None => info!("[步骤 #{}] 未找到可解码的指令，使用原始页面", index),
        }

        let references = self.classifier.classify(decoded.as_deref(), &raw_content);
        let step = ChallengeStep::new(index, url, raw_content, decoded, references);

        if deadline.has_passed() {
            warn!("{} ⏱️ 渲染完成时已到截止时间", step);
            return Ok(StepOutcome::DeadlineReached {
                step,
                answer: None,
                stage: "计算答案",
            });
        }

        let Some(endpoint) = step.submission_endpoint().map(str::to_string) else {
            warn!("{} ⚠️ 未找到提交端点", step);
            return Ok(StepOutcome::NoReference { step });
        };

        let answer = self
            .answer_engine
            .compute(
                step.decoded_instructions(),
                step.data_file_reference(),
                deadline,
            )
            .await;
        info!("{} 🧮 答案: {}", step, answer);

        if deadline.has_passed() {
            warn!("{} ⏱️ 已到截止时间，答案未提交", step);
            return Ok(StepOutcome::DeadlineReached {
                step,
                answer: Some(answer),
                stage: "提交",
            });
        }

        let submission = self
            .submission_client
            .submit(&endpoint, credentials, step.url(), &answer, deadline)
            .await;

        Ok(StepOutcome::Submitted {
            step,
            answer,
            submission,
        })
    }
}
