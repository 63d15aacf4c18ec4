use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::{AnswerValue, SubmissionResult};

/// 提交凭据，原样透传给提交端点
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("secret", &"***")
            .finish()
    }
}

/// 一次求解请求
#[derive(Debug, Clone, Deserialize)]
pub struct ChainRequest {
    pub start_url: String,
    pub credentials: Credentials,
    /// 为空时使用配置中的 `chain_budget_secs`
    #[serde(default)]
    pub deadline_budget_seconds: Option<u64>,
}

impl ChainRequest {
    pub fn new(start_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            start_url: start_url.into(),
            credentials,
            deadline_budget_seconds: None,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.deadline_budget_seconds = Some(budget.as_secs());
        self
    }
}

/// 链路状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChainState {
    Running,
    AwaitingNext,
    DoneSuccess,
    DoneNoReference,
    DoneError,
    DoneTimeout,
}

impl ChainState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ChainState::DoneSuccess
                | ChainState::DoneNoReference
                | ChainState::DoneError
                | ChainState::DoneTimeout
        )
    }
}

impl fmt::Display for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChainState::Running => "RUNNING",
            ChainState::AwaitingNext => "AWAITING_NEXT",
            ChainState::DoneSuccess => "DONE_SUCCESS",
            ChainState::DoneNoReference => "DONE_NO_REFERENCE",
            ChainState::DoneError => "DONE_ERROR",
            ChainState::DoneTimeout => "DONE_TIMEOUT",
        };
        f.write_str(name)
    }
}

/// 单步记录
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub url: String,
    pub decoded_instructions: Option<String>,
    pub submission_endpoint: Option<String>,
    pub data_file_reference: Option<String>,
    /// 没有提交端点时不计算答案
    pub answer: Option<AnswerValue>,
    pub submission: Option<SubmissionResult>,
}

/// 整条链的最终报告
#[derive(Debug, Clone, Serialize)]
pub struct ChainReport {
    pub start_url: String,
    pub started_at: String,
    pub final_state: ChainState,
    /// 错误分类（FetchTimeout / FetchError / SubmissionError 等）
    pub error_kind: Option<String>,
    pub reason: Option<String>,
    pub steps: Vec<StepRecord>,
    pub steps_completed: usize,
    pub total_elapsed_seconds: f64,
}

impl ChainReport {
    /// 调度层在任务超出墙钟上限时合成的报告，中途状态全部丢弃
    pub fn abandoned(
        start_url: impl Into<String>,
        started_at: impl Into<String>,
        final_state: ChainState,
        reason: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            start_url: start_url.into(),
            started_at: started_at.into(),
            final_state,
            error_kind: None,
            reason: Some(reason.into()),
            steps: Vec::new(),
            steps_completed: 0,
            total_elapsed_seconds: elapsed.as_secs_f64(),
        }
    }

    /// 最后一步提交的答案
    pub fn last_answer(&self) -> Option<&AnswerValue> {
        self.steps.iter().rev().find_map(|s| s.answer.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_value(ChainState::DoneNoReference).unwrap(),
            serde_json::json!("DONE_NO_REFERENCE")
        );
        assert_eq!(ChainState::AwaitingNext.to_string(), "AWAITING_NEXT");
        assert!(!ChainState::Running.is_terminal());
        assert!(ChainState::DoneTimeout.is_terminal());
    }

    #[test]
    fn test_request_deserializes_without_budget() {
        let request: ChainRequest = serde_json::from_str(
            r#"{"start_url": "https://quiz.example/1",
                "credentials": {"email": "a@b.c", "secret": "s3cret"}}"#,
        )
        .unwrap();
        assert_eq!(request.start_url, "https://quiz.example/1");
        assert!(request.deadline_budget_seconds.is_none());
        assert!(!format!("{:?}", request).contains("s3cret"));
    }
}
