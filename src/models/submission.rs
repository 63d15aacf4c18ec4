use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 服务端对提交的响应（只取关心的字段）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionResponse {
    pub correct: Option<bool>,
    pub accepted: Option<bool>,
    pub url: Option<String>,
    /// 部分服务端用 `next_url`，两者都给时以 `url` 为准
    pub next_url: Option<String>,
    pub reason: Option<String>,
}

/// 一次提交的结果
///
/// `failure` 只在请求没有送达或响应无法解析时设置，
/// 编排层据此区分“答错了”和“提交坏了”
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResult {
    pub accepted: bool,
    pub next_url: Option<String>,
    pub rejection_reason: Option<String>,
    pub raw_response: Option<JsonValue>,
    pub failure: Option<String>,
}

impl SubmissionResult {
    /// 由服务端 JSON 响应构建
    pub fn from_response(raw: JsonValue, response: SubmissionResponse) -> Self {
        let accepted = response.correct.or(response.accepted).unwrap_or(false);
        let next_url = response
            .url
            .into_iter()
            .chain(response.next_url)
            .map(|u| u.trim().to_string())
            .find(|u| !u.is_empty());
        let rejection_reason = response.reason.filter(|r| !r.trim().is_empty());

        Self {
            accepted,
            next_url,
            rejection_reason,
            raw_response: Some(raw),
            failure: None,
        }
    }

    /// 提交失败（网络错误或响应格式错误）
    pub fn failed(diagnostic: impl Into<String>) -> Self {
        let diagnostic = diagnostic.into();
        Self {
            accepted: false,
            next_url: None,
            rejection_reason: Some(diagnostic.clone()),
            raw_response: None,
            failure: Some(diagnostic),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}
