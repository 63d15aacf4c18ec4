//! 答案提交 - 业务能力层
//!
//! 只负责"把答案 POST 到提交端点并解读响应"，失败也返回结果而不是错误

use std::time::Duration;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::error::SubmissionError;
use crate::models::{AnswerValue, Credentials, Deadline, SubmissionResponse, SubmissionResult};
use crate::utils::logging::truncate_text;

/// 提交请求体
#[derive(Debug, Serialize)]
struct SubmissionBody<'a> {
    email: &'a str,
    secret: &'a str,
    url: &'a str,
    answer: &'a AnswerValue,
}

/// 提交客户端
#[derive(Debug, Clone)]
pub struct SubmissionClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl SubmissionClient {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// 提交答案
    ///
    /// # 参数
    /// - `endpoint`: 提交端点
    /// - `credentials`: 凭据（原样透传）
    /// - `step_url`: 当前这一步的页面 URL
    /// - `answer`: 计算出的答案
    /// - `deadline`: 请求超时不超过剩余时间
    pub async fn submit(
        &self,
        endpoint: &str,
        credentials: &Credentials,
        step_url: &str,
        answer: &AnswerValue,
        deadline: &Deadline,
    ) -> SubmissionResult {
        info!("📤 提交答案 {} → {}", answer, endpoint);

        let timeout = deadline.cap(self.timeout);
        match self.post(endpoint, credentials, step_url, answer, timeout).await {
            Ok(result) => {
                if result.accepted {
                    info!("✓ 答案正确");
                } else {
                    warn!(
                        "⚠️ 答案未被接受: {}",
                        result.rejection_reason.as_deref().unwrap_or("(无原因)")
                    );
                }
                result
            }
            Err(e) => {
                warn!("❌ 提交失败: {}", e);
                SubmissionResult::failed(e.to_string())
            }
        }
    }

    async fn post(
        &self,
        endpoint: &str,
        credentials: &Credentials,
        step_url: &str,
        answer: &AnswerValue,
        timeout: Duration,
    ) -> Result<SubmissionResult, SubmissionError> {
        let body = SubmissionBody {
            email: &credentials.email,
            secret: &credentials.secret,
            url: step_url,
            answer,
        };

        let request_failed = |source| SubmissionError::Request {
            endpoint: endpoint.to_string(),
            source,
        };

        let response = self
            .client
            .post(endpoint)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        let text = response.text().await.map_err(request_failed)?;
        debug!("提交响应 HTTP {}: {}", status, truncate_text(&text, 200));

        let malformed = |message: String| SubmissionError::MalformedResponse {
            endpoint: endpoint.to_string(),
            message,
        };

        // 答错时服务端可能返回 4xx，但只要带 JSON 就照常解读
        let raw: JsonValue = serde_json::from_str(&text).map_err(|e| {
            malformed(format!(
                "HTTP {} 响应不是 JSON ({}): {}",
                status.as_u16(),
                e,
                truncate_text(&text, 80)
            ))
        })?;
        if !raw.is_object() {
            return Err(malformed(format!("响应不是 JSON 对象: {}", raw)));
        }

        let parsed: SubmissionResponse =
            serde_json::from_value(raw.clone()).map_err(|e| malformed(e.to_string()))?;
        Ok(SubmissionResult::from_response(raw, parsed))
    }
}
