//! 单步上下文
//!
//! 封装"这一步抓到了什么"：页面内容、解码后的指令以及分类出的两个 URL

use std::fmt::Display;

use crate::services::References;

/// 一次抓取对应的一步
///
/// 构建后不可修改，步骤结束即丢弃
#[derive(Debug, Clone)]
pub struct ChallengeStep {
    index: usize,
    url: String,
    decoded_instructions: Option<String>,
    submission_endpoint: Option<String>,
    data_file_reference: Option<String>,
    raw_content: String,
}

impl ChallengeStep {
    /// 创建新的步骤上下文
    pub fn new(
        index: usize,
        url: impl Into<String>,
        raw_content: String,
        decoded_instructions: Option<String>,
        references: References,
    ) -> Self {
        Self {
            index,
            url: url.into(),
            decoded_instructions,
            submission_endpoint: references.submission_endpoint,
            data_file_reference: references.data_file_reference,
            raw_content,
        }
    }

    /// 步骤序号（从1开始，仅用于日志）
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn decoded_instructions(&self) -> Option<&str> {
        self.decoded_instructions.as_deref()
    }

    pub fn submission_endpoint(&self) -> Option<&str> {
        self.submission_endpoint.as_deref()
    }

    pub fn data_file_reference(&self) -> Option<&str> {
        self.data_file_reference.as_deref()
    }

    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }
}

impl Display for ChallengeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[步骤 #{} {}]", self.index, self.url)
    }
}
