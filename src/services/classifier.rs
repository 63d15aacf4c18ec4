//! URL 分类 - 业务能力层
//!
//! 从解码后的指令和原始文档中找出绝对 URL，
//! 并识别出提交端点和数据文件

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::services::artifact::ArtifactKind;

/// 遇到空白或引号类字符即停止
const ABSOLUTE_URL_PATTERN: &str = r#"https?://[^\s"'<>`]+"#;

/// 句末标点不属于 URL
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', ')', ']', '}', '!', '?'];

/// 分类结果，两个类别都可能为空
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    pub submission_endpoint: Option<String>,
    pub data_file_reference: Option<String>,
}

impl References {
    fn is_complete(&self) -> bool {
        self.submission_endpoint.is_some() && self.data_file_reference.is_some()
    }
}

/// URL 分类器
#[derive(Debug, Clone)]
pub struct ReferenceClassifier {
    pattern: Regex,
}

impl ReferenceClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(ABSOLUTE_URL_PATTERN)?,
        })
    }

    /// 提取文本中所有格式正确的 http/https URL（按出现顺序）
    pub fn extract_urls(&self, text: &str) -> Vec<Url> {
        self.pattern
            .find_iter(text)
            .filter_map(|m| {
                let candidate = m
                    .as_str()
                    .trim_end_matches(TRAILING_PUNCTUATION)
                    .replace("&amp;", "&");
                Url::parse(&candidate).ok()
            })
            .filter(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
            .collect()
    }

    /// 先查解码后的指令，再查原始文档；每个类别首个命中即确定，之后不再覆盖
    pub fn classify(&self, decoded: Option<&str>, raw_content: &str) -> References {
        let mut refs = References::default();

        for (source, text) in [("指令", decoded.unwrap_or_default()), ("原始文档", raw_content)] {
            if refs.is_complete() {
                break;
            }
            for url in self.extract_urls(text) {
                let path = url.path().to_ascii_lowercase();

                if is_submission_path(&path) {
                    if refs.submission_endpoint.is_none() {
                        debug!("从{}中识别到提交端点: {}", source, url);
                        refs.submission_endpoint = Some(url.to_string());
                    }
                } else if ArtifactKind::from_path(&path).is_some()
                    && refs.data_file_reference.is_none()
                {
                    debug!("从{}中识别到数据文件: {}", source, url);
                    refs.data_file_reference = Some(url.to_string());
                }
            }
        }

        refs
    }
}

fn is_submission_path(lower_path: &str) -> bool {
    lower_path.contains("submit")
}
