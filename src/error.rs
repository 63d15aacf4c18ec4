use thiserror::Error;

/// 页面渲染错误
#[derive(Debug, Error)]
pub enum FetchError {
    /// 渲染在导航超时内没有完成
    #[error("导航超时 ({timeout_secs}s): {url}")]
    Timeout { url: String, timeout_secs: u64 },

    /// 网络或导航失败
    #[error("导航到 {url} 失败: {source}")]
    Navigation {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 无法获取渲染会话（浏览器标签页）
    #[error("无法创建渲染会话: {source}")]
    Session {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FetchError {
    /// 创建导航失败错误
    pub fn navigation(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        FetchError::Navigation {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// 创建会话错误
    pub fn session(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        FetchError::Session {
            source: Box::new(source),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

/// 数据文件下载 / 解析错误
///
/// 这类错误不会中断链路，只会让答案退回默认值
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("下载数据文件失败 ({url}): {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("数据文件返回非成功状态 ({url}): HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("解析 {kind} 文件失败: {message}")]
    Parse { kind: &'static str, message: String },
}

impl ArtifactError {
    pub fn parse(kind: &'static str, message: impl Into<String>) -> Self {
        ArtifactError::Parse {
            kind,
            message: message.into(),
        }
    }
}

/// 提交答案时的错误
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// 网络请求失败（含超时）
    #[error("提交请求失败 ({endpoint}): {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// 响应不是合法的 JSON 对象
    #[error("提交响应无法解析 ({endpoint}): {message}")]
    MalformedResponse { endpoint: String, message: String },
}

/// 单步执行中的终止性错误
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{reason}")]
    Submission { reason: String },
}

impl StepError {
    /// 错误分类名，写入报告供调用方区分
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::Fetch(e) if e.is_timeout() => "FetchTimeout",
            StepError::Fetch(_) => "FetchError",
            StepError::Submission { .. } => "SubmissionError",
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_error_kind_distinguishes_timeout() {
        let timeout = StepError::from(FetchError::Timeout {
            url: "https://quiz.example/1".to_string(),
            timeout_secs: 30,
        });
        assert_eq!(timeout.kind(), "FetchTimeout");

        let nav = StepError::from(FetchError::navigation(
            "https://quiz.example/1",
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        ));
        assert_eq!(nav.kind(), "FetchError");

        let submit = StepError::Submission {
            reason: "boom".to_string(),
        };
        assert_eq!(submit.kind(), "SubmissionError");
    }
}
