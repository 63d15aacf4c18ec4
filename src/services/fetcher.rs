//! 页面内容获取 - 业务能力层
//!
//! 只负责"渲染 URL 并返回文档内容"能力，不关心流程

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Browser;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::infrastructure::PageSession;

/// 页面内容获取能力
///
/// 实现方必须在超时内返回，且任何退出路径都不能泄漏渲染会话
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// 渲染 `url`，返回脚本执行后的文档内容
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// 基于 Chromium 的实现，每次获取都打开一个新标签页
pub struct ChromiumFetcher {
    browser: Browser,
}

impl ChromiumFetcher {
    pub fn new(browser: Browser) -> Self {
        Self { browser }
    }

    async fn render(session: &PageSession, url: &str) -> Result<String, FetchError> {
        session
            .page()
            .goto(url)
            .await
            .map_err(|e| FetchError::navigation(url, e))?;

        // goto 在文档解析完成后返回，不等待网络空闲
        if let Ok(state) = session.eval("document.readyState").await {
            debug!("文档状态: {}", state);
        }

        session
            .eval_as::<String>("document.documentElement.outerHTML")
            .await
            .map_err(|e| FetchError::Navigation {
                url: url.to_string(),
                source: e.into(),
            })
    }
}

#[async_trait]
impl ContentFetcher for ChromiumFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let session = PageSession::open(&self.browser).await?;

        let outcome = match tokio::time::timeout(timeout, Self::render(&session, url)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("⏱️ 渲染超时 ({}s): {}", timeout.as_secs(), url);
                Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout_secs: timeout.as_secs(),
                })
            }
        };

        session.close().await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::launch_headless_browser;
    use crate::config::Config;

    #[tokio::test]
    #[ignore] // 需要本机安装 Chromium：cargo test -- --ignored
    async fn test_chromium_fetch_renders_script_output() {
        let _ = tracing_subscriber::fmt::try_init();

        let browser = launch_headless_browser(&Config::default())
            .await
            .expect("启动浏览器失败");
        let fetcher = ChromiumFetcher::new(browser);

        let html = fetcher
            .fetch(
                "data:text/html,<div id=q></div><script>document.getElementById('q').innerHTML=atob('aGVsbG8=')</script>",
                Duration::from_secs(10),
            )
            .await
            .expect("渲染失败");

        assert!(html.contains("hello"));
    }
}
