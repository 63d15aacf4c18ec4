//! 渲染会话 - 基础设施层
//!
//! 一个会话对应浏览器中的一个标签页，只暴露"执行 JS"的能力

use anyhow::Result;
use chromiumoxide::{Browser, Page};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::FetchError;

/// 渲染会话
///
/// 职责：
/// - 每一步独占一个 Page
/// - 暴露 eval() 能力
/// - 不认识题目 / 提交
/// - 任何退出路径上都会关闭标签页（正常路径显式关闭，被取消时由 Drop 兜底）
pub struct PageSession {
    page: Page,
    closed: bool,
}

impl PageSession {
    /// 在浏览器中打开一个空白标签页
    pub async fn open(browser: &Browser) -> std::result::Result<Self, FetchError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(FetchError::session)?;
        debug!("渲染会话已打开");
        Ok(Self {
            page,
            closed: false,
        })
    }

    /// 获取 page 的引用（用于导航等操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 关闭标签页
    pub async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.page.clone().close().await {
            debug!("关闭渲染会话失败: {}", e);
        } else {
            debug!("渲染会话已关闭");
        }
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // 超时取消时 future 被丢弃，只能在后台关闭
        let page = self.page.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = page.close().await;
            });
        }
    }
}
