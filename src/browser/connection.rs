use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tracing::{debug, info};

use super::spawn_event_loop;

/// 事件循环起来之后再发 CDP 命令
const HANDLER_WARMUP: Duration = Duration::from_millis(300);

/// 复用已在远程调试端口上运行的浏览器
///
/// 连接后会查询一次版本，端口上不是可用的 CDP 服务时尽早报错
pub async fn connect_to_browser(port: u16) -> Result<Browser> {
    let endpoint = format!("http://localhost:{}", port);
    info!("🔌 连接远程浏览器: {}", endpoint);

    let (browser, handler) = Browser::connect(&endpoint)
        .await
        .with_context(|| format!("无法连接到调试端口 {}", port))?;
    spawn_event_loop(handler);
    tokio::time::sleep(HANDLER_WARMUP).await;

    let version = browser
        .version()
        .await
        .context("浏览器已连接但无法查询版本")?;
    debug!("浏览器版本: {}", version.product);

    Ok(browser)
}
