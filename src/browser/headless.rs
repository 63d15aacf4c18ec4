use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chromiumoxide::{Browser, BrowserConfig};
use tracing::{debug, info};

use super::spawn_event_loop;
use crate::config::Config;

const CHROME_ARGS: &[&str] = &[
    "--disable-gpu",
    "--no-sandbox", // 容器内没有沙盒权限
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-background-networking",
];

/// 启动本地浏览器，`headless = false` 时显示窗口便于调试
pub async fn launch_headless_browser(config: &Config) -> Result<Browser> {
    info!("🚀 启动浏览器 (headless = {})", config.headless);

    let mut builder = if config.headless {
        BrowserConfig::builder().new_headless_mode()
    } else {
        BrowserConfig::builder().with_head()
    };
    if let Some(executable) = config.chrome_executable.as_deref() {
        debug!("使用浏览器: {}", executable);
        builder = builder.chrome_executable(Path::new(executable));
    }

    let browser_config = builder
        .args(CHROME_ARGS.iter().copied())
        .build()
        .map_err(|e| anyhow!("浏览器配置无效: {}", e))?;

    let (browser, handler) = Browser::launch(browser_config)
        .await
        .context("启动浏览器失败")?;
    spawn_event_loop(handler);

    info!("✅ 浏览器已就绪");
    Ok(browser)
}
