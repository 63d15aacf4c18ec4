//! 浏览器接入：启动新的无头浏览器，或连接到已有浏览器

pub mod connection;
pub mod headless;

use anyhow::Result;
use chromiumoxide::{Browser, Handler};
use futures::StreamExt;
use tracing::warn;

use crate::config::Config;

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;

/// 按配置获取浏览器：设置了调试端口则连接，否则启动
pub async fn acquire_browser(config: &Config) -> Result<Browser> {
    match config.browser_debug_port {
        Some(port) => connect_to_browser(port).await,
        None => launch_headless_browser(config).await,
    }
}

/// 后台驱动 CDP 事件循环，出错即退出
fn spawn_event_loop(mut handler: Handler) {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                warn!("浏览器事件循环结束: {}", e);
                break;
            }
        }
    });
}
