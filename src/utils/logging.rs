//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::ChainReport;

/// 初始化日志：优先使用 `RUST_LOG`，否则按是否详细日志选择级别
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!(
        "⏱️ 链路预算: {}s / 墙钟上限: {}s",
        config.chain_budget_secs, config.wall_clock_cap_secs
    );
    info!("📊 最大并发链数: {}", config.max_concurrent_chains.max(1));
    info!("{}", "=".repeat(60));
}

/// 记录一条链的最终结果
pub fn log_chain_complete(chain_index: usize, report: &ChainReport) {
    info!("\n{}", "─".repeat(60));
    info!(
        "[链 {}] 🏁 结束状态: {} | 完成步数: {} | 耗时: {:.2}s",
        chain_index, report.final_state, report.steps_completed, report.total_elapsed_seconds
    );
    if let Some(reason) = report.reason.as_deref() {
        info!("[链 {}] 原因: {}", chain_index, truncate_text(reason, 200));
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
