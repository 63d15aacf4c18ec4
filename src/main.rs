use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use quiz_chain_solver::browser;
use quiz_chain_solver::utils::logging;
use quiz_chain_solver::{
    ChainDispatcher, ChainOrchestrator, ChainRequest, ChromiumFetcher, Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（可选 TOML 文件 + 环境变量）
    let config_path = std::env::var("QUIZ_CONFIG").ok().map(PathBuf::from);
    let config = Config::load(config_path.as_deref()).context("加载配置失败")?;

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(&config);

    // 起始 URL：命令行参数优先，其次 QUIZ_START_URL
    let mut start_urls: Vec<String> = std::env::args().skip(1).collect();
    if start_urls.is_empty() {
        if let Ok(url) = std::env::var("QUIZ_START_URL") {
            start_urls.push(url);
        }
    }
    if start_urls.is_empty() {
        anyhow::bail!("缺少起始 URL：请通过命令行参数或 QUIZ_START_URL 提供");
    }

    let browser = browser::acquire_browser(&config)
        .await
        .context("无法获取浏览器")?;
    let fetcher = Arc::new(ChromiumFetcher::new(browser));
    let orchestrator = Arc::new(ChainOrchestrator::from_config(&config, fetcher)?);
    let dispatcher = ChainDispatcher::from_config(&config, orchestrator);

    let requests = start_urls
        .into_iter()
        .map(|url| ChainRequest::new(url, config.credentials()))
        .collect();

    let reports = dispatcher.dispatch_all(requests).await;
    for (index, report) in reports.iter().enumerate() {
        logging::log_chain_complete(index + 1, report);
        println!("{}", serde_json::to_string_pretty(report)?);
    }

    Ok(())
}
