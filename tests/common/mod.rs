#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use quiz_chain_solver::{Config, ContentFetcher, Credentials, FetchError};

/// 按 URL 返回预设页面的渲染器，记录调用次数和打开的会话数
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, String>,
    delay: Duration,
    calls: AtomicUsize,
    fetched: std::sync::Mutex<Vec<String>>,
    open_sessions: Arc<AtomicUsize>,
    max_open_sessions: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// 每次渲染前等待的时间
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    pub fn max_open_sessions(&self) -> usize {
        self.max_open_sessions.load(Ordering::SeqCst)
    }
}

/// 模拟渲染会话，Drop 时释放
struct SessionGuard {
    open: Arc<AtomicUsize>,
}

impl SessionGuard {
    fn open(open: &Arc<AtomicUsize>, max: &Arc<AtomicUsize>) -> Self {
        let now = open.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self {
            open: Arc::clone(open),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContentFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(url.to_string());
        let _session = SessionGuard::open(&self.open_sessions, &self.max_open_sessions);

        let render = async {
            tokio::time::sleep(self.delay).await;
            self.pages.get(url).cloned().ok_or_else(|| {
                FetchError::navigation(
                    url,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no such page"),
                )
            })
        };

        match tokio::time::timeout(timeout, render).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout_secs: timeout.as_secs(),
            }),
        }
    }
}

/// 指令以 atob 形式藏在脚本里，URL 作为普通链接放在页面上
pub fn quiz_page(instructions: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!("<a href=\"{}\">link</a>\n", l))
        .collect();
    format!(
        r##"<html><head></head><body>
<div id="result"></div>
{anchors}<script>
  document.querySelector("#result").innerHTML = atob(`{payload}`);
</script>
</body></html>"##,
        anchors = anchors,
        payload = STANDARD.encode(instructions)
    )
}

pub fn credentials() -> Credentials {
    Credentials::new("student@example.com", "s3cret")
}

pub fn test_config() -> Config {
    Config {
        navigation_timeout_secs: 1,
        download_timeout_secs: 5,
        submit_timeout_secs: 5,
        ..Config::default()
    }
}
