use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::Credentials;

/// 程序配置
///
/// 加载顺序：默认值 → TOML 文件（可选）→ 环境变量
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 浏览器配置 ---
    /// Chromium 可执行文件路径，为空时由 chromiumoxide 自动查找
    pub chrome_executable: Option<String>,
    /// 已运行浏览器的调试端口，设置后直接连接而不是启动新浏览器
    pub browser_debug_port: Option<u16>,
    /// 是否以无头模式启动
    pub headless: bool,

    // --- 超时配置（秒） ---
    pub navigation_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub submit_timeout_secs: u64,
    /// 单条链的总预算，刻意短于调用方 180 秒的外部限制
    pub chain_budget_secs: u64,
    /// 调度层强制的墙钟上限
    pub wall_clock_cap_secs: u64,

    /// 同时运行的链数量
    pub max_concurrent_chains: usize,
    /// 没有规则命中时提交的默认答案
    pub default_answer: String,
    /// 无法识别的文件类型最多保留的字节数
    pub max_opaque_text_bytes: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,

    // --- 提交凭据 ---
    pub email: String,
    pub secret: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            browser_debug_port: None,
            headless: true,
            navigation_timeout_secs: 30,
            download_timeout_secs: 15,
            submit_timeout_secs: 15,
            chain_budget_secs: 160,
            wall_clock_cap_secs: 175,
            max_concurrent_chains: 1,
            default_answer: "42".to_string(),
            max_opaque_text_bytes: 64 * 1024,
            verbose_logging: false,
            email: String::new(),
            secret: String::new(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("chrome_executable", &self.chrome_executable)
            .field("browser_debug_port", &self.browser_debug_port)
            .field("headless", &self.headless)
            .field("navigation_timeout_secs", &self.navigation_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("submit_timeout_secs", &self.submit_timeout_secs)
            .field("chain_budget_secs", &self.chain_budget_secs)
            .field("wall_clock_cap_secs", &self.wall_clock_cap_secs)
            .field("max_concurrent_chains", &self.max_concurrent_chains)
            .field("default_answer", &self.default_answer)
            .field("max_opaque_text_bytes", &self.max_opaque_text_bytes)
            .field("verbose_logging", &self.verbose_logging)
            .field("email", &self.email)
            .field("secret", &"***")
            .finish()
    }
}

impl Config {
    /// 只从环境变量加载
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// 加载配置：如果给出 TOML 路径则以文件为基础，再叠加环境变量
    pub fn load(toml_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match toml_path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// 从 TOML 文件加载，缺失字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 用 `lookup` 提供的变量覆盖当前配置
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(v);
        }
        if let Some(port) = parse_var::<u16, _>(&lookup, "BROWSER_DEBUG_PORT", "u16")? {
            self.browser_debug_port = Some(port);
        }
        override_parsed(&lookup, "HEADLESS", "bool", &mut self.headless)?;
        override_parsed(
            &lookup,
            "NAVIGATION_TIMEOUT_SECS",
            "u64",
            &mut self.navigation_timeout_secs,
        )?;
        override_parsed(
            &lookup,
            "DOWNLOAD_TIMEOUT_SECS",
            "u64",
            &mut self.download_timeout_secs,
        )?;
        override_parsed(&lookup, "SUBMIT_TIMEOUT_SECS", "u64", &mut self.submit_timeout_secs)?;
        override_parsed(&lookup, "CHAIN_BUDGET_SECS", "u64", &mut self.chain_budget_secs)?;
        override_parsed(&lookup, "WALL_CLOCK_CAP_SECS", "u64", &mut self.wall_clock_cap_secs)?;
        override_parsed(
            &lookup,
            "MAX_CONCURRENT_CHAINS",
            "usize",
            &mut self.max_concurrent_chains,
        )?;
        override_parsed(
            &lookup,
            "MAX_OPAQUE_TEXT_BYTES",
            "usize",
            &mut self.max_opaque_text_bytes,
        )?;
        override_parsed(&lookup, "VERBOSE_LOGGING", "bool", &mut self.verbose_logging)?;
        if let Some(v) = lookup("DEFAULT_ANSWER") {
            self.default_answer = v;
        }
        if let Some(v) = lookup("QUIZ_EMAIL") {
            self.email = v;
        }
        if let Some(v) = lookup("QUIZ_SECRET") {
            self.secret = v;
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email.clone(), self.secret.clone())
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    pub fn chain_budget(&self) -> Duration {
        Duration::from_secs(self.chain_budget_secs)
    }

    pub fn wall_clock_cap(&self) -> Duration {
        Duration::from_secs(self.wall_clock_cap_secs)
    }
}

fn parse_var<T, F>(
    lookup: &F,
    var_name: &str,
    expected_type: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var_name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type,
            }),
    }
}

fn override_parsed<T, F>(
    lookup: &F,
    var_name: &str,
    expected_type: &'static str,
    slot: &mut T,
) -> Result<(), ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = parse_var(lookup, var_name, expected_type)? {
        *slot = value;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_budget_is_short_of_caller_limit() {
        let config = Config::default();
        assert!(config.chain_budget_secs < 180);
        assert!(config.wall_clock_cap_secs < 180);
        assert_eq!(config.default_answer, "42");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("CHAIN_BUDGET_SECS", "120"),
                ("BROWSER_DEBUG_PORT", "9222"),
                ("QUIZ_EMAIL", "someone@example.com"),
                ("HEADLESS", "false"),
            ]))
            .unwrap();

        assert_eq!(config.chain_budget_secs, 120);
        assert_eq!(config.browser_debug_port, Some(9222));
        assert_eq!(config.email, "someone@example.com");
        assert!(!config.headless);
        // 未覆盖的字段保持默认
        assert_eq!(config.submit_timeout_secs, 15);
    }

    #[test]
    fn test_env_override_parse_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup_from(&[("SUBMIT_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarParseFailed { .. }));
    }

    #[test]
    fn test_toml_partial_fields() {
        let config: Config = toml::from_str(
            r#"
            navigation_timeout_secs = 10
            default_answer = "0"
            "#,
        )
        .unwrap();
        assert_eq!(config.navigation_timeout_secs, 10);
        assert_eq!(config.default_answer, "0");
        assert_eq!(config.chain_budget_secs, 160);
    }

    #[test]
    fn test_debug_masks_secret() {
        let config = Config {
            secret: "hunter2".to_string(),
            ..Config::default()
        };
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
