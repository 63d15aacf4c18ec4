//! 隐藏指令解码 - 业务能力层
//!
//! 页面把题目指令以 base64 字面量的形式传给 `atob(...)` 之类的解码调用，
//! 这里负责找出这些字面量并还原出第一段合法文本

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use regex::Regex;
use tracing::debug;

use crate::utils::logging::truncate_text;

/// 解码调用：`atob("...")`、`base64.b64decode('...')` 等，字面量允许跨行
const DECODE_CALL_PATTERN: &str =
    r#"\b(?:atob|b64decode|base64decode|decode)\s*\(\s*["'`]([A-Za-z0-9+/=_\-\s]+)["'`]\s*\)"#;

/// 指令解码器
#[derive(Debug, Clone)]
pub struct PayloadDecoder {
    pattern: Regex,
}

impl PayloadDecoder {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(DECODE_CALL_PATTERN)?,
        })
    }

    /// 按出现顺序列出所有候选字面量
    pub fn candidates<'a>(&self, content: &'a str) -> Vec<&'a str> {
        self.pattern
            .captures_iter(content)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// 返回第一个能解码成合法文本的候选，全部失败时返回 `None`
    pub fn decode(&self, content: &str) -> Option<String> {
        for (index, literal) in self.candidates(content).into_iter().enumerate() {
            match decode_literal(literal) {
                Some(text) => {
                    debug!(
                        "✓ 第 {} 个候选解码成功: {}",
                        index + 1,
                        truncate_text(&text, 80)
                    );
                    return Some(text);
                }
                None => debug!("第 {} 个候选解码失败，尝试下一个", index + 1),
            }
        }
        None
    }
}

/// 解码单个字面量，忽略其中的空白，兼容标准 / URL 安全字母表以及缺失的填充
fn decode_literal(literal: &str) -> Option<String> {
    let compact: String = literal.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    let bytes = [&STANDARD, &STANDARD_NO_PAD, &URL_SAFE, &URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(compact.as_bytes()).ok())?;

    let text = String::from_utf8(bytes).ok()?;
    if text.trim().is_empty() || text.contains('\0') {
        return None;
    }
    Some(text)
}
