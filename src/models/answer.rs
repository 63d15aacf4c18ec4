use std::fmt;

use serde::Serialize;

/// 提交给服务端的答案
///
/// 序列化时不带标签：整数 → JSON 整数，小数 → JSON 数字，文本 → JSON 字符串
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl AnswerValue {
    /// 数值答案：整数值输出为整数，否则保留小数
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite()
            && value.fract() == 0.0
            && value >= i64::MIN as f64
            && value <= i64::MAX as f64
        {
            AnswerValue::Integer(value as i64)
        } else {
            AnswerValue::Number(value)
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        AnswerValue::Text(value.into())
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Integer(v) => write!(f, "{}", v),
            AnswerValue::Number(v) => write!(f, "{}", v),
            AnswerValue::Text(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integral_values_become_integers() {
        assert_eq!(AnswerValue::from_f64(10.0), AnswerValue::Integer(10));
        assert_eq!(AnswerValue::from_f64(-3.0), AnswerValue::Integer(-3));
        assert_eq!(AnswerValue::from_f64(2.5), AnswerValue::Number(2.5));
    }

    #[test]
    fn test_serializes_untagged() {
        assert_eq!(serde_json::to_value(AnswerValue::Integer(7)).unwrap(), json!(7));
        assert_eq!(serde_json::to_value(AnswerValue::Number(2.75)).unwrap(), json!(2.75));
        assert_eq!(serde_json::to_value(AnswerValue::text("42")).unwrap(), json!("42"));
    }
}
