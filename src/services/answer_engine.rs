//! 答案计算 - 业务能力层
//!
//! 根据解码后的指令和数据文件计算答案。
//! 规则表按固定顺序匹配，第一个命中且能算出结果的规则生效：
//!
//! 1. sum / summed → 指令中点名的数值列（没有则取第一个数值列）求和
//! 2. count / counts / how many → 行数；PDF 文本且提到 word 时为单词数
//! 3. average / averaged / mean → 第一个数值列的平均值，保留两位小数
//! 4. max / maximum → 第一个数值列的最大值
//! 5. min / minimum → 第一个数值列的最小值
//! 6. 都不命中 → 默认答案

use tracing::{debug, info, warn};

use crate::models::{AnswerValue, Deadline};
use crate::services::artifact::{words, ArtifactFetcher, DataArtifact};

/// 指令中的线索（小写文本 + 切词结果）
struct Cues {
    lower: String,
    words: Vec<String>,
}

impl Cues {
    fn new(instructions: &str) -> Self {
        let lower = instructions.to_lowercase();
        let words = words(&lower);
        Self { lower, words }
    }

    fn has_any_word(&self, candidates: &[&str]) -> bool {
        self.words.iter().any(|w| candidates.contains(&w.as_str()))
    }

    fn has_phrase(&self, phrase: &str) -> bool {
        self.lower.contains(phrase)
    }
}

// 按整词匹配，词形变化逐一列出（"determine" 不算 min）
const SUM_CUES: &[&str] = &["sum", "sums", "summed", "summing", "summation"];
const COUNT_CUES: &[&str] = &["count", "counts", "counted", "counting"];
const MEAN_CUES: &[&str] = &["average", "averages", "averaged", "averaging", "mean"];
const MAX_CUES: &[&str] = &["max", "maximum", "maximal", "maximums"];
const MIN_CUES: &[&str] = &["min", "minimum", "minimal", "minimums"];

type Rule = fn(&Cues, &DataArtifact) -> Option<AnswerValue>;

/// 规则表，顺序即优先级
const RULES: &[(&str, Rule)] = &[
    ("sum", sum_rule),
    ("count", count_rule),
    ("mean", mean_rule),
    ("max", max_rule),
    ("min", min_rule),
];

/// 按规则表计算答案，没有规则命中时返回 `None`
pub fn derive_answer(instructions: &str, artifact: &DataArtifact) -> Option<AnswerValue> {
    let cues = Cues::new(instructions);
    RULES.iter().find_map(|(name, rule)| {
        let answer = rule(&cues, artifact)?;
        debug!("规则 {} 命中，答案: {}", name, answer);
        Some(answer)
    })
}

fn sum_rule(cues: &Cues, artifact: &DataArtifact) -> Option<AnswerValue> {
    if !cues.has_any_word(SUM_CUES) {
        return None;
    }
    let table = artifact.table()?;
    let (_, values) = table
        .numeric_column_named_in(&cues.words)
        .or_else(|| table.first_numeric_column())?;
    Some(AnswerValue::from_f64(values.iter().sum()))
}

fn count_rule(cues: &Cues, artifact: &DataArtifact) -> Option<AnswerValue> {
    if !cues.has_any_word(COUNT_CUES) && !cues.has_phrase("how many") {
        return None;
    }
    if let Some(text) = artifact.document_text() {
        if cues.has_any_word(&["word", "words"]) {
            return Some(AnswerValue::Integer(text.split_whitespace().count() as i64));
        }
    }
    let table = artifact.table()?;
    Some(AnswerValue::Integer(table.row_count() as i64))
}

fn mean_rule(cues: &Cues, artifact: &DataArtifact) -> Option<AnswerValue> {
    if !cues.has_any_word(MEAN_CUES) {
        return None;
    }
    let (_, values) = artifact.table()?.first_numeric_column()?;
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some(AnswerValue::from_f64((mean * 100.0).round() / 100.0))
}

fn max_rule(cues: &Cues, artifact: &DataArtifact) -> Option<AnswerValue> {
    if !cues.has_any_word(MAX_CUES) {
        return None;
    }
    let (_, values) = artifact.table()?.first_numeric_column()?;
    values
        .into_iter()
        .reduce(f64::max)
        .map(AnswerValue::from_f64)
}

fn min_rule(cues: &Cues, artifact: &DataArtifact) -> Option<AnswerValue> {
    if !cues.has_any_word(MIN_CUES) {
        return None;
    }
    let (_, values) = artifact.table()?.first_numeric_column()?;
    values
        .into_iter()
        .reduce(f64::min)
        .map(AnswerValue::from_f64)
}

/// 答案引擎：下载 → 解析 → 规则计算，任何失败都退回默认答案
pub struct AnswerEngine {
    fetcher: ArtifactFetcher,
    default_answer: String,
}

impl AnswerEngine {
    pub fn new(fetcher: ArtifactFetcher, default_answer: impl Into<String>) -> Self {
        Self {
            fetcher,
            default_answer: default_answer.into(),
        }
    }

    pub fn default_answer(&self) -> AnswerValue {
        AnswerValue::text(self.default_answer.clone())
    }

    /// 数据文件的下载受 `deadline` 约束，超时同样退回默认答案
    pub async fn compute(
        &self,
        instructions: Option<&str>,
        data_file: Option<&str>,
        deadline: &Deadline,
    ) -> AnswerValue {
        let Some(reference) = data_file else {
            info!("未找到数据文件，使用默认答案 {}", self.default_answer);
            return self.default_answer();
        };

        match self.fetcher.load(reference, deadline).await {
            Ok(artifact) => self.derive(instructions.unwrap_or_default(), &artifact),
            Err(e) => {
                warn!("⚠️ 数据文件处理失败，使用默认答案: {}", e);
                self.default_answer()
            }
        }
    }

    /// 对已解析的数据制品应用规则表
    pub fn derive(&self, instructions: &str, artifact: &DataArtifact) -> AnswerValue {
        derive_answer(instructions, artifact).unwrap_or_else(|| {
            info!("没有规则命中，使用默认答案 {}", self.default_answer);
            self.default_answer()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::artifact::Table;

    fn csv(text: &str) -> DataArtifact {
        DataArtifact::Tabular(Table::from_csv(text.as_bytes()).unwrap())
    }

    #[test]
    fn test_sum_of_named_column() {
        let data = csv("value\n1\n2\n3\n4\n");
        assert_eq!(
            derive_answer("Find the sum of column value", &data),
            Some(AnswerValue::Integer(10))
        );
    }

    #[test]
    fn test_sum_prefers_named_over_first_numeric() {
        let data = csv("id,amount\n1,1.5\n2,2.25\n");
        assert_eq!(
            derive_answer("What is the SUM of the amount column?", &data),
            Some(AnswerValue::Number(3.75))
        );
        assert_eq!(
            derive_answer("sum everything", &data),
            Some(AnswerValue::Integer(3))
        );
    }

    #[test]
    fn test_how_many_rows() {
        let data = csv("a\n1\n2\n3\n4\n5\n6\n7\n");
        assert_eq!(derive_answer("How many rows?", &data), Some(AnswerValue::Integer(7)));
    }

    #[test]
    fn test_word_count_of_document_text() {
        let data = DataArtifact::DocumentText("the quick  brown\nfox".to_string());
        assert_eq!(
            derive_answer("Count the words in the PDF", &data),
            Some(AnswerValue::Integer(4))
        );
        // 没有提到 word 时 PDF 没有表格，计数规则不命中
        assert_eq!(derive_answer("count it", &data), None);
    }

    #[test]
    fn test_mean_rounded() {
        let data = csv("x\n1\n2\n2\n");
        assert_eq!(
            derive_answer("What is the average?", &data),
            Some(AnswerValue::Number(1.67))
        );
    }

    #[test]
    fn test_max_and_min() {
        let data = csv("label,score\na,3\nb,-1\nc,8\n");
        assert_eq!(derive_answer("the maximum score", &data), Some(AnswerValue::Integer(8)));
        assert_eq!(derive_answer("give the min", &data), Some(AnswerValue::Integer(-1)));
        // "determine" 中的 min 不算
        assert_eq!(derive_answer("determine the answer", &data), None);
    }

    #[test]
    fn test_inflected_cues() {
        let data = csv("v\n2\n4\n");
        assert_eq!(derive_answer("The values, summed", &data), Some(AnswerValue::Integer(6)));
        assert_eq!(derive_answer("Sums of v please", &data), Some(AnswerValue::Integer(6)));
        assert_eq!(derive_answer("how the rows counts", &data), Some(AnswerValue::Integer(2)));
        assert_eq!(derive_answer("v averaged", &data), Some(AnswerValue::Integer(3)));
        assert_eq!(derive_answer("the maximal v", &data), Some(AnswerValue::Integer(4)));
        assert_eq!(derive_answer("minimal v", &data), Some(AnswerValue::Integer(2)));
        // 只是包含 cue 字母的词不算
        assert_eq!(derive_answer("summary of accounts", &data), None);
    }

    #[test]
    fn test_precedence_sum_before_count() {
        let data = csv("v\n5\n6\n");
        assert_eq!(
            derive_answer("count the rows then sum them", &data),
            Some(AnswerValue::Integer(11))
        );
    }

    #[test]
    fn test_rule_falls_through_without_numeric_column() {
        let data = csv("name\nalpha\nbeta\n");
        // sum 没有数值列可用，继续匹配 count
        assert_eq!(
            derive_answer("sum or count the names", &data),
            Some(AnswerValue::Integer(2))
        );
    }

    #[test]
    fn test_structured_records_are_aggregated() {
        let data = DataArtifact::Structured(serde_json::json!([
            {"name": "a", "value": 4},
            {"name": "b", "value": 6}
        ]));
        assert_eq!(derive_answer("sum of value", &data), Some(AnswerValue::Integer(10)));
    }

    #[test]
    fn test_deterministic() {
        let data = csv("value\n1.25\n2.5\n");
        let first = derive_answer("mean value", &data);
        for _ in 0..5 {
            assert_eq!(derive_answer("mean value", &data), first);
        }
    }
}
