//! 数据文件 - 业务能力层
//!
//! 负责下载数据文件并按扩展名解析成内存中的数据制品（DataArtifact）

use std::borrow::Cow;
use std::time::Duration;

use phf::phf_map;
use serde_json::Value as JsonValue;
use tracing::{debug, info};
use url::Url;

use crate::error::ArtifactError;
use crate::models::Deadline;
use crate::utils::logging::truncate_text;

/// 数据制品类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Tabular,
    DocumentText,
    Structured,
    OpaqueText,
}

/// 可识别的数据文件扩展名
static EXTENSION_KINDS: phf::Map<&'static str, ArtifactKind> = phf_map! {
    "csv" => ArtifactKind::Tabular,
    "pdf" => ArtifactKind::DocumentText,
    "json" => ArtifactKind::Structured,
    "xlsx" => ArtifactKind::OpaqueText,
    "txt" => ArtifactKind::OpaqueText,
};

impl ArtifactKind {
    /// 按路径扩展名识别，路径需已转为小写；不是数据文件时返回 `None`
    pub fn from_path(lower_path: &str) -> Option<Self> {
        let file_name = lower_path.rsplit('/').next()?;
        let (_, extension) = file_name.rsplit_once('.')?;
        EXTENSION_KINDS.get(extension).copied()
    }

    /// 数据文件引用对应的解析方式，无法识别的一律按文本处理
    pub fn for_reference(reference: &str) -> Self {
        Url::parse(reference)
            .ok()
            .and_then(|url| Self::from_path(&url.path().to_ascii_lowercase()))
            .unwrap_or(ArtifactKind::OpaqueText)
    }

    pub fn name(self) -> &'static str {
        match self {
            ArtifactKind::Tabular => "CSV",
            ArtifactKind::DocumentText => "PDF",
            ArtifactKind::Structured => "JSON",
            ArtifactKind::OpaqueText => "文本",
        }
    }
}

/// 表格数据：表头 + 按行存放的单元格
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// 解析带表头的 CSV
    pub fn from_csv(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(|e| ArtifactError::parse("CSV", e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ArtifactError::parse("CSV", e.to_string()))?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    /// JSON 对象数组视为表格，表头按键首次出现的顺序排列
    pub fn from_json_records(value: &JsonValue) -> Option<Self> {
        let records = value.as_array()?;
        if records.is_empty() || !records.iter().all(JsonValue::is_object) {
            return None;
        }

        let mut headers: Vec<String> = Vec::new();
        for record in records.iter().filter_map(JsonValue::as_object) {
            for key in record.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .filter_map(JsonValue::as_object)
            .map(|record| {
                headers
                    .iter()
                    .map(|h| match record.get(h) {
                        None | Some(JsonValue::Null) => String::new(),
                        Some(JsonValue::String(s)) => s.clone(),
                        Some(other) => other.to_string(),
                    })
                    .collect()
            })
            .collect();

        Some(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 数值列：所有非空单元格都能解析成数字，且至少有一个非空单元格
    pub fn numeric_column(&self, index: usize) -> Option<Vec<f64>> {
        let mut values = Vec::new();
        for row in &self.rows {
            let cell = row.get(index).map(String::as_str).unwrap_or_default();
            if cell.trim().is_empty() {
                continue;
            }
            values.push(parse_number(cell)?);
        }
        (!values.is_empty()).then_some(values)
    }

    pub fn first_numeric_column(&self) -> Option<(usize, Vec<f64>)> {
        (0..self.headers.len()).find_map(|i| self.numeric_column(i).map(|v| (i, v)))
    }

    /// 表头在指令中出现（按词匹配）的第一个数值列
    pub fn numeric_column_named_in(&self, instruction_words: &[String]) -> Option<(usize, Vec<f64>)> {
        self.headers.iter().enumerate().find_map(|(i, header)| {
            let header_words = words(&header.to_lowercase());
            if header_words.is_empty() || !contains_sequence(instruction_words, &header_words) {
                return None;
            }
            self.numeric_column(i).map(|v| (i, v))
        })
    }
}

/// 解析后的数据制品，只属于创建它的那一步
#[derive(Debug, Clone, PartialEq)]
pub enum DataArtifact {
    Tabular(Table),
    DocumentText(String),
    Structured(JsonValue),
    OpaqueText(String),
}

impl DataArtifact {
    /// 按类别解析下载到的字节
    pub fn parse(
        kind: ArtifactKind,
        bytes: &[u8],
        max_opaque_text_bytes: usize,
    ) -> Result<Self, ArtifactError> {
        match kind {
            ArtifactKind::Tabular => Table::from_csv(bytes).map(DataArtifact::Tabular),
            ArtifactKind::DocumentText => pdf_extract::extract_text_from_mem(bytes)
                .map(DataArtifact::DocumentText)
                .map_err(|e| ArtifactError::parse("PDF", e.to_string())),
            ArtifactKind::Structured => serde_json::from_slice(bytes)
                .map(DataArtifact::Structured)
                .map_err(|e| ArtifactError::parse("JSON", e.to_string())),
            ArtifactKind::OpaqueText => {
                let text = String::from_utf8_lossy(bytes);
                Ok(DataArtifact::OpaqueText(
                    truncate_bytes(&text, max_opaque_text_bytes).to_string(),
                ))
            }
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            DataArtifact::Tabular(_) => ArtifactKind::Tabular,
            DataArtifact::DocumentText(_) => ArtifactKind::DocumentText,
            DataArtifact::Structured(_) => ArtifactKind::Structured,
            DataArtifact::OpaqueText(_) => ArtifactKind::OpaqueText,
        }
    }

    /// 表格视图：CSV 本身，或由对象数组构成的 JSON
    pub fn table(&self) -> Option<Cow<'_, Table>> {
        match self {
            DataArtifact::Tabular(table) => Some(Cow::Borrowed(table)),
            DataArtifact::Structured(value) => Table::from_json_records(value).map(Cow::Owned),
            _ => None,
        }
    }

    /// PDF 文本
    pub fn document_text(&self) -> Option<&str> {
        match self {
            DataArtifact::DocumentText(text) => Some(text),
            _ => None,
        }
    }
}

/// 数据文件下载器
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_opaque_text_bytes: usize,
}

impl ArtifactFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration, max_opaque_text_bytes: usize) -> Self {
        Self {
            client,
            timeout,
            max_opaque_text_bytes,
        }
    }

    /// 下载原始字节
    pub async fn download(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, ArtifactError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| ArtifactError::Download {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArtifactError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ArtifactError::Download {
                url: url.to_string(),
                source,
            })?;
        Ok(bytes.to_vec())
    }

    /// 下载并解析，解析放在阻塞线程中进行
    ///
    /// 下载超时取配置值和截止时间剩余量中较小者
    pub async fn load(&self, url: &str, deadline: &Deadline) -> Result<DataArtifact, ArtifactError> {
        let kind = ArtifactKind::for_reference(url);
        let timeout = deadline.cap(self.timeout);
        info!(
            "📥 下载{}数据文件 (超时 {:.1}s): {}",
            kind.name(),
            timeout.as_secs_f64(),
            url
        );

        let bytes = self.download(url, timeout).await?;
        debug!("已下载 {} 字节", bytes.len());

        let max_opaque = self.max_opaque_text_bytes;
        // PDF 解析器遇到损坏文件可能 panic，放进阻塞任务后会变成 JoinError
        let artifact = tokio::task::spawn_blocking(move || DataArtifact::parse(kind, &bytes, max_opaque))
            .await
            .map_err(|e| ArtifactError::parse(kind.name(), e.to_string()))??;

        if let Some(text) = artifact.document_text() {
            debug!("PDF 文本预览: {}", truncate_text(text, 80));
        }
        Ok(artifact)
    }
}

/// 按字节数截断，保证落在字符边界上
fn truncate_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// 数字单元格：去掉千分位逗号和前导货币符号
pub(crate) fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 小写文本按字母数字切词
pub(crate) fn words(lower_text: &str) -> Vec<String> {
    lower_text
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_sequence(haystack: &[String], needle: &[String]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(ArtifactKind::from_path("/files/data.csv"), Some(ArtifactKind::Tabular));
        assert_eq!(ArtifactKind::from_path("/doc.pdf"), Some(ArtifactKind::DocumentText));
        assert_eq!(ArtifactKind::from_path("/a.json"), Some(ArtifactKind::Structured));
        assert_eq!(ArtifactKind::from_path("/notes.txt"), Some(ArtifactKind::OpaqueText));
        assert_eq!(ArtifactKind::from_path("/v1.2/page"), None);
        assert_eq!(ArtifactKind::from_path("/submit"), None);
        assert_eq!(
            ArtifactKind::for_reference("https://q.example/Data.CSV?x=1"),
            ArtifactKind::Tabular
        );
        assert_eq!(
            ArtifactKind::for_reference("https://q.example/blob"),
            ArtifactKind::OpaqueText
        );
    }

    #[test]
    fn test_csv_numeric_columns() {
        let table = Table::from_csv(b"name,value,price\na,1,\"$1,000\"\nb,2,20\n\nc,3,x\n").unwrap();
        assert_eq!(table.headers(), &["name", "value", "price"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.numeric_column(0), None);
        assert_eq!(table.numeric_column(1), Some(vec![1.0, 2.0, 3.0]));
        // 含有非数字单元格的列不是数值列
        assert_eq!(table.numeric_column(2), None);
        assert_eq!(table.first_numeric_column().map(|(i, _)| i), Some(1));
    }

    #[test]
    fn test_named_column_match_uses_words() {
        let table = Table::from_csv(b"id,unit price,qty\n1,2.5,4\n2,3.5,6\n").unwrap();
        let question = words("what is the sum of the unit price column?");
        assert_eq!(table.numeric_column_named_in(&question).map(|(i, _)| i), Some(1));

        // "id" 只作为其他单词的一部分出现时不算命中
        let question = words("consider the identity of qty");
        assert_eq!(table.numeric_column_named_in(&question).map(|(i, _)| i), Some(2));
    }

    #[test]
    fn test_json_records_table_view() {
        let artifact = DataArtifact::parse(
            ArtifactKind::Structured,
            br#"[{"city":"A","score":10},{"city":"B","score":null},{"city":"C","score":5,"extra":true}]"#,
            1024,
        )
        .unwrap();
        let table = artifact.table().unwrap();
        assert_eq!(table.headers(), &["city", "score", "extra"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.numeric_column(1), Some(vec![10.0, 5.0]));

        let scalar = DataArtifact::parse(ArtifactKind::Structured, b"{\"answer\": 1}", 1024).unwrap();
        assert!(scalar.table().is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            DataArtifact::parse(ArtifactKind::Structured, b"{not json", 1024),
            Err(ArtifactError::Parse { kind: "JSON", .. })
        ));
        assert!(matches!(
            DataArtifact::parse(ArtifactKind::DocumentText, b"not a pdf", 1024),
            Err(ArtifactError::Parse { kind: "PDF", .. })
        ));
    }

    #[test]
    fn test_opaque_text_truncated_on_char_boundary() {
        let artifact = DataArtifact::parse(ArtifactKind::OpaqueText, "héllo".as_bytes(), 2).unwrap();
        assert_eq!(artifact, DataArtifact::OpaqueText("h".to_string()));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 1,234.5 "), Some(1234.5));
        assert_eq!(parse_number("$7"), Some(7.0));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_table_from_non_records() {
        assert!(Table::from_json_records(&json!([1, 2, 3])).is_none());
        assert!(Table::from_json_records(&json!([])).is_none());
    }
}
