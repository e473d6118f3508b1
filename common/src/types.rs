//! 解析APIとやりとりする型定義
//!
//! - AnalyzeResponse: `/analyze-label` のレスポンスボディ
//! - AnalysisOutcome: レスポンスを解釈した結果（受理 / 却下）
//! - AnalysisRow: 表示用の1行（カテゴリ + 指示）

use crate::error::AnalysisError;
use crate::parser::parse_analysis_rows;
use crate::preview::to_data_uri;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// サーバーがメッセージを返さなかった場合の却下メッセージ
pub const DEFAULT_INVALID_MESSAGE: &str = "Sorry, no valid laundry care symbols are identified.";

/// `valid: true` なのに解析結果がない場合のメッセージ
pub const MISSING_ANALYSIS_MESSAGE: &str = "No analysis received from server";

/// 表示用の1行
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRow {
    pub category: String,
    pub instruction: String,
}

impl AnalysisRow {
    pub fn new(category: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            instruction: instruction.into(),
        }
    }
}

/// 非2xxレスポンスのボディ（FastAPI形式）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

/// `/analyze-label` のレスポンス
///
/// `valid` と `instructions` は型を決め打ちせず受け取り、解釈時に判定する
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub valid: Option<Value>,

    /// `## カテゴリ` / `• [指示]` 形式のテキスト
    #[serde(default)]
    pub analysis: Option<String>,

    /// 構造化された行リスト（対応サーバーのみ）
    #[serde(default)]
    pub instructions: Option<Value>,

    #[serde(default)]
    pub message: Option<String>,
}

impl AnalyzeResponse {
    /// 2xxレスポンスボディをパース
    pub fn from_body(body: &str) -> Result<Self, AnalysisError> {
        serde_json::from_str(body)
            .map_err(|e| AnalysisError::Malformed(format!("Invalid response from server: {}", e)))
    }

    /// `valid` が真として扱える値か
    ///
    /// `false` / `null` / `0` / `""` / 欠落は偽
    pub fn is_valid(&self) -> bool {
        match &self.valid {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }

    /// 構造化された行（形式が違えば無視）
    pub fn structured_rows(&self) -> Option<Vec<AnalysisRow>> {
        let value = self.instructions.clone()?;
        serde_json::from_value::<Vec<AnalysisRow>>(value)
            .ok()
            .filter(|rows| !rows.is_empty())
    }

    /// 受理 / 却下 / 不正レスポンスに振り分ける
    pub fn into_outcome(self) -> Result<AnalysisOutcome, AnalysisError> {
        if !self.is_valid() {
            let message = self
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_INVALID_MESSAGE.to_string());
            return Ok(AnalysisOutcome::Rejected { message });
        }

        let structured = self.structured_rows();
        let text = self
            .analysis
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| AnalysisError::Malformed(MISSING_ANALYSIS_MESSAGE.to_string()))?;

        Ok(AnalysisOutcome::Accepted(AnalysisReport { text, structured }))
    }
}

/// 解析結果の解釈
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// 洗濯表示として認識された
    Accepted(AnalysisReport),
    /// 洗濯表示ではないと判定された
    Rejected { message: String },
}

/// 受理された解析結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<Vec<AnalysisRow>>,
}

impl AnalysisReport {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured: None,
        }
    }

    /// 表示行（構造化データを優先し、なければテキストを毎回パース）
    pub fn rows(&self) -> Vec<AnalysisRow> {
        match &self.structured {
            Some(rows) => rows.clone(),
            None => parse_analysis_rows(&self.text),
        }
    }
}

/// ユーザーが選択した画像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedImage {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// プレビュー用のdata URI
    pub fn preview_data_uri(&self) -> String {
        to_data_uri(&self.mime_type, &self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// `/health` のレスポンス
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: String,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// 1ファイル分の解析結果（`--output` で保存）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelReport {
    pub file_name: String,

    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,

    #[serde(default)]
    pub rows: Vec<AnalysisRow>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// 解析日時（RFC3339）
    #[serde(default)]
    pub analyzed_at: String,
}
