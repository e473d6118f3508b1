//! エラー型定義

use thiserror::Error;

/// 1回の解析リクエストの失敗
///
/// Displayはそのままエラーバナーに表示される文言
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// 接続失敗・タイムアウトなど
    #[error("Network error: {0}")]
    Transport(String),

    /// 非2xxレスポンス
    #[error("{message}")]
    Server { status: u16, message: String },

    /// 2xxだが期待するフィールドがない
    #[error("{0}")]
    Malformed(String),
}

impl AnalysisError {
    /// 非2xxレスポンスからエラーを組み立てる
    ///
    /// ボディに `detail` があればその文言、なければステータスコードを含む汎用メッセージ
    pub fn from_status(status: u16, reason: Option<&str>, body: &str) -> Self {
        let detail = serde_json::from_str::<crate::types::ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .filter(|d| !d.is_empty());

        let message = match detail {
            Some(detail) => detail,
            None => match reason {
                Some(reason) => format!("Server error: {} {}", status, reason),
                None => format!("Server error: {}", status),
            },
        };

        AnalysisError::Server { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            AnalysisError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}
