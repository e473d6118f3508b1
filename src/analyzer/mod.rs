//! 解析バックエンド
//!
//! 画像を外部の解析サービスに送り、結果を `AnalysisOutcome` として返す。

mod http;

pub use http::{HttpBackend, ANALYZE_PATH, FILE_FIELD, HEALTH_PATH};

use laundry_advisor_common::{AnalysisError, AnalysisOutcome, HealthResponse, SelectedImage};
use std::future::Future;

/// 解析サービスへの接続口
///
/// コントローラーはこのトレイト越しにだけバックエンドを呼ぶ
pub trait AnalysisBackend: Send + Sync + 'static {
    /// 1枚の画像を解析
    fn analyze(
        &self,
        image: &SelectedImage,
    ) -> impl Future<Output = Result<AnalysisOutcome, AnalysisError>> + Send;

    /// 死活確認
    fn health(&self) -> impl Future<Output = Result<HealthResponse, AnalysisError>> + Send;
}
