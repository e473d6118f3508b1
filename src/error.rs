use laundry_advisor_common::AnalysisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaundryError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("BACKEND_URLが設定されていません。`laundry-advisor config --set-backend-url URL` で設定するか環境変数 BACKEND_URL を指定してください")]
    MissingBackendUrl,

    #[error("BACKEND_URLが不正です: {0}")]
    InvalidBackendUrl(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("空のファイルです: {0}")]
    EmptyFile(String),

    #[error("画像ファイルではありません: {0}")]
    UnsupportedFile(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("HTTPクライアントエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("解析エラー: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("解析に失敗しました: {failed}/{total}件")]
    AnalysisFailed { failed: usize, total: usize },

    #[error("コントローラーが停止しています")]
    ControllerStopped,

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LaundryError>;
