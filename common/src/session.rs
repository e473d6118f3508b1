//! アップロードセッションの状態遷移
//!
//! 1回の画像選択 = 1セッション。新しい画像を選ぶとセッションは丸ごと置き換わり、
//! 世代番号が進む。古い世代のレスポンスや遷移タイマーは捨てられる。
//!
//! ```text
//! Idle ─begin→ Loading ─complete→ SuccessTransition ─settle→ Done
//!                        ├───────→ ErrorTransition ───settle→ Invalid
//!                        └───────→ Error
//! ```

use crate::error::AnalysisError;
use crate::types::{AnalysisOutcome, AnalysisReport, AnalysisRow, LabelReport, SelectedImage};
use std::sync::Arc;
use std::time::Duration;

/// 表示ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
    SuccessTransition,
    ErrorTransition,
    Invalid,
    Error,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Loading => "loading",
            Status::SuccessTransition => "success-transition",
            Status::ErrorTransition => "error-transition",
            Status::Invalid => "invalid",
            Status::Error => "error",
            Status::Done => "done",
        }
    }

    /// これ以上遷移しない状態か
    pub fn is_settled(&self) -> bool {
        matches!(self, Status::Idle | Status::Invalid | Status::Error | Status::Done)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// セッション状態（各状態が自分のデータだけを持つ）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Loading,
    SuccessTransition(AnalysisReport),
    ErrorTransition(String),
    Invalid(String),
    Error(String),
    Done(AnalysisReport),
}

impl SessionState {
    pub fn status(&self) -> Status {
        match self {
            SessionState::Idle => Status::Idle,
            SessionState::Loading => Status::Loading,
            SessionState::SuccessTransition(_) => Status::SuccessTransition,
            SessionState::ErrorTransition(_) => Status::ErrorTransition,
            SessionState::Invalid(_) => Status::Invalid,
            SessionState::Error(_) => Status::Error,
            SessionState::Done(_) => Status::Done,
        }
    }
}

/// 演出用の遷移の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// SuccessTransition → Done
    Success,
    /// ErrorTransition → Invalid
    Invalid,
}

/// 演出用の待ち時間
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionDelays {
    pub success: Duration,
    pub invalid: Duration,
}

impl TransitionDelays {
    pub const DEFAULT_SUCCESS_MS: u64 = 1000;
    pub const DEFAULT_INVALID_MS: u64 = 1500;

    pub fn from_millis(success_ms: u64, invalid_ms: u64) -> Self {
        Self {
            success: Duration::from_millis(success_ms),
            invalid: Duration::from_millis(invalid_ms),
        }
    }

    /// 待ち時間なし（即座に確定）
    pub fn none() -> Self {
        Self::from_millis(0, 0)
    }

    pub fn for_kind(&self, kind: TransitionKind) -> Duration {
        match kind {
            TransitionKind::Success => self.success,
            TransitionKind::Invalid => self.invalid,
        }
    }
}

impl Default for TransitionDelays {
    fn default() -> Self {
        Self::from_millis(Self::DEFAULT_SUCCESS_MS, Self::DEFAULT_INVALID_MS)
    }
}

/// リクエストの世代
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn from_generation(generation: u64) -> Self {
        Self(generation)
    }

    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// `complete` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// 古い世代のレスポンスなので無視した
    Stale,
    /// 確定状態（Error）に遷移した
    Final,
    /// 演出状態に遷移した。待ち時間後に `settle` が必要
    Transition(TransitionKind),
}

/// 1回の画像選択に対応するセッション
#[derive(Debug, Clone, Default)]
pub struct UploadSession {
    generation: u64,
    image: Option<Arc<SelectedImage>>,
    preview_data_uri: Option<String>,
    state: SessionState,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新しい画像でセッションを置き換え、Loadingに遷移
    pub fn begin(&mut self, image: SelectedImage) -> RequestTicket {
        let generation = self.generation + 1;
        let preview = image.preview_data_uri();
        *self = Self {
            generation,
            image: Some(Arc::new(image)),
            preview_data_uri: Some(preview),
            state: SessionState::Loading,
        };
        RequestTicket(generation)
    }

    /// レスポンスを反映
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        result: Result<AnalysisOutcome, AnalysisError>,
    ) -> Applied {
        if !self.is_current(ticket) || self.state != SessionState::Loading {
            return Applied::Stale;
        }

        match result {
            Ok(AnalysisOutcome::Accepted(report)) => {
                self.state = SessionState::SuccessTransition(report);
                Applied::Transition(TransitionKind::Success)
            }
            Ok(AnalysisOutcome::Rejected { message }) => {
                self.state = SessionState::ErrorTransition(message);
                Applied::Transition(TransitionKind::Invalid)
            }
            Err(err) => {
                self.state = SessionState::Error(err.to_string());
                Applied::Final
            }
        }
    }

    /// 演出状態を確定状態に進める
    ///
    /// 古い世代、または演出状態でなければ何もしない
    pub fn settle(&mut self, ticket: RequestTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        match std::mem::take(&mut self.state) {
            SessionState::SuccessTransition(report) => {
                self.state = SessionState::Done(report);
                true
            }
            SessionState::ErrorTransition(message) => {
                self.state = SessionState::Invalid(message);
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.generation && self.generation > 0
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.state.status()
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        self.image.as_deref()
    }

    pub fn preview_data_uri(&self) -> Option<&str> {
        self.preview_data_uri.as_deref()
    }

    /// 解析テキスト（Doneのときのみ）
    pub fn result_text(&self) -> Option<&str> {
        match &self.state {
            SessionState::Done(report) => Some(report.text.as_str()),
            _ => None,
        }
    }

    /// エラーメッセージ（Error / Invalidのときのみ）
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SessionState::Error(message) | SessionState::Invalid(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// 表示行（Doneのときのみ、毎回再計算）
    pub fn rows(&self) -> Vec<AnalysisRow> {
        match &self.state {
            SessionState::Done(report) => report.rows(),
            _ => Vec::new(),
        }
    }

    /// 保存用のレポート。確定していなければNone
    pub fn report(&self, analyzed_at: impl Into<String>) -> Option<LabelReport> {
        if !self.status().is_settled() {
            return None;
        }
        let image = self.image()?;

        Some(LabelReport {
            file_name: image.file_name.clone(),
            status: self.status().as_str().to_string(),
            analysis: self.result_text().map(str::to_string),
            rows: self.rows(),
            message: self.error_message().map(str::to_string),
            analyzed_at: analyzed_at.into(),
        })
    }
}
