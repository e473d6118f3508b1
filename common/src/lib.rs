//! Laundry Advisor Common Library
//!
//! CLIと他のフロントエンドで共有される型と状態遷移

pub mod error;
pub mod parser;
pub mod preview;
pub mod session;
pub mod types;

pub use error::AnalysisError;
pub use parser::{parse_analysis_rows, CATEGORY_MARKER, INSTRUCTION_MARKER};
pub use preview::{abbreviate_data_uri, to_data_uri};
pub use session::{
    Applied, RequestTicket, SessionState, Status, TransitionDelays, TransitionKind, UploadSession,
};
pub use types::{
    AnalysisOutcome, AnalysisReport, AnalysisRow, AnalyzeResponse, HealthResponse, LabelReport,
    SelectedImage, DEFAULT_INVALID_MESSAGE,
};
