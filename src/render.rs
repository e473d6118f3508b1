//! 端末表示
//!
//! セッション状態をテキストに整形し、ローディング中はスピナーを出す。

use indicatif::{ProgressBar, ProgressStyle};
use laundry_advisor_common::preview::abbreviate_data_uri;
use laundry_advisor_common::{AnalysisRow, SessionState, Status, UploadSession};
use std::time::Duration;

const CATEGORY_HEADER: &str = "Category";
const INSTRUCTION_HEADER: &str = "Instruction";
const PREVIEW_CHARS: usize = 48;

/// 2列の表に整形
pub fn format_table(rows: &[AnalysisRow]) -> String {
    let width = rows
        .iter()
        .map(|r| r.category.chars().count())
        .chain(std::iter::once(CATEGORY_HEADER.len()))
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!("{:<width$} | {}", CATEGORY_HEADER, INSTRUCTION_HEADER, width = width));
    lines.push(format!("{}-+-{}", "-".repeat(width), "-".repeat(INSTRUCTION_HEADER.len())));
    for row in rows {
        lines.push(format!("{:<width$} | {}", row.category, row.instruction, width = width));
    }
    lines.join("\n")
}

/// 状態ごとの1行メッセージ
pub fn status_line(session: &UploadSession) -> String {
    match session.state() {
        SessionState::Idle => "画像を選択してください".to_string(),
        SessionState::Loading => "Analyzing image...".to_string(),
        SessionState::SuccessTransition(_) => "✔ Analysis complete".to_string(),
        SessionState::ErrorTransition(_) => "✖ Care label not recognized".to_string(),
        SessionState::Invalid(message) => format!("⚠ {}", message),
        SessionState::Error(message) => format!("Error: {}", message),
        SessionState::Done(_) => "Washing Instructions:".to_string(),
    }
}

/// 確定状態の表示ブロック
///
/// Doneで行が取れない場合は生テキストをそのまま出す
pub fn render_session(session: &UploadSession, backend_url: Option<&str>) -> String {
    let mut out = status_line(session);

    match session.status() {
        Status::Done => {
            let rows = session.rows();
            out.push('\n');
            if rows.is_empty() {
                out.push_str(session.result_text().unwrap_or_default());
            } else {
                out.push_str(&format_table(&rows));
            }
        }
        Status::Error => {
            if let Some(url) = backend_url {
                out.push_str(&format!("\nPlease make sure the backend server is running at {}", url));
            }
        }
        _ => {}
    }

    out
}

/// プレビュー行（ファイル名・サイズ・data URI先頭）
pub fn preview_line(session: &UploadSession) -> Option<String> {
    let image = session.image()?;
    let uri = session.preview_data_uri()?;
    Some(format!(
        "📷 {} ({} bytes, {}) {}",
        image.file_name,
        image.len(),
        image.mime_type,
        abbreviate_data_uri(uri, PREVIEW_CHARS)
    ))
}

/// 状態変化を端末に出力する
pub struct TerminalView {
    backend_url: Option<String>,
    last: Option<(u64, Status)>,
    spinner: Option<ProgressBar>,
}

impl TerminalView {
    pub fn new(backend_url: Option<String>) -> Self {
        Self {
            backend_url,
            last: None,
            spinner: None,
        }
    }

    pub fn update(&mut self, session: &UploadSession) {
        let key = (session.generation(), session.status());
        if self.last == Some(key) {
            return;
        }
        let is_new_request = self.last.map(|(g, _)| g) != Some(key.0);
        self.last = Some(key);

        self.finish_spinner();

        if is_new_request {
            if let Some(line) = preview_line(session) {
                println!("{}", line);
            }
        }

        match session.status() {
            Status::Idle => {}
            Status::Loading => self.start_spinner(&status_line(session)),
            Status::SuccessTransition | Status::ErrorTransition => println!("{}", status_line(session)),
            Status::Invalid | Status::Error | Status::Done => {
                println!("{}\n", render_session(session, self.backend_url.as_deref()));
            }
        }
    }

    fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn finish_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Drop for TerminalView {
    fn drop(&mut self) {
        self.finish_spinner();
    }
}
