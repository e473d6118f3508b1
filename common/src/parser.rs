//! 解析テキストのパーサー
//!
//! サーバーが返すテキストを行単位で読み、表示用の行に変換する:
//!
//! ```text
//! ## Water Temperature
//! • [30°C or below]
//! ```
//!
//! - `##` で始まる行: 以降の指示が属するカテゴリ
//! - `•` で始まる行: 現在のカテゴリに属する指示（`[` `]` は除去）
//! - カテゴリより前の指示、その他の行は無視

use crate::types::AnalysisRow;

/// カテゴリ行のマーカー
pub const CATEGORY_MARKER: &str = "##";

/// 指示行のマーカー
pub const INSTRUCTION_MARKER: &str = "•";

/// 解析テキストを表示行に変換
///
/// # Examples
/// ```
/// use laundry_advisor_common::parse_analysis_rows;
///
/// let rows = parse_analysis_rows("## Washing\n• [Wash cold]");
/// assert_eq!(rows[0].category, "Washing");
/// assert_eq!(rows[0].instruction, "Wash cold");
/// ```
pub fn parse_analysis_rows(text: &str) -> Vec<AnalysisRow> {
    let mut rows = Vec::new();
    let mut category: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix(CATEGORY_MARKER) {
            category = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(INSTRUCTION_MARKER) {
            // カテゴリ前の指示は捨てる
            let Some(current) = &category else {
                continue;
            };
            rows.push(AnalysisRow::new(current.clone(), strip_brackets(rest)));
        }
    }

    rows
}

fn strip_brackets(text: &str) -> String {
    let text = text.trim();
    let text = text.strip_prefix('[').unwrap_or(text);
    let text = text.strip_suffix(']').unwrap_or(text);
    text.trim().to_string()
}
