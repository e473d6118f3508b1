//! プレビュー用data URI

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// 画像バイト列をdata URIに変換
///
/// `data:image/jpeg;base64,/9j/4AAQ...` 形式
pub fn to_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// 表示用に短縮したdata URI
pub fn abbreviate_data_uri(data_url: &str, max_chars: usize) -> String {
    if data_url.chars().count() <= max_chars {
        return data_url.to_string();
    }
    let head: String = data_url.chars().take(max_chars).collect();
    format!("{}…", head)
}
