//! ログ初期化
//!
//! 進捗表示はstdout、診断ログ（tracing）はstderrに出す。

use tracing_subscriber::EnvFilter;

/// 既定のログレベル（`RUST_LOG` があればそちらを優先）
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "laundry_advisor=debug,warn"
    } else {
        "warn"
    }
}

/// tracing subscriberを登録。2回目以降の呼び出しは無視
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
