use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "laundry-advisor")]
#[command(about = "洗濯表示ラベルAI解析ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ラベル画像を解析して洗濯方法を表示
    Analyze {
        /// 画像ファイルまたはフォルダ
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,

        /// 結果をJSONで保存
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 演出用の待ち時間を省略
        #[arg(long)]
        no_delay: bool,
    },

    /// 対話的に画像パスを入力して解析
    Interactive {
        /// 演出用の待ち時間を省略
        #[arg(long)]
        no_delay: bool,
    },

    /// バックエンドの死活確認
    Health,

    /// 設定を表示/編集
    Config {
        /// バックエンドURLを設定
        #[arg(long)]
        set_backend_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
