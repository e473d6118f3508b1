use clap::Parser;
use laundry_advisor::analyzer::{AnalysisBackend, HttpBackend, HEALTH_PATH};
use laundry_advisor::controller::{join_logged, ControllerHandle, UploadController};
use laundry_advisor::render::TerminalView;
use laundry_advisor::{cli, config, error, logging, scanner};
use cli::{Cli, Commands};
use config::Config;
use error::{LaundryError, Result};
use laundry_advisor_common::{RequestTicket, Status, TransitionDelays, UploadSession};
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // configコマンドは壊れた設定ファイルの修復にも使うので読み込みエラーで止めない
    let config = if matches!(cli.command, Commands::Config { .. }) {
        Config::load_lenient()
    } else {
        Config::load()?
    };

    match cli.command {
        Commands::Analyze { paths, recursive, output, no_delay } => {
            // BACKEND_URLがなければここで終了
            let backend = HttpBackend::from_config(&config)?;
            println!("🧺 laundry-advisor - ラベル解析\n");

            let inputs = scanner::collect_inputs(&paths, recursive)?;
            println!("✔ {}枚の画像を検出\n", inputs.len());

            let delays = delays_for(&config, no_delay);
            run_analyze(backend, delays, &inputs, output.as_deref()).await?;
        }

        Commands::Interactive { no_delay } => {
            let backend = HttpBackend::from_config(&config)?;
            println!("🧺 laundry-advisor - 対話モード\n");
            run_interactive(backend, delays_for(&config, no_delay)).await?;
        }

        Commands::Health => {
            let backend = HttpBackend::from_config(&config)?;
            println!("接続確認: {}", backend.endpoint(HEALTH_PATH));

            let health = backend.health().await?;
            if health.is_healthy() {
                println!("✔ バックエンドは正常です");
            } else {
                println!("⚠ バックエンドの状態: {}", health.status);
            }
        }

        Commands::Config { set_backend_url, show } => {
            let mut config = config;

            if let Some(url) = set_backend_url {
                config.set_backend_url(url)?;
                println!("✔ バックエンドURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  バックエンドURL: {}", config.backend_url.as_deref().unwrap_or("未設定"));
                println!(
                    "  タイムアウト: {}",
                    config
                        .timeout_seconds
                        .map(|s| format!("{}秒", s))
                        .unwrap_or_else(|| "既定値".into())
                );
                println!("  成功時の待ち時間: {}ms", config.success_delay_ms);
                println!("  却下時の待ち時間: {}ms", config.invalid_delay_ms);
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

fn delays_for(config: &Config, no_delay: bool) -> TransitionDelays {
    if no_delay {
        TransitionDelays::none()
    } else {
        config.delays()
    }
}

async fn run_analyze(
    backend: HttpBackend,
    delays: TransitionDelays,
    inputs: &[PathBuf],
    output: Option<&Path>,
) -> Result<()> {
    let backend_url = backend.base_url().to_string();
    let (handle, controller) = UploadController::spawn(backend, delays);
    let mut view = TerminalView::new(Some(backend_url));

    let mut reports = Vec::new();
    let mut failed = 0;

    for (idx, path) in inputs.iter().enumerate() {
        println!("[{}/{}] {}", idx + 1, inputs.len(), path.display());

        let image = match scanner::load_image(path) {
            Ok(image) => image,
            Err(e) => {
                println!("✖ {}\n", e);
                failed += 1;
                continue;
            }
        };

        let ticket = handle.submit(image)?;
        let session = follow(&handle, ticket, &mut view).await?;

        if session.status() == Status::Error {
            failed += 1;
        }
        if let Some(report) = session.report(chrono::Local::now().to_rfc3339()) {
            reports.push(report);
        }
    }

    drop(handle);
    join_logged("controller", controller).await;

    if let Some(output) = output {
        let json = serde_json::to_string_pretty(&reports)?;
        std::fs::write(output, json)?;
        println!("✔ 結果を保存: {}", output.display());
    }

    if failed > 0 {
        return Err(LaundryError::AnalysisFailed {
            failed,
            total: inputs.len(),
        });
    }

    println!("✅ 解析完了");
    Ok(())
}

/// チケットが確定するまで状態変化を表示
async fn follow(
    handle: &ControllerHandle,
    ticket: RequestTicket,
    view: &mut TerminalView,
) -> Result<UploadSession> {
    let mut rx = handle.subscribe();

    loop {
        let session = rx.borrow_and_update().clone();
        if session.generation() > ticket.generation() {
            return Ok(session);
        }
        if session.generation() == ticket.generation() {
            view.update(&session);
            if session.status().is_settled() {
                return Ok(session);
            }
        }

        rx.changed().await.map_err(|_| LaundryError::ControllerStopped)?;
    }
}

async fn run_interactive(backend: HttpBackend, delays: TransitionDelays) -> Result<()> {
    let backend_url = backend.base_url().to_string();
    let (handle, controller) = UploadController::spawn(backend, delays);

    let mut rx = handle.subscribe();
    let printer = tokio::spawn(async move {
        let mut view = TerminalView::new(Some(backend_url));
        while rx.changed().await.is_ok() {
            let session = rx.borrow_and_update().clone();
            view.update(&session);
        }
    });

    println!("画像のパスを入力してください。解析中に別の画像を入力すると置き換えます。");

    loop {
        let input = tokio::task::spawn_blocking(|| {
            dialoguer::Input::<String>::new()
                .with_prompt("画像パス (空欄または q で終了)")
                .allow_empty(true)
                .interact_text()
        })
        .await
        .map_err(|e| LaundryError::Prompt(e.to_string()))?
        .map_err(|e| LaundryError::Prompt(e.to_string()))?;

        let input = input.trim();
        if input.is_empty() || input.eq_ignore_ascii_case("q") {
            break;
        }

        match scanner::load_image(Path::new(input)) {
            Ok(image) => {
                handle.submit(image)?;
            }
            Err(e) => println!("✖ {}", e),
        }
    }

    drop(handle);
    join_logged("controller", controller).await;
    join_logged("printer", printer).await;
    Ok(())
}
