//! アップロードコントローラー
//!
//! セッション状態を1つのtokioタスクが所有し、イベントで遷移させる。
//!
//! - ユーザー操作: `ControllerHandle::submit` → コマンドチャネル
//! - リクエスト完了・演出タイマー: 内部チャネル
//! - 状態の公開: `watch` チャネル
//!
//! 新しい画像が送られると、実行中のリクエストと演出タイマーは中断される。
//! 中断が間に合わなかったレスポンスは世代番号で破棄される。

use crate::analyzer::AnalysisBackend;
use crate::error::{LaundryError, Result};
use laundry_advisor_common::{
    AnalysisError, AnalysisOutcome, Applied, RequestTicket, SelectedImage, TransitionDelays,
    UploadSession,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

enum Command {
    Submit(SelectedImage),
}

enum Internal {
    Completed {
        ticket: RequestTicket,
        result: std::result::Result<AnalysisOutcome, AnalysisError>,
    },
    Settle {
        ticket: RequestTicket,
    },
}

/// コントローラーへの操作口
///
/// 全てのハンドルがdropされるとコントローラーは停止する
#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<UploadSession>,
    submitted: Arc<Mutex<u64>>,
}

impl ControllerHandle {
    /// 画像を送信。返り値のチケットで完了を待てる
    pub fn submit(&self, image: SelectedImage) -> Result<RequestTicket> {
        // コントローラーはコマンドを順に処理し、1件ごとに世代を1つ進める
        let mut submitted = self
            .submitted
            .lock()
            .map_err(|_| LaundryError::ControllerStopped)?;
        self.commands
            .send(Command::Submit(image))
            .map_err(|_| LaundryError::ControllerStopped)?;
        *submitted += 1;
        Ok(RequestTicket::from_generation(*submitted))
    }

    /// 状態の購読
    pub fn subscribe(&self) -> watch::Receiver<UploadSession> {
        self.state.clone()
    }

    /// 現在の状態
    pub fn current(&self) -> UploadSession {
        self.state.borrow().clone()
    }

    /// チケットの処理が確定するか、新しい送信で置き換えられるまで待つ
    pub async fn wait_for(&self, ticket: RequestTicket) -> Result<UploadSession> {
        let mut rx = self.state.clone();
        let session = rx
            .wait_for(|s| {
                s.generation() > ticket.generation()
                    || (s.generation() == ticket.generation() && s.status().is_settled())
            })
            .await
            .map_err(|_| LaundryError::ControllerStopped)?;
        Ok(session.clone())
    }
}

pub struct UploadController<B> {
    backend: Arc<B>,
    delays: TransitionDelays,
    session: UploadSession,
    commands: mpsc::UnboundedReceiver<Command>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    state_tx: watch::Sender<UploadSession>,
    request: Option<JoinHandle<()>>,
    timer: Option<JoinHandle<()>>,
}

impl<B: AnalysisBackend> UploadController<B> {
    /// コントローラーを起動
    ///
    /// 返り値のJoinHandleは停止時の最終セッションを返す
    pub fn spawn(backend: B, delays: TransitionDelays) -> (ControllerHandle, JoinHandle<UploadSession>) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(UploadSession::new());

        let controller = Self {
            backend: Arc::new(backend),
            delays,
            session: UploadSession::new(),
            commands: commands_rx,
            internal_tx,
            internal_rx,
            state_tx,
            request: None,
            timer: None,
        };

        let handle = ControllerHandle {
            commands: commands_tx,
            state: state_rx,
            submitted: Arc::new(Mutex::new(0)),
        };

        (handle, tokio::spawn(controller.run()))
    }

    async fn run(mut self) -> UploadSession {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Submit(image)) => self.submit(image),
                    None => break,
                },
                Some(event) = self.internal_rx.recv() => self.handle_internal(event),
            }
        }

        debug!("controller stopped");
        self.cancel_pending();
        self.session
    }

    fn submit(&mut self, image: SelectedImage) {
        self.cancel_pending();

        let ticket = self.session.begin(image);
        info!(
            generation = ticket.generation(),
            file = self.session.image().map(|i| i.file_name.as_str()).unwrap_or_default(),
            "image submitted"
        );
        self.publish();

        let Some(image) = self.session.image().cloned() else {
            return;
        };
        let backend = Arc::clone(&self.backend);
        let tx = self.internal_tx.clone();
        self.request = Some(tokio::spawn(async move {
            let result = backend.analyze(&image).await;
            let _ = tx.send(Internal::Completed { ticket, result });
        }));
    }

    fn handle_internal(&mut self, event: Internal) {
        match event {
            Internal::Completed { ticket, result } => match self.session.complete(ticket, result) {
                Applied::Stale => {
                    debug!(generation = ticket.generation(), "discarding superseded response");
                }
                Applied::Final => {
                    self.request = None;
                    self.publish();
                }
                Applied::Transition(kind) => {
                    self.request = None;
                    self.publish();
                    self.schedule_settle(ticket, self.delays.for_kind(kind));
                }
            },
            Internal::Settle { ticket } => {
                self.timer = None;
                if self.session.settle(ticket) {
                    self.publish();
                }
            }
        }
    }

    fn schedule_settle(&mut self, ticket: RequestTicket, delay: Duration) {
        if delay.is_zero() {
            if self.session.settle(ticket) {
                self.publish();
            }
            return;
        }

        let tx = self.internal_tx.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Internal::Settle { ticket });
        }));
    }

    fn cancel_pending(&mut self) {
        if let Some(request) = self.request.take() {
            request.abort();
        }
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn publish(&self) {
        debug!(
            generation = self.session.generation(),
            status = %self.session.status(),
            "state changed"
        );
        self.state_tx.send_replace(self.session.clone());
    }
}

/// タスクの終了を待つ。パニック・中断はログに残してNone
pub async fn join_logged<T>(task: &str, handle: JoinHandle<T>) -> Option<T> {
    match handle.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(task, error = %e, "task ended abnormally");
            None
        }
    }
}
