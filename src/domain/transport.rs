/// トランスポートアダプターの契約
///
/// 1回の呼び出しで1回だけアップロードを行い、進捗と完了を
/// `TransportSink` 経由でマネージャーに届ける。再試行はしない。
///
/// # 契約
/// - 進捗は 0..=100 の範囲で単調非減少。送信中のみ通知される。
/// - 完了通知は `complete(self, ..)` がシンクを消費するため高々1回。
///   アダプターは必ず1回呼び出す責務を負う。
/// - `CancelHandle::cancel()` 後は一切の通知が抑止され、転送タスクは中断される。
/// - 成功ボディの解釈（分類結果へのパース）は呼び出し側の責務。
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;

/// アップロード試行の識別子（単調増加）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AttemptId(u64);

impl AttemptId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 1回分のアップロード要求
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// 送信先URL
    pub url: String,
    /// 元のファイル名
    pub file_name: String,
    pub mime_type: String,
    /// ファイル本体（候補画像と共有する読み取り専用ビュー）
    pub bytes: Arc<[u8]>,
}

/// 失敗の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum FailureKind {
    /// 接続失敗などの通信エラー
    Network,
    /// 時間切れ
    Timeout,
    /// 2xx 以外のステータス
    HttpStatus(u16),
    /// 応答ボディを読み取れない
    Parse,
}

impl FailureKind {
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Network => Some("Check that the classifier service is running and reachable."),
            Self::Timeout => Some("The service did not answer in time. Retry or raise timeout_ms."),
            Self::HttpStatus(code) if *code >= 500 => {
                Some("The classifier service failed. Retry in a moment.")
            }
            Self::HttpStatus(_) => Some("The request was rejected. Check the endpoint URL."),
            Self::Parse => None,
        }
    }
}

/// トランスポート層の失敗
#[derive(Error, Debug, Clone, PartialEq)]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl TransportFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Network => write!(f, "network error: {}", self.detail),
            FailureKind::Timeout => write!(f, "upload timed out: {}", self.detail),
            FailureKind::HttpStatus(code) => write!(f, "HTTP error {}: {}", code, self.detail),
            FailureKind::Parse => write!(f, "unreadable response: {}", self.detail),
        }
    }
}

/// 完了結果
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOutcome {
    /// 2xx 応答（ボディは未解釈のまま）
    Success { status: u16, body: Vec<u8> },
    Failure(TransportFailure),
}

/// アダプターからマネージャーへの通知
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Progress(u8),
    Completed(TransportOutcome),
}

/// 試行IDで識別される通知
#[derive(Debug, Clone, PartialEq)]
pub struct TransportMessage {
    pub attempt: AttemptId,
    pub event: TransportEvent,
}

/// 進捗通知の送り口（複製可能、ストリーム内から利用する）
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    attempt: AttemptId,
    tx: UnboundedSender<TransportMessage>,
    cancelled: Arc<AtomicBool>,
    last_percent: Arc<AtomicU8>,
}

impl ProgressReporter {
    /// `bytes_sent / bytes_total` を百分率で通知する（総量不明なら通知しない）
    pub fn report(&self, bytes_sent: u64, bytes_total: u64) {
        if bytes_total == 0 {
            return;
        }
        let percent = (bytes_sent.min(bytes_total) * 100 / bytes_total) as u8;
        self.percent(percent);
    }

    /// 百分率を通知する（100で頭打ち、前回以下の値は捨てる）
    pub fn percent(&self, percent: u8) {
        if self.cancelled.load(Ordering::Acquire) {
            return;
        }
        let percent = percent.min(100);
        let previous = self.last_percent.fetch_max(percent, Ordering::AcqRel);
        if percent > previous {
            let _ = self.tx.send(TransportMessage {
                attempt: self.attempt,
                event: TransportEvent::Progress(percent),
            });
        }
    }
}

/// 1回の試行に対する通知の送り口
#[derive(Debug)]
pub struct TransportSink {
    reporter: ProgressReporter,
}

impl TransportSink {
    pub fn new(attempt: AttemptId, tx: UnboundedSender<TransportMessage>) -> Self {
        Self {
            reporter: ProgressReporter {
                attempt,
                tx,
                cancelled: Arc::new(AtomicBool::new(false)),
                last_percent: Arc::new(AtomicU8::new(0)),
            },
        }
    }

    pub fn progress(&self, percent: u8) {
        self.reporter.percent(percent);
    }

    pub fn reporter(&self) -> ProgressReporter {
        self.reporter.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.reporter.cancelled.load(Ordering::Acquire)
    }

    /// このシンクに紐づくキャンセルハンドル
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.reporter.cancelled),
            abort: None,
        }
    }

    /// 完了を通知する（キャンセル済みなら捨てる）
    pub fn complete(self, outcome: TransportOutcome) {
        if self.is_cancelled() {
            log::debug!(
                "dropping completion of cancelled attempt {}",
                self.reporter.attempt
            );
            return;
        }
        let _ = self.reporter.tx.send(TransportMessage {
            attempt: self.reporter.attempt,
            event: TransportEvent::Completed(outcome),
        });
    }
}

/// 送信中の試行を取り消すハンドル
#[derive(Debug)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl CancelHandle {
    /// 転送タスクの中断ハンドルを紐づける
    pub fn with_abort(mut self, abort: AbortHandle) -> Self {
        self.abort = Some(abort);
        self
    }

    /// 以降の通知を抑止し転送を中断する（完了後は何もしない）
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// アップロードを実行するアダプター
pub trait TransportAdapter {
    /// 1回だけアップロードを開始し、直ちにキャンセルハンドルを返す
    fn send(&self, request: UploadRequest, sink: TransportSink) -> CancelHandle;
}
