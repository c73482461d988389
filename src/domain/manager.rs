//! アップロードマネージャー
//!
//! 候補画像1つ分のクライアント側状態（選択、検証、プレビュー、送信、進捗、結果）を
//! 所有する決定的な状態機械。
//!
//! ```text
//! Idle ──select──▶ Validating ──ok──▶ Ready ──submit──▶ Uploading ──▶ Succeeded
//!   ▲                  │                                  │      └──▶ Failed
//!   └──── rejected ────┘                                  │
//!   ▲                                                     │
//!   └──────────────────── clear（どの状態からでも）──────┘
//! ```
//!
//! 状態遷移はインテント（select / submit / clear）とトランスポート通知の
//! 適用時にのみ起こり、同時には走らない。送信中の試行は `AttemptId` で識別し、
//! 現在の試行と一致しない通知は破棄する。

use crate::api::types::{ClassificationResponse, ClassificationResult};
use crate::config::UploaderConfig;
use crate::domain::candidate::{Candidate, SelectedFile, SelectionSource};
use crate::domain::error::{DomainError, UploadError};
use crate::domain::preview::PreviewStore;
use crate::domain::progress::{ProgressSink, UploadPhase, UploadProgress};
use crate::domain::transport::{
    AttemptId, CancelHandle, TransportAdapter, TransportEvent, TransportMessage, TransportOutcome,
    TransportSink, UploadRequest,
};
use crate::domain::validator;
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// セッションの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Idle,
    Validating,
    Ready,
    Uploading,
    Succeeded,
    Failed,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Ready => "ready",
            Self::Uploading => "uploading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// プレゼンテーション層向けの状態スナップショット
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub status: UploadStatus,
    pub progress_percent: u8,
    pub file_name: Option<String>,
    pub size_bytes: Option<u64>,
    pub mime_type: Option<String>,
    pub preview: Option<String>,
    pub attempt: Option<AttemptId>,
    pub result: Option<ClassificationResult>,
    pub error: Option<String>,
}

/// 送信中の試行
#[derive(Debug)]
struct InFlight {
    attempt: AttemptId,
    handle: CancelHandle,
}

pub struct UploadManager<T: TransportAdapter, P: PreviewStore> {
    config: UploaderConfig,
    transport: T,
    previews: P,
    sink: Box<dyn ProgressSink>,

    status: UploadStatus,
    candidate: Option<Candidate>,
    progress_percent: u8,
    result: Option<ClassificationResult>,
    error_message: Option<String>,
    failure: Option<UploadError>,

    last_attempt: AttemptId,
    in_flight: Option<InFlight>,
    tx: UnboundedSender<TransportMessage>,
    rx: UnboundedReceiver<TransportMessage>,
}

impl<T: TransportAdapter, P: PreviewStore> UploadManager<T, P> {
    pub fn new(config: UploaderConfig, transport: T, previews: P, sink: Box<dyn ProgressSink>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            config,
            transport,
            previews,
            sink,
            status: UploadStatus::Idle,
            candidate: None,
            progress_percent: 0,
            result: None,
            error_message: None,
            failure: None,
            last_attempt: AttemptId::new(0),
            in_flight: None,
            tx,
            rx,
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Failed 状態の原因
    pub fn failure(&self) -> Option<&UploadError> {
        self.failure.as_ref()
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        self.candidate.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    #[cfg(test)]
    pub(crate) fn previews(&self) -> &P {
        &self.previews
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let candidate = self.candidate.as_ref();
        SessionSnapshot {
            status: self.status,
            progress_percent: self.progress_percent,
            file_name: candidate.map(|c| c.display_name().to_string()),
            size_bytes: candidate.map(Candidate::size_bytes),
            mime_type: candidate.map(|c| c.mime_type().to_string()),
            preview: candidate.map(|c| c.preview().location().to_string()),
            attempt: self.in_flight.as_ref().map(|f| f.attempt),
            result: self.result.clone(),
            error: self.error_message.clone(),
        }
    }

    /// 選択インテント（ダイアログ・ドロップ共通）
    ///
    /// 先頭のファイルのみを使用し、残りは黙って無視する。空なら何もしない。
    /// 送信中であれば先に取り消す。検証に失敗した場合は既存の候補も破棄して
    /// Idle に戻り、エラーメッセージを保持したうえで同じエラーを返す。
    pub fn select(&mut self, files: Vec<SelectedFile>, source: SelectionSource) -> Result<(), DomainError> {
        let total = files.len();
        let Some(file) = files.into_iter().next() else {
            return Ok(());
        };
        if total > 1 {
            log::debug!("ignoring {} additional file(s) in selection", total - 1);
        }

        if let Some(attempt) = self.cancel_in_flight() {
            log::info!("upload {} cancelled by new selection", attempt);
        }

        self.reset_session_fields();
        self.set_status(UploadStatus::Validating);
        self.emit(UploadPhase::Validating {
            file_name: file.name.clone(),
            source,
        });

        let policy = self.config.validation_policy();
        if let Err(e) = validator::validate_image(&file.mime_type, file.size_bytes(), &policy) {
            self.reject(&file.name, e.to_string());
            return Err(e);
        }

        // 旧候補のプレビューを解放してから新しいものを確保する
        self.release_candidate();
        let preview = match self.previews.acquire(&file) {
            Ok(preview) => preview,
            Err(e) => {
                self.reject(&file.name, e.to_string());
                return Err(e);
            }
        };

        let candidate = Candidate::new(file, preview);
        let phase = UploadPhase::Ready {
            file_name: candidate.display_name().to_string(),
            size_bytes: candidate.size_bytes(),
            mime_type: candidate.mime_type().to_string(),
            preview: candidate.preview().location().to_string(),
        };
        self.candidate = Some(candidate);
        self.set_status(UploadStatus::Ready);
        self.emit(phase);

        Ok(())
    }

    /// 送信インテント
    ///
    /// 送信中・候補なし・エンドポイント未設定の場合は状態を変えずに拒否する。
    /// Failed / Succeeded からは同じ候補で再送信できる。
    pub fn submit(&mut self) -> Result<AttemptId, DomainError> {
        if self.status == UploadStatus::Uploading {
            return Err(DomainError::UploadAlreadyInProgress);
        }
        let Some(candidate) = self.candidate.as_ref() else {
            return Err(DomainError::NoFileSelected);
        };
        let Some(url) = self.config.endpoint.clone() else {
            return Err(DomainError::NoEndpointConfigured);
        };

        let attempt = self.last_attempt.next();
        self.last_attempt = attempt;

        let request = UploadRequest {
            url,
            file_name: candidate.display_name().to_string(),
            mime_type: candidate.mime_type().to_string(),
            bytes: candidate.shared_bytes(),
        };
        let phase = UploadPhase::Uploading {
            attempt,
            file_name: request.file_name.clone(),
            size_bytes: candidate.size_bytes(),
        };

        self.reset_session_fields();
        self.set_status(UploadStatus::Uploading);
        self.emit(phase);
        log::info!("upload {} started: {} -> {}", attempt, request.file_name, request.url);

        let sink = TransportSink::new(attempt, self.tx.clone());
        let handle = self.transport.send(request, sink);
        self.in_flight = Some(InFlight { attempt, handle });

        Ok(attempt)
    }

    /// クリアインテント
    ///
    /// 送信中なら取り消し、プレビューを解放して全フィールドを初期化する。
    /// 候補も送信もない Idle 状態では何もしない。
    pub fn clear(&mut self) {
        if self.status == UploadStatus::Idle && self.candidate.is_none() && self.in_flight.is_none() {
            self.error_message = None;
            return;
        }

        let cancelled_attempt = self.cancel_in_flight();
        self.release_candidate();
        self.reset_session_fields();
        self.set_status(UploadStatus::Idle);
        self.emit(UploadPhase::Cleared { cancelled_attempt });
    }

    /// トランスポート通知を1件適用する
    ///
    /// 現在の試行と一致しない（取り消し済み・置き換え済みの）通知は破棄し `false` を返す。
    pub fn handle_transport_message(&mut self, message: TransportMessage) -> bool {
        let is_current = self.status == UploadStatus::Uploading
            && self
                .in_flight
                .as_ref()
                .is_some_and(|f| f.attempt == message.attempt);
        if !is_current {
            log::debug!("discarding stale transport event for attempt {}", message.attempt);
            return false;
        }

        let attempt = message.attempt;
        match message.event {
            TransportEvent::Progress(percent) => {
                let percent = percent.min(100);
                if percent > self.progress_percent {
                    self.progress_percent = percent;
                    self.emit(UploadPhase::Progress { attempt, percent });
                }
            }
            TransportEvent::Completed(outcome) => {
                self.in_flight = None;
                match outcome {
                    TransportOutcome::Success { body, .. } => {
                        match ClassificationResponse::parse(&body).and_then(ClassificationResponse::into_result) {
                            Ok(result) => self.succeed(attempt, result),
                            Err(e) => self.fail(attempt, e.into()),
                        }
                    }
                    TransportOutcome::Failure(failure) => self.fail(attempt, failure.into()),
                }
            }
        }

        true
    }

    /// 届いている通知をブロックせずにすべて適用し、適用件数を返す
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.rx.try_recv() {
            if self.handle_transport_message(message) {
                applied += 1;
            }
        }
        applied
    }

    /// Uploading を抜けるまで通知を待って適用する
    pub async fn wait_until_settled(&mut self) -> UploadStatus {
        while self.status == UploadStatus::Uploading {
            match self.rx.recv().await {
                Some(message) => {
                    self.handle_transport_message(message);
                }
                None => break,
            }
        }
        self.status
    }

    fn succeed(&mut self, attempt: AttemptId, result: ClassificationResult) {
        log::info!(
            "upload {} succeeded: {} ({:.2})",
            attempt,
            result.prediction.as_str(),
            result.confidence
        );
        self.progress_percent = 100;
        self.result = Some(result.clone());
        self.error_message = None;
        self.failure = None;
        self.set_status(UploadStatus::Succeeded);
        self.emit(UploadPhase::Succeeded { attempt, result });
    }

    fn fail(&mut self, attempt: AttemptId, error: UploadError) {
        let message = error.to_string();
        log::info!("upload {} failed: {}", attempt, message);
        self.result = None;
        self.error_message = Some(message.clone());
        self.failure = Some(error);
        self.set_status(UploadStatus::Failed);
        self.emit(UploadPhase::Failed { attempt, message });
    }

    fn reject(&mut self, file_name: &str, reason: String) {
        self.release_candidate();
        self.error_message = Some(reason.clone());
        self.set_status(UploadStatus::Idle);
        self.emit(UploadPhase::Rejected {
            file_name: file_name.to_string(),
            reason,
        });
    }

    fn cancel_in_flight(&mut self) -> Option<AttemptId> {
        let in_flight = self.in_flight.take()?;
        in_flight.handle.cancel();
        Some(in_flight.attempt)
    }

    fn release_candidate(&mut self) {
        if let Some(candidate) = self.candidate.take() {
            self.previews.release(candidate.into_preview());
        }
    }

    fn reset_session_fields(&mut self) {
        self.progress_percent = 0;
        self.result = None;
        self.error_message = None;
        self.failure = None;
    }

    fn set_status(&mut self, status: UploadStatus) {
        if self.status != status {
            log::debug!("upload state: {} -> {}", self.status, status);
            self.status = status;
        }
    }

    fn emit(&self, phase: UploadPhase) {
        self.sink.emit(UploadProgress::new(phase));
    }
}

impl<T: TransportAdapter, P: PreviewStore> Drop for UploadManager<T, P> {
    fn drop(&mut self) {
        self.cancel_in_flight();
        self.release_candidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Prediction, Probabilities};
    use crate::config::BYTES_PER_MB;
    use crate::domain::testing::{CountingPreviewStore, FakeTransport, RecordingSink, image, success_body};
    use crate::domain::transport::{FailureKind, TransportFailure};
    use pretty_assertions::assert_eq;

    type TestManager = UploadManager<FakeTransport, CountingPreviewStore>;

    fn manager() -> (TestManager, RecordingSink) {
        manager_with(UploaderConfig {
            endpoint: Some("http://classifier.test/api/classifications/classify-file".to_string()),
            ..UploaderConfig::default()
        })
    }

    fn manager_with(config: UploaderConfig) -> (TestManager, RecordingSink) {
        let sink = RecordingSink::default();
        let manager = UploadManager::new(
            config,
            FakeTransport::default(),
            CountingPreviewStore::default(),
            Box::new(sink.clone()),
        );
        (manager, sink)
    }

    fn edible_result() -> ClassificationResult {
        ClassificationResult {
            prediction: Prediction::Edible,
            confidence: 0.92,
            probabilities: Probabilities {
                edible: 0.92,
                poisonous: 0.08,
            },
        }
    }

    fn ready_manager() -> (TestManager, RecordingSink) {
        let (mut m, sink) = manager();
        m.select(vec![image("cap.jpg", 2 * BYTES_PER_MB as usize)], SelectionSource::Browse)
            .expect("valid image");
        (m, sink)
    }

    #[test]
    fn test_non_image_is_rejected_without_preview() {
        let (mut m, _) = manager();
        for mime in ["text/plain", "application/pdf", "video/mp4"] {
            let file = SelectedFile::new("notes.txt", mime, vec![1, 2, 3]);
            let err = m.select(vec![file], SelectionSource::Drop).unwrap_err();

            assert!(matches!(err, DomainError::NotAnImage { .. }));
            assert_eq!(m.status(), UploadStatus::Idle);
            assert!(m.candidate().is_none());
            assert!(m.error_message().unwrap().starts_with("not an image"));
        }
        assert_eq!(m.previews().acquired(), 0);
    }

    #[test]
    fn test_too_large_acquires_no_preview() {
        let (mut m, _) = manager();
        let oversized = image("huge.png", (15 * BYTES_PER_MB + 1) as usize);

        let err = m.select(vec![oversized], SelectionSource::Browse).unwrap_err();

        assert!(matches!(err, DomainError::FileTooLarge { max_mb: 15, .. }));
        assert!(m.error_message().unwrap().contains("exceeds size limit of 15mb"));
        assert_eq!(m.status(), UploadStatus::Idle);
        assert_eq!(m.previews().acquired(), 0);
    }

    #[test]
    fn test_rejected_selection_drops_previous_candidate() {
        let (mut m, _) = ready_manager();

        let result = m.select(
            vec![SelectedFile::new("doc.pdf", "application/pdf", vec![0])],
            SelectionSource::Browse,
        );

        assert!(result.is_err());
        assert!(m.candidate().is_none());
        assert_eq!(m.previews().acquired(), 1);
        assert_eq!(m.previews().released(), 1);
    }

    #[test]
    fn test_second_selection_releases_first_preview() {
        let (mut m, _) = ready_manager();
        let first_preview = m.candidate().unwrap().preview().location().to_string();

        m.select(vec![image("gills.png", 1024)], SelectionSource::Drop)
            .unwrap();

        assert_eq!(m.previews().acquired(), 2);
        assert_eq!(m.previews().released(), 1);
        assert_eq!(m.previews().released_locations(), vec![first_preview]);
        assert_eq!(m.candidate().unwrap().display_name(), "gills.png");

        m.clear();
        assert_eq!(m.previews().acquired(), m.previews().released());
    }

    #[test]
    fn test_only_first_file_is_used() {
        let (mut m, _) = manager();
        m.select(
            vec![image("first.jpg", 10), image("second.jpg", 10)],
            SelectionSource::Drop,
        )
        .unwrap();

        assert_eq!(m.candidate().unwrap().display_name(), "first.jpg");
        assert_eq!(m.previews().acquired(), 1);
    }

    #[test]
    fn test_empty_selection_is_noop() {
        let (mut m, sink) = ready_manager();
        let before = sink.phases().len();

        m.select(Vec::new(), SelectionSource::Drop).unwrap();

        assert_eq!(m.status(), UploadStatus::Ready);
        assert_eq!(sink.phases().len(), before);
    }

    #[test]
    fn test_preview_failure_returns_to_idle() {
        let (mut m, _) = manager();
        m.previews().fail_next_acquire();

        let err = m.select(vec![image("cap.jpg", 10)], SelectionSource::Browse).unwrap_err();

        assert!(matches!(err, DomainError::PreviewUnavailable { .. }));
        assert_eq!(m.status(), UploadStatus::Idle);
        assert!(m.error_message().is_some());
    }

    #[test]
    fn test_submit_without_candidate() {
        let (mut m, _) = manager();

        let err = m.submit().unwrap_err();

        assert!(matches!(err, DomainError::NoFileSelected));
        assert_eq!(m.status(), UploadStatus::Idle);
        assert_eq!(m.transport().calls(), 0);
    }

    #[test]
    fn test_submit_without_endpoint() {
        let (mut m, _) = manager_with(UploaderConfig {
            endpoint: None,
            ..UploaderConfig::default()
        });
        m.select(vec![image("cap.jpg", 10)], SelectionSource::Browse)
            .unwrap();

        let err = m.submit().unwrap_err();

        assert!(matches!(err, DomainError::NoEndpointConfigured));
        assert_eq!(m.status(), UploadStatus::Ready);
        assert_eq!(m.transport().calls(), 0);
    }

    #[test]
    fn test_double_submit_is_rejected() {
        let (mut m, _) = ready_manager();

        let attempt = m.submit().unwrap();
        let err = m.submit().unwrap_err();

        assert!(matches!(err, DomainError::UploadAlreadyInProgress));
        assert_eq!(m.status(), UploadStatus::Uploading);
        assert_eq!(m.transport().calls(), 1);
        assert_eq!(m.snapshot().attempt, Some(attempt));
    }

    #[test]
    fn test_request_carries_candidate() {
        let (mut m, _) = ready_manager();
        m.submit().unwrap();

        let request = m.transport().request(0);
        assert_eq!(request.url, "http://classifier.test/api/classifications/classify-file");
        assert_eq!(request.file_name, "cap.jpg");
        assert_eq!(request.mime_type, "image/jpeg");
        assert_eq!(request.bytes.len() as u64, 2 * BYTES_PER_MB);
    }

    #[test]
    fn test_successful_upload_with_progress() {
        let (mut m, sink) = ready_manager();
        assert_eq!(m.status(), UploadStatus::Ready);

        m.submit().unwrap();
        assert_eq!(m.progress_percent(), 0);

        for percent in [25, 60, 100] {
            m.transport().progress(0, percent);
        }
        assert_eq!(m.process_pending(), 3);
        assert_eq!(m.progress_percent(), 100);

        m.transport().complete(0, TransportOutcome::Success {
            status: 200,
            body: success_body(),
        });
        m.process_pending();

        assert_eq!(m.status(), UploadStatus::Succeeded);
        assert_eq!(m.progress_percent(), 100);
        assert_eq!(m.result(), Some(&edible_result()));
        assert_eq!(m.error_message(), None);

        let percents: Vec<u8> = sink
            .phases()
            .into_iter()
            .filter_map(|p| match p {
                UploadPhase::Progress { percent, .. } => Some(percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![25, 60, 100]);
    }

    #[test]
    fn test_success_without_progress_forces_hundred() {
        let (mut m, _) = ready_manager();
        m.submit().unwrap();

        m.transport().complete(0, TransportOutcome::Success {
            status: 201,
            body: success_body(),
        });
        m.process_pending();

        assert_eq!(m.status(), UploadStatus::Succeeded);
        assert_eq!(m.progress_percent(), 100);
    }

    #[test]
    fn test_progress_never_decreases() {
        let (mut m, _) = ready_manager();
        let attempt = m.submit().unwrap();

        for percent in [60, 30, 200] {
            m.handle_transport_message(TransportMessage {
                attempt,
                event: TransportEvent::Progress(percent),
            });
        }

        assert_eq!(m.progress_percent(), 100);
    }

    #[test]
    fn test_http_failure_keeps_candidate_for_retry() {
        let (mut m, _) = ready_manager();
        m.submit().unwrap();

        m.transport().complete(0, TransportOutcome::Failure(TransportFailure::new(
            FailureKind::HttpStatus(500),
            "Internal Server Error",
        )));
        m.process_pending();

        assert_eq!(m.status(), UploadStatus::Failed);
        assert!(m.error_message().unwrap().contains("HTTP error 500"));
        assert!(m.result().is_none());
        assert!(m.candidate().is_some());
        assert_eq!(m.previews().released(), 0);

        let retry = m.submit().unwrap();
        assert_eq!(retry, AttemptId::new(2));
        assert_eq!(m.status(), UploadStatus::Uploading);
        assert_eq!(m.error_message(), None);
        assert_eq!(m.transport().calls(), 2);
        assert_eq!(m.previews().acquired(), 1);
    }

    #[test]
    fn test_failure_messages_identify_category() {
        let cases = [
            (
                TransportOutcome::Failure(TransportFailure::new(FailureKind::Network, "connection refused")),
                "network error",
            ),
            (
                TransportOutcome::Failure(TransportFailure::new(FailureKind::Timeout, "after 30000ms")),
                "upload timed out",
            ),
            (
                TransportOutcome::Success {
                    status: 200,
                    body: b"<html>not json</html>".to_vec(),
                },
                "unreadable response",
            ),
            (
                TransportOutcome::Success {
                    status: 200,
                    body: br#"{"success":false,"message":"Invalid image data"}"#.to_vec(),
                },
                "classification failed: Invalid image data",
            ),
        ];

        for (outcome, expected) in cases {
            let (mut m, _) = ready_manager();
            m.submit().unwrap();
            m.transport().complete(0, outcome);
            m.process_pending();

            assert_eq!(m.status(), UploadStatus::Failed);
            let message = m.error_message().unwrap();
            assert!(message.starts_with(expected), "{message}");
            assert!(m.failure().is_some());
        }
    }

    #[test]
    fn test_clear_during_upload_cancels_and_ignores_late_completion() {
        let (mut m, sink) = ready_manager();
        let attempt = m.submit().unwrap();
        m.transport().progress(0, 40);
        m.process_pending();

        m.clear();

        assert!(m.transport().is_cancelled(0));
        assert_eq!(m.status(), UploadStatus::Idle);
        assert_eq!(m.progress_percent(), 0);
        assert_eq!(m.previews().released(), 1);
        assert!(matches!(
            sink.phases().last(),
            Some(UploadPhase::Cleared { cancelled_attempt: Some(a) }) if *a == attempt
        ));

        // キャンセル済みシンクからの完了は抑止される
        m.transport().complete(0, TransportOutcome::Success {
            status: 200,
            body: success_body(),
        });
        assert_eq!(m.process_pending(), 0);

        // 抑止をすり抜けた遅延通知も試行IDで破棄される
        let applied = m.handle_transport_message(TransportMessage {
            attempt,
            event: TransportEvent::Completed(TransportOutcome::Success {
                status: 200,
                body: success_body(),
            }),
        });
        assert!(!applied);
        assert_eq!(m.status(), UploadStatus::Idle);
        assert!(m.result().is_none());
        assert_eq!(m.previews().released(), 1);
    }

    #[test]
    fn test_new_selection_during_upload_discards_stale_completion() {
        let (mut m, _) = ready_manager();
        let first = m.submit().unwrap();

        m.select(vec![image("second.png", 100)], SelectionSource::Drop)
            .unwrap();
        assert!(m.transport().is_cancelled(0));
        assert_eq!(m.status(), UploadStatus::Ready);

        let applied = m.handle_transport_message(TransportMessage {
            attempt: first,
            event: TransportEvent::Completed(TransportOutcome::Failure(TransportFailure::new(
                FailureKind::Network,
                "reset",
            ))),
        });

        assert!(!applied);
        assert_eq!(m.status(), UploadStatus::Ready);
        assert_eq!(m.error_message(), None);
    }

    #[test]
    fn test_stale_attempt_cannot_complete_newer_one() {
        let (mut m, _) = ready_manager();
        let first = m.submit().unwrap();
        m.transport().complete(0, TransportOutcome::Failure(TransportFailure::new(
            FailureKind::Timeout,
            "slow",
        )));
        m.process_pending();

        let second = m.submit().unwrap();
        assert!(second > first);
        let applied = m.handle_transport_message(TransportMessage {
            attempt: first,
            event: TransportEvent::Completed(TransportOutcome::Success {
                status: 200,
                body: success_body(),
            }),
        });

        assert!(!applied);
        assert_eq!(m.status(), UploadStatus::Uploading);
    }

    #[test]
    fn test_clear_on_idle_is_noop() {
        let (mut m, sink) = manager();

        m.clear();
        m.clear();

        assert_eq!(m.status(), UploadStatus::Idle);
        assert_eq!(m.previews().released(), 0);
        assert!(sink.phases().is_empty());
    }

    #[test]
    fn test_clear_after_success_resets_everything() {
        let (mut m, _) = ready_manager();
        m.submit().unwrap();
        m.transport().complete(0, TransportOutcome::Success {
            status: 200,
            body: success_body(),
        });
        m.process_pending();

        m.clear();

        assert_eq!(
            m.snapshot(),
            SessionSnapshot {
                status: UploadStatus::Idle,
                progress_percent: 0,
                file_name: None,
                size_bytes: None,
                mime_type: None,
                preview: None,
                attempt: None,
                result: None,
                error: None,
            }
        );
        assert_eq!(m.previews().released(), 1);

        m.clear();
        assert_eq!(m.previews().released(), 1);
    }

    #[test]
    fn test_drop_releases_preview_and_cancels() {
        let previews = CountingPreviewStore::default();
        let transport = FakeTransport::default();
        {
            let mut m = UploadManager::new(
                UploaderConfig::default(),
                transport.clone(),
                previews.clone(),
                Box::new(RecordingSink::default()),
            );
            m.select(vec![image("cap.jpg", 10)], SelectionSource::Browse)
                .unwrap();
            m.submit().unwrap();
        }

        assert!(transport.is_cancelled(0));
        assert_eq!(previews.acquired(), 1);
        assert_eq!(previews.released(), 1);
    }

    #[test]
    fn test_phase_sequence_for_successful_flow() {
        let (mut m, sink) = manager();
        m.select(vec![image("cap.jpg", 10)], SelectionSource::Drop)
            .unwrap();
        m.submit().unwrap();
        m.transport().complete(0, TransportOutcome::Success {
            status: 200,
            body: success_body(),
        });
        m.process_pending();

        let names: Vec<&str> = sink
            .phases()
            .iter()
            .map(|p| match p {
                UploadPhase::Validating { .. } => "validating",
                UploadPhase::Rejected { .. } => "rejected",
                UploadPhase::Ready { .. } => "ready",
                UploadPhase::Uploading { .. } => "uploading",
                UploadPhase::Progress { .. } => "progress",
                UploadPhase::Succeeded { .. } => "succeeded",
                UploadPhase::Failed { .. } => "failed",
                UploadPhase::Cleared { .. } => "cleared",
            })
            .collect();
        assert_eq!(names, vec!["validating", "ready", "uploading", "succeeded"]);
    }

    #[tokio::test]
    async fn test_wait_until_settled() {
        let previews = CountingPreviewStore::default();
        let transport = FakeTransport::replying(TransportOutcome::Success {
            status: 200,
            body: success_body(),
        });
        let mut m = UploadManager::new(
            UploaderConfig::default(),
            transport,
            previews,
            Box::new(RecordingSink::default()),
        );
        m.select(vec![image("cap.jpg", 10)], SelectionSource::Browse)
            .unwrap();
        m.submit().unwrap();

        let status = m.wait_until_settled().await;

        assert_eq!(status, UploadStatus::Succeeded);
        assert_eq!(m.result(), Some(&edible_result()));
    }
}
