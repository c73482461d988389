//! テスト用のフェイク実装
//!
//! 共有状態を `Rc<RefCell<..>>` で持つため、マネージャーに渡した後も
//! クローンから呼び出し記録を確認できる。

use crate::domain::candidate::SelectedFile;
use crate::domain::error::DomainError;
use crate::domain::preview::{PreviewHandle, PreviewStore};
use crate::domain::progress::{ProgressSink, UploadPhase, UploadProgress};
use crate::domain::transport::{CancelHandle, TransportAdapter, TransportOutcome, TransportSink, UploadRequest};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// 拡張子から MIME タイプを決めた画像ファイル
pub fn image(name: &str, size: usize) -> SelectedFile {
    let mime = if name.ends_with(".png") { "image/png" } else { "image/jpeg" };
    SelectedFile::new(name, mime, vec![0xAB; size])
}

pub fn success_body() -> Vec<u8> {
    br#"{
        "success": true,
        "message": "Classification completed successfully",
        "result": {
            "prediction": "edible",
            "confidence": 0.92,
            "probabilities": {"edible": 0.92, "poisonous": 0.08}
        }
    }"#
    .to_vec()
}

struct SentCall {
    request: UploadRequest,
    sink: Option<TransportSink>,
    cancel: CancelHandle,
}

#[derive(Default)]
struct TransportState {
    calls: Vec<SentCall>,
    reply: Option<TransportOutcome>,
}

/// 送信を記録し、テストから進捗・完了を手動で通知できるトランスポート
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Rc<RefCell<TransportState>>,
}

impl FakeTransport {
    /// `send` の中で即座に完了を通知する
    pub fn replying(outcome: TransportOutcome) -> Self {
        let transport = Self::default();
        transport.state.borrow_mut().reply = Some(outcome);
        transport
    }

    pub fn calls(&self) -> usize {
        self.state.borrow().calls.len()
    }

    pub fn request(&self, index: usize) -> UploadRequest {
        self.state.borrow().calls[index].request.clone()
    }

    pub fn is_cancelled(&self, index: usize) -> bool {
        self.state.borrow().calls[index].cancel.is_cancelled()
    }

    pub fn progress(&self, index: usize, percent: u8) {
        if let Some(sink) = &self.state.borrow().calls[index].sink {
            sink.progress(percent);
        }
    }

    pub fn complete(&self, index: usize, outcome: TransportOutcome) {
        let sink = self.state.borrow_mut().calls[index].sink.take();
        if let Some(sink) = sink {
            sink.complete(outcome);
        }
    }
}

impl TransportAdapter for FakeTransport {
    fn send(&self, request: UploadRequest, sink: TransportSink) -> CancelHandle {
        let mut state = self.state.borrow_mut();
        let cancel = sink.cancel_handle();
        let handle = sink.cancel_handle();
        let sink = match state.reply.clone() {
            Some(outcome) => {
                sink.complete(outcome);
                None
            }
            None => Some(sink),
        };
        state.calls.push(SentCall { request, sink, cancel });
        handle
    }
}

#[derive(Default)]
struct PreviewState {
    acquired: usize,
    released: Vec<String>,
    live: HashSet<u64>,
    next_id: u64,
    fail_next: bool,
}

/// 確保・解放の回数を数えるプレビューストア
#[derive(Clone, Default)]
pub struct CountingPreviewStore {
    state: Rc<RefCell<PreviewState>>,
}

impl CountingPreviewStore {
    pub fn acquired(&self) -> usize {
        self.state.borrow().acquired
    }

    pub fn released(&self) -> usize {
        self.state.borrow().released.len()
    }

    pub fn released_locations(&self) -> Vec<String> {
        self.state.borrow().released.clone()
    }

    pub fn fail_next_acquire(&self) {
        self.state.borrow_mut().fail_next = true;
    }
}

impl PreviewStore for CountingPreviewStore {
    fn acquire(&mut self, file: &SelectedFile) -> Result<PreviewHandle, DomainError> {
        let mut state = self.state.borrow_mut();
        if std::mem::take(&mut state.fail_next) {
            return Err(DomainError::preview_unavailable("disk full"));
        }
        state.next_id += 1;
        state.acquired += 1;
        let id = state.next_id;
        state.live.insert(id);
        Ok(PreviewHandle::new(id, format!("preview://{}/{}", id, file.name)))
    }

    fn release(&mut self, handle: PreviewHandle) {
        let mut state = self.state.borrow_mut();
        assert!(state.live.remove(&handle.id()), "preview {} released twice", handle.id());
        state.released.push(handle.location().to_string());
    }
}

/// 通知されたフェーズを記録するシンク
#[derive(Clone, Default)]
pub struct RecordingSink {
    phases: Rc<RefCell<Vec<UploadPhase>>>,
}

impl RecordingSink {
    pub fn phases(&self) -> Vec<UploadPhase> {
        self.phases.borrow().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, progress: UploadProgress) {
        self.phases.borrow_mut().push(progress.phase);
    }
}
