/// ドメイン層: アップロード状態の通知イベント
///
/// マネージャーの状態遷移と進捗をイベントとして表現します。
/// プレゼンテーション層はこれらを受け取り、人間向けの表示や
/// 機械向けのJSON行に変換します。
use crate::api::types::ClassificationResult;
use crate::domain::candidate::SelectionSource;
use crate::domain::transport::AttemptId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 状態遷移・進捗の各段階
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum UploadPhase {
    /// 選択されたファイルを検証中
    Validating {
        file_name: String,
        source: SelectionSource,
    },

    /// 検証で拒否された
    Rejected { file_name: String, reason: String },

    /// 候補画像として受理され、送信可能
    Ready {
        file_name: String,
        size_bytes: u64,
        mime_type: String,
        preview: String,
    },

    /// 送信開始
    Uploading {
        attempt: AttemptId,
        file_name: String,
        size_bytes: u64,
    },

    /// 送信進捗
    Progress { attempt: AttemptId, percent: u8 },

    /// 分類結果を受信
    Succeeded {
        attempt: AttemptId,
        result: ClassificationResult,
    },

    /// 送信失敗
    Failed { attempt: AttemptId, message: String },

    /// クリア（入力欄のリセットを含む）
    Cleared { cancelled_attempt: Option<AttemptId> },
}

/// 通知イベントと発生時刻
#[derive(Debug, Clone, Serialize)]
pub struct UploadProgress {
    #[serde(flatten)]
    pub phase: UploadPhase,
    pub at: DateTime<Utc>,
}

impl UploadProgress {
    pub fn new(phase: UploadPhase) -> Self {
        Self {
            phase,
            at: Utc::now(),
        }
    }
}

/// 通知の受け口
pub trait ProgressSink {
    fn emit(&self, progress: UploadProgress);
}

/// 通知を捨てるシンク
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn emit(&self, _progress: UploadProgress) {}
}
