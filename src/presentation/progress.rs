/// プレゼンテーション層: アップロード進捗表示
///
/// ドメイン層の`UploadProgress`をUI表示に適した形式に変換し、
/// `ProgressSink` として端末へ書き出します。
///
/// # 設計方針
/// - `From<&UploadProgress>`で借用による変換（所有権を奪わない）
/// - `Option<DisplayProgress>`で表示抑制を明示的に表現
/// - 機械向けモードでは1イベント1行のJSONを stdout へ出力
use crate::domain::progress::{ProgressSink, UploadPhase, UploadProgress};
use crate::presentation::output::{format_megabytes, format_percent};

/// 進捗表示のカテゴリ
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressCategory {
    /// ファイル検証中
    Validation,
    /// 送信準備完了
    Preparation,
    /// ファイルアップロード中
    Upload,
    /// 完了
    Completed,
    /// 失敗・拒否
    Failed,
}

/// プレゼンテーション層用の進捗情報
#[derive(Debug, Clone)]
pub struct DisplayProgress {
    /// 表示用メッセージ
    pub message: String,
    /// 進捗カテゴリ
    pub category: ProgressCategory,
    /// 詳細情報（オプション）
    pub details: Option<String>,
}

impl DisplayProgress {
    pub fn new(message: String, category: ProgressCategory) -> Self {
        Self {
            message,
            category,
            details: None,
        }
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

/// # 戻り値
/// - `Some(DisplayProgress)`: 表示すべき進捗情報
/// - `None`: 表示を抑制（10%刻み以外の進捗更新）
impl From<&UploadProgress> for Option<DisplayProgress> {
    fn from(progress: &UploadProgress) -> Self {
        match &progress.phase {
            UploadPhase::Validating { file_name, .. } => Some(DisplayProgress::new(
                format!("Validating file: {}", file_name),
                ProgressCategory::Validation,
            )),
            UploadPhase::Rejected { file_name, reason } => Some(DisplayProgress::new(
                format!("File rejected: {} ({})", file_name, reason),
                ProgressCategory::Failed,
            )),
            UploadPhase::Ready {
                file_name,
                size_bytes,
                mime_type,
                preview,
            } => Some(
                DisplayProgress::new(
                    format!(
                        "File accepted: {} ({}, {})",
                        file_name,
                        format_megabytes(*size_bytes),
                        mime_type
                    ),
                    ProgressCategory::Preparation,
                )
                .with_details(format!("preview: {}", preview)),
            ),
            UploadPhase::Uploading {
                attempt,
                file_name,
                size_bytes,
            } => Some(DisplayProgress::new(
                format!(
                    "Uploading {} ({}) [attempt {}]...",
                    file_name,
                    format_megabytes(*size_bytes),
                    attempt
                ),
                ProgressCategory::Upload,
            )),
            UploadPhase::Progress { percent, .. } => format_upload_percent(*percent),
            UploadPhase::Succeeded { result, .. } => Some(DisplayProgress::new(
                format!(
                    "Upload successful. Prediction: {} ({})",
                    result.prediction.as_str(),
                    format_percent(result.confidence)
                ),
                ProgressCategory::Completed,
            )),
            UploadPhase::Failed { message, .. } => Some(DisplayProgress::new(
                format!("Upload failed: {}", message),
                ProgressCategory::Failed,
            )),
            UploadPhase::Cleared { cancelled_attempt } => Some(match cancelled_attempt {
                Some(attempt) => DisplayProgress::new(
                    format!("Cleared (upload {} cancelled)", attempt),
                    ProgressCategory::Completed,
                ),
                None => DisplayProgress::new("Cleared".to_string(), ProgressCategory::Completed),
            }),
        }
    }
}

/// 送信進捗の表示
///
/// 10%刻みでのみ表示し、それ以外は`None`を返して過度な更新を抑制する。
fn format_upload_percent(percent: u8) -> Option<DisplayProgress> {
    if percent % 10 == 0 {
        Some(DisplayProgress::new(
            format!("Uploading... {}%", percent),
            ProgressCategory::Upload,
        ))
    } else {
        None
    }
}

/// 端末へ進捗を書き出すシンク
///
/// * `machine_output = false`: 人間向けの行を stderr へ
/// * `machine_output = true`: JSON行を stdout へ
#[derive(Debug, Clone, Copy)]
pub struct TerminalProgressSink {
    machine_output: bool,
}

impl TerminalProgressSink {
    pub fn new(machine_output: bool) -> Self {
        Self { machine_output }
    }
}

impl ProgressSink for TerminalProgressSink {
    fn emit(&self, progress: UploadProgress) {
        if self.machine_output {
            match serde_json::to_string(&progress) {
                Ok(line) => println!("{}", line),
                Err(e) => log::warn!("failed to serialize progress event: {}", e),
            }
            return;
        }

        if let Some(display) = Option::<DisplayProgress>::from(&progress) {
            eprintln!("{}", display.message);
            if let Some(details) = display.details {
                eprintln!("  {}", details);
            }
        }
    }
}
