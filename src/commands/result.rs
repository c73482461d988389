/// コマンド実行結果を表す型
///
/// 各コマンドはこの型を返し、プレゼンテーション層（main.rs/cli.rs）で
/// 人間向けと機械向けの出力フォーマットを決定する。
use crate::api::types::ClassificationResult;
use crate::config::{UploadEncoding, ValueSource};
use crate::domain::transport::AttemptId;
use serde::Serialize;

/// コマンド実行結果の統一型
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandResult {
    Classify(ClassifyResult),
    Check(CheckResult),
    Config(ConfigResult),
    Help,
}

/// 分類コマンドの結果
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyResult {
    pub file_name: String,
    /// ファイルサイズ（bytes）
    pub size_bytes: u64,
    pub mime_type: String,
    /// 成功した試行
    pub attempt: AttemptId,
    pub result: ClassificationResult,
}

/// 事前チェックコマンドの結果
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub file_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    /// 受理時に確保されたプレビューの場所（チェック後に解放済み）
    pub preview: String,
    /// 適用されたサイズ上限 (MiB)
    pub max_file_size_mb: u64,
}

/// 設定表示コマンドの結果
#[derive(Debug, Clone, Serialize)]
pub struct ConfigResult {
    /// ユーザー設定ファイルの場所
    pub config_path: Option<String>,
    /// 今回のコマンドでエンドポイントを保存したか
    pub endpoint_saved: bool,
    pub endpoint: Option<String>,
    pub endpoint_source: ValueSource,
    pub max_file_size_mb: u64,
    pub max_file_size_source: ValueSource,
    pub timeout_ms: u64,
    pub timeout_source: ValueSource,
    pub encoding: UploadEncoding,
}

impl CommandResult {
    /// 成功メッセージを取得（人間向け出力用）
    pub fn success_message(&self) -> String {
        match self {
            CommandResult::Classify(_) => "Upload successful.".to_string(),
            CommandResult::Check(_) => "File accepted.".to_string(),
            CommandResult::Config(r) => {
                if r.endpoint_saved {
                    "Configuration saved.".to_string()
                } else {
                    "Current configuration".to_string()
                }
            }
            CommandResult::Help => "".to_string(),
        }
    }
}
