use crate::api::client::HttpTransport;
use crate::commands::result::{ClassifyResult, CommandResult};
use crate::config::{APP_CONFIG, UploaderConfig};
use crate::domain::candidate::SelectionSource;
use crate::domain::manager::UploadManager;
use crate::domain::preview::TempFilePreviewStore;
use crate::domain::progress::{NoopSink, ProgressSink};
use crate::presentation::input;
use crate::presentation::progress::TerminalProgressSink;
use anyhow::{Context, Result, bail};

/// 分類コマンドを実行する
///
/// 画像を1枚選択して送信し、完了まで待って分類結果を返す。
///
/// # 引数
/// * `file_path` - 分類する画像ファイルのパス
/// * `show_progress` - 状態遷移と進捗を表示するか
/// * `machine_output` - 進捗をJSON行で出力するか
///
/// # エラー
/// このレイヤーでは anyhow::Result を返し、
/// ドメイン層・インフラ層のエラーを集約する。
pub async fn execute(file_path: &str, show_progress: bool, machine_output: bool) -> Result<CommandResult> {
    // ユーザー設定を読み込み（自動検証される）
    let resolved = UploaderConfig::load()
        .context("Failed to load user configuration. Please check your config.toml file.")?;
    let config = resolved.uploader;

    let file = input::read_selected_file(file_path).context("Failed to read image file")?;

    let transport = HttpTransport::new(&config).context("Failed to initialize HTTP transport")?;
    let previews = TempFilePreviewStore::new(&APP_CONFIG.upload.preview_dir_prefix)
        .context("Failed to prepare preview storage")?;
    let sink: Box<dyn ProgressSink> = if show_progress {
        Box::new(TerminalProgressSink::new(machine_output))
    } else {
        Box::new(NoopSink)
    };

    let mut manager = UploadManager::new(config, transport, previews, sink);

    manager
        .select(vec![file], SelectionSource::Browse)
        .context("File validation failed")?;
    let attempt = manager.submit().context("Failed to start upload")?;
    manager.wait_until_settled().await;

    if let Some(failure) = manager.failure() {
        return Err(failure.clone()).context("Upload failed");
    }

    let (Some(result), Some(candidate)) = (manager.result(), manager.candidate()) else {
        bail!(
            "Upload finished without a classification result: {}",
            manager.error_message().unwrap_or("unknown state")
        );
    };

    Ok(CommandResult::Classify(ClassifyResult {
        file_name: candidate.display_name().to_string(),
        size_bytes: candidate.size_bytes(),
        mime_type: candidate.mime_type().to_string(),
        attempt,
        result: result.clone(),
    }))
}
