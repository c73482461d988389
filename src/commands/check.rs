use crate::api::client::HttpTransport;
use crate::commands::result::{CheckResult, CommandResult};
use crate::config::{APP_CONFIG, UploaderConfig};
use crate::domain::candidate::SelectionSource;
use crate::domain::manager::UploadManager;
use crate::domain::preview::TempFilePreviewStore;
use crate::domain::progress::NoopSink;
use crate::presentation::input;
use anyhow::{Context, Result, bail};

/// 事前チェックコマンドを実行する
///
/// 送信はせず、選択（検証とプレビュー確保）だけを行ってからクリアする。
pub async fn execute(file_path: &str) -> Result<CommandResult> {
    let resolved = UploaderConfig::load()
        .context("Failed to load user configuration. Please check your config.toml file.")?;
    let config = resolved.uploader;
    let max_file_size_mb = config.max_file_size_mb;

    let file = input::read_selected_file(file_path).context("Failed to read image file")?;

    let transport = HttpTransport::new(&config).context("Failed to initialize HTTP transport")?;
    let previews = TempFilePreviewStore::new(&APP_CONFIG.upload.preview_dir_prefix)
        .context("Failed to prepare preview storage")?;
    let mut manager = UploadManager::new(config, transport, previews, Box::new(NoopSink));

    if let Err(e) = manager.select(vec![file], SelectionSource::Browse) {
        let context = if e.is_validation() {
            "File rejected"
        } else {
            "Failed to prepare the file"
        };
        return Err(e).context(context);
    }

    let snapshot = manager.snapshot();
    manager.clear();

    let (Some(file_name), Some(size_bytes), Some(mime_type), Some(preview)) = (
        snapshot.file_name,
        snapshot.size_bytes,
        snapshot.mime_type,
        snapshot.preview,
    ) else {
        bail!("File was accepted but no candidate is available");
    };

    Ok(CommandResult::Check(CheckResult {
        file_name,
        size_bytes,
        mime_type,
        preview,
        max_file_size_mb,
    }))
}
