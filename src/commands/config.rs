use crate::commands::result::{CommandResult, ConfigResult};
use crate::config::{UploaderConfig, UserConfig};
use anyhow::{Context, Result};

/// 設定表示コマンドを実行する
///
/// `endpoint` が指定された場合はユーザー設定に保存してから表示する。
/// 空文字列を指定すると保存済みのエンドポイントを削除する。
pub fn execute(endpoint: Option<&str>) -> Result<CommandResult> {
    let config_path = UserConfig::config_path().ok();

    let endpoint_saved = match endpoint {
        Some(endpoint) => {
            let mut user = UserConfig::load().context("Failed to load user configuration")?;
            let endpoint = endpoint.trim();
            user.endpoint = (!endpoint.is_empty()).then(|| endpoint.to_string());
            user.validate().context("Invalid endpoint")?;
            user.save().context("Failed to save user configuration")?;
            true
        }
        None => false,
    };

    let resolved = UploaderConfig::load()
        .context("Failed to load user configuration. Please check your config.toml file.")?;

    Ok(CommandResult::Config(ConfigResult {
        config_path: config_path.map(|p| p.display().to_string()),
        endpoint_saved,
        endpoint: resolved.uploader.endpoint,
        endpoint_source: resolved.endpoint_source,
        max_file_size_mb: resolved.uploader.max_file_size_mb,
        max_file_size_source: resolved.max_file_size_source,
        timeout_ms: resolved.uploader.timeout_ms,
        timeout_source: resolved.timeout_source,
        encoding: resolved.uploader.encoding,
    }))
}
