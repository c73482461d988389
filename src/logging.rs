//! ロギングの初期化
//!
//! `log` ファサードのバックエンドとして simplelog を使う。
//! 端末出力は常に stderr（stdout は機械向け JSON 用に空けておく）。
//! `[logging] file_path` が設定されていればファイルにも書き出す。

use crate::config::app::LoggingConfig;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;

/// ログレベルを上書きする環境変数
pub const LOG_ENV: &str = "MUSHVISION_LOG";

/// グローバルロガーを初期化する（失敗しても処理は続行）
pub fn initialize(settings: &LoggingConfig) {
    let level = resolve_level(std::env::var(LOG_ENV).ok().as_deref(), &settings.level);
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if !settings.file_path.is_empty()
        && let Some(file_logger) = create_file_logger(&settings.file_path, level, config)
    {
        loggers.push(file_logger);
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Warning: Could not initialize logging: {}", e);
    }
}

/// 環境変数 > 設定ファイル の順でレベルを決める（不正な値は無視）
fn resolve_level(env_value: Option<&str>, configured: &str) -> LevelFilter {
    env_value
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| configured.trim().parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(path: &str, level: LevelFilter, config: Config) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {}: {}", path, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_level() {
        assert_eq!(resolve_level(None, "info"), LevelFilter::Info);
        assert_eq!(resolve_level(Some("debug"), "info"), LevelFilter::Debug);
        assert_eq!(resolve_level(Some("TRACE"), "info"), LevelFilter::Trace);
        assert_eq!(resolve_level(Some("loud"), "error"), LevelFilter::Error);
        assert_eq!(resolve_level(None, "nonsense"), LevelFilter::Warn);
    }
}
