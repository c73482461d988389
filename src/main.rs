mod api;
mod cli;
mod commands;
mod config;
mod domain;
mod error_severity;
mod logging;
mod presentation;

use anyhow::Result;
use api::error::InfraError;
use config::APP_CONFIG;
use config::error::ConfigError;
use domain::error::{DomainError, UploadError};
use error_severity::ErrorSeverity;
use std::env;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let machine_output = args.iter().any(|a| a == "--machine");

    logging::initialize(&APP_CONFIG.logging);

    if let Err(e) = run(&args).await {
        handle_error(e, machine_output);
    }
}

/// アプリケーションのメイン処理
async fn run(args: &[String]) -> Result<()> {
    let parsed = cli::parse_args(args)?;

    let Some(command) = parsed.command else {
        presentation::output::print_usage();
        return Ok(());
    };

    let result = cli::dispatch(command, parsed.machine_output).await?;
    presentation::output::output_result(&result, parsed.machine_output)
}

/// エラーハンドリングとユーザーへの表示
///
/// anyhow::Error から元のエラー型を downcast して、
/// エラーの種類に応じた exit code とメッセージを決定する。
fn handle_error(error: anyhow::Error, machine_output: bool) {
    let exit_code = determine_severity(&error)
        .map(|severity| severity.exit_code())
        .unwrap_or(1);
    let hint = get_error_hint(&error);

    if machine_output {
        let json = serde_json::json!({
            "success": false,
            "error": format!("{:#}", error),
            "exit_code": exit_code,
            "hint": hint,
        });
        println!("{}", json);
        std::process::exit(exit_code);
    }

    eprintln!("Error: {}", error);

    // エラーチェーンを辿って詳細を表示
    let chain: Vec<_> = error.chain().skip(1).collect();
    if !chain.is_empty() {
        eprintln!("\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            eprintln!("  {}: {}", i + 1, cause);
        }
    }

    if let Some(hint) = hint {
        eprintln!("\nHint: {}", hint);
    }

    std::process::exit(exit_code);
}

/// エラーチェーンから深刻度を決定
fn determine_severity(error: &anyhow::Error) -> Option<ErrorSeverity> {
    error.chain().find_map(|cause| {
        if let Some(err) = cause.downcast_ref::<DomainError>() {
            Some(err.severity())
        } else if let Some(err) = cause.downcast_ref::<UploadError>() {
            Some(err.severity())
        } else if let Some(err) = cause.downcast_ref::<InfraError>() {
            Some(err.severity())
        } else {
            cause.downcast_ref::<ConfigError>().map(ConfigError::severity)
        }
    })
}

/// エラーに対するユーザー向けヒントを取得
fn get_error_hint(error: &anyhow::Error) -> Option<String> {
    error.chain().find_map(|cause| {
        let hint = if let Some(err) = cause.downcast_ref::<DomainError>() {
            err.hint()
        } else if let Some(err) = cause.downcast_ref::<UploadError>() {
            err.hint()
        } else if let Some(err) = cause.downcast_ref::<InfraError>() {
            err.hint()
        } else if let Some(err) = cause.downcast_ref::<ConfigError>() {
            err.hint()
        } else {
            None
        };
        hint.map(str::to_string)
    })
}
