/// プレゼンテーション層: コマンド結果の出力
///
/// コマンド実行結果をユーザー向け（人間可読）または
/// 機械向け（JSON）形式で出力する責務を担います。
/// CLI使用方法の表示もこのモジュールが担当します。
use crate::commands::result::CommandResult;
use crate::config::{UploadEncoding, ValueSource};
use anyhow::Result;

/// ヘルプテキスト（単一の情報源）
const HELP_TEXT: &str = "mushvision
Classify mushroom photos as edible or poisonous from the command line

Usage:
  mushvision [--machine] <command> [args...]

Global Flags:
  --machine        - Output machine-readable JSON to stdout (for scripting)
                     Works for both success and error cases

Available commands:
  classify <file> [--progress]
                   - Upload an image to the classifier and print the prediction
                     --progress: Show validation and upload progress
  check <file>     - Validate an image (type and size) without uploading it
  config [--endpoint <url>]
                   - Show the resolved configuration and where each value comes from
                     --endpoint: Save the upload URL to the user config (\"\" to unset)
  help             - Display this help message

Environment:
  MUSHVISION_API_URL             - Upload URL (overrides the config file)
  MUSHVISION_LOG                 - Log level (trace, debug, info, warn, error)

Error Output:
  Normal mode:   Human-readable error messages to stderr
  --machine:     JSON error object with exit_code and hint fields

Progress Output:
  classify --progress            - Show human-readable progress to stderr
  --machine classify --progress  - Output machine-readable JSON progress to stdout";

/// 分類結果に添える注意書き
const DISCLAIMER: &str = "Disclaimer: This classification is for educational purposes only. \
Never eat a wild mushroom based on this result; consult a qualified expert.";

/// コマンド使用方法を表示する
///
/// CLI引数が不正な場合や、ヘルプが必要な場合に呼び出されます。
pub fn print_usage() {
    eprintln!("{}", HELP_TEXT);
}

/// コマンド結果を適切な形式で出力する
///
/// # Output
/// * `machine_output = false`: 人間向けの詳細メッセージ（stderr）
/// * `machine_output = true`: 機械可読JSON（stdout）
pub fn output_result(result: &CommandResult, machine_output: bool) -> Result<()> {
    if machine_output {
        println!("{}", render_machine_readable(result)?);
    } else {
        eprint!("{}", render_human_readable(result));
    }

    Ok(())
}

/// バイト数を MB 表記（小数2桁）にする
pub fn format_megabytes(size_bytes: u64) -> String {
    format!("{:.2} MB", size_bytes as f64 / 1_048_576.0)
}

/// 0.0〜1.0 の確率を百分率（小数2桁）にする
pub fn format_percent(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

fn source_label(source: ValueSource) -> &'static str {
    match source {
        ValueSource::Default => "default",
        ValueSource::UserConfig => "user config",
        ValueSource::Environment => "environment",
    }
}

fn encoding_label(encoding: UploadEncoding) -> &'static str {
    match encoding {
        UploadEncoding::Multipart => "multipart",
        UploadEncoding::JsonBase64 => "json-base64",
    }
}

/// 人間向けの詳細メッセージを組み立てる
///
/// 出力はstderrに送られ、stdoutはパイプライン用に予約されます。
fn render_human_readable(result: &CommandResult) -> String {
    let mut out = String::new();
    let mut line = |text: String| {
        out.push_str(&text);
        out.push('\n');
    };

    match result {
        CommandResult::Classify(r) => {
            line(String::new());
            line(result.success_message());
            line("---".to_string());
            line(format!("File:        {} ({}, {})", r.file_name, format_megabytes(r.size_bytes), r.mime_type));
            line(format!("Prediction:  {}", r.result.prediction.as_str().to_uppercase()));
            line(format!("Confidence:  {}", format_percent(r.result.confidence)));
            line(format!("  Edible:    {}", format_percent(r.result.probabilities.edible)));
            line(format!("  Poisonous: {}", format_percent(r.result.probabilities.poisonous)));
            line("---".to_string());
            line(DISCLAIMER.to_string());
        }
        CommandResult::Check(r) => {
            line(result.success_message());
            line(format!("File:      {}", r.file_name));
            line(format!("Type:      {}", r.mime_type));
            line(format!(
                "Size:      {} (limit {} MB)",
                format_megabytes(r.size_bytes),
                r.max_file_size_mb
            ));
            line(format!("Preview:   {} (released)", r.preview));
        }
        CommandResult::Config(r) => {
            line(result.success_message());
            if let Some(path) = &r.config_path {
                line(format!("Config file:    {}", path));
            }
            line(format!(
                "Endpoint:       {} ({})",
                r.endpoint.as_deref().unwrap_or("(not set)"),
                source_label(r.endpoint_source)
            ));
            line(format!(
                "Max file size:  {} MB ({})",
                r.max_file_size_mb,
                source_label(r.max_file_size_source)
            ));
            line(format!("Timeout:        {} ms ({})", r.timeout_ms, source_label(r.timeout_source)));
            line(format!("Encoding:       {}", encoding_label(r.encoding)));
        }
        CommandResult::Help => {
            line(HELP_TEXT.to_string());
        }
    }

    out
}

/// 機械可読JSONを組み立てる
///
/// スクリプトやパイプライン処理のために、
/// コマンド結果を構造化されたJSON形式で出力します。
fn render_machine_readable(result: &CommandResult) -> Result<String> {
    let mut json = serde_json::to_value(result)?;
    if let Some(object) = json.as_object_mut() {
        object.insert("success".to_string(), serde_json::Value::Bool(true));
    }
    Ok(serde_json::to_string(&json)?)
}
