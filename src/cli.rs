use crate::commands::{self, CommandResult};
use anyhow::{Context, Result, bail};

/// 解析済みのコマンド
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Classify { file_path: String, progress: bool },
    Check { file_path: String },
    Config { endpoint: Option<String> },
    Help,
}

/// 解析済みのCLI引数
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArgs {
    /// 機械可読出力（--machine）
    pub machine_output: bool,
    /// None の場合は使用方法のみ表示
    pub command: Option<Command>,
}

/// CLI引数を解析する
///
/// `--machine` はコマンドの前後どちらに置いてもよい。
pub fn parse_args(args: &[String]) -> Result<ParsedArgs> {
    let machine_output = args.iter().skip(1).any(|a| a == "--machine");
    let rest: Vec<&str> = args
        .iter()
        .skip(1)
        .map(String::as_str)
        .filter(|a| *a != "--machine")
        .collect();

    let Some((command, command_args)) = rest.split_first() else {
        return Ok(ParsedArgs {
            machine_output,
            command: None,
        });
    };

    let command = match *command {
        "classify" => {
            let progress = command_args.contains(&"--progress");
            let file_path = positional(command_args)
                .context("Please specify an image file for the classify command")?;
            Command::Classify {
                file_path: file_path.to_string(),
                progress,
            }
        }
        "check" => {
            let file_path =
                positional(command_args).context("Please specify an image file for the check command")?;
            Command::Check {
                file_path: file_path.to_string(),
            }
        }
        "config" => {
            let endpoint = match command_args.iter().position(|a| *a == "--endpoint") {
                Some(index) => Some(
                    command_args
                        .get(index + 1)
                        .context("Please specify a URL after --endpoint")?
                        .to_string(),
                ),
                None => None,
            };
            Command::Config { endpoint }
        }
        "help" | "--help" | "-h" => Command::Help,
        other => bail!(
            "Unknown command: '{}'. Use 'help' to see available commands.",
            other
        ),
    };

    Ok(ParsedArgs {
        machine_output,
        command: Some(command),
    })
}

/// フラグ以外の最初の引数
fn positional<'a>(args: &[&'a str]) -> Option<&'a str> {
    args.iter().copied().find(|a| !a.starts_with("--"))
}

/// コマンドを実行する
pub async fn dispatch(command: Command, machine_output: bool) -> Result<CommandResult> {
    match command {
        Command::Classify { file_path, progress } => commands::classify::execute(&file_path, progress, machine_output)
            .await
            .context("Classify command failed"),
        Command::Check { file_path } => commands::check::execute(&file_path)
            .await
            .context("Check command failed"),
        Command::Config { endpoint } => {
            commands::config::execute(endpoint.as_deref()).context("Config command failed")
        }
        Command::Help => commands::help::execute(),
    }
}
