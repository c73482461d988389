//! エラーの深刻度（終了コードの決定に使用）
//!
//! プレゼンテーション層の関心事だが、各層のエラー型が `severity()` で
//! この分類を返すため、どの層にも依存しない独立モジュールとして置く。

use serde::Serialize;
use std::fmt;

/// エラーの深刻度と対応する終了コード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// ユーザーが直せるエラー
    ///
    /// 画像ではないファイル、サイズ超過、ファイル未選択など。
    ///
    /// **Exit Code: 1**
    UserError,

    /// 設定エラー
    ///
    /// エンドポイント未設定、設定ファイルの破損など。
    ///
    /// **Exit Code: 2**
    ConfigError,

    /// システムエラー
    ///
    /// 分類サービスに接続できない、タイムアウト、サーバーエラーなど。
    ///
    /// **Exit Code: 3**
    SystemError,
}

impl ErrorSeverity {
    /// 対応する終了コードを返す
    pub fn exit_code(self) -> i32 {
        match self {
            Self::UserError => 1,
            Self::ConfigError => 2,
            Self::SystemError => 3,
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserError => write!(f, "user error"),
            Self::ConfigError => write!(f, "configuration error"),
            Self::SystemError => write!(f, "system error"),
        }
    }
}
