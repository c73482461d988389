/// アプリケーション設定モジュール
///
/// ビルド時に config.toml から埋め込まれる静的設定を管理します。
/// ここで定義されるのはデフォルト値のみで、実行時の値は
/// `UploaderConfig::resolve` でユーザー設定・環境変数と合成されます。
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// 1 MiB のバイト数
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// 埋め込み設定（初回アクセス時にパース）
pub static APP_CONFIG: LazyLock<AppConfig> = LazyLock::new(AppConfig::load);

/// アプリケーション全体の設定
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

/// 分類サービス関連の設定
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// 分類サービスのベースURL
    pub base_url: String,

    /// アップロード先のパス（base_url に連結）
    pub upload_path: String,

    /// アップロードのタイムアウト(ミリ秒)
    pub timeout_ms: u64,
}

/// アップロード関連の設定
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// 受け付ける画像の最大サイズ (MiB)
    pub max_file_size_mb: u64,

    /// リクエストボディの形式
    pub encoding: UploadEncoding,

    /// プレビュー用一時ディレクトリの接頭辞
    pub preview_dir_prefix: String,
}

/// アップロードのリクエストボディ形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadEncoding {
    /// multipart/form-data の `file` フィールド
    #[serde(rename = "multipart")]
    Multipart,
    /// `{ "imageData": <base64>, "imageName": <name> }` のJSON
    #[serde(rename = "json-base64")]
    JsonBase64,
}

/// ロギング関連の設定
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// ログレベル (trace, debug, info, warn, error)
    pub level: String,

    /// ログファイルの保存先 (空の場合は端末のみ)
    pub file_path: String,
}

impl ApiConfig {
    /// ベースURLとパスからアップロードURLを組み立てる
    pub fn upload_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.upload_path
        )
    }
}

impl AppConfig {
    /// ビルド時に埋め込まれたconfig.tomlから設定を読み込む
    ///
    /// # Panics
    /// 設定ファイルのパースに失敗した場合はパニックします。
    /// これはビルド時設定なので、実行時エラーではなくコンパイルエラーとして扱うべきです。
    pub fn load() -> Self {
        const CONFIG_STR: &str = include_str!("../../config.toml");
        toml::from_str(CONFIG_STR)
            .expect("Failed to parse embedded config.toml. This is a build-time configuration error.")
    }
}
