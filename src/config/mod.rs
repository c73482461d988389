/// 設定管理モジュール
///
/// このモジュールは3段の設定解決を提供します:
/// 1. AppConfig - ビルド時に埋め込まれるデフォルト値（APP_CONFIG）
/// 2. UserConfig - 実行時にユーザーディレクトリから読み込まれる上書き値
/// 3. 環境変数 MUSHVISION_API_URL - エンドポイントの上書き
///
/// 解決結果の `UploaderConfig` はアップロードマネージャーと
/// トランスポートに注入され、モジュールレベルの定数としては参照されません。
///
/// # 使用例
///
/// ```rust
/// use crate::config::{UploaderConfig, UserConfig};
///
/// let user_config = UserConfig::load()?;
/// let resolved = UploaderConfig::resolve(&APP_CONFIG, &user_config, UploaderConfig::endpoint_from_env());
/// let manager = UploadManager::new(resolved.uploader, transport, previews, sink);
/// ```
pub mod app;
pub mod error;
pub mod user;

pub use app::{APP_CONFIG, AppConfig, BYTES_PER_MB, UploadEncoding};
pub use user::UserConfig;

use crate::config::error::ConfigError;
use crate::domain::validator::ValidationPolicy;
use serde::Serialize;
use std::time::Duration;

/// エンドポイントを上書きする環境変数
pub const API_URL_ENV: &str = "MUSHVISION_API_URL";

/// アップロードに必要な設定値（解決済み）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploaderConfig {
    /// アップロードURL（None の場合は送信不可）
    pub endpoint: Option<String>,
    /// 受け付ける画像の最大サイズ (MiB)
    pub max_file_size_mb: u64,
    /// アップロードのタイムアウト（ミリ秒）
    pub timeout_ms: u64,
    /// リクエストボディの形式
    #[serde(skip)]
    pub encoding: UploadEncoding,
}

/// 設定値の出所
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Default,
    UserConfig,
    Environment,
}

/// 解決結果と各値の出所
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub uploader: UploaderConfig,
    pub endpoint_source: ValueSource,
    pub max_file_size_source: ValueSource,
    pub timeout_source: ValueSource,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self::from_app(&APP_CONFIG)
    }
}

impl UploaderConfig {
    /// 埋め込み設定のみから作成
    pub fn from_app(app: &AppConfig) -> Self {
        Self {
            endpoint: normalize_endpoint(Some(app.api.upload_url())),
            max_file_size_mb: app.upload.max_file_size_mb,
            timeout_ms: app.api.timeout_ms,
            encoding: app.upload.encoding,
        }
    }

    /// 環境変数からエンドポイントを取得
    pub fn endpoint_from_env() -> Option<String> {
        std::env::var(API_URL_ENV).ok()
    }

    /// 環境変数 > ユーザー設定 > 埋め込み設定 の順で解決する
    ///
    /// 空白のみのエンドポイントは「未設定」として None に解決される。
    pub fn resolve(app: &AppConfig, user: &UserConfig, env_endpoint: Option<String>) -> ResolvedConfig {
        let mut uploader = Self::from_app(app);
        let mut endpoint_source = ValueSource::Default;
        let mut max_file_size_source = ValueSource::Default;
        let mut timeout_source = ValueSource::Default;

        if let Some(endpoint) = env_endpoint {
            uploader.endpoint = normalize_endpoint(Some(endpoint));
            endpoint_source = ValueSource::Environment;
        } else if let Some(endpoint) = &user.endpoint {
            uploader.endpoint = normalize_endpoint(Some(endpoint.clone()));
            endpoint_source = ValueSource::UserConfig;
        }

        if let Some(size) = user.max_file_size_mb {
            uploader.max_file_size_mb = size;
            max_file_size_source = ValueSource::UserConfig;
        }

        if let Some(timeout) = user.timeout_ms {
            uploader.timeout_ms = timeout;
            timeout_source = ValueSource::UserConfig;
        }

        ResolvedConfig {
            uploader,
            endpoint_source,
            max_file_size_source,
            timeout_source,
        }
    }

    /// ユーザー設定と環境変数を読み込んで解決する
    pub fn load() -> Result<ResolvedConfig, ConfigError> {
        let user = UserConfig::load()?;
        Ok(Self::resolve(&APP_CONFIG, &user, Self::endpoint_from_env()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// 選択時の検証ポリシー
    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy::from_megabytes(self.max_file_size_mb)
    }
}

fn normalize_endpoint(endpoint: Option<String>) -> Option<String> {
    endpoint
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
}
