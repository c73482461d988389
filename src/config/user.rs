/// ユーザー設定モジュール
///
/// 実行時にユーザーディレクトリから読み込まれる動的設定を管理します。
/// Windows: C:\Users\<User>\AppData\Roaming\mushvision\config.toml
/// macOS:   /Users/<User>/Library/Application Support/mushvision/config.toml
/// Linux:   /home/<user>/.config/mushvision/config.toml
///
/// すべての項目は任意で、未設定の項目は埋め込み設定（APP_CONFIG）の値が使われます。
/// 初回起動時にコメントのみのテンプレートを自動作成します。
use crate::config::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 最大ファイルサイズの上限 (MiB)
const MAX_FILE_SIZE_MB_LIMIT: u64 = 1024;

/// タイムアウトの下限（ミリ秒）
const MIN_TIMEOUT_MS: u64 = 100;

/// タイムアウトの上限（10分）
const MAX_TIMEOUT_MS: u64 = 600_000;

/// ユーザー設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    /// アップロード先URL（空文字列はエンドポイント未設定として扱う）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// 受け付ける画像の最大サイズ (MiB)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size_mb: Option<u64>,

    /// アップロードのタイムアウト（ミリ秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl UserConfig {
    /// ユーザー設定ファイルのパスを取得
    ///
    /// # Errors
    /// 設定ディレクトリが取得できない場合に ConfigError::DirectoryNotFound を返します。
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .ok_or_else(|| ConfigError::directory_not_found("Failed to get user config directory"))
            .map(|config_dir| config_dir.join("mushvision").join("config.toml"))
    }

    /// プラットフォーム既定の場所からユーザー設定を読み込む
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// 指定パスからユーザー設定を読み込む
    ///
    /// 設定ファイルが存在しない場合は、デフォルトテンプレートから自動的に作成します。
    /// 読み込み後、自動的に検証を実行します（Fail Fast）。
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            ConfigError::file_system(
                format!("Failed to read config file: {}", config_path.display()),
                e,
            )
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            ConfigError::parse_error(
                format!("Failed to parse config file ({})", config_path.display()),
                e,
            )
        })?;

        config.validate()?;

        Ok(config)
    }

    /// デフォルト設定ファイルを作成
    fn create_default_config(config_path: &Path) -> Result<(), ConfigError> {
        Self::ensure_parent_dir(config_path)?;

        fs::write(config_path, Self::default_toml_content()).map_err(|e| {
            ConfigError::file_system(
                format!("Failed to create default config file: {}", config_path.display()),
                e,
            )
        })
    }

    fn ensure_parent_dir(config_path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConfigError::file_system(
                    format!("Failed to create config directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// デフォルトTOMLテンプレート（すべてコメントアウト）
    fn default_toml_content() -> String {
        format!(
            r#"# mushvision - User Configuration
# Every key is optional; unset keys fall back to the built-in defaults.
# MUSHVISION_API_URL overrides `endpoint` when set.

# Full upload URL of the classifier service
# endpoint = "http://localhost:8080/api/classifications/classify-file"

# Largest accepted image in MiB (1-{})
# max_file_size_mb = 15

# Upload timeout in milliseconds ({}-{})
# timeout_ms = 30000
"#,
            MAX_FILE_SIZE_MB_LIMIT, MIN_TIMEOUT_MS, MAX_TIMEOUT_MS
        )
    }

    /// プラットフォーム既定の場所に保存する
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// 指定パスに保存する（必要に応じてディレクトリを作成）
    pub fn save_to(&self, config_path: &Path) -> Result<(), ConfigError> {
        Self::ensure_parent_dir(config_path)?;

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::serialize_error("Failed to serialize config", e))?;

        fs::write(config_path, content).map_err(|e| {
            ConfigError::file_system(
                format!("Failed to write config file: {}", config_path.display()),
                e,
            )
        })
    }

    /// ユーザー設定を検証
    ///
    /// # 検証内容
    /// - max_file_size_mb: 1 以上 1024 以下
    /// - timeout_ms: 100 以上 600000 以下
    ///
    /// - endpoint: http:// または https:// で始まる
    ///
    /// endpoint は空文字列を許容する（「未設定」の明示として扱う）。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = self.endpoint.as_deref().map(str::trim)
            && !endpoint.is_empty()
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ConfigError::validation_error(format!(
                "Invalid endpoint '{}'. Must start with http:// or https://",
                endpoint
            )));
        }

        if let Some(size) = self.max_file_size_mb
            && !(1..=MAX_FILE_SIZE_MB_LIMIT).contains(&size)
        {
            return Err(ConfigError::validation_error(format!(
                "Invalid max_file_size_mb '{}'. Must be between 1 and {}",
                size, MAX_FILE_SIZE_MB_LIMIT
            )));
        }

        if let Some(timeout) = self.timeout_ms
            && !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&timeout)
        {
            return Err(ConfigError::validation_error(format!(
                "Invalid timeout_ms '{}'. Must be between {} and {}",
                timeout, MIN_TIMEOUT_MS, MAX_TIMEOUT_MS
            )));
        }

        Ok(())
    }
}
