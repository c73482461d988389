/// ドメイン層のエラー定義
///
/// 候補画像の選択・送信に関わる制約違反と、分類サービスの応答に関する
/// プロトコルエラーを構造化して定義する。
/// 選択時の検証エラーと操作エラーは送信を開始せずにその場で返され、
/// 送信後の失敗（`UploadError`）はセッションの Failed 状態として保持される。
use crate::domain::transport::TransportFailure;
use crate::error_severity::ErrorSeverity;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// MIMEタイプが画像ではない
    #[error("not an image (type: {mime_type})")]
    NotAnImage { mime_type: String },

    /// ファイルサイズが制限を超過
    #[error("exceeds size limit of {max_mb}mb ({size} bytes)")]
    FileTooLarge { size: u64, max_mb: u64 },

    /// 候補画像が選択されていない
    #[error("no file selected")]
    NoFileSelected,

    /// 送信中に再送信が要求された
    #[error("an upload is already in progress")]
    UploadAlreadyInProgress,

    /// アップロード先が設定されていない
    #[error("no upload endpoint configured")]
    NoEndpointConfigured,

    /// プレビューリソースを確保できない
    #[error("preview unavailable: {message}")]
    PreviewUnavailable { message: String },

    /// ファイルが見つからない
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// ディレクトリが指定された（ファイルが期待される場所）
    #[error("'{path}' is a directory, not a file")]
    NotAFile { path: String },

    /// ファイルを読み込めない
    #[error("failed to read file: {path}")]
    UnreadableFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl DomainError {
    pub fn not_an_image(mime_type: impl Into<String>) -> Self {
        Self::NotAnImage {
            mime_type: mime_type.into(),
        }
    }

    pub fn preview_unavailable(message: impl Into<String>) -> Self {
        Self::PreviewUnavailable {
            message: message.into(),
        }
    }

    /// 選択時の検証エラーか
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::NotAnImage { .. } | Self::FileTooLarge { .. })
    }

    /// エラーの深刻度を返す
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoEndpointConfigured => ErrorSeverity::ConfigError,
            Self::PreviewUnavailable { .. } => ErrorSeverity::SystemError,
            Self::NotAnImage { .. }
            | Self::FileTooLarge { .. }
            | Self::NoFileSelected
            | Self::UploadAlreadyInProgress
            | Self::FileNotFound { .. }
            | Self::NotAFile { .. }
            | Self::UnreadableFile { .. } => ErrorSeverity::UserError,
        }
    }

    /// ユーザー向けのヒントメッセージを返す
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::NotAnImage { .. } => Some("Please choose an image file (jpg, png, webp, ...)."),
            Self::FileTooLarge { .. } => {
                Some("Try a smaller image or raise max_file_size_mb in your config file.")
            }
            Self::NoFileSelected => Some("Select an image before submitting."),
            Self::UploadAlreadyInProgress => Some("Wait for the current upload to finish."),
            Self::NoEndpointConfigured => {
                Some("Set MUSHVISION_API_URL or `endpoint` in your config file.")
            }
            Self::PreviewUnavailable { .. } => {
                Some("Check that the temporary directory is writable.")
            }
            Self::FileNotFound { .. } => {
                Some("Please check the file path and ensure the file exists.")
            }
            Self::NotAFile { .. } => Some("Please specify a file, not a directory."),
            Self::UnreadableFile { .. } => Some("Check the file permissions."),
        }
    }
}

/// 分類サービスの応答に関するエラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// 応答ボディを期待する形式として解釈できない
    #[error("unreadable response: {detail}")]
    UnparsableResponse { detail: String },

    /// `success: false` の応答
    #[error("classification failed: {message}")]
    ApplicationFailure { message: String },
}

/// 送信開始後の失敗（Failed 状態の原因）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error(transparent)]
    Transport(#[from] TransportFailure),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl UploadError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Protocol(ProtocolError::ApplicationFailure { .. }) => ErrorSeverity::UserError,
            Self::Protocol(_) | Self::Transport(_) => ErrorSeverity::SystemError,
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Transport(failure) => failure.kind.hint(),
            Self::Protocol(ProtocolError::UnparsableResponse { .. }) => {
                Some("The endpoint did not answer like a classifier. Check the configured URL.")
            }
            Self::Protocol(ProtocolError::ApplicationFailure { .. }) => {
                Some("The classifier rejected the image. Try another photo.")
            }
        }
    }
}
