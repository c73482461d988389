/// インフラ層のエラー定義
///
/// HTTP 通信中に発生するエラーを構造化して定義。
/// 転送タスクの境界で `TransportFailure` に変換され、マネージャーへ届けられる。
use crate::domain::transport::{FailureKind, TransportFailure};
use crate::error_severity::ErrorSeverity;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InfraError {
    /// 接続失敗などのネットワークエラー
    #[error("network error: {message}")]
    Network { message: String },

    /// 2xx 以外の応答
    #[error("HTTP error {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// タイムアウトエラー
    #[error("upload timed out: {operation}")]
    Timeout { operation: String },

    /// 応答ボディの読み取り失敗
    #[error("unreadable response: {message}")]
    Decode { message: String },

    /// HTTP クライアントやリクエストの組み立てに失敗
    #[error("failed to build request: {message}")]
    Client { message: String },

    /// 非同期ランタイムの外で作成された
    #[error("no async runtime available for the HTTP transport")]
    NoRuntime,
}

impl InfraError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn client(message: impl Into<String>) -> Self {
        Self::Client {
            message: message.into(),
        }
    }

    /// reqwest のエラーを分類する
    pub fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("POST {}", url))
        } else if err.is_connect() {
            Self::network(format!("connection failed to {}: {}", url, err))
        } else if err.is_decode() || err.is_body() {
            Self::decode(err.to_string())
        } else if err.is_builder() {
            Self::client(err.to_string())
        } else {
            Self::network(format!("request failed for {}: {}", url, err))
        }
    }

    /// エラーの深刻度を返す
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::HttpStatus { status, .. } if (400..500).contains(status) => ErrorSeverity::UserError,
            _ => ErrorSeverity::SystemError,
        }
    }

    pub fn hint(&self) -> Option<&str> {
        self.kind().hint()
    }

    /// 対応する失敗の分類
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } | Self::Client { .. } | Self::NoRuntime => FailureKind::Network,
            Self::HttpStatus { status, .. } => FailureKind::HttpStatus(*status),
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Decode { .. } => FailureKind::Parse,
        }
    }
}

impl From<InfraError> for TransportFailure {
    fn from(err: InfraError) -> Self {
        let kind = err.kind();
        let detail = match err {
            InfraError::Network { message }
            | InfraError::HttpStatus { message, .. }
            | InfraError::Decode { message } => message,
            InfraError::Timeout { operation } => operation,
            other => other.to_string(),
        };
        TransportFailure::new(kind, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_conversion_keeps_category_in_message() {
        let cases = [
            (InfraError::network("connection refused"), "network error: connection refused"),
            (InfraError::timeout("POST http://x/api"), "upload timed out: POST http://x/api"),
            (InfraError::http_status(500, "Internal Server Error"), "HTTP error 500: Internal Server Error"),
            (InfraError::decode("truncated body"), "unreadable response: truncated body"),
        ];

        for (err, expected) in cases {
            let failure = TransportFailure::from(err);
            assert_eq!(failure.to_string(), expected);
        }
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(InfraError::http_status(404, "").kind(), FailureKind::HttpStatus(404));
        assert_eq!(InfraError::NoRuntime.kind(), FailureKind::Network);
        assert_eq!(InfraError::decode("x").kind(), FailureKind::Parse);
    }

    #[test]
    fn test_severity() {
        assert_eq!(InfraError::http_status(400, "bad image").severity(), ErrorSeverity::UserError);
        assert_eq!(InfraError::http_status(503, "down").severity(), ErrorSeverity::SystemError);
        assert_eq!(InfraError::timeout("POST").severity(), ErrorSeverity::SystemError);
    }

    #[test]
    fn test_client_errors_keep_their_own_message() {
        let failure = TransportFailure::from(InfraError::client("bad mime"));
        assert_eq!(failure.kind, FailureKind::Network);
        assert_eq!(failure.detail, "failed to build request: bad mime");
    }
}
