/// HTTPトランスポート
///
/// 分類サービスへの画像アップロードを担当する `TransportAdapter` 実装。
/// 転送は tokio タスクとして実行し、送信済みバイト数から進捗を通知します。
/// タイムアウト時は転送を打ち切り、キャンセル時はタスクごと中断します。
use crate::api::error::InfraError;
use crate::api::types::{ClassificationRequest, error_message_from_body};
use crate::config::{UploadEncoding, UploaderConfig};
use crate::domain::transport::{
    CancelHandle, ProgressReporter, TransportAdapter, TransportOutcome, TransportSink, UploadRequest,
};
use base64::{Engine as _, engine::general_purpose};
use futures::stream::{self, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// 1回に送り出すバイト数
const CHUNK_SIZE: usize = 64 * 1024;

/// multipart のファイルフィールド名
const FILE_FIELD: &str = "file";

/// HTTP トランスポートの結果型
type TransferResult<T> = Result<T, InfraError>;

/// reqwest ベースのトランスポート
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
    encoding: UploadEncoding,
    runtime: Handle,
}

impl HttpTransport {
    /// 新しいトランスポートを作成
    ///
    /// tokio ランタイムの中で呼び出す必要があります。
    ///
    /// # Arguments
    /// * `config` - 解決済みのアップロード設定（タイムアウトとボディ形式を使用）
    pub fn new(config: &UploaderConfig) -> TransferResult<Self> {
        let runtime = Handle::try_current().map_err(|_| InfraError::NoRuntime)?;
        let timeout = config.timeout();

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InfraError::client(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout,
            encoding: config.encoding,
            runtime,
        })
    }
}

impl TransportAdapter for HttpTransport {
    fn send(&self, request: UploadRequest, sink: TransportSink) -> CancelHandle {
        let cancel = sink.cancel_handle();
        let client = self.client.clone();
        let timeout = self.timeout;
        let encoding = self.encoding;

        let task = self.runtime.spawn(async move {
            let reporter = sink.reporter();
            let transfer = transfer(&client, &request, encoding, reporter);
            let outcome = match tokio::time::timeout(timeout, transfer).await {
                Ok(Ok((status, body))) => TransportOutcome::Success { status, body },
                Ok(Err(e)) => TransportOutcome::Failure(e.into()),
                Err(_) => TransportOutcome::Failure(
                    InfraError::timeout(format!("no response within {}ms", timeout.as_millis())).into(),
                ),
            };
            sink.complete(outcome);
        });

        cancel.with_abort(task.abort_handle())
    }
}

/// リクエストを送信し、成功時はステータスとボディを返す
async fn transfer(
    client: &Client,
    request: &UploadRequest,
    encoding: UploadEncoding,
    reporter: ProgressReporter,
) -> TransferResult<(u16, Vec<u8>)> {
    let builder = build_request(client, request, encoding, reporter)?;
    let response = builder
        .send()
        .await
        .map_err(|e| InfraError::from_reqwest(e, &request.url))?;

    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| InfraError::decode(format!("failed to read response body: {}", e)))?;

    if !status.is_success() {
        let message = error_message_from_body(&body)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "request failed".to_string());
        return Err(InfraError::http_status(status.as_u16(), message));
    }

    Ok((status.as_u16(), body.to_vec()))
}

/// ボディ形式に応じたリクエストを組み立てる
fn build_request(
    client: &Client,
    request: &UploadRequest,
    encoding: UploadEncoding,
    reporter: ProgressReporter,
) -> TransferResult<RequestBuilder> {
    match encoding {
        UploadEncoding::Multipart => {
            let length = request.bytes.len() as u64;
            let part = Part::stream_with_length(progress_body(Arc::clone(&request.bytes), reporter), length)
                .file_name(request.file_name.clone())
                .mime_str(&request.mime_type)
                .map_err(|e| InfraError::client(format!("invalid content type {}: {}", request.mime_type, e)))?;

            Ok(client
                .post(&request.url)
                .multipart(Form::new().part(FILE_FIELD, part)))
        }
        UploadEncoding::JsonBase64 => {
            let payload = ClassificationRequest {
                image_data: general_purpose::STANDARD.encode(&request.bytes),
                image_name: request.file_name.clone(),
            };
            let json = serde_json::to_vec(&payload)
                .map_err(|e| InfraError::client(format!("failed to encode request: {}", e)))?;

            Ok(client
                .post(&request.url)
                .header(CONTENT_TYPE, "application/json")
                .body(progress_body(Arc::from(json), reporter)))
        }
    }
}

/// チャンクを送り出すたびに進捗を通知するボディ
fn progress_body(bytes: Arc<[u8]>, reporter: ProgressReporter) -> Body {
    let total = bytes.len();
    let chunks = stream::iter((0..total).step_by(CHUNK_SIZE)).map(move |start| {
        let end = (start + CHUNK_SIZE).min(total);
        reporter.report(end as u64, total as u64);
        Ok::<_, std::io::Error>(bytes[start..end].to_vec())
    });
    Body::wrap_stream(chunks)
}
