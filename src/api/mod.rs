/// インフラ層: 分類サービスとの HTTP 通信
///
/// - `client`: reqwest による `TransportAdapter` 実装
/// - `types`: 応答エンベロープと分類結果
/// - `error`: 通信エラー
pub mod client;
pub mod error;
pub mod types;
