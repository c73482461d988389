/// ドメイン層
///
/// アップロードマネージャーの状態機械と、その境界（トランスポート・プレビュー・通知）を定義する。
/// HTTP や端末出力には依存しない。
pub mod candidate;
pub mod error;
pub mod manager;
pub mod preview;
pub mod progress;
pub mod transport;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;
