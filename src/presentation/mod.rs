/// プレゼンテーション層モジュール
///
/// ドメイン層のビジネスロジックとUI表示の橋渡しを行います。
/// プレゼンテーション層はドメイン層に依存しますが、その逆はありません。
///
/// # モジュール
/// - `input`: 画像ファイルの読み込み
/// - `output`: コマンド結果の出力（人間向け・機械向け）
/// - `progress`: アップロード進捗の表示
pub mod input;
pub mod output;
pub mod progress;
