/// 分類サービスとの通信用の型定義
///
/// 応答エンベロープ `{ success, message, result }` と、
/// JSON(base64) 形式で送信する場合のリクエストボディを定義します。
use crate::domain::error::ProtocolError;
use serde::{Deserialize, Serialize};

/// 判定ラベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prediction {
    Edible,
    Poisonous,
}

impl Prediction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edible => "edible",
            Self::Poisonous => "poisonous",
        }
    }
}

/// クラスごとの確率（合計はおおよそ1）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub edible: f64,
    pub poisonous: f64,
}

/// 分類結果（解釈せずにプレゼンテーション層へ渡す）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub prediction: Prediction,
    /// 0.0〜1.0
    pub confidence: f64,
    pub probabilities: Probabilities,
}

/// 応答エンベロープ
#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationResponse {
    /// 存在して false の場合は 2xx でも失敗扱い
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<ClassificationResult>,
}

impl ClassificationResponse {
    /// 応答ボディをパースする
    pub fn parse(body: &[u8]) -> Result<Self, ProtocolError> {
        serde_json::from_slice(body).map_err(|e| ProtocolError::UnparsableResponse {
            detail: e.to_string(),
        })
    }

    /// エンベロープから分類結果を取り出す
    pub fn into_result(self) -> Result<ClassificationResult, ProtocolError> {
        if self.success == Some(false) {
            return Err(ProtocolError::ApplicationFailure {
                message: self
                    .message
                    .unwrap_or_else(|| "Classification failed".to_string()),
            });
        }

        self.result.ok_or_else(|| ProtocolError::UnparsableResponse {
            detail: "missing `result` object".to_string(),
        })
    }
}

/// エラー応答ボディから `message` を取り出す（JSONでなければ None）
pub fn error_message_from_body(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ClassificationResponse>(body)
        .ok()
        .and_then(|response| response.message)
        .filter(|message| !message.trim().is_empty())
}

/// JSON(base64) 形式のリクエストボディ
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRequest {
    pub image_data: String,
    pub image_name: String,
}
