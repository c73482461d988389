/// 候補画像（アップロード対象として選択中の1ファイル）
use crate::domain::preview::PreviewHandle;
use serde::Serialize;
use std::sync::Arc;

/// 選択操作の経路（どちらも同じ選択インテントに合流する）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    /// ファイル選択ダイアログ
    Browse,
    /// ドラッグ&ドロップ
    Drop,
}

/// ユーザーが渡した生のファイル
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// 検証を通過した候補画像
///
/// プレビューハンドルを排他的に所有する。置き換え・クリア時には
/// マネージャーが `into_preview` で取り出して解放する。
#[derive(Debug)]
pub struct Candidate {
    bytes: Arc<[u8]>,
    display_name: String,
    mime_type: String,
    size_bytes: u64,
    preview: PreviewHandle,
}

impl Candidate {
    pub(crate) fn new(file: SelectedFile, preview: PreviewHandle) -> Self {
        let size_bytes = file.size_bytes();
        Self {
            bytes: Arc::from(file.bytes),
            display_name: file.name,
            mime_type: file.mime_type,
            size_bytes,
            preview,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }

    /// 送信用に本体を共有する
    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// 候補を破棄し、解放すべきプレビューハンドルを返す
    pub(crate) fn into_preview(self) -> PreviewHandle {
        self.preview
    }
}
