/// プレビューリソースの取得と解放
///
/// プレビューは候補画像1つにつき1つだけ確保され、候補の置き換え・クリア・
/// マネージャー破棄のいずれかでちょうど1回解放される。
/// `PreviewHandle` は複製できず `release` で消費されるため、二重解放は型で防がれる。
use crate::domain::candidate::SelectedFile;
use crate::domain::error::DomainError;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// 確保済みのプレビューリソース
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    id: u64,
    location: String,
}

impl PreviewHandle {
    pub fn new(id: u64, location: impl Into<String>) -> Self {
        Self {
            id,
            location: location.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// 表示に使う場所（URLやパス）
    pub fn location(&self) -> &str {
        &self.location
    }
}

/// プレビューリソースの確保・解放を行うストア
pub trait PreviewStore {
    fn acquire(&mut self, file: &SelectedFile) -> Result<PreviewHandle, DomainError>;

    fn release(&mut self, handle: PreviewHandle);
}

/// 一時ディレクトリにファイルを書き出してプレビューとするストア
///
/// ハンドルの場所は `file://` URL。ストア自体を破棄すると
/// ディレクトリごと削除される。
pub struct TempFilePreviewStore {
    dir: TempDir,
    next_id: u64,
}

impl TempFilePreviewStore {
    pub fn new(prefix: &str) -> Result<Self, DomainError> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .map_err(|e| DomainError::preview_unavailable(format!("failed to create preview directory: {}", e)))?;
        Ok(Self { dir, next_id: 0 })
    }

    fn path_for(&self, id: u64, name: &str) -> PathBuf {
        self.dir.path().join(format!("{}-{}", id, sanitize_file_name(name)))
    }
}

impl PreviewStore for TempFilePreviewStore {
    fn acquire(&mut self, file: &SelectedFile) -> Result<PreviewHandle, DomainError> {
        self.next_id += 1;
        let path = self.path_for(self.next_id, &file.name);

        fs::write(&path, &file.bytes).map_err(|e| {
            DomainError::preview_unavailable(format!("failed to write {}: {}", path.display(), e))
        })?;

        log::debug!("preview {} acquired at {}", self.next_id, path.display());
        Ok(PreviewHandle::new(
            self.next_id,
            format!("file://{}", path.display()),
        ))
    }

    fn release(&mut self, handle: PreviewHandle) {
        let path = handle
            .location()
            .strip_prefix("file://")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(handle.location()));

        match fs::remove_file(&path) {
            Ok(()) => log::debug!("preview {} released", handle.id()),
            Err(e) => log::warn!("failed to release preview {}: {}", path.display(), e),
        }
    }
}

/// ファイル名からパス区切りなどを取り除く
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches(['.', '_']).is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}
