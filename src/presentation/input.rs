/// プレゼンテーション層: ユーザー入力処理
///
/// CLI引数で指定されたファイルを読み込み、ドメイン層の
/// `SelectedFile`（ファイル名・MIMEタイプ・内容）に変換します。
/// MIMEタイプは拡張子から判定します。
use crate::domain::candidate::SelectedFile;
use crate::domain::error::DomainError;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// 判定できない拡張子の MIME タイプ
const UNKNOWN_MIME: &str = "application/octet-stream";

/// 指定パスのファイルを読み込む
pub fn read_selected_file(file_path: &str) -> Result<SelectedFile, DomainError> {
    let path = Path::new(file_path);

    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DomainError::FileNotFound {
            path: file_path.to_string(),
        },
        _ => DomainError::UnreadableFile {
            path: file_path.to_string(),
            source: e,
        },
    })?;

    if !metadata.is_file() {
        return Err(DomainError::NotAFile {
            path: file_path.to_string(),
        });
    }

    let bytes = fs::read(path).map_err(|e| DomainError::UnreadableFile {
        path: file_path.to_string(),
        source: e,
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.to_string());

    Ok(SelectedFile::new(name, mime_type_for(path), bytes))
}

/// 拡張子から MIME タイプを推定する
pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "mp4" => "video/mp4",
        _ => UNKNOWN_MIME,
    }
}
