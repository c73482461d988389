/// ドメインサービス: 候補画像の検証ポリシー
///
/// `(MIMEタイプ, サイズ, ポリシー)` だけで結果が決まる純粋関数。
/// 副作用を持たないため、マネージャーとは独立してテストできる。
use crate::config::BYTES_PER_MB;
use crate::domain::error::DomainError;

/// 既定の最大サイズ (MiB)
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 15;

/// 選択時の検証ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    max_file_size_mb: u64,
}

impl ValidationPolicy {
    pub fn from_megabytes(max_file_size_mb: u64) -> Self {
        Self { max_file_size_mb }
    }

    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size_mb
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(BYTES_PER_MB)
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::from_megabytes(DEFAULT_MAX_FILE_SIZE_MB)
    }
}

/// 候補画像を検証する
///
/// # エラー
/// - MIMEタイプが `image/` で始まらない → `NotAnImage`
/// - サイズが上限を超える → `FileTooLarge`（上限ちょうどは許可）
pub fn validate_image(
    mime_type: &str,
    size_bytes: u64,
    policy: &ValidationPolicy,
) -> Result<(), DomainError> {
    if !is_image_mime(mime_type) {
        return Err(DomainError::not_an_image(mime_type));
    }

    if size_bytes > policy.max_bytes() {
        return Err(DomainError::FileTooLarge {
            size: size_bytes,
            max_mb: policy.max_file_size_mb(),
        });
    }

    Ok(())
}

fn is_image_mime(mime_type: &str) -> bool {
    mime_type
        .trim()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}
