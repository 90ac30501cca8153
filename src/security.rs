//! Security Module
//!
//! ZIP bomb攻撃やパストラバーサル攻撃への対策を提供するモジュール。
//! メタデータ解析の前にアーカイブ全体を検証する。

use std::io::{Read, Seek};

use zip::ZipArchive;

use crate::error::XlsxJsonError;

/// アーカイブ処理の制限値
#[derive(Debug, Clone)]
pub(crate) struct ArchiveLimits {
    /// 入力ファイルの最大サイズ（バイト）
    pub max_input_size: u64,
    /// アーカイブ内の最大エントリ数
    pub max_entry_count: usize,
    /// 単一エントリの展開後最大サイズ（バイト）
    pub max_entry_size: u64,
    /// 展開後の合計最大サイズ（バイト）
    pub max_total_size: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_input_size: 2_147_483_648,  // 2GB
            max_entry_count: 10_000,
            max_entry_size: 104_857_600,    // 100MB
            max_total_size: 1_073_741_824,  // 1GB
        }
    }
}

/// アーカイブ全体を検証
///
/// エントリ数・各エントリのパスとサイズ・展開後の合計サイズを
/// 制限値と照合します。違反があれば`SecurityViolation`を返します。
pub(crate) fn validate_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    limits: &ArchiveLimits,
) -> Result<(), XlsxJsonError> {
    if archive.len() > limits.max_entry_count {
        return Err(XlsxJsonError::SecurityViolation(format!(
            "ZIP archive contains too many files: {} (max: {})",
            archive.len(),
            limits.max_entry_count
        )));
    }

    let mut total_size = 0u64;
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| XlsxJsonError::Zip(format!("{}", e)))?;

        let name = entry.name();
        validate_zip_path(name)
            .map_err(|e| XlsxJsonError::SecurityViolation(format!("Invalid ZIP path: {}", e)))?;

        let size = entry.size();
        if size > limits.max_entry_size {
            return Err(XlsxJsonError::SecurityViolation(format!(
                "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                name, size, limits.max_entry_size
            )));
        }

        total_size = total_size.checked_add(size).ok_or_else(|| {
            XlsxJsonError::SecurityViolation(
                "Total decompressed size calculation overflow".to_string(),
            )
        })?;

        if total_size > limits.max_total_size {
            return Err(XlsxJsonError::SecurityViolation(format!(
                "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                total_size, limits.max_total_size
            )));
        }
    }

    Ok(())
}

/// ZIPエントリのパスを検証
///
/// パストラバーサル攻撃を防ぐため、`..`・絶対パス・バックスラッシュを拒否します。
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    if path.starts_with('/') || path.starts_with("C:\\") || path.starts_with("c:\\") {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    if path.contains("..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}
