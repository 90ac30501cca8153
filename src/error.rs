//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// xlsxjsonクレート全体で使用するエラー型
///
/// ワークブックの読み込み・解析、JSONドキュメントの解析、
/// ワークブックの再構築中に発生するすべてのエラーを統一的に扱う。
///
/// エラーの捕捉はスコープ単位で行われる。セル・テーブル・シート単位で
/// 回復可能な失敗はログに記録して処理を継続し、この型が呼び出し元まで
/// 伝播するのはファイル単位の致命的な失敗のみとなる。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxjson::XlsxJsonError;
/// use std::fs::File;
///
/// fn read_workbook(path: &str) -> Result<(), XlsxJsonError> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     // ... 処理 ...
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum XlsxJsonError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Excelファイルの解析中に発生したエラー
    ///
    /// calamineクレートがワークブックを解析する際に発生したエラーです。
    /// ファイル形式が不正、破損したファイルなどが原因となります。
    #[error("Failed to parse Excel file: {0}")]
    Parse(#[from] calamine::Error),

    /// Excelファイルの書き込み中に発生したエラー
    ///
    /// rust_xlsxwriterクレートがワークブックを生成する際に発生したエラーです。
    #[error("Failed to write Excel file: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    /// JSONドキュメントの解析・生成エラー
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8文字列の変換エラー
    ///
    /// XML解析時にUTF-8文字列への変換に失敗した場合に発生します。
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// ZIPアーカイブの解析エラー
    ///
    /// XLSXファイル（ZIPアーカイブ）の解析中に発生したエラーです。
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// 数値の解析エラー
    #[error("Number parse error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// 設定の検証に失敗したエラー
    ///
    /// `ConverterBuilder::build()`時の検証、および不正な範囲指定などの
    /// 構成上の問題で発生します。
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSONドキュメントがスキーマの前提を満たしていないエラー
    #[error("Schema error: {0}")]
    Schema(String),

    /// 単一シートのスコープで発生したエラー
    ///
    /// ドライバはこのエラーをログに記録してシートをスキップし、
    /// 残りのシートの処理を継続します。
    #[error("Sheet '{sheet}' failed: {message}")]
    Sheet {
        /// エラーが発生したシート名
        sheet: String,
        /// エラーの詳細メッセージ
        message: String,
    },

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃、ファイルサイズ制限などの
    /// セキュリティ制限に違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}
