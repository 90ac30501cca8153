//! Builder Module
//!
//! Fluent Builder APIを提供し、`Converter`インスタンスを段階的に構築する。

use std::io::{Read, Seek};

use crate::error::XlsxJsonError;
use crate::extract::extract_workbook;
use crate::rebuild::build_workbook;
use crate::schema::WorkbookDocument;
use crate::security::ArchiveLimits;

/// 変換処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ConversionConfig {
    /// ISO日付形の文字列を日付値へ戻すヒューリスティックを使うか
    pub date_coercion: bool,

    /// アーカイブ処理の制限値
    pub limits: ArchiveLimits,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            date_coercion: true,
            limits: ArchiveLimits::default(),
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Converter`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみを
/// オーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxjson::ConverterBuilder;
///
/// # fn main() -> Result<(), xlsxjson::XlsxJsonError> {
/// let converter = ConverterBuilder::new()
///     .with_date_coercion(false)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConverterBuilder {
    /// 内部設定（構築中）
    config: ConversionConfig,
}

impl ConverterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 日付ヒューリスティック: 有効（`"2024-03-01"`形の文字列を日付セルへ戻す）
    /// - 入力ファイルの最大サイズ: 2GB
    pub fn new() -> Self {
        Self {
            config: ConversionConfig::default(),
        }
    }

    /// 再構築時の日付ヒューリスティックを有効・無効にする
    ///
    /// 無効にすると、ISO日付形の文字列もそのまま文字列セルとして
    /// 書き戻されます。
    pub fn with_date_coercion(mut self, enabled: bool) -> Self {
        self.config.date_coercion = enabled;
        self
    }

    /// 入力ファイルの最大サイズ（バイト）を設定する
    ///
    /// # 制約
    ///
    /// * 0を指定した場合、`build()`時に`XlsxJsonError::Config`を返す
    pub fn with_max_input_size(mut self, bytes: u64) -> Self {
        self.config.limits.max_input_size = bytes;
        self
    }

    /// 設定を検証し、`Converter`インスタンスを生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `XlsxJsonError::Config(String)`: 設定の検証に失敗した場合
    pub fn build(self) -> Result<Converter, XlsxJsonError> {
        if self.config.limits.max_input_size == 0 {
            return Err(XlsxJsonError::Config(
                "max input size must be positive".to_string(),
            ));
        }

        Ok(Converter::new(self.config))
    }
}

/// 変換処理のファサード
///
/// ワークブックと正規JSONドキュメントを双方向に変換するメインの
/// エントリーポイントです。1つのインスタンスを複数ファイルの変換に
/// 使い回せます（変換間で共有される状態はありません）。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::fs::File;
/// use xlsxjson::ConverterBuilder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let converter = ConverterBuilder::new().build()?;
///
/// // ワークブック -> JSON
/// let input = File::open("report.xlsx")?;
/// let json = converter.extract_to_json(input, "report.xlsx")?;
///
/// // JSON -> ワークブック
/// let bytes = converter.reconstruct_from_json(&json)?;
/// std::fs::write("rebuilt.xlsx", bytes)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Converter {
    /// 変換設定
    config: ConversionConfig,
}

impl Converter {
    pub(crate) fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    /// ワークブックを正規ドキュメントへ抽出
    ///
    /// # 引数
    ///
    /// * `input` - ワークブックを読み込むためのリーダー（Read + Seek）
    /// * `file_name` - JSONの`file`フィールドへ記録する元のファイル名
    ///
    /// # エラー
    ///
    /// 読み込み不能・形式不正などファイル単位の失敗のみがエラーになります。
    /// シート・テーブル単位の失敗はログに記録され、残りが処理されます。
    pub fn extract<R: Read + Seek>(
        &self,
        input: R,
        file_name: &str,
    ) -> Result<WorkbookDocument, XlsxJsonError> {
        extract_workbook(input, file_name, &self.config)
    }

    /// ワークブックを正規JSON文字列へ抽出
    ///
    /// 出力は2スペースインデントの整形済みJSONです。
    pub fn extract_to_json<R: Read + Seek>(
        &self,
        input: R,
        file_name: &str,
    ) -> Result<String, XlsxJsonError> {
        self.extract(input, file_name)?.to_json_string()
    }

    /// 正規ドキュメントからワークブックを再構築
    ///
    /// 戻り値は完成したXLSXファイルのバイト列です。
    pub fn reconstruct(&self, document: &WorkbookDocument) -> Result<Vec<u8>, XlsxJsonError> {
        build_workbook(document, &self.config)
    }

    /// JSON文字列からワークブックを再構築
    pub fn reconstruct_from_json(&self, json: &str) -> Result<Vec<u8>, XlsxJsonError> {
        let document = WorkbookDocument::from_json_str(json)?;
        self.reconstruct(&document)
    }
}
