//! Workbook Reader Module
//!
//! calamineを使用したワークブック読み出しと、抽出パイプラインの
//! ドライバを提供するモジュール。セル値・結合範囲はcalamineから、
//! シート表示状態・テーブル定義・エポック判定はXMLメタデータから取得する。

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets, Xlsx};
use chrono::{Duration, NaiveDate, NaiveTime};
use std::io::{Cursor, Read, Seek};

use crate::builder::ConversionConfig;
use crate::coerce::{parse_iso_like, scalar_to_json};
use crate::error::XlsxJsonError;
use crate::extract::table::extract_table;
use crate::extract::used_range::extract_used_range;
use crate::extract::WorkbookMetadata;
use crate::merge::MergeMap;
use crate::schema::{MergedCellInfo, SheetDocument, WorkbookDocument};
use crate::types::{CellCoord, CellRange, CellScalar, MergedRegion};

/// ワークブックリーダー
///
/// calamineのラッパーとして、ワークブックレベルの操作を提供します。
/// XMLメタデータパーサーを統合し、calamineで取得できない情報も扱います。
pub(crate) struct WorkbookReader {
    /// calamineのワークブック（XLSX形式のみサポート）
    workbook: Xlsx<Cursor<Vec<u8>>>,
    /// XMLメタデータ
    metadata: WorkbookMetadata,
}

impl WorkbookReader {
    /// ワークブックを開き、XMLメタデータも解析する
    ///
    /// 入力全体をメモリへ読み込み、サイズ制限を適用してから
    /// calamineとメタデータパーサーの両方に渡します。
    pub fn open<R: Read + Seek>(
        mut reader: R,
        config: &ConversionConfig,
    ) -> Result<Self, XlsxJsonError> {
        let mut buffer = Vec::new();
        let bytes_read = reader.read_to_end(&mut buffer)?;

        if bytes_read as u64 > config.limits.max_input_size {
            return Err(XlsxJsonError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                bytes_read, config.limits.max_input_size
            )));
        }

        let sheets =
            open_workbook_auto_from_rs(Cursor::new(buffer.clone())).map_err(XlsxJsonError::Parse)?;
        let workbook = match sheets {
            Sheets::Xlsx(workbook) => workbook,
            _ => {
                return Err(XlsxJsonError::Config(
                    "Only XLSX format is supported".to_string(),
                ))
            }
        };

        let metadata = WorkbookMetadata::parse(Cursor::new(buffer), &config.limits)?;

        Ok(Self { workbook, metadata })
    }

    /// すべてのシート名を取得（ワークブック内の順序）
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    /// XMLメタデータを取得
    pub fn metadata(&self) -> &WorkbookMetadata {
        &self.metadata
    }

    /// シートのセル値範囲を取得
    pub fn sheet_values(&mut self, sheet_name: &str) -> Result<Range<Data>, XlsxJsonError> {
        self.workbook
            .worksheet_range(sheet_name)
            .map_err(|e| XlsxJsonError::Parse(e.into()))
    }

    /// シートの結合範囲を発見順に取得
    pub fn merged_regions(
        &mut self,
        sheet_name: &str,
    ) -> Result<Vec<MergedRegion>, XlsxJsonError> {
        self.workbook
            .load_merged_regions()
            .map_err(|e| XlsxJsonError::Parse(e.into()))?;

        let regions = match self.workbook.worksheet_merge_cells(sheet_name) {
            Some(Ok(regions)) => regions
                .iter()
                .map(|dims| {
                    let start = CellCoord::new(dims.start.0, dims.start.1);
                    let end = CellCoord::new(dims.end.0, dims.end.1);
                    MergedRegion::new(CellRange::new(start, end))
                })
                .collect(),
            Some(Err(_)) | None => Vec::new(),
        };

        Ok(regions)
    }
}

/// 結合解決済みのセル値を取得
///
/// 座標が結合範囲内ならアンカーの値、そうでなければセル自身の値を返す。
/// 範囲外の座標は空セル扱いになるため、常に値が得られる。
pub(crate) fn scalar_at(
    values: &Range<Data>,
    merges: &MergeMap,
    coord: CellCoord,
    is_1904: bool,
) -> CellScalar {
    let source = merges.resolve(coord);
    match values.get_value((source.row, source.col)) {
        Some(data) => data_to_scalar(data, is_1904),
        None => CellScalar::Null,
    }
}

/// calamineのセル値を論理値へ変換
pub(crate) fn data_to_scalar(data: &Data, is_1904: bool) -> CellScalar {
    match data {
        Data::Empty => CellScalar::Null,
        Data::Int(i) => CellScalar::Number(*i as f64),
        Data::Float(f) => CellScalar::Number(*f),
        Data::String(s) => CellScalar::Text(s.clone()),
        Data::Bool(b) => CellScalar::Bool(*b),
        // エラー値はキャッシュされた表示文字列として保持（例: "#DIV/0!"）
        Data::Error(e) => CellScalar::Text(format!("{}", e)),
        Data::DateTime(dt) => serial_to_scalar(dt.as_f64(), is_1904),
        Data::DateTimeIso(s) => {
            parse_iso_like(s).unwrap_or_else(|| CellScalar::Text(s.clone()))
        }
        Data::DurationIso(s) => CellScalar::Text(s.clone()),
        _ => CellScalar::Null,
    }
}

/// Excelのシリアル日付値を日付・日時へ変換
///
/// # エポックシステム
///
/// - 1900年システム（デフォルト）: 1899年12月30日起算。
///   1900年うるう年バグのため、1900-03-01以降のシリアル値で正確。
/// - 1904年システム: 1904年1月1日起算（Mac版Excel）。
///
/// 時刻成分が0なら日付、あれば日時になる。変換できないシリアル値は
/// 数値のまま保持する。
fn serial_to_scalar(serial: f64, is_1904: bool) -> CellScalar {
    if !serial.is_finite() || serial < 0.0 {
        return CellScalar::Number(serial);
    }

    let epoch = if is_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    };
    let epoch = match epoch {
        Some(epoch) => epoch,
        None => return CellScalar::Number(serial),
    };

    let mut days = serial.floor() as i64;
    // 秒に丸めてから日付越えを補正
    let mut secs = ((serial - serial.floor()) * 86_400.0).round() as i64;
    if secs >= 86_400 {
        days += 1;
        secs = 0;
    }

    let date = match epoch.checked_add_signed(Duration::days(days)) {
        Some(date) => date,
        None => return CellScalar::Number(serial),
    };

    if secs == 0 {
        CellScalar::Date(date)
    } else {
        CellScalar::DateTime(date.and_time(NaiveTime::MIN) + Duration::seconds(secs))
    }
}

/// ワークブック全体を正規JSONドキュメントへ抽出
///
/// シート単位の失敗はログに記録してスキップし、残りのシートを
/// 処理し続けます。呼び出し元へ伝播するのはファイル単位の失敗のみです。
pub(crate) fn extract_workbook<R: Read + Seek>(
    input: R,
    file_name: &str,
    config: &ConversionConfig,
) -> Result<WorkbookDocument, XlsxJsonError> {
    log::info!("Starting extraction: {}", file_name);

    let mut reader = WorkbookReader::open(input, config)?;
    let sheet_names = reader.sheet_names();
    log::info!("Workbook loaded. Sheets: {:?}", sheet_names);

    let mut document = WorkbookDocument {
        file: file_name.to_string(),
        sheets: Vec::new(),
    };

    for sheet_name in &sheet_names {
        match extract_sheet(&mut reader, file_name, sheet_name) {
            Ok(sheet) => document.sheets.push(sheet),
            Err(e) => log::error!("Error in sheet '{}': {}", sheet_name, e),
        }
    }

    log::info!("Extraction finished: {}", file_name);
    Ok(document)
}

/// シート1枚を抽出
fn extract_sheet(
    reader: &mut WorkbookReader,
    file_name: &str,
    sheet_name: &str,
) -> Result<SheetDocument, XlsxJsonError> {
    log::info!("--- Sheet: {} ---", sheet_name);

    let values = reader.sheet_values(sheet_name)?;
    let regions = reader.merged_regions(sheet_name)?;
    let merges = MergeMap::new(&regions);
    let is_1904 = reader.metadata().is_1904();
    let visibility = reader.metadata().visibility(sheet_name);

    // シートレベルの結合範囲を文書化
    let merged_cells = merged_cell_infos(&values, &regions, is_1904);
    if !merged_cells.is_empty() {
        let ranges: Vec<&str> = merged_cells.iter().map(|m| m.range.as_str()).collect();
        log::info!("Merged ranges: {:?}", ranges);
    }

    let mut sheet = SheetDocument {
        name: sheet_name.to_string(),
        header: format!("{}-{}", file_name, sheet_name),
        sheet_state: visibility.as_state_str().to_string(),
        merged_cells: merged_cells.clone(),
        excel_tables: None,
        used_range: None,
    };

    let table_metas = reader.metadata().tables_for(sheet_name);
    if !table_metas.is_empty() {
        let names: Vec<&str> = table_metas.iter().map(|t| t.name.as_str()).collect();
        log::info!("Excel tables found: {:?}", names);

        let mut tables = Vec::new();
        for meta in table_metas {
            match extract_table(sheet_name, &values, &merges, &regions, meta, is_1904) {
                Ok(table) => tables.push(table),
                Err(e) => {
                    log::error!("Table '{}' on sheet '{}' failed: {}", meta.name, sheet_name, e)
                }
            }
        }
        sheet.excel_tables = Some(tables);
    } else {
        log::warn!(
            "No Excel tables found on sheet '{}'. Falling back to used range.",
            sheet_name
        );
        sheet.used_range = Some(extract_used_range(
            sheet_name,
            &values,
            &merges,
            merged_cells,
            is_1904,
        ));
    }

    Ok(sheet)
}

/// 結合範囲の文書化情報を構築
///
/// `rows`と`cols`はJSON境界の約束どおり1始まりへ変換する。
/// `value`はアンカーセルの値（アンカーは常に自分自身へ解決される）。
fn merged_cell_infos(
    values: &Range<Data>,
    regions: &[MergedRegion],
    is_1904: bool,
) -> Vec<MergedCellInfo> {
    regions
        .iter()
        .map(|region| {
            let anchor_value = match values.get_value((region.anchor.row, region.anchor.col)) {
                Some(data) => data_to_scalar(data, is_1904),
                None => CellScalar::Null,
            };
            MergedCellInfo {
                range: region.range.to_range_notation(),
                anchor: region.anchor.to_a1_notation(),
                rows: [region.range.start.row + 1, region.range.end.row + 1],
                cols: [region.range.start.col + 1, region.range.end.col + 1],
                value: scalar_to_json(&anchor_value),
            }
        })
        .collect()
}
