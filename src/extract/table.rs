//! Table Extraction Module
//!
//! シートに宣言されたExcelテーブルを正規ドキュメントへ抽出するモジュール。
//! ヘッダー行はテーブル範囲の先頭行を結合解決した値から作り、
//! 重複したヘッダー名には数値サフィックスを付けて一意化する。

use calamine::{Data, Range};
use std::collections::HashMap;

use crate::audit;
use crate::coerce::scalar_to_json;
use crate::error::XlsxJsonError;
use crate::extract::metadata::TableMeta;
use crate::extract::workbook::scalar_at;
use crate::merge::MergeMap;
use crate::schema::{RowObject, TableDocument, TableMergeRef};
use crate::types::{CellCoord, CellScalar, MergedRegion};

/// Excelテーブル1つを抽出
///
/// ヘッダー行・データ行・テーブルと交差する結合範囲を収集し、
/// セルごとの監査ログを出力します。範囲が解析できないテーブルは
/// このテーブル単位で失敗し、呼び出し元が残りのテーブルを継続します。
pub(crate) fn extract_table(
    sheet_name: &str,
    values: &Range<Data>,
    merges: &MergeMap,
    regions: &[MergedRegion],
    meta: &TableMeta,
    is_1904: bool,
) -> Result<TableDocument, XlsxJsonError> {
    let range = meta.range.ok_or_else(|| {
        XlsxJsonError::Config(format!(
            "Table '{}' has an invalid ref '{}'",
            meta.name, meta.ref_text
        ))
    })?;

    // ヘッダー行（結合解決済みの値を一意化）
    let mut header_cells = Vec::new();
    for col in range.start.col..=range.end.col {
        header_cells.push(scalar_at(
            values,
            merges,
            CellCoord::new(range.start.row, col),
            is_1904,
        ));
    }
    let headers = unique_headers(&header_cells);

    // データ行
    let mut rows: Vec<RowObject> = Vec::new();
    for row in (range.start.row + 1)..=range.end.row {
        let mut row_obj = RowObject::new();
        for (idx, col) in (range.start.col..=range.end.col).enumerate() {
            let coord = CellCoord::new(row, col);
            let value = scalar_at(values, merges, coord, is_1904);
            audit::log_map(
                audit::sheet_cell(sheet_name, coord),
                audit::table_cell(&meta.name, rows.len(), &headers[idx]),
            );
            row_obj.insert(headers[idx].clone(), scalar_to_json(&value));
        }
        rows.push(row_obj);
    }

    // テーブル範囲と交差する結合範囲（透明性のための記録）
    let merged_cells_in_table = regions
        .iter()
        .filter(|region| region.range.intersects(&range))
        .map(|region| TableMergeRef {
            range: region.range.to_range_notation(),
            anchor: region.anchor.to_a1_notation(),
        })
        .collect();

    Ok(TableDocument {
        name: meta.name.clone(),
        ref_range: Some(meta.ref_text.clone()),
        headers,
        row_count: rows.len(),
        rows,
        merged_cells_in_table,
    })
}

/// ヘッダー名を一意化
///
/// 最初の出現はそのまま、同名（大文字小文字を区別した完全一致）の
/// 2回目以降の出現には`_2`、`_3`…のサフィックスを付ける。
/// 改名1件につき警告を1行出力する。空セルは空文字列のヘッダーになる。
pub(crate) fn unique_headers(cells: &[CellScalar]) -> Vec<String> {
    let mut seen: HashMap<String, u32> = HashMap::new();
    let mut out = Vec::with_capacity(cells.len());

    for cell in cells {
        let base = cell.to_header_text();
        match seen.get_mut(&base) {
            None => {
                seen.insert(base.clone(), 1);
                out.push(base);
            }
            Some(count) => {
                *count += 1;
                let renamed = format!("{}_{}", base, count);
                log::warn!("Duplicate header '{}' renamed to '{}'", base, renamed);
                out.push(renamed);
            }
        }
    }

    out
}
