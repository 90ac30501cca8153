//! Table Reconstruction Module
//!
//! JSONドキュメントのテーブルをワークシートへ書き戻すモジュール。
//! 元の`ref`範囲があればその位置へ、なければ既存コンテンツの後ろへ
//! 1行空けて配置する。ヘッダー・データを書いた後にテーブルオブジェクトを
//! 登録し、最後にテーブルと交差していた結合範囲を再適用する。

use std::collections::HashSet;

use rust_xlsxwriter::{Table, TableColumn, TableStyle, Worksheet};

use crate::audit;
use crate::coerce::json_to_scalar;
use crate::error::XlsxJsonError;
use crate::rebuild::cells::write_scalar;
use crate::rebuild::merges::{apply_merges, MergeSpec};
use crate::schema::TableDocument;
use crate::types::{CellCoord, CellRange, CellScalar, MAX_COLS, MAX_ROWS};

/// テーブル1つをシートへ書き戻す
///
/// 列数は宣言済みヘッダー数と行オブジェクトの最大キー数の大きい方。
/// ヘッダーより多い列は`Col_<n>`の名前で埋める。このテーブル単位の
/// 失敗はエラーとして返し、呼び出し元が残りのテーブルを継続する。
pub(crate) fn write_table(
    worksheet: &mut Worksheet,
    sheet_title: &str,
    table_index: usize,
    table: &TableDocument,
    registered_names: &mut HashSet<String>,
    cursor: &mut Option<u32>,
    date_coercion: bool,
) -> Result<(), XlsxJsonError> {
    let headers = &table.headers;
    let rows = &table.rows;

    // 1. 開始位置の決定
    let (start_row, start_col) = match &table.ref_range {
        Some(ref_text) => {
            let range = CellRange::parse(ref_text).ok_or_else(|| {
                XlsxJsonError::Config(format!(
                    "Table '{}' has an unresolvable ref '{}'",
                    table.name, ref_text
                ))
            })?;
            (range.start.row, range.start.col)
        }
        // refなしのテーブルは既存コンテンツの後ろへ1行空けて配置
        None => match cursor {
            Some(last_row) => (*last_row + 2, 0),
            None => (0, 0),
        },
    };

    // 2. 列数の決定（行オブジェクトがヘッダーより多くのキーを持つ場合に備える）
    let n_cols = headers
        .len()
        .max(rows.iter().map(|row| row.len()).max().unwrap_or(0));
    if n_cols == 0 {
        return Err(XlsxJsonError::Config(format!(
            "Table '{}' has no columns",
            table.name
        )));
    }

    let end_row = start_row + rows.len() as u32;
    let end_col = start_col + n_cols as u32 - 1;
    if end_row >= MAX_ROWS || end_col >= MAX_COLS {
        return Err(XlsxJsonError::Config(format!(
            "Table '{}' exceeds sheet bounds",
            table.name
        )));
    }

    let header_at = |col: usize| -> String {
        headers
            .get(col)
            .cloned()
            .unwrap_or_else(|| format!("Col_{}", col + 1))
    };

    // 3. ヘッダー行の書き込み
    for col in 0..n_cols {
        let coord = CellCoord::new(start_row, start_col + col as u32);
        worksheet.write_string(coord.row, coord.col as u16, header_at(col))?;
        audit::log_map(
            format!("tables[{}].headers[{}]", table_index, col),
            audit::sheet_cell(sheet_title, coord),
        );
    }

    // 4. データ行の書き込み（逆方向の型変換を適用）
    for (row_index, row) in rows.iter().enumerate() {
        for col in 0..n_cols {
            let key = header_at(col);
            let value = row
                .get(&key)
                .map(|v| json_to_scalar(v, date_coercion))
                .unwrap_or(CellScalar::Null);
            let coord = CellCoord::new(start_row + 1 + row_index as u32, start_col + col as u32);
            write_scalar(worksheet, coord.row, coord.col as u16, &value)?;
            audit::log_map(
                format!("tables[{}].rows[{}]['{}']", table_index, row_index, key),
                audit::sheet_cell(sheet_title, coord),
            );
        }
    }

    // 5. テーブル名の一意化とテーブルオブジェクトの登録
    let table_ref = CellRange::new(
        CellCoord::new(start_row, start_col),
        CellCoord::new(end_row, end_col),
    );
    let desired = if table.name.is_empty() {
        format!("Table{}", table_index + 1)
    } else {
        table.name.clone()
    };
    let display_name = ensure_unique_table_name(registered_names, desired);

    let columns: Vec<TableColumn> = (0..n_cols)
        .map(|col| TableColumn::new().set_header(header_at(col)))
        .collect();
    let table_object = Table::new()
        .set_name(&display_name)
        .set_columns(&columns)
        .set_style(TableStyle::Medium2);

    match worksheet.add_table(
        start_row,
        start_col as u16,
        end_row,
        end_col as u16,
        &table_object,
    ) {
        Ok(_) => log::info!(
            "Table created: name={}, ref={}",
            display_name,
            table_ref.to_range_notation()
        ),
        // セルは書き込み済みのため、テーブルオブジェクトだけを諦める
        Err(e) => log::warn!(
            "Table could not be created (name={}, ref={}): {}",
            display_name,
            table_ref.to_range_notation(),
            e
        ),
    }

    if let Some(last) = cursor {
        *last = (*last).max(end_row);
    } else {
        *cursor = Some(end_row);
    }

    // 6. テーブルと交差していた結合範囲の再適用
    let specs: Vec<MergeSpec> = table
        .merged_cells_in_table
        .iter()
        .map(|m| MergeSpec {
            range_text: m.range.clone(),
            anchor_value: anchor_value_from_table(
                &m.range,
                table,
                start_row,
                start_col,
                n_cols,
                end_row,
                date_coercion,
            ),
        })
        .collect();
    apply_merges(worksheet, sheet_title, &specs, Some(&display_name));

    Ok(())
}

/// 望みの名前を既存名と衝突しないように調整
///
/// 衝突するたびに`_2`、`_3`…のサフィックスを試す。テーブル名の一意性は
/// ワークブック全体で、大文字小文字を区別せずに判定する。
/// 決定した名前は登録済みセットへ追加される。
pub(crate) fn ensure_unique_table_name(
    registered: &mut HashSet<String>,
    desired: String,
) -> String {
    let base = if desired.is_empty() {
        "Table".to_string()
    } else {
        desired
    };

    let mut name = base.clone();
    let mut counter = 1u32;
    while registered.contains(&name.to_lowercase()) {
        counter += 1;
        name = format!("{}_{}", base, counter);
    }
    registered.insert(name.to_lowercase());
    name
}

/// 結合範囲のアンカー値をテーブルデータから復元
///
/// アンカーがヘッダー行ならヘッダー名、データ行なら該当キーの値。
/// テーブル範囲の外なら復元できない（`None`）。
fn anchor_value_from_table(
    range_text: &str,
    table: &TableDocument,
    start_row: u32,
    start_col: u32,
    n_cols: usize,
    end_row: u32,
    date_coercion: bool,
) -> Option<CellScalar> {
    let anchor = CellRange::parse(range_text)?.start;
    if anchor.col < start_col || anchor.col >= start_col + n_cols as u32 {
        return None;
    }
    let col = (anchor.col - start_col) as usize;
    let key = table
        .headers
        .get(col)
        .cloned()
        .unwrap_or_else(|| format!("Col_{}", col + 1));

    if anchor.row == start_row {
        Some(CellScalar::Text(key))
    } else if anchor.row > start_row && anchor.row <= end_row {
        let row_index = (anchor.row - start_row - 1) as usize;
        table
            .rows
            .get(row_index)
            .and_then(|row| row.get(&key))
            .map(|v| json_to_scalar(v, date_coercion))
    } else {
        None
    }
}
