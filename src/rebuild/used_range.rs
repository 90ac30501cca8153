//! Used Range Reconstruction Module
//!
//! 使用領域グリッドをシート先頭（A1）から行優先で書き戻すモジュール。
//! 書き込み後、グリッド自身の結合範囲をMergeApplierへ引き渡す。

use rust_xlsxwriter::Worksheet;

use crate::audit;
use crate::coerce::json_to_scalar;
use crate::error::XlsxJsonError;
use crate::rebuild::cells::write_scalar;
use crate::rebuild::merges::{apply_merges, MergeSpec};
use crate::schema::UsedRangeDocument;
use crate::types::CellCoord;

/// 使用領域グリッドをシートへ書き戻す
pub(crate) fn write_used_range(
    worksheet: &mut Worksheet,
    sheet_title: &str,
    used_range: &UsedRangeDocument,
    date_coercion: bool,
) -> Result<(), XlsxJsonError> {
    for (row_index, row_values) in used_range.grid.iter().enumerate() {
        for (col_index, value) in row_values.iter().enumerate() {
            let scalar = json_to_scalar(value, date_coercion);
            let coord = CellCoord::new(row_index as u32, col_index as u32);
            write_scalar(worksheet, coord.row, coord.col as u16, &scalar)?;
            audit::log_map(
                audit::grid_cell(row_index, col_index),
                audit::sheet_cell(sheet_title, coord),
            );
        }
    }

    // グリッドの結合範囲（アンカー値は記述から復元できる）
    let specs: Vec<MergeSpec> = used_range
        .merged_cells
        .iter()
        .map(|m| MergeSpec {
            range_text: m.range.clone(),
            anchor_value: Some(json_to_scalar(&m.value, date_coercion)),
        })
        .collect();
    apply_merges(worksheet, sheet_title, &specs, None);

    Ok(())
}
