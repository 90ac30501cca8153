//! Used Range Extraction Module
//!
//! テーブルが宣言されていないシートのフォールバック。使用領域全体を
//! 結合解決済みの稠密なグリッドとして取り込む。

use calamine::{Data, Range};
use serde_json::Value;

use crate::audit;
use crate::coerce::scalar_to_json;
use crate::extract::workbook::scalar_at;
use crate::merge::MergeMap;
use crate::schema::{MergedCellInfo, UsedRangeDocument};
use crate::types::{CellCoord, CellRange};

/// 使用領域をグリッドとして抽出
///
/// この層に「データなし」というエラー状態はなく、常に成功します。
/// 空シートは1×1のnullグリッド（dimensions "A1:A1"）になります。
pub(crate) fn extract_used_range(
    sheet_name: &str,
    values: &Range<Data>,
    merges: &MergeMap,
    merged_cells: Vec<MergedCellInfo>,
    is_1904: bool,
) -> UsedRangeDocument {
    let (start, end) = match (values.start(), values.end()) {
        (Some(start), Some(end)) => (
            CellCoord::new(start.0, start.1),
            CellCoord::new(end.0, end.1),
        ),
        _ => {
            // 空シート
            audit::log_map(
                audit::sheet_cell(sheet_name, CellCoord::new(0, 0)),
                audit::grid_cell(0, 0),
            );
            return UsedRangeDocument {
                dimensions: "A1:A1".to_string(),
                row_count: 1,
                col_count: 1,
                grid: vec![vec![Value::Null]],
                merged_cells,
            };
        }
    };

    let mut grid = Vec::with_capacity((end.row - start.row + 1) as usize);
    for row in start.row..=end.row {
        let mut row_values = Vec::with_capacity((end.col - start.col + 1) as usize);
        for col in start.col..=end.col {
            let coord = CellCoord::new(row, col);
            let value = scalar_at(values, merges, coord, is_1904);
            audit::log_map(
                audit::sheet_cell(sheet_name, coord),
                audit::grid_cell((row - start.row) as usize, (col - start.col) as usize),
            );
            row_values.push(scalar_to_json(&value));
        }
        grid.push(row_values);
    }

    UsedRangeDocument {
        dimensions: CellRange::new(start, end).to_range_notation(),
        row_count: grid.len(),
        col_count: (end.col - start.col + 1) as usize,
        grid,
        merged_cells,
    }
}
