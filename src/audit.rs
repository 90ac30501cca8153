//! Audit Log Module
//!
//! セル単位のマッピングを監査ログとして記録するモジュール。
//! すべてのマッピング行は `Map: <source-locator> -> <target-locator>` の
//! 固定フォーマットで、`xlsxjson::audit` ターゲットのINFOレベルで出力される。
//! 正しさの検証には使わず、トレーサビリティのためだけに存在する。

use std::fmt::Display;

use crate::types::CellCoord;

/// 監査ログのターゲット名
///
/// 埋め込み側はこのターゲットでマッピング行だけを抽出・転送できる。
pub(crate) const AUDIT_TARGET: &str = "xlsxjson::audit";

/// マッピング行を1件出力
pub(crate) fn log_map(source: impl Display, target: impl Display) {
    log::info!(target: AUDIT_TARGET, "Map: {} -> {}", source, target);
}

/// シート上のセルを指すロケータ（例: "Sheet1!B3"）
pub(crate) fn sheet_cell(sheet: &str, coord: CellCoord) -> String {
    format!("{}!{}", sheet, coord.to_a1_notation())
}

/// 抽出時のテーブルセルロケータ（例: "tables['Orders'].rows[0]['Amount']"）
pub(crate) fn table_cell(table_name: &str, row_index: usize, header: &str) -> String {
    format!("tables['{}'].rows[{}]['{}']", table_name, row_index, header)
}

/// 抽出時のグリッドセルロケータ（例: "used_range[2][4]"）
pub(crate) fn grid_cell(row_index: usize, col_index: usize) -> String {
    format!("used_range[{}][{}]", row_index, col_index)
}
