//! Merge Application Module
//!
//! 結合範囲の記述をワークシートへ適用するモジュール。
//! 結合の適用はセル範囲を空文字列で埋めるため、適用後にアンカーの値を
//! 書き戻す。アンカー以外のセルが空になるのはデータモデルの不変条件
//! どおりで、損失ではない。
//!
//! 不正な範囲・シート上限超過・単一セル・既存結合との重複はすべて
//! 警告としてその1件だけをスキップし、決して致命的にはならない。
//! 同じ範囲を二度適用しても2回目が警告になるだけでシートは壊れない。

use rust_xlsxwriter::{Format, Worksheet};

use crate::rebuild::cells::write_scalar;
use crate::types::{CellRange, CellScalar};

/// 適用する結合1件分の記述
#[derive(Debug, Clone)]
pub(crate) struct MergeSpec {
    /// 範囲文字列（例: "A1:B2"）。空文字列の記述は黙ってスキップされる。
    pub range_text: String,
    /// アンカーセルへ書き戻す値
    pub anchor_value: Option<CellScalar>,
}

/// 結合範囲のリストをシートへ適用
///
/// `table_name`が指定されている場合、ログにテーブル名を併記する。
pub(crate) fn apply_merges(
    worksheet: &mut Worksheet,
    sheet_title: &str,
    specs: &[MergeSpec],
    table_name: Option<&str>,
) {
    for spec in specs {
        if spec.range_text.is_empty() {
            continue;
        }

        let range = match CellRange::parse(&spec.range_text) {
            Some(range) => range,
            None => {
                warn_skipped(sheet_title, &spec.range_text, table_name, "invalid range string");
                continue;
            }
        };

        if !range.is_normalized() || !range.fits_sheet_bounds() {
            warn_skipped(
                sheet_title,
                &spec.range_text,
                table_name,
                "range is out of sheet bounds",
            );
            continue;
        }

        if range.start == range.end {
            warn_skipped(
                sheet_title,
                &spec.range_text,
                table_name,
                "single-cell merge is not applicable",
            );
            continue;
        }

        if let Err(e) = worksheet.merge_range(
            range.start.row,
            range.start.col as u16,
            range.end.row,
            range.end.col as u16,
            "",
            &Format::new(),
        ) {
            warn_skipped(sheet_title, &spec.range_text, table_name, &e.to_string());
            continue;
        }

        // 結合でアンカーも空文字列になったため、値を書き戻す
        if let Some(value) = &spec.anchor_value {
            if !value.is_null() {
                if let Err(e) =
                    write_scalar(worksheet, range.start.row, range.start.col as u16, value)
                {
                    warn_skipped(sheet_title, &spec.range_text, table_name, &e.to_string());
                    continue;
                }
            }
        }

        match table_name {
            Some(table) => log::info!(
                "Merged (in table {}): {}!{}",
                table,
                sheet_title,
                spec.range_text
            ),
            None => log::info!("Merged: {}!{}", sheet_title, spec.range_text),
        }
    }
}

fn warn_skipped(sheet_title: &str, range_text: &str, table_name: Option<&str>, reason: &str) {
    match table_name {
        Some(table) => log::warn!(
            "Merge skipped (in table {}, {}!{}): {}",
            table,
            sheet_title,
            range_text,
            reason
        ),
        None => log::warn!("Merge skipped ({}!{}): {}", sheet_title, range_text, reason),
    }
}
