//! Reconstruction Module
//!
//! 正規JSONドキュメントからワークブックを書き戻すパイプライン。
//! テーブル・グリッドの書き込みの後、結合範囲を最後に適用する。

mod cells;
mod merges;
mod table;
mod used_range;
mod workbook;

pub(crate) use workbook::build_workbook;
