//! Cell Writing Module
//!
//! 論理値をワークシートのセルへ書き込む共通処理。
//! 日付・日時はISO形の数値書式付きで書き込み、再抽出時に
//! 同じ値へ戻れるようにする。

use rust_xlsxwriter::{Format, Worksheet, XlsxError};

use crate::types::CellScalar;

/// 日付セル用の数値書式
pub(crate) fn date_format() -> Format {
    Format::new().set_num_format("yyyy-mm-dd")
}

/// 日時セル用の数値書式
pub(crate) fn datetime_format() -> Format {
    Format::new().set_num_format("yyyy-mm-dd hh:mm:ss")
}

/// 論理値を1セルに書き込む
///
/// 空値は何も書かない（セルは空のまま）。
pub(crate) fn write_scalar(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellScalar,
) -> Result<(), XlsxError> {
    match value {
        CellScalar::Null => {}
        CellScalar::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellScalar::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        CellScalar::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellScalar::Date(d) => {
            worksheet.write_datetime_with_format(row, col, d, &date_format())?;
        }
        CellScalar::DateTime(dt) => {
            worksheet.write_datetime_with_format(row, col, dt, &datetime_format())?;
        }
    }
    Ok(())
}
