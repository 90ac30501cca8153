//! Value Coercion Module
//!
//! セル値とJSON値の双方向変換を提供するモジュール。
//! 日付・日時はJSON側でISO-8601文字列になるため、逆変換では
//! `YYYY-MM-DD`形に見える文字列をヒューリスティックに日付へ戻す。
//! この変換は意図的に曖昧な境界であり、1回の往復で不動点に収束する。

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::types::CellScalar;

/// セル値をJSON値へ変換
///
/// 日付は"%Y-%m-%d"、日時は"%Y-%m-%dT%H:%M:%S"の文字列になる。
/// JSONで表現できない数値（NaN・無限大）は文字列化する。
/// これは文書化された非可逆のエスケープハッチであり、エラーにはならない。
pub(crate) fn scalar_to_json(value: &CellScalar) -> Value {
    match value {
        CellScalar::Null => Value::Null,
        CellScalar::Bool(b) => Value::Bool(*b),
        CellScalar::Number(n) => number_to_json(*n),
        CellScalar::Text(s) => Value::String(s.clone()),
        CellScalar::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        CellScalar::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
    }
}

/// JSON値をセル値へ変換
///
/// 数値・論理値・nullはそのまま通過する。文字列は`date_coercion`が
/// 有効な場合のみISO日付形の解析を試み、失敗すれば元の文字列のまま
/// 通過する（決して失敗しない）。配列やオブジェクトなどそれ以外の
/// JSON値は文字列化される。
pub(crate) fn json_to_scalar(value: &Value, date_coercion: bool) -> CellScalar {
    match value {
        Value::Null => CellScalar::Null,
        Value::Bool(b) => CellScalar::Bool(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) => CellScalar::Number(f),
            None => CellScalar::Text(n.to_string()),
        },
        Value::String(s) => {
            if date_coercion {
                parse_iso_like(s).unwrap_or_else(|| CellScalar::Text(s.clone()))
            } else {
                CellScalar::Text(s.clone())
            }
        }
        // 配列・オブジェクトは文字列化（非可逆のエスケープハッチ）
        other => CellScalar::Text(other.to_string()),
    }
}

/// ISO-8601形の文字列を日付・日時として解析
///
/// `YYYY-MM-DD`で始まる形だけを対象とし、時刻成分があれば日時、
/// なければ日付になる。どの形式にも一致しなければ`None`。
pub(crate) fn parse_iso_like(s: &str) -> Option<CellScalar> {
    let bytes = s.as_bytes();
    if bytes.len() < 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(CellScalar::DateTime(dt));
        }
    }

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(CellScalar::Date(d));
    }

    None
}

/// f64をJSON数値へ変換
///
/// 整数値は整数として出力する。非有限値は文字列にフォールバックする。
fn number_to_json(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        // 2^53未満の整数値は正確に表現できる
        return Value::Number((n as i64).into());
    }
    match serde_json::Number::from_f64(n) {
        Some(num) => Value::Number(num),
        None => Value::String(n.to_string()),
    }
}
