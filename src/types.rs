//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。
//! セル座標・セル範囲は内部的に0始まり、A1記法とJSON境界でのみ1始まりに変換する。

use chrono::{NaiveDate, NaiveDateTime};

/// XLSX形式の最大行数（1,048,576行）
pub(crate) const MAX_ROWS: u32 = 1_048_576;

/// XLSX形式の最大列数（16,384列 = XFD）
pub(crate) const MAX_COLS: u32 = 16_384;

/// セル座標（0始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1形式の文字列に変換（例: (0, 0) -> "A1"）
    pub fn to_a1_notation(&self) -> String {
        let col_str = Self::col_index_to_letter(self.col);
        format!("{}{}", col_str, self.row + 1)
    }

    /// A1形式の文字列を座標に変換（例: "A1" -> (0, 0)）
    ///
    /// 列部分のアルファベットと行部分の数字に分解して解析します。
    /// 形式が不正な場合は`None`を返します。
    pub fn parse(a1: &str) -> Option<Self> {
        let mut col_str = String::new();
        let mut row_str = String::new();

        for ch in a1.chars() {
            if ch.is_ascii_alphabetic() && row_str.is_empty() {
                col_str.push(ch.to_ascii_uppercase());
            } else if ch.is_ascii_digit() {
                row_str.push(ch);
            } else if ch == '$' {
                // 絶対参照記号は無視
                continue;
            } else {
                return None;
            }
        }

        if col_str.is_empty() || row_str.is_empty() {
            return None;
        }

        // 列を数値に変換（A=0, B=1, ..., Z=25, AA=26, ...）
        let col = col_str
            .chars()
            .rev()
            .enumerate()
            .map(|(i, ch)| {
                let val = (ch as u32) - ('A' as u32) + 1;
                val.checked_mul(26_u32.checked_pow(i as u32)?)
            })
            .try_fold(0u32, |acc, v| acc.checked_add(v?))?
            .checked_sub(1)?;

        // 行を数値に変換（1始まりなので0始まりに変換）
        let row = row_str.parse::<u32>().ok()?.checked_sub(1)?;

        Some(Self { row, col })
    }

    /// 列インデックスを文字列に変換（0 -> "A", 25 -> "Z", 26 -> "AA"）
    fn col_index_to_letter(mut col: u32) -> String {
        let mut result = String::new();
        loop {
            let remainder = col % 26;
            result.insert(0, (b'A' + remainder as u8) as char);
            if col < 26 {
                break;
            }
            col = col / 26 - 1;
        }
        result
    }
}

/// セル範囲（両端を含む矩形）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellRange {
    pub start: CellCoord,
    pub end: CellCoord,
}

impl CellRange {
    /// 新しい範囲を生成
    pub fn new(start: CellCoord, end: CellCoord) -> Self {
        Self { start, end }
    }

    /// 範囲文字列を解析（例: "A1:B2"、単一セルの"A1"も縮退範囲として許容）
    pub fn parse(text: &str) -> Option<Self> {
        match text.split_once(':') {
            Some((start, end)) => {
                let start = CellCoord::parse(start.trim())?;
                let end = CellCoord::parse(end.trim())?;
                Some(Self { start, end })
            }
            None => {
                let coord = CellCoord::parse(text.trim())?;
                Some(Self {
                    start: coord,
                    end: coord,
                })
            }
        }
    }

    /// "A1:B2"形式の範囲文字列に変換
    pub fn to_range_notation(&self) -> String {
        format!(
            "{}:{}",
            self.start.to_a1_notation(),
            self.end.to_a1_notation()
        )
    }

    /// 指定された座標が範囲内にあるかを判定
    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.row >= self.start.row
            && coord.row <= self.end.row
            && coord.col >= self.start.col
            && coord.col <= self.end.col
    }

    /// 他の範囲と交差するかを判定（境界を含む）
    ///
    /// どちらかの軸で完全に片側に外れている場合のみ交差しない。
    pub fn intersects(&self, other: &CellRange) -> bool {
        !(self.end.col < other.start.col
            || self.start.col > other.end.col
            || self.end.row < other.start.row
            || self.start.row > other.end.row)
    }

    /// 開始座標が終了座標以下であるかを判定
    pub fn is_normalized(&self) -> bool {
        self.start.row <= self.end.row && self.start.col <= self.end.col
    }

    /// 範囲全体がXLSXのシート上限内に収まるかを判定
    pub fn fits_sheet_bounds(&self) -> bool {
        self.end.row < MAX_ROWS && self.end.col < MAX_COLS
    }

    /// 範囲のサイズ（行数 × 列数）を計算
    pub fn size(&self) -> (u32, u32) {
        let rows = self.end.row - self.start.row + 1;
        let cols = self.end.col - self.start.col + 1;
        (rows, cols)
    }
}

/// セル結合範囲の情報
///
/// アンカー（左上セル）だけが実際の値を保持し、結合範囲内の他のセルは
/// すべてアンカーの値に解決される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MergedRegion {
    /// 結合範囲
    pub range: CellRange,

    /// アンカーセル（左上セル）の座標
    pub anchor: CellCoord,
}

impl MergedRegion {
    /// 新しい結合範囲を生成
    pub fn new(range: CellRange) -> Self {
        Self {
            anchor: range.start,
            range,
        }
    }

    /// 指定された座標が結合範囲内にあるかを判定
    pub fn contains(&self, coord: CellCoord) -> bool {
        self.range.contains(coord)
    }
}

/// セルの論理値
///
/// ワークブックとJSONドキュメントの間で受け渡す値の種類。
/// 日付・日時はJSON側ではISO-8601文字列として表現される。
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellScalar {
    /// 空セル（JSONのnull）
    Null,

    /// 論理値
    Bool(bool),

    /// 数値（f64）
    Number(f64),

    /// 文字列
    Text(String),

    /// 日付（時刻成分なし）
    Date(NaiveDate),

    /// 日時
    DateTime(NaiveDateTime),
}

impl CellScalar {
    /// 値が空かどうかを判定
    pub fn is_null(&self) -> bool {
        matches!(self, CellScalar::Null)
    }

    /// ヘッダーセル用の文字列表現を取得
    ///
    /// 空セルは空文字列になる。テーブルヘッダーの重複判定・改名に使用する。
    pub fn to_header_text(&self) -> String {
        match self {
            CellScalar::Null => String::new(),
            CellScalar::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellScalar::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellScalar::Text(s) => s.clone(),
            CellScalar::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellScalar::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // CellCoord のテスト
    #[test]
    fn test_cell_coord_to_a1_notation() {
        assert_eq!(CellCoord::new(0, 0).to_a1_notation(), "A1");
        assert_eq!(CellCoord::new(0, 25).to_a1_notation(), "Z1");
        assert_eq!(CellCoord::new(0, 26).to_a1_notation(), "AA1");
        assert_eq!(CellCoord::new(99, 701).to_a1_notation(), "ZZ100");
        assert_eq!(CellCoord::new(0, 51).to_a1_notation(), "AZ1");
        assert_eq!(CellCoord::new(0, 52).to_a1_notation(), "BA1");
    }

    #[test]
    fn test_cell_coord_parse() {
        assert_eq!(CellCoord::parse("A1"), Some(CellCoord::new(0, 0)));
        assert_eq!(CellCoord::parse("Z1"), Some(CellCoord::new(0, 25)));
        assert_eq!(CellCoord::parse("AA1"), Some(CellCoord::new(0, 26)));
        assert_eq!(CellCoord::parse("ZZ100"), Some(CellCoord::new(99, 701)));
        assert_eq!(CellCoord::parse("$B$3"), Some(CellCoord::new(2, 1)));
        assert_eq!(CellCoord::parse("a1"), Some(CellCoord::new(0, 0)));
    }

    #[test]
    fn test_cell_coord_parse_invalid() {
        assert_eq!(CellCoord::parse(""), None);
        assert_eq!(CellCoord::parse("A"), None);
        assert_eq!(CellCoord::parse("1"), None);
        assert_eq!(CellCoord::parse("A0"), None);
        assert_eq!(CellCoord::parse("A1:B2"), None);
        assert_eq!(CellCoord::parse("1A"), None);
    }

    // CellRange のテスト
    #[test]
    fn test_cell_range_parse() {
        let range = CellRange::parse("A1:D20").unwrap();
        assert_eq!(range.start, CellCoord::new(0, 0));
        assert_eq!(range.end, CellCoord::new(19, 3));

        // 単一セルは縮退範囲として解析される
        let single = CellRange::parse("B2").unwrap();
        assert_eq!(single.start, single.end);
        assert_eq!(single.start, CellCoord::new(1, 1));

        assert_eq!(CellRange::parse("A1:"), None);
        assert_eq!(CellRange::parse(":B2"), None);
        assert_eq!(CellRange::parse("garbage"), None);
    }

    #[test]
    fn test_cell_range_notation_round_trip() {
        for text in ["A1:D20", "B3:B3", "AA10:AB12"] {
            let range = CellRange::parse(text).unwrap();
            assert_eq!(range.to_range_notation(), text);
        }
    }

    #[test]
    fn test_cell_range_contains() {
        let range = CellRange::new(CellCoord::new(0, 0), CellCoord::new(10, 5));
        assert!(range.contains(CellCoord::new(0, 0)));
        assert!(range.contains(CellCoord::new(5, 3)));
        assert!(range.contains(CellCoord::new(10, 5)));
        assert!(!range.contains(CellCoord::new(11, 5)));
        assert!(!range.contains(CellCoord::new(5, 6)));
    }

    #[test]
    fn test_cell_range_intersects() {
        let table = CellRange::parse("A1:D10").unwrap();

        // テーブルの内側・境界上・外側
        assert!(table.intersects(&CellRange::parse("B2:C3").unwrap()));
        assert!(table.intersects(&CellRange::parse("D10:F12").unwrap()));
        assert!(table.intersects(&CellRange::parse("C5:Z5").unwrap()));
        assert!(!table.intersects(&CellRange::parse("E1:F10").unwrap()));
        assert!(!table.intersects(&CellRange::parse("A11:D12").unwrap()));
    }

    #[test]
    fn test_cell_range_bounds_checks() {
        assert!(CellRange::parse("A1:XFD1048576")
            .unwrap()
            .fits_sheet_bounds());
        // XFDの次の列XFEは範囲外
        assert!(!CellRange::parse("XFE1:XFG2").unwrap().fits_sheet_bounds());
        assert!(!CellRange::parse("A1048577:A1048578")
            .unwrap()
            .fits_sheet_bounds());

        assert!(CellRange::parse("A1:B2").unwrap().is_normalized());
        assert!(!CellRange::parse("ZZZ1:AAA2").unwrap().is_normalized());
    }

    #[test]
    fn test_cell_range_size() {
        let range = CellRange::new(CellCoord::new(0, 0), CellCoord::new(10, 5));
        assert_eq!(range.size(), (11, 6));

        // 単一セル
        let range2 = CellRange::new(CellCoord::new(0, 0), CellCoord::new(0, 0));
        assert_eq!(range2.size(), (1, 1));
    }

    // MergedRegion のテスト
    #[test]
    fn test_merged_region_anchor() {
        let range = CellRange::new(CellCoord::new(0, 0), CellCoord::new(2, 3));
        let merged = MergedRegion::new(range);
        assert_eq!(merged.anchor, CellCoord::new(0, 0));
        assert!(merged.contains(CellCoord::new(1, 2)));
        assert!(!merged.contains(CellCoord::new(3, 3)));
    }

    // CellScalar のテスト
    #[test]
    fn test_cell_scalar_header_text() {
        assert_eq!(CellScalar::Null.to_header_text(), "");
        assert_eq!(
            CellScalar::Text("Name".to_string()).to_header_text(),
            "Name"
        );
        assert_eq!(CellScalar::Number(42.0).to_header_text(), "42");
        assert_eq!(CellScalar::Number(1.5).to_header_text(), "1.5");
        assert_eq!(CellScalar::Bool(true).to_header_text(), "TRUE");
        assert_eq!(
            CellScalar::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).to_header_text(),
            "2024-03-01"
        );
    }

    // プロパティベーステスト
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // A1記法へ変換して解析すると元の座標に戻ること
            #[test]
            fn test_a1_notation_round_trip(row in 0u32..MAX_ROWS, col in 0u32..MAX_COLS) {
                let coord = CellCoord::new(row, col);
                let a1 = coord.to_a1_notation();
                prop_assert_eq!(CellCoord::parse(&a1), Some(coord));
            }

            // 範囲文字列の往復が安定すること
            #[test]
            fn test_range_notation_round_trip(
                r1 in 0u32..1000, c1 in 0u32..100, r2 in 0u32..1000, c2 in 0u32..100,
            ) {
                let range = CellRange::new(CellCoord::new(r1, c1), CellCoord::new(r2, c2));
                let text = range.to_range_notation();
                prop_assert_eq!(CellRange::parse(&text), Some(range));
            }
        }
    }
}
