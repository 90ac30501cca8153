//! Schema Module
//!
//! 正規JSONドキュメントの型定義と直列化・逆直列化を提供するモジュール。
//! フィールド名はそのまま下流ツールとの契約であり、シート・テーブル・
//! ヘッダー・行・結合範囲の順序はすべて挿入順で保持される
//! （`serde_json`の`preserve_order`を前提とする）。

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::XlsxJsonError;

/// テーブル1行分のオブジェクト（ヘッダー名 -> 値、挿入順保持）
pub type RowObject = serde_json::Map<String, Value>;

/// 結合セル範囲の記述
///
/// `rows`と`cols`は1始まりの`[min, max]`。`value`はアンカーセルの値。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedCellInfo {
    /// 結合範囲（例: "A1:B2"）
    pub range: String,
    /// アンカーセルのA1記法（例: "A1"）
    pub anchor: String,
    /// 行範囲 [min_row, max_row]（1始まり）
    #[serde(default)]
    pub rows: [u32; 2],
    /// 列範囲 [min_col, max_col]（1始まり）
    #[serde(default)]
    pub cols: [u32; 2],
    /// アンカーセルの値
    #[serde(default)]
    pub value: Value,
}

/// テーブルと交差する結合範囲への参照
///
/// 透明性のためにJSONへ記録するだけで、値の解決には使わない
/// （値は抽出時に解決済み）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMergeRef {
    /// 結合範囲（例: "A1:B1"）
    pub range: String,
    /// アンカーセルのA1記法
    pub anchor: String,
}

/// Excelテーブル1つ分のドキュメント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDocument {
    /// テーブル名（ワークブック内で一意）
    #[serde(default)]
    pub name: String,

    /// 元の矩形範囲（例: "A1:D20"）。再構築時の配置の基準になる。
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_range: Option<String>,

    /// 重複解消済みのヘッダー（列順）
    #[serde(default)]
    pub headers: Vec<String>,

    /// データ行数（ヘッダー行を含まない）
    #[serde(default)]
    pub row_count: usize,

    /// データ行のリスト（ヘッダー名 -> 値）
    #[serde(default)]
    pub rows: Vec<RowObject>,

    /// テーブル範囲と交差する結合範囲
    #[serde(default)]
    pub merged_cells_in_table: Vec<TableMergeRef>,
}

/// テーブルが宣言されていないシートの使用領域
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsedRangeDocument {
    /// 使用領域の範囲文字列（例: "A1:F20"、空シートは"A1:A1"）
    #[serde(default)]
    pub dimensions: String,

    /// 行数
    #[serde(default)]
    pub row_count: usize,

    /// 列数
    #[serde(default)]
    pub col_count: usize,

    /// 行優先の2次元グリッド
    #[serde(default)]
    pub grid: Vec<Vec<Value>>,

    /// シートの結合範囲
    #[serde(default)]
    pub merged_cells: Vec<MergedCellInfo>,
}

/// シート1枚分のドキュメント
///
/// `excel_tables`と`used_range`は排他的で、テーブルが1つでも宣言されて
/// いればテーブル側、なければ使用領域側だけが存在する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetDocument {
    /// シート名（JSONではsheetsオブジェクトのキーになる）
    #[serde(skip)]
    pub name: String,

    /// "<ファイル名>-<シート名>"形式の見出し
    #[serde(default)]
    pub header: String,

    /// シートの表示状態（"visible" / "hidden" / "veryHidden"）
    #[serde(default)]
    pub sheet_state: String,

    /// シートレベルの結合範囲（発見順）
    #[serde(default)]
    pub merged_cells: Vec<MergedCellInfo>,

    /// Excelテーブルのリスト（宣言順）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excel_tables: Option<Vec<TableDocument>>,

    /// テーブルがない場合の使用領域グリッド
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_range: Option<UsedRangeDocument>,
}

/// ワークブック全体の正規JSONドキュメント
///
/// JSON上の形は `{"file": "...", "sheets": {"<シート名>": {...}, ...}}`。
/// `sheets`はシート名をキーとするオブジェクトとして直列化されるが、
/// 内部表現は挿入順を保持するベクタで持つ。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookDocument {
    /// 元のワークブックのファイル名
    pub file: String,

    /// シートのリスト（ワークブック内の順序）
    pub sheets: Vec<SheetDocument>,
}

impl WorkbookDocument {
    /// JSON文字列（2スペースインデント）へ直列化
    pub fn to_json_string(&self) -> Result<String, XlsxJsonError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JSON文字列から解析
    pub fn from_json_str(json: &str) -> Result<Self, XlsxJsonError> {
        Ok(serde_json::from_str(json)?)
    }

    /// シートを名前で検索（テスト・ツール用）
    pub fn sheet(&self, name: &str) -> Option<&SheetDocument> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

impl Serialize for WorkbookDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct SheetsMap<'a>(&'a [SheetDocument]);

        impl Serialize for SheetsMap<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for sheet in self.0 {
                    map.serialize_entry(&sheet.name, sheet)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("file", &self.file)?;
        map.serialize_entry("sheets", &SheetsMap(&self.sheets))?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for WorkbookDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RawDocument {
            #[serde(default)]
            file: String,
            #[serde(default)]
            sheets: serde_json::Map<String, Value>,
        }

        // preserve_order有効時、Mapの走査はJSON上の出現順になる
        let raw = RawDocument::deserialize(deserializer)?;
        let mut sheets = Vec::with_capacity(raw.sheets.len());
        for (name, value) in raw.sheets {
            let mut sheet: SheetDocument =
                serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            sheet.name = name;
            sheets.push(sheet);
        }

        Ok(WorkbookDocument {
            file: raw.file,
            sheets,
        })
    }
}
