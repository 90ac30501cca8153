//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

/// シートの表示状態
///
/// ワークブック上の表示制御であり、データの有無とは無関係です。
/// JSONドキュメントの`sheet_state`フィールドと相互変換されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetVisibility {
    /// 通常表示（デフォルト）
    Visible,

    /// 非表示（ユーザー操作で再表示可能）
    Hidden,

    /// 完全非表示（VBAなどからのみ再表示可能）
    VeryHidden,
}

impl SheetVisibility {
    /// JSONの`sheet_state`値へ変換
    pub fn as_state_str(&self) -> &'static str {
        match self {
            SheetVisibility::Visible => "visible",
            SheetVisibility::Hidden => "hidden",
            SheetVisibility::VeryHidden => "veryHidden",
        }
    }

    /// `sheet_state`値から変換
    ///
    /// 未知の値や空文字列は`Visible`として扱います。
    pub fn from_state(state: &str) -> Self {
        match state {
            "hidden" => SheetVisibility::Hidden,
            "veryHidden" => SheetVisibility::VeryHidden,
            _ => SheetVisibility::Visible,
        }
    }
}

impl Default for SheetVisibility {
    fn default() -> Self {
        SheetVisibility::Visible
    }
}
