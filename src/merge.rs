//! Merge Resolution Module
//!
//! シートの結合セル範囲から、範囲内の各セル座標をアンカー（左上セル）へ
//! 解決するためのルックアップを構築するモジュール。
//! ワークブック上では結合範囲のアンカーだけが値を保持するため、
//! 抽出時はこのルックアップを通して値を参照する。

use std::collections::HashMap;

use crate::types::{CellCoord, MergedRegion};

/// 結合セルのアンカールックアップ
///
/// 登録順に範囲を展開して構築する。範囲同士が重なる不正な入力でも
/// クラッシュせず、後から登録された範囲が優先される（タイブレーク仕様）。
/// 実際のExcelファイルで重なりが生じることはない。
#[derive(Debug, Default)]
pub(crate) struct MergeMap {
    anchors: HashMap<(u32, u32), CellCoord>,
}

impl MergeMap {
    /// 結合範囲のリストからルックアップを構築
    pub fn new(regions: &[MergedRegion]) -> Self {
        let mut anchors = HashMap::new();
        for region in regions {
            for row in region.range.start.row..=region.range.end.row {
                for col in region.range.start.col..=region.range.end.col {
                    anchors.insert((row, col), region.anchor);
                }
            }
        }
        Self { anchors }
    }

    /// 座標が結合範囲に含まれる場合、そのアンカー座標を返す
    ///
    /// アンカー自身も自分へ解決される（単一セルの縮退結合を含む）。
    pub fn anchor_of(&self, coord: CellCoord) -> Option<CellCoord> {
        self.anchors.get(&(coord.row, coord.col)).copied()
    }

    /// 値を読むべき座標へ解決
    ///
    /// 結合範囲外の座標はそのまま返す。常に値の取得先が得られるため、
    /// この層にエラー状態は存在しない。
    pub fn resolve(&self, coord: CellCoord) -> CellCoord {
        self.anchor_of(coord).unwrap_or(coord)
    }

    /// 登録されているセル数（テスト用）
    #[cfg(test)]
    pub fn covered_cells(&self) -> usize {
        self.anchors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellRange;

    fn region(text: &str) -> MergedRegion {
        MergedRegion::new(CellRange::parse(text).unwrap())
    }

    #[test]
    fn test_covered_cells_resolve_to_anchor() {
        let map = MergeMap::new(&[region("A1:C2")]);

        let anchor = CellCoord::new(0, 0);
        for row in 0..2 {
            for col in 0..3 {
                assert_eq!(map.resolve(CellCoord::new(row, col)), anchor);
            }
        }
        assert_eq!(map.covered_cells(), 6);
    }

    #[test]
    fn test_uncovered_cells_resolve_to_themselves() {
        let map = MergeMap::new(&[region("A1:B1")]);
        let outside = CellCoord::new(5, 5);
        assert_eq!(map.anchor_of(outside), None);
        assert_eq!(map.resolve(outside), outside);
    }

    #[test]
    fn test_degenerate_single_cell_merge() {
        // 単一セルの結合も自分自身へ解決される
        let map = MergeMap::new(&[region("B2:B2")]);
        let coord = CellCoord::new(1, 1);
        assert_eq!(map.anchor_of(coord), Some(coord));
        assert_eq!(map.resolve(coord), coord);
    }

    #[test]
    fn test_overlapping_regions_last_wins() {
        // 重なり合う範囲では後から登録された範囲が優先される
        let map = MergeMap::new(&[region("A1:B2"), region("B2:C3")]);
        assert_eq!(map.resolve(CellCoord::new(1, 1)), CellCoord::new(1, 1));
        // 重なっていないセルは元の範囲のまま
        assert_eq!(map.resolve(CellCoord::new(0, 0)), CellCoord::new(0, 0));
        assert_eq!(map.resolve(CellCoord::new(1, 0)), CellCoord::new(0, 0));
    }

    #[test]
    fn test_empty_region_list() {
        let map = MergeMap::new(&[]);
        let coord = CellCoord::new(3, 3);
        assert_eq!(map.resolve(coord), coord);
    }

    // プロパティベーステスト
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // 結合範囲内のすべてのセルがアンカーと同じ座標へ解決されること
            #[test]
            fn test_merge_resolution_agreement(
                r1 in 0u32..50, c1 in 0u32..20, dr in 0u32..5, dc in 0u32..5,
            ) {
                let range = CellRange::new(
                    CellCoord::new(r1, c1),
                    CellCoord::new(r1 + dr, c1 + dc),
                );
                let map = MergeMap::new(&[MergedRegion::new(range)]);
                let anchor_target = map.resolve(CellCoord::new(r1, c1));

                for row in r1..=r1 + dr {
                    for col in c1..=c1 + dc {
                        prop_assert_eq!(map.resolve(CellCoord::new(row, col)), anchor_target);
                    }
                }
            }
        }
    }
}
