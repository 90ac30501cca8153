//! Workbook Reconstruction Module
//!
//! JSONドキュメントからワークブックを組み立てるドライバ。
//! シートごとに、タイトルの整形 → 表示状態 → テーブルまたはグリッドの
//! 書き戻し → シートレベル結合の適用、の順で処理する。
//! シート単位の失敗はログに記録してスキップし、組み立てられた分の
//! ワークブックは必ず保存する。

use std::collections::HashSet;

use rust_xlsxwriter::{Workbook, Worksheet};

use crate::api::SheetVisibility;
use crate::builder::ConversionConfig;
use crate::error::XlsxJsonError;
use crate::rebuild::merges::{apply_merges, MergeSpec};
use crate::rebuild::table::write_table;
use crate::rebuild::used_range::write_used_range;
use crate::coerce::json_to_scalar;
use crate::schema::{SheetDocument, WorkbookDocument};

/// JSONドキュメントからワークブックを構築してバイト列として返す
pub(crate) fn build_workbook(
    document: &WorkbookDocument,
    config: &ConversionConfig,
) -> Result<Vec<u8>, XlsxJsonError> {
    log::info!("Starting reconstruction: {}", document.file);

    let mut workbook = Workbook::new();

    if document.sheets.is_empty() {
        // それでも有効なワークブックを保存する
        log::error!("Document contains no sheets.");
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Sheet1")?;
        return Ok(workbook.save_to_buffer()?);
    }

    let mut used_titles: HashSet<String> = HashSet::new();
    let mut registered_tables: HashSet<String> = HashSet::new();
    let mut active_chosen = false;

    for sheet in &document.sheets {
        let title = sanitize_sheet_title(&sheet.name, &used_titles);
        used_titles.insert(title.to_lowercase());

        if let Err(e) = build_sheet(
            &mut workbook,
            sheet,
            &title,
            &mut registered_tables,
            &mut active_chosen,
            config,
        ) {
            log::error!("Error in sheet '{}': {}", sheet.name, e);
        }
    }

    let bytes = workbook.save_to_buffer()?;
    log::info!("Reconstruction finished: {}", document.file);
    Ok(bytes)
}

/// シート1枚を組み立てる
fn build_sheet(
    workbook: &mut Workbook,
    sheet: &SheetDocument,
    title: &str,
    registered_tables: &mut HashSet<String>,
    active_chosen: &mut bool,
    config: &ConversionConfig,
) -> Result<(), XlsxJsonError> {
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(title)?;

    apply_visibility(worksheet, title, &sheet.sheet_state, active_chosen);

    // テーブルかグリッドのどちらか一方を書き戻す
    let tables = sheet
        .excel_tables
        .as_deref()
        .filter(|tables| !tables.is_empty());
    if let Some(tables) = tables {
        let mut cursor: Option<u32> = None;
        for (table_index, table) in tables.iter().enumerate() {
            if let Err(e) = write_table(
                worksheet,
                title,
                table_index,
                table,
                registered_tables,
                &mut cursor,
                config.date_coercion,
            ) {
                log::error!(
                    "Table could not be written (sheet '{}', index {}): {}",
                    title,
                    table_index,
                    e
                );
            }
        }
    } else if let Some(used_range) = &sheet.used_range {
        write_used_range(worksheet, title, used_range, config.date_coercion)?;
    } else {
        log::warn!(
            "Sheet '{}': neither 'excel_tables' nor 'used_range' present. Created empty sheet.",
            title
        );
    }

    // シートレベルの結合は最後に適用（テーブルの外に及ぶ場合がある）
    let specs: Vec<MergeSpec> = sheet
        .merged_cells
        .iter()
        .map(|m| MergeSpec {
            range_text: m.range.clone(),
            anchor_value: Some(json_to_scalar(&m.value, config.date_coercion)),
        })
        .collect();
    apply_merges(worksheet, title, &specs, None);

    Ok(())
}

/// シートの表示状態を適用
///
/// 最初の可視シートをアクティブシートにする。書き込み側の形式は
/// veryHiddenを表現できないため、hiddenへ落として警告を出す。
fn apply_visibility(
    worksheet: &mut Worksheet,
    title: &str,
    sheet_state: &str,
    active_chosen: &mut bool,
) {
    match SheetVisibility::from_state(sheet_state) {
        SheetVisibility::Visible => {
            if !*active_chosen {
                worksheet.set_active(true);
                *active_chosen = true;
            }
        }
        SheetVisibility::Hidden => {
            worksheet.set_hidden(true);
        }
        SheetVisibility::VeryHidden => {
            log::warn!(
                "Sheet '{}' requested veryHidden; the writer only supports hidden.",
                title
            );
            worksheet.set_hidden(true);
        }
    }
}

/// シートタイトルを書き込み側の制約に合わせて整形
///
/// 使用できない文字を`_`へ置換し、31文字へ切り詰め、既存タイトルと
/// 衝突する場合はサフィックスで一意化する（大文字小文字は区別しない）。
fn sanitize_sheet_title(name: &str, used_titles: &HashSet<String>) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect();

    let mut base: String = cleaned.chars().take(31).collect();
    base = base.trim_matches('\'').to_string();
    if base.is_empty() {
        base = "Sheet".to_string();
    }

    if !used_titles.contains(&base.to_lowercase()) {
        return base;
    }

    let mut counter = 2u32;
    loop {
        let suffix = format!("_{}", counter);
        let kept = 31usize.saturating_sub(suffix.chars().count());
        let candidate: String = base.chars().take(kept).chain(suffix.chars()).collect();
        if !used_titles.contains(&candidate.to_lowercase()) {
            return candidate;
        }
        counter += 1;
    }
}
