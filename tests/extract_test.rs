//! Integration Tests for the forward pipeline (workbook -> canonical JSON)
//!
//! Fixtures are generated in memory with rust_xlsxwriter and fed through the
//! public converter API.

use rust_xlsxwriter::*;
use serde_json::json;
use std::io::Cursor;
use xlsxjson::{ConverterBuilder, WorkbookDocument};

// Helper module for generating test fixtures
mod fixtures {
    use super::*;

    /// Generate a workbook with one Excel table (2 columns, 2 data rows)
    pub fn generate_table_workbook() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Data")?;

        let columns = vec![
            TableColumn::new().set_header("Name"),
            TableColumn::new().set_header("Amount"),
        ];
        let table = Table::new().set_name("Orders").set_columns(&columns);
        worksheet.add_table(0, 0, 2, 1, &table)?;

        worksheet.write_string(1, 0, "Alice")?;
        worksheet.write_number(1, 1, 10.0)?;
        worksheet.write_string(2, 0, "Bob")?;
        worksheet.write_number(2, 1, 20.5)?;

        Ok(workbook.save_to_buffer()?)
    }

    /// Generate a table whose header row is covered by a merged range, so
    /// both physical header cells resolve to the same text
    pub fn generate_duplicate_header_table() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        let columns = vec![
            TableColumn::new().set_header("Header"),
            TableColumn::new().set_header("HeaderB"),
        ];
        let table = Table::new().set_name("Dup").set_columns(&columns);
        worksheet.add_table(0, 0, 1, 1, &table)?;

        // Merge A1:B1; only the anchor keeps a value
        worksheet.merge_range(0, 0, 0, 1, "", &Format::new())?;
        worksheet.write_string(0, 0, "Header")?;

        worksheet.write_string(1, 0, "x")?;
        worksheet.write_string(1, 1, "y")?;

        Ok(workbook.save_to_buffer()?)
    }

    /// Generate a table with a merged range overlapping its last row
    pub fn generate_table_with_touching_merge() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        let columns = vec![
            TableColumn::new().set_header("A"),
            TableColumn::new().set_header("B"),
        ];
        let table = Table::new().set_name("Spanned").set_columns(&columns);
        worksheet.add_table(0, 0, 2, 1, &table)?;

        worksheet.write_string(1, 0, "r1a")?;
        worksheet.write_string(1, 1, "r1b")?;

        // Merge across the last table row; the anchor keeps the value
        worksheet.merge_range(2, 0, 2, 1, "", &Format::new())?;
        worksheet.write_string(2, 0, "wide")?;

        // A merge below the table must not be reported as touching
        worksheet.merge_range(4, 0, 4, 1, "elsewhere", &Format::new())?;

        Ok(workbook.save_to_buffer()?)
    }

    /// Generate a sheet without tables: scattered values plus one merge
    pub fn generate_grid_workbook() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Notes")?;

        worksheet.merge_range(1, 1, 1, 2, "Title", &Format::new())?;
        worksheet.write_string(2, 1, "left")?;
        worksheet.write_number(2, 2, 7.0)?;

        Ok(workbook.save_to_buffer()?)
    }

    /// Generate a workbook with a table sheet followed by a plain sheet
    pub fn generate_mixed_workbook() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();

        let sheet1 = workbook.add_worksheet();
        sheet1.set_name("Data")?;
        let columns = vec![TableColumn::new().set_header("Key")];
        let table = Table::new().set_name("Keys").set_columns(&columns);
        sheet1.add_table(0, 0, 1, 0, &table)?;
        sheet1.write_string(1, 0, "k1")?;

        let sheet2 = workbook.add_worksheet();
        sheet2.set_name("Notes")?;
        sheet2.write_string(0, 0, "free-form")?;

        Ok(workbook.save_to_buffer()?)
    }

    /// Generate a workbook with a visible and a hidden sheet
    pub fn generate_hidden_sheet_workbook() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();

        let sheet1 = workbook.add_worksheet();
        sheet1.set_name("Front")?;
        sheet1.write_string(0, 0, "shown")?;

        let sheet2 = workbook.add_worksheet();
        sheet2.set_name("Back")?;
        sheet2.write_string(0, 0, "tucked away")?;
        sheet2.set_hidden(true);

        Ok(workbook.save_to_buffer()?)
    }

    /// Generate a workbook whose only sheet is completely empty
    pub fn generate_empty_workbook() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Blank")?;
        Ok(workbook.save_to_buffer()?)
    }

    /// Generate a grid with one date cell
    pub fn generate_date_workbook() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        let date = ExcelDateTime::from_ymd(2024, 3, 1)?;
        let format = Format::new().set_num_format("yyyy-mm-dd");
        worksheet.write_datetime_with_format(0, 0, &date, &format)?;
        worksheet.write_string(0, 1, "2024-03-01")?;

        Ok(workbook.save_to_buffer()?)
    }
}

fn extract(bytes: Vec<u8>, file_name: &str) -> WorkbookDocument {
    let converter = ConverterBuilder::new().build().unwrap();
    converter.extract(Cursor::new(bytes), file_name).unwrap()
}

#[test]
fn test_table_extraction() {
    let bytes = fixtures::generate_table_workbook().unwrap();
    let document = extract(bytes, "orders.xlsx");

    assert_eq!(document.file, "orders.xlsx");
    assert_eq!(document.sheets.len(), 1);

    let sheet = &document.sheets[0];
    assert_eq!(sheet.name, "Data");
    assert_eq!(sheet.header, "orders.xlsx-Data");
    assert_eq!(sheet.sheet_state, "visible");
    assert!(sheet.used_range.is_none());

    let tables = sheet.excel_tables.as_ref().unwrap();
    assert_eq!(tables.len(), 1);
    let table = &tables[0];
    assert_eq!(table.name, "Orders");
    assert_eq!(table.ref_range.as_deref(), Some("A1:B3"));
    assert_eq!(table.headers, ["Name", "Amount"]);
    assert_eq!(table.row_count, 2);
    assert_eq!(table.rows[0]["Name"], json!("Alice"));
    assert_eq!(table.rows[0]["Amount"], json!(10));
    assert_eq!(table.rows[1]["Name"], json!("Bob"));
    assert_eq!(table.rows[1]["Amount"], json!(20.5));
}

#[test]
fn test_duplicate_headers_are_renamed() {
    let bytes = fixtures::generate_duplicate_header_table().unwrap();
    let document = extract(bytes, "dup.xlsx");

    let table = &document.sheets[0].excel_tables.as_ref().unwrap()[0];
    assert_eq!(table.headers, ["Header", "Header_2"]);
    assert_eq!(table.rows[0]["Header"], json!("x"));
    assert_eq!(table.rows[0]["Header_2"], json!("y"));

    // The merged header range is reported as touching the table
    assert_eq!(table.merged_cells_in_table.len(), 1);
    assert_eq!(table.merged_cells_in_table[0].range, "A1:B1");

    // Extracted headers are always unique
    let mut unique = table.headers.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), table.headers.len());
}

#[test]
fn test_touching_merges_reported() {
    let bytes = fixtures::generate_table_with_touching_merge().unwrap();
    let document = extract(bytes, "spanned.xlsx");

    let sheet = &document.sheets[0];
    let table = &sheet.excel_tables.as_ref().unwrap()[0];

    // Only the merge intersecting the table bounds is listed
    assert_eq!(table.merged_cells_in_table.len(), 1);
    assert_eq!(table.merged_cells_in_table[0].range, "A3:B3");
    assert_eq!(table.merged_cells_in_table[0].anchor, "A3");

    // The merged row resolves both cells to the anchor value
    assert_eq!(table.rows[1]["A"], json!("wide"));
    assert_eq!(table.rows[1]["B"], json!("wide"));

    // The sheet itself documents both merges, in discovery order
    assert_eq!(sheet.merged_cells.len(), 2);
    assert_eq!(sheet.merged_cells[0].range, "A3:B3");
    assert_eq!(sheet.merged_cells[1].range, "A5:B5");
    assert_eq!(sheet.merged_cells[1].value, json!("elsewhere"));
}

#[test]
fn test_used_range_extraction_resolves_merges() {
    let bytes = fixtures::generate_grid_workbook().unwrap();
    let document = extract(bytes, "notes.xlsx");

    let sheet = &document.sheets[0];
    assert!(sheet.excel_tables.is_none());

    let used_range = sheet.used_range.as_ref().unwrap();
    assert_eq!(used_range.dimensions, "B2:C3");
    assert_eq!(used_range.row_count, 2);
    assert_eq!(used_range.col_count, 2);

    // Merged B2:C2 duplicates the anchor value across the span
    assert_eq!(used_range.grid[0][0], json!("Title"));
    assert_eq!(used_range.grid[0][1], json!("Title"));
    assert_eq!(used_range.grid[1][0], json!("left"));
    assert_eq!(used_range.grid[1][1], json!(7));

    assert_eq!(used_range.merged_cells.len(), 1);
    let merge = &used_range.merged_cells[0];
    assert_eq!(merge.range, "B2:C2");
    assert_eq!(merge.anchor, "B2");
    assert_eq!(merge.rows, [2, 2]);
    assert_eq!(merge.cols, [2, 3]);
    assert_eq!(merge.value, json!("Title"));
}

#[test]
fn test_mixed_workbook_has_tables_xor_used_range() {
    let bytes = fixtures::generate_mixed_workbook().unwrap();
    let document = extract(bytes, "mixed.xlsx");

    let names: Vec<&str> = document.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Data", "Notes"]);

    let data = document.sheet("Data").unwrap();
    assert!(data.excel_tables.is_some());
    assert!(data.used_range.is_none());

    let notes = document.sheet("Notes").unwrap();
    assert!(notes.excel_tables.is_none());
    assert!(notes.used_range.is_some());
    assert_eq!(notes.used_range.as_ref().unwrap().grid[0][0], json!("free-form"));
}

#[test]
fn test_hidden_sheet_state() {
    let bytes = fixtures::generate_hidden_sheet_workbook().unwrap();
    let document = extract(bytes, "hidden.xlsx");

    assert_eq!(document.sheet("Front").unwrap().sheet_state, "visible");
    assert_eq!(document.sheet("Back").unwrap().sheet_state, "hidden");
}

#[test]
fn test_empty_sheet_yields_one_by_one_null_grid() {
    let bytes = fixtures::generate_empty_workbook().unwrap();
    let document = extract(bytes, "empty.xlsx");

    let used_range = document.sheets[0].used_range.as_ref().unwrap();
    assert_eq!(used_range.dimensions, "A1:A1");
    assert_eq!(used_range.row_count, 1);
    assert_eq!(used_range.col_count, 1);
    assert_eq!(used_range.grid, vec![vec![serde_json::Value::Null]]);
}

#[test]
fn test_date_cells_become_iso_strings() {
    let bytes = fixtures::generate_date_workbook().unwrap();
    let document = extract(bytes, "dates.xlsx");

    let used_range = document.sheets[0].used_range.as_ref().unwrap();
    // A date-formatted cell and a plain string produce the same JSON value
    assert_eq!(used_range.grid[0][0], json!("2024-03-01"));
    assert_eq!(used_range.grid[0][1], json!("2024-03-01"));
}

#[test]
fn test_extract_to_json_is_pretty_and_ordered() {
    let bytes = fixtures::generate_mixed_workbook().unwrap();
    let converter = ConverterBuilder::new().build().unwrap();
    let json_text = converter
        .extract_to_json(Cursor::new(bytes), "mixed.xlsx")
        .unwrap();

    // Pretty output with 2-space indentation
    assert!(json_text.contains("\n  \"file\": \"mixed.xlsx\""));

    // Sheet order is preserved in the serialized document
    let data_pos = json_text.find("\"Data\"").unwrap();
    let notes_pos = json_text.find("\"Notes\"").unwrap();
    assert!(data_pos < notes_pos);

    // The document parses back to the same structure
    let document = WorkbookDocument::from_json_str(&json_text).unwrap();
    assert_eq!(document.sheets.len(), 2);
}

#[test]
fn test_unreadable_input_is_a_file_level_error() {
    let converter = ConverterBuilder::new().build().unwrap();
    let garbage = vec![0u8; 64];
    assert!(converter.extract(Cursor::new(garbage), "bad.xlsx").is_err());
}
