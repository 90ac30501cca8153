//! xlsxjson - Bidirectional converter between XLSX workbooks and a canonical JSON document
//!
//! This crate extracts a workbook's structure (sheets, merged-cell regions,
//! named Excel tables, raw cell grids, sheet visibility) into a canonical JSON
//! document, and reconstructs an equivalent workbook from that document.
//! Merged-cell anchors are resolved during extraction, duplicate table headers
//! are renamed, and every processed cell is recorded in an audit log line of
//! the form `Map: <source-locator> -> <target-locator>`.
//!
//! Re-extracting a reconstructed workbook reproduces the same logical content:
//! after at most one lossy coercion pass (date values travel as ISO-8601
//! strings), further round-trips are fixed points.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxjson::ConverterBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = ConverterBuilder::new().build()?;
//!
//!     // Extract a workbook into canonical JSON
//!     let input = File::open("report.xlsx")?;
//!     let json = converter.extract_to_json(input, "report.xlsx")?;
//!     std::fs::write("report.json", &json)?;
//!
//!     // Reconstruct an equivalent workbook from the JSON
//!     let bytes = converter.reconstruct_from_json(&json)?;
//!     std::fs::write("rebuilt.xlsx", bytes)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! For in-memory conversion, use `Cursor`:
//!
//! ```rust,no_run
//! use std::io::Cursor;
//! use xlsxjson::ConverterBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = ConverterBuilder::new().build()?;
//! let excel_data: Vec<u8> = vec![]; // Your workbook bytes
//! let document = converter.extract(Cursor::new(excel_data), "input.xlsx")?;
//! for sheet in &document.sheets {
//!     println!("{}: {}", sheet.name, sheet.sheet_state);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! The crate emits through the [`log`](https://docs.rs/log) facade and never
//! installs a logger itself; the embedding binary owns logger setup. Per-cell
//! audit mapping lines are INFO records under the `xlsxjson::audit` target,
//! recoverable skips are WARN, and skipped scopes (a failed sheet or table)
//! are ERROR. Failures are always contained in the smallest enclosing scope:
//! a bad merge range skips that merge, a bad table skips that table, a bad
//! sheet skips that sheet, and the remaining output is still produced.

mod api;
mod audit;
mod builder;
mod coerce;
mod error;
mod extract;
mod merge;
mod rebuild;
mod schema;
mod security;
mod types;

// 公開API
pub use api::SheetVisibility;
pub use builder::{Converter, ConverterBuilder};
pub use error::XlsxJsonError;
pub use schema::{
    MergedCellInfo, RowObject, SheetDocument, TableDocument, TableMergeRef, UsedRangeDocument,
    WorkbookDocument,
};
