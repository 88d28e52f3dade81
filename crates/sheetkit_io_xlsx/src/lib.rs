//! `sheetkit_io_xlsx` v1:
//! Tabular sheet layout engine and XLSX writer kernel.
//!
//! Module layout:
//! - `conf`   : constants and default presets
//! - `spec`   : request/rendered models, options, reports and errors
//! - `util`   : pure helper functions (anchors, styles, filter/fit ranges)
//! - `parse`  : JSON request boundary (`sheetsData` / `excelConfigs`)
//! - `layout` : per-table row cursor state machine
//! - `writer` : workbook assembler, XLSX encoder and artifact persistence
//!
//! Every generation call builds fresh state; nothing is shared between calls,
//! so callers may run independent requests concurrently.
pub mod conf;
pub mod layout;
pub mod parse;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
pub use layout::{EnumLayoutState, TableLayoutCursor, layout_table};
pub use parse::{parse_generate_request, parse_style_config, parse_workbook_request};
pub use spec::{
    EnumCellSpec, EnumCellValue, EnumRenderedContent, EnumStyleKind, GenerateError, Result,
    SpecArtifact, SpecAutofitPolicy, SpecCellRange, SpecCellStyle, SpecColumn,
    SpecRenderedCell, SpecRenderedSheet, SpecRenderedWorkbook, SpecRow, SpecSheet,
    SpecStyleConfig, SpecTable, SpecTableExtent, SpecWorkbookRequest, SpecXlsxReport,
};
pub use util::{
    calculate_autofilter_range, calculate_autofit_widths, derive_row_from_anchor,
    resolve_cell_style,
};
pub use writer::{
    XlsxWriter, build_workbook, build_workbook_with_policy, encode_workbook, generate_xlsx,
    persist_workbook,
};
