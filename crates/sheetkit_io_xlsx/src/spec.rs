//! Shared workbook specification models, rendered artifacts and errors.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::conf::{
    C_ARTIFACT_DOWNLOAD_SEGMENT, N_WIDTH_CELL_MAX_DEFAULT, N_WIDTH_CELL_MIN_DEFAULT,
    N_WIDTH_CELL_PADDING_DEFAULT,
};

////////////////////////////////////////////////////////////////////////////////
// #region RequestSpecification

/// One generation request: every sheet to render, in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecWorkbookRequest {
    /// Sheets in workbook order.
    pub sheets: Vec<SpecSheet>,
}

/// One sheet and the tables laid out into it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheet {
    /// Requested sheet name; defaulted by position when `None`.
    pub name: Option<String>,
    /// Tables in layout order.
    pub tables: Vec<SpecTable>,
}

/// One table: anchor, optional title/header and positional rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTable {
    /// Anchor such as `"A3"`; only the row component is used.
    pub start_cell: String,
    /// Optional title written above the header.
    pub title: Option<String>,
    /// Skip the header row entirely.
    pub skip_header: bool,
    /// Header columns; position is the 1-based column index.
    pub columns: Vec<SpecColumn>,
    /// Data rows, each positionally aligned with `columns`.
    pub rows: Vec<SpecRow>,
}

impl Default for SpecTable {
    fn default() -> Self {
        Self {
            start_cell: crate::conf::C_START_CELL_DEFAULT.to_string(),
            title: None,
            skip_header: false,
            columns: vec![],
            rows: vec![],
        }
    }
}

/// One header column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecColumn {
    /// Header label.
    pub name: String,
}

impl SpecColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One data row.
pub type SpecRow = Vec<EnumCellSpec>;

/// Literal value carried by a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
}

impl EnumCellValue {
    /// Text shown by a spreadsheet consumer, used for width inference.
    pub fn to_display_string(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::String(val) => val.clone(),
            Self::Number(val) => val.to_string(),
            Self::Boolean(val) => val.to_string(),
        }
    }
}

/// Input cell: a literal value or a formula left for the consumer to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellSpec {
    /// Directly displayed value.
    Literal(EnumCellValue),
    /// Formula expression, kept verbatim.
    Formula(String),
}

impl EnumCellSpec {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Literal(EnumCellValue::String(value.into()))
    }

    pub fn number(value: f64) -> Self {
        Self::Literal(EnumCellValue::Number(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::Literal(EnumCellValue::Boolean(value))
    }

    pub fn blank() -> Self {
        Self::Literal(EnumCellValue::None)
    }

    pub fn formula(expression: impl Into<String>) -> Self {
        Self::Formula(expression.into())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StyleSpecification

/// Presentation config carried by a request (`excelConfigs`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecStyleConfig {
    /// Body font family.
    pub font_family: Option<String>,
    /// Body font size.
    pub font_size: Option<f64>,
    /// Header font size.
    pub header_font_size: Option<f64>,
    /// Table title font size.
    pub table_title_font_size: Option<f64>,
    /// Emit one auto-filter range per table.
    pub auto_filter: bool,
    /// Infer column widths after all tables of a sheet are laid out.
    pub auto_fit_column_width: bool,
}

/// Element kinds the style resolver distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnumStyleKind {
    /// Table title cell.
    Title,
    /// Header label cell.
    Header,
    /// Data cell.
    Body,
}

impl fmt::Display for EnumStyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_kind = match self {
            Self::Title => "title",
            Self::Header => "header",
            Self::Body => "body",
        };
        write!(f, "{c_kind}")
    }
}

/// Concrete font directives of one rendered cell.
///
/// `None` fields inherit the sheet default.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecCellStyle {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<f64>,
    /// Bold weight.
    pub bold: Option<bool>,
}

impl SpecCellStyle {
    /// Return a new style by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellStyle) -> SpecCellStyle {
        self.merge(&patch)
    }

    /// Merge two styles with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellStyle) -> SpecCellStyle {
        SpecCellStyle {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
        }
    }
}

/// Autofit width policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitPolicy {
    /// Minimum width before padding.
    pub width_cell_min: usize,
    /// Maximum final width; never above the Excel limit of 255.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitPolicy {
    fn default() -> Self {
        Self {
            width_cell_min: N_WIDTH_CELL_MIN_DEFAULT,
            width_cell_max: N_WIDTH_CELL_MAX_DEFAULT,
            width_cell_padding: N_WIDTH_CELL_PADDING_DEFAULT,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RenderedArtifact

/// Content of a rendered cell.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumRenderedContent {
    /// Native-typed value.
    Value(EnumCellValue),
    /// Formula expression, verbatim.
    Formula(String),
}

impl EnumRenderedContent {
    /// Stringified length used by autofit (blank counts as zero).
    pub fn display_len(&self) -> usize {
        match self {
            Self::Value(value) => value.to_display_string().chars().count(),
            Self::Formula(expr) => expr.chars().count(),
        }
    }
}

/// One positioned, styled output cell. Indices are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecRenderedCell {
    /// 1-based row index.
    pub row: u32,
    /// 1-based column index.
    pub col: u16,
    /// Element kind the style was resolved for.
    pub kind: EnumStyleKind,
    /// Value or formula.
    pub content: EnumRenderedContent,
    /// Resolved style.
    pub style: SpecCellStyle,
}

/// Inclusive 1-based rectangular range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecCellRange {
    pub row_start: u32,
    pub col_start: u16,
    pub row_end: u32,
    pub col_end: u16,
}

impl fmt::Display for SpecCellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            crate::util::derive_column_letters(self.col_start),
            self.row_start,
            crate::util::derive_column_letters(self.col_end),
            self.row_end
        )
    }
}

/// Cursor walk summary of one laid-out table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTableExtent {
    /// Row parsed from the anchor (first row written, if any).
    pub row_start: u32,
    /// First data row (equals `row_end_exclusive` when there are none).
    pub row_data_start: u32,
    /// Cursor value after the walk.
    pub row_end_exclusive: u32,
    /// Number of columns used.
    pub n_cols: u16,
    /// Number of data rows written.
    pub n_rows_data: u32,
    /// Whether a header row was written.
    pub if_has_header: bool,
}

/// One rendered sheet: cells in write order plus derived ranges.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecRenderedSheet {
    /// Unique normalized sheet name.
    pub name: String,
    /// Cells in write order.
    pub cells: Vec<SpecRenderedCell>,
    /// Per-table extents in layout order.
    pub tables: Vec<SpecTableExtent>,
    /// Auto-filter ranges, one per eligible table.
    pub auto_filters: Vec<SpecCellRange>,
    /// Display width by 1-based column index.
    pub column_widths: BTreeMap<u16, usize>,
}

impl SpecRenderedSheet {
    /// Last cell written at (`row`, `col`), i.e. the one a consumer sees.
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&SpecRenderedCell> {
        self.cells
            .iter()
            .rev()
            .find(|cell| cell.row == row && cell.col == col)
    }
}

/// Finished in-memory document, ready for encoding.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecRenderedWorkbook {
    /// Sheets in request order.
    pub sheets: Vec<SpecRenderedSheet>,
    /// One report per sheet.
    pub reports: Vec<SpecXlsxReport>,
}

impl SpecRenderedWorkbook {
    /// Flatten every sheet report into `"<sheet>: <warning>"` lines.
    pub fn warnings(&self) -> Vec<String> {
        self.reports
            .iter()
            .flat_map(|report| {
                report
                    .warnings
                    .iter()
                    .map(move |msg| format!("{}: {msg}", report.sheet_name))
            })
            .collect()
    }
}

/// Persisted XLSX artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecArtifact {
    /// Collision-resistant identifier, generated once per request.
    pub id: Uuid,
    /// File name inside the artifact directory.
    pub file_name: String,
    /// Full path of the committed file.
    pub path: PathBuf,
}

impl SpecArtifact {
    /// Public retrieval URL under `base_url`.
    pub fn download_url(&self, base_url: &str) -> String {
        format!(
            "{}/{C_ARTIFACT_DOWNLOAD_SEGMENT}/{}",
            base_url.trim_end_matches('/'),
            self.file_name
        )
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-sheet build report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheet the report belongs to.
    pub sheet_name: String,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            warnings: vec![],
        }
    }

    /// Add a warning message and forward it to the log.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        log::warn!("[{}] {}", self.sheet_name, msg.as_ref());
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Result alias for generation calls.
pub type Result<T> = std::result::Result<T, GenerateError>;

/// Request-level failures. Any of them aborts the whole request.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Malformed request: missing `sheetsData`, row/column mismatch, unknown cell tag.
    #[error("Validation error: {0}")]
    Validation(String),
    /// Unplaceable table: non-positive anchor row, rows without columns, Excel limits.
    #[error("Layout error: {0}")]
    Layout(String),
    /// Serialization or persistence failure.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl GenerateError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }
}

impl From<rust_xlsxwriter::XlsxError> for GenerateError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Encoding(format!("xlsx write error: {err}"))
    }
}

impl From<std::io::Error> for GenerateError {
    fn from(err: std::io::Error) -> Self {
        Self::Encoding(format!("artifact io error: {err}"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_style_merge_prefers_right_side() {
        let base = SpecCellStyle {
            font_name: Some("Calibri".to_string()),
            font_size: Some(11.0),
            bold: None,
        };
        let merged = base.with_(SpecCellStyle {
            font_size: Some(13.0),
            bold: Some(true),
            ..Default::default()
        });

        assert_eq!(merged.font_name.as_deref(), Some("Calibri"));
        assert_eq!(merged.font_size, Some(13.0));
        assert_eq!(merged.bold, Some(true));
    }

    #[test]
    fn test_range_display_uses_a1_notation() {
        let range = SpecCellRange {
            row_start: 5,
            col_start: 1,
            row_end: 8,
            col_end: 28,
        };
        assert_eq!(range.to_string(), "A5:AB8");
    }

    #[test]
    fn test_display_len_counts_stringified_values() {
        assert_eq!(
            EnumRenderedContent::Value(EnumCellValue::Number(90.0)).display_len(),
            2
        );
        assert_eq!(
            EnumRenderedContent::Value(EnumCellValue::Number(2.5)).display_len(),
            3
        );
        assert_eq!(
            EnumRenderedContent::Value(EnumCellValue::Boolean(false)).display_len(),
            5
        );
        assert_eq!(
            EnumRenderedContent::Value(EnumCellValue::None).display_len(),
            0
        );
        assert_eq!(
            EnumRenderedContent::Formula("=B2*2".to_string()).display_len(),
            5
        );
    }

    #[test]
    fn test_artifact_download_url_trims_trailing_slash() {
        let artifact = SpecArtifact {
            id: Uuid::nil(),
            file_name: "generated-file-x.xlsx".to_string(),
            path: PathBuf::from("/tmp/generated-file-x.xlsx"),
        };
        assert_eq!(
            artifact.download_url("https://example.test/"),
            "https://example.test/downloads/generated-file-x.xlsx"
        );
    }

    #[test]
    fn test_error_display_names_category() {
        let err = GenerateError::validation("sheetsData must be a non-empty array.");
        assert_eq!(
            err.to_string(),
            "Validation error: sheetsData must be a non-empty array."
        );
    }
}
