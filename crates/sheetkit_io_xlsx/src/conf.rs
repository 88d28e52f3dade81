//! XLSX constants and default preset factories.

use crate::spec::{SpecAutofitPolicy, SpecCellStyle, SpecStyleConfig};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: u32 = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Sheet name Excel reserves (case-insensitive).
pub const C_EXCEL_SHEET_NAME_RESERVED: &str = "History";

/// Body font family when the request config names none.
pub const C_FONT_FAMILY_DEFAULT: &str = "Calibri";
/// Body font size when the request config names none.
pub const N_FONT_SIZE_BODY_DEFAULT: f64 = 11.0;
/// Header font size when the request config names none.
pub const N_FONT_SIZE_HEADER_DEFAULT: f64 = 11.0;
/// Table title font size when the request config names none.
pub const N_FONT_SIZE_TITLE_DEFAULT: f64 = 13.0;

/// Minimum inferred column width before padding.
pub const N_WIDTH_CELL_MIN_DEFAULT: usize = 10;
/// Padding added to every inferred column width.
pub const N_WIDTH_CELL_PADDING_DEFAULT: usize = 2;
/// Maximum inferred column width after padding.
pub const N_WIDTH_CELL_MAX_DEFAULT: usize = N_WIDTH_EXCEL_MAX;
/// Excel column width limit in characters.
pub const N_WIDTH_EXCEL_MAX: usize = 255;

/// Anchor used when a table carries no `startCell`.
pub const C_START_CELL_DEFAULT: &str = "A1";
/// Prefix of generated artifact file names.
pub const C_ARTIFACT_FILE_PREFIX: &str = "generated-file-";
/// Extension of generated artifact file names.
pub const C_ARTIFACT_FILE_EXT: &str = "xlsx";
/// Retrieval path segment under the public base URL.
pub const C_ARTIFACT_DOWNLOAD_SEGMENT: &str = "downloads";

/// Build the sheet name used when a sheet spec carries none.
///
/// `idx_sheet` is zero-based; the produced name is 1-based (`Sheet1`, ...).
pub fn derive_default_sheet_name(idx_sheet: usize) -> String {
    format!("Sheet{}", idx_sheet + 1)
}

/// Build the style config used when a request carries no `excelConfigs`.
pub fn derive_default_style_config() -> SpecStyleConfig {
    SpecStyleConfig::default()
}

/// Build the sheet-wide base style that title/header cells inherit from.
pub fn derive_default_sheet_style() -> SpecCellStyle {
    SpecCellStyle {
        font_name: Some(C_FONT_FAMILY_DEFAULT.to_string()),
        font_size: Some(N_FONT_SIZE_BODY_DEFAULT),
        bold: None,
    }
}

/// Build default autofit policy.
pub fn derive_default_autofit_policy() -> SpecAutofitPolicy {
    SpecAutofitPolicy::default()
}
