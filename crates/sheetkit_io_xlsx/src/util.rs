//! Stateless helper utilities used by the layout engine and the XLSX writer.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::conf::{
    C_EXCEL_SHEET_NAME_RESERVED, C_FONT_FAMILY_DEFAULT, N_FONT_SIZE_BODY_DEFAULT,
    N_FONT_SIZE_HEADER_DEFAULT, N_FONT_SIZE_TITLE_DEFAULT, N_LEN_EXCEL_SHEET_NAME_MAX,
    N_NROWS_EXCEL_MAX, N_WIDTH_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{
    EnumStyleKind, GenerateError, Result, SpecAutofitPolicy, SpecCellRange, SpecCellStyle,
    SpecRenderedSheet, SpecStyleConfig, SpecTableExtent,
};

static RE_NON_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9]").expect("static regex must compile"));
static RE_ANCHOR_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\$?([A-Za-z]+)").expect("static regex must compile"));

////////////////////////////////////////////////////////////////////////////////
// #region CellReference

/// Parse the 1-based row of an anchor such as `"B5"`.
///
/// Every non-digit character is stripped; an anchor without digits maps to
/// row 1. Column letters do not shift placement (tables always start at
/// column 1), see [`derive_column_letters_from_anchor`].
pub fn derive_row_from_anchor(anchor: &str) -> Result<u32> {
    let c_digits = RE_NON_DIGIT.replace_all(anchor, "");
    if c_digits.is_empty() {
        return Ok(1);
    }

    let n_row = c_digits
        .trim_start_matches('0')
        .parse::<u64>()
        .unwrap_or(0);
    if c_digits.trim_start_matches('0').len() > 19 || n_row > u64::from(N_NROWS_EXCEL_MAX) {
        return Err(GenerateError::layout(format!(
            "Anchor {anchor:?} row exceeds Excel limit of {N_NROWS_EXCEL_MAX}."
        )));
    }
    if n_row == 0 {
        return Err(GenerateError::layout(format!(
            "Anchor {anchor:?} resolves to non-positive row 0."
        )));
    }

    Ok(n_row as u32)
}

/// Leading column letters of an anchor (`"$c7"` -> `"C"`), if any.
pub fn derive_column_letters_from_anchor(anchor: &str) -> Option<String> {
    RE_ANCHOR_COLUMN
        .captures(anchor)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_uppercase())
}

/// Convert a 1-based column index to letters (`1` -> `A`, `28` -> `AB`).
pub fn derive_column_letters(col: u16) -> String {
    let mut n_col = u32::from(col);
    let mut l_chars = Vec::new();
    while n_col > 0 {
        let n_rem = (n_col - 1) % 26;
        l_chars.push(char::from(b'A' + n_rem as u8));
        n_col = (n_col - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StyleResolution

/// Resolve concrete font directives for one element kind.
///
/// Title and header cells leave the family unset so they inherit the sheet
/// default; only body cells take `fontFamily`.
pub fn resolve_cell_style(kind: EnumStyleKind, config: &SpecStyleConfig) -> SpecCellStyle {
    match kind {
        EnumStyleKind::Title => SpecCellStyle {
            font_name: None,
            font_size: Some(
                config
                    .table_title_font_size
                    .unwrap_or(N_FONT_SIZE_TITLE_DEFAULT),
            ),
            bold: None,
        },
        EnumStyleKind::Header => SpecCellStyle {
            font_name: None,
            font_size: Some(config.header_font_size.unwrap_or(N_FONT_SIZE_HEADER_DEFAULT)),
            bold: Some(true),
        },
        EnumStyleKind::Body => SpecCellStyle {
            font_name: Some(
                config
                    .font_family
                    .clone()
                    .unwrap_or_else(|| C_FONT_FAMILY_DEFAULT.to_string()),
            ),
            font_size: Some(config.font_size.unwrap_or(N_FONT_SIZE_BODY_DEFAULT)),
            bold: Some(false),
        },
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DerivedRanges

/// Auto-filter rectangle over the header (or first data row) through the last data row.
///
/// Returns `None` when the table has no columns, or neither header nor data rows.
pub fn calculate_autofilter_range(extent: &SpecTableExtent) -> Option<SpecCellRange> {
    if extent.n_cols == 0 {
        return None;
    }

    let n_row_top = extent.row_end_exclusive - extent.n_rows_data - u32::from(extent.if_has_header);
    let n_row_bottom = extent.row_end_exclusive.checked_sub(1)?;
    if n_row_bottom < n_row_top || (extent.n_rows_data == 0 && !extent.if_has_header) {
        return None;
    }

    Some(SpecCellRange {
        row_start: n_row_top,
        col_start: 1,
        row_end: n_row_bottom,
        col_end: extent.n_cols,
    })
}

/// Infer display widths for every column touched in `sheet`.
///
/// Each width is `max(width_cell_min, longest) + width_cell_padding` over every
/// written cell in the column, capped at `width_cell_max` (at most 255); blank
/// cells count as zero.
pub fn calculate_autofit_widths(
    sheet: &SpecRenderedSheet,
    policy: &SpecAutofitPolicy,
) -> BTreeMap<u16, usize> {
    let n_max = usize::min(
        N_WIDTH_EXCEL_MAX,
        usize::max(policy.width_cell_min, policy.width_cell_max),
    );
    let mut dict_len_max: BTreeMap<u16, usize> = BTreeMap::new();
    for cell in &sheet.cells {
        let n_len = cell.content.display_len();
        dict_len_max
            .entry(cell.col)
            .and_modify(|n_max| *n_max = usize::max(*n_max, n_len))
            .or_insert(n_len);
    }

    dict_len_max
        .into_iter()
        .map(|(col, n_len)| {
            (
                col,
                usize::min(
                    n_max,
                    usize::max(policy.width_cell_min, n_len) + policy.width_cell_padding,
                ),
            )
        })
        .collect()
}

/// Pairs `(i, j)` (`i < j`) of tables whose written row ranges intersect.
pub fn derive_overlapping_tables(extents: &[SpecTableExtent]) -> Vec<(usize, usize)> {
    let mut l_pairs = Vec::new();
    for (i, lhs) in extents.iter().enumerate() {
        if lhs.row_end_exclusive <= lhs.row_start {
            continue;
        }
        for (j, rhs) in extents.iter().enumerate().skip(i + 1) {
            if rhs.row_end_exclusive <= rhs.row_start {
                continue;
            }
            if lhs.row_start < rhs.row_end_exclusive && rhs.row_start < lhs.row_end_exclusive {
                l_pairs.push((i, j));
            }
        }
    }
    l_pairs
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
///
/// Leading/trailing apostrophes are stripped and the reserved name `History`
/// gets a `replace_to` suffix.
pub fn sanitize_sheet_name(name: &str, replace_to: &str, name_default: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = trim_sheet_name(&c_name).to_string();
    if c_name.eq_ignore_ascii_case(C_EXCEL_SHEET_NAME_RESERVED) {
        c_name.push_str(replace_to);
    }
    if c_name.is_empty() {
        c_name = name_default.to_string();
    }

    let c_name_truncated: String = c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect();
    match trim_sheet_name(&c_name_truncated) {
        "" => name_default.to_string(),
        c_trimmed => c_trimmed.to_string(),
    }
}

fn trim_sheet_name(name: &str) -> &str {
    name.trim_matches(|c: char| c.is_whitespace() || c == '\'')
}

/// Return `name`, or the first free `name__N` (N >= 2), and record it as taken.
///
/// Names are compared case-insensitively, as Excel does; the returned name
/// keeps its casing.
pub fn derive_unique_sheet_name(name: &str, set_names_existing: &mut BTreeSet<String>) -> String {
    if set_names_existing.insert(name.to_lowercase()) {
        return name.to_string();
    }

    let base_name: String = name
        .chars()
        .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
        .collect();

    let mut n_idx = 2usize;
    loop {
        let candidate: String = format!("{base_name}__{n_idx}")
            .chars()
            .take(N_LEN_EXCEL_SHEET_NAME_MAX)
            .collect();
        if set_names_existing.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n_idx += 1;
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
