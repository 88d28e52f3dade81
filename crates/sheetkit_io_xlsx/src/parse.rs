//! Request boundary: turn a JSON generation body into validated specs.
//!
//! Body shape: `{ "sheetsData": [...], "excelConfigs": {...} }`.
//! Cells arrive as `{ "type": "literal" | "formula", "value": ... }` and are
//! mapped onto the closed [`EnumCellSpec`] variant; any other tag is rejected.

use serde::Deserialize;
use serde_json::Value;

use crate::conf::{C_START_CELL_DEFAULT, derive_default_style_config};
use crate::spec::{
    EnumCellSpec, EnumCellValue, GenerateError, Result, SpecColumn, SpecRow, SpecSheet,
    SpecStyleConfig, SpecTable, SpecWorkbookRequest,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGenerateBody {
    sheets_data: Option<Value>,
    excel_configs: Option<Value>,
}

/// `sheetName` wins over `name` when both are present.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSheet {
    sheet_name: Option<String>,
    name: Option<String>,
    #[serde(default)]
    tables: Vec<RawTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTable {
    start_cell: Option<String>,
    title: Option<String>,
    #[serde(default)]
    skip_header: Option<Value>,
    columns: Option<Vec<RawColumn>>,
    rows: Option<Vec<Vec<RawCell>>>,
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    name: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStyleConfig {
    font_family: Option<String>,
    font_size: Option<Value>,
    header_font_size: Option<Value>,
    table_title_font_size: Option<Value>,
    auto_filter: Option<Value>,
    auto_fit_column_width: Option<Value>,
}

/// Parse a full generation body into a request and its style config.
pub fn parse_generate_request(body: &str) -> Result<(SpecWorkbookRequest, SpecStyleConfig)> {
    let raw: RawGenerateBody = serde_json::from_str(body)
        .map_err(|err| GenerateError::validation(format!("Malformed request body: {err}")))?;

    let request = parse_workbook_request(raw.sheets_data.as_ref())?;
    let config = match raw.excel_configs {
        Some(Value::Null) | None => derive_default_style_config(),
        Some(value) => parse_style_config(&value)?,
    };
    Ok((request, config))
}

/// Parse the `sheetsData` value. It must be a non-empty array.
pub fn parse_workbook_request(sheets_data: Option<&Value>) -> Result<SpecWorkbookRequest> {
    let Some(Value::Array(l_sheets_raw)) = sheets_data else {
        return Err(GenerateError::validation(
            "sheetsData must be a non-empty array.",
        ));
    };
    if l_sheets_raw.is_empty() {
        return Err(GenerateError::validation(
            "sheetsData must be a non-empty array.",
        ));
    }

    let mut l_sheets = Vec::with_capacity(l_sheets_raw.len());
    for (n_idx_sheet, sheet_raw) in l_sheets_raw.iter().enumerate() {
        let raw: RawSheet = serde_json::from_value(sheet_raw.clone()).map_err(|err| {
            GenerateError::validation(format!("sheetsData[{n_idx_sheet}] is malformed: {err}"))
        })?;

        let mut l_tables = Vec::with_capacity(raw.tables.len());
        for (n_idx_table, table_raw) in raw.tables.into_iter().enumerate() {
            let c_path = format!("sheetsData[{n_idx_sheet}].tables[{n_idx_table}]");
            l_tables.push(convert_table(table_raw, &c_path)?);
        }

        l_sheets.push(SpecSheet {
            name: raw.sheet_name.or(raw.name),
            tables: l_tables,
        });
    }

    Ok(SpecWorkbookRequest { sheets: l_sheets })
}

/// Parse the `excelConfigs` value.
///
/// Sizes accept numbers or numeric strings; flags accept booleans or
/// `"true"`/`"false"` strings.
pub fn parse_style_config(value: &Value) -> Result<SpecStyleConfig> {
    let raw: RawStyleConfig = serde_json::from_value(value.clone())
        .map_err(|err| GenerateError::validation(format!("excelConfigs is malformed: {err}")))?;

    Ok(SpecStyleConfig {
        font_family: raw.font_family.filter(|name| !name.trim().is_empty()),
        font_size: parse_font_size(raw.font_size.as_ref(), "fontSize")?,
        header_font_size: parse_font_size(raw.header_font_size.as_ref(), "headerFontSize")?,
        table_title_font_size: parse_font_size(
            raw.table_title_font_size.as_ref(),
            "tableTitleFontSize",
        )?,
        auto_filter: parse_flag(raw.auto_filter.as_ref()),
        auto_fit_column_width: parse_flag(raw.auto_fit_column_width.as_ref()),
    })
}

/// Resolve a boolean-as-string flag; anything but `true`/`"true"` is false.
pub fn parse_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(val)) => *val,
        Some(Value::String(val)) => val.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn parse_font_size(value: Option<&Value>, field: &str) -> Result<Option<f64>> {
    let n_size = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(val)) => val.as_f64(),
        Some(Value::String(val)) if val.trim().is_empty() => return Ok(None),
        Some(Value::String(val)) => val.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match n_size {
        Some(val) if val.is_finite() && val > 0.0 => Ok(Some(val)),
        _ => Err(GenerateError::validation(format!(
            "excelConfigs.{field} must be a positive number."
        ))),
    }
}

fn convert_table(raw: RawTable, c_path: &str) -> Result<SpecTable> {
    let Some(l_columns_raw) = raw.columns else {
        return Err(GenerateError::validation(format!(
            "{c_path} must carry a columns array."
        )));
    };
    let Some(l_rows_raw) = raw.rows else {
        return Err(GenerateError::validation(format!(
            "{c_path} must carry a rows array."
        )));
    };

    let mut l_columns = Vec::with_capacity(l_columns_raw.len());
    for (n_idx_col, column) in l_columns_raw.into_iter().enumerate() {
        let c_name = match column.name {
            Some(Value::String(val)) => val,
            Some(Value::Number(val)) => val.to_string(),
            Some(Value::Bool(val)) => val.to_string(),
            None | Some(Value::Null) => String::new(),
            Some(_) => {
                return Err(GenerateError::validation(format!(
                    "{c_path}.columns[{n_idx_col}].name must be a string."
                )));
            }
        };
        l_columns.push(SpecColumn { name: c_name });
    }

    let mut l_rows: Vec<SpecRow> = Vec::with_capacity(l_rows_raw.len());
    for (n_idx_row, row_raw) in l_rows_raw.into_iter().enumerate() {
        let mut row = Vec::with_capacity(row_raw.len());
        for (n_idx_col, cell_raw) in row_raw.into_iter().enumerate() {
            let c_cell_path = format!("{c_path}.rows[{n_idx_row}][{n_idx_col}]");
            row.push(convert_cell(cell_raw, &c_cell_path)?);
        }
        l_rows.push(row);
    }

    Ok(SpecTable {
        start_cell: raw
            .start_cell
            .unwrap_or_else(|| C_START_CELL_DEFAULT.to_string()),
        title: raw.title,
        skip_header: parse_flag(raw.skip_header.as_ref()),
        columns: l_columns,
        rows: l_rows,
    })
}

fn convert_cell(raw: RawCell, c_path: &str) -> Result<EnumCellSpec> {
    let Some(c_kind) = raw.kind else {
        return Err(GenerateError::validation(format!(
            "{c_path} is missing its type tag."
        )));
    };

    match c_kind.to_ascii_lowercase().as_str() {
        "formula" => match raw.value {
            Value::String(expr) => Ok(EnumCellSpec::Formula(expr)),
            _ => Err(GenerateError::validation(format!(
                "{c_path} formula value must be a string."
            ))),
        },
        "literal" => Ok(EnumCellSpec::Literal(convert_literal(raw.value, c_path)?)),
        _ => Err(GenerateError::validation(format!(
            "{c_path} has unsupported cell type {c_kind:?}; expected \"literal\" or \"formula\"."
        ))),
    }
}

fn convert_literal(value: Value, c_path: &str) -> Result<EnumCellValue> {
    match value {
        Value::Null => Ok(EnumCellValue::None),
        Value::String(val) => Ok(EnumCellValue::String(val)),
        Value::Bool(val) => Ok(EnumCellValue::Boolean(val)),
        Value::Number(val) => val.as_f64().map(EnumCellValue::Number).ok_or_else(|| {
            GenerateError::validation(format!("{c_path} number is out of range."))
        }),
        Value::Array(_) | Value::Object(_) => Err(GenerateError::validation(format!(
            "{c_path} literal value must be text, number, boolean or null."
        ))),
    }
}
