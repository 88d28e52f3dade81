//! Workbook assembler and XLSX writer kernel.
//!
//! [`build_workbook`] lays every table of every sheet out into an in-memory
//! [`SpecRenderedWorkbook`]; [`encode_workbook`] maps that artifact onto a
//! `rust_xlsxwriter` workbook; [`persist_workbook`] commits encoded bytes under a
//! fresh UUID-based file name.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::conf::{
    C_ARTIFACT_FILE_EXT, C_ARTIFACT_FILE_PREFIX, derive_default_autofit_policy,
    derive_default_sheet_name, derive_default_sheet_style,
};
use crate::layout::layout_table;
use crate::spec::{
    EnumCellValue, EnumRenderedContent, GenerateError, Result, SpecArtifact, SpecAutofitPolicy,
    SpecCellStyle, SpecRenderedSheet, SpecRenderedWorkbook, SpecSheet, SpecStyleConfig,
    SpecWorkbookRequest, SpecXlsxReport,
};
use crate::util::{
    calculate_autofilter_range, calculate_autofit_widths, derive_column_letters_from_anchor,
    derive_overlapping_tables, derive_unique_sheet_name, sanitize_sheet_name,
};

/// Stateful writer bound to an artifact directory.
///
/// Every [`Self::write_request`] call builds fresh engine state; only the
/// collected reports survive between calls.
pub struct XlsxWriter {
    path_dir_out: PathBuf,
    l_reports: Vec<SpecXlsxReport>,
}

impl XlsxWriter {
    /// Create writer that commits artifacts into `path_dir_out`.
    pub fn new(path_dir_out: PathBuf) -> Self {
        Self {
            path_dir_out,
            l_reports: Vec::new(),
        }
    }

    /// Return artifact directory as string.
    pub fn dir_out(&self) -> String {
        self.path_dir_out.to_string_lossy().to_string()
    }

    /// Return immutable snapshot of per-sheet reports of every request written so far.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Build, encode and persist one request. Nothing is committed on error.
    pub fn write_request(
        &mut self,
        request: &SpecWorkbookRequest,
        config: &SpecStyleConfig,
    ) -> Result<SpecArtifact> {
        let (artifact, rendered) = generate_xlsx(request, config, &self.path_dir_out)?;
        self.l_reports.extend(rendered.reports);
        Ok(artifact)
    }
}

/// Lay out every sheet of `request` with the default autofit policy.
pub fn build_workbook(
    request: &SpecWorkbookRequest,
    config: &SpecStyleConfig,
) -> Result<SpecRenderedWorkbook> {
    build_workbook_with_policy(request, config, &derive_default_autofit_policy())
}

/// Lay out every sheet of `request`, in request order.
pub fn build_workbook_with_policy(
    request: &SpecWorkbookRequest,
    config: &SpecStyleConfig,
    policy_autofit: &SpecAutofitPolicy,
) -> Result<SpecRenderedWorkbook> {
    if request.sheets.is_empty() {
        return Err(GenerateError::validation(
            "sheetsData must be a non-empty array.",
        ));
    }

    let mut set_sheet_names_existing = BTreeSet::new();
    let mut rendered = SpecRenderedWorkbook::default();
    for (n_idx_sheet, sheet) in request.sheets.iter().enumerate() {
        let (sheet_rendered, report) = build_sheet(
            n_idx_sheet,
            sheet,
            config,
            policy_autofit,
            &mut set_sheet_names_existing,
        )?;
        rendered.sheets.push(sheet_rendered);
        rendered.reports.push(report);
    }

    log::info!(
        "Built workbook: sheets={} cells={}",
        rendered.sheets.len(),
        rendered
            .sheets
            .iter()
            .map(|sheet| sheet.cells.len())
            .sum::<usize>()
    );
    Ok(rendered)
}

fn build_sheet(
    n_idx_sheet: usize,
    sheet: &SpecSheet,
    config: &SpecStyleConfig,
    policy_autofit: &SpecAutofitPolicy,
    set_sheet_names_existing: &mut BTreeSet<String>,
) -> Result<(SpecRenderedSheet, SpecXlsxReport)> {
    let c_name_default = derive_default_sheet_name(n_idx_sheet);
    let c_name_requested = sheet.name.as_deref().unwrap_or(&c_name_default);
    let c_name_sanitized = sanitize_sheet_name(c_name_requested, "_", &c_name_default);
    let c_name_unique = derive_unique_sheet_name(&c_name_sanitized, set_sheet_names_existing);

    let mut report = SpecXlsxReport::new(&c_name_unique);
    if c_name_unique != c_name_requested {
        report.warn(format!(
            "Sheet name {c_name_requested:?} normalized to {c_name_unique:?}."
        ));
    }

    let mut rendered = SpecRenderedSheet {
        name: c_name_unique,
        ..Default::default()
    };

    for (n_idx_table, table) in sheet.tables.iter().enumerate() {
        let extent = layout_table(table, config, &mut rendered.cells).map_err(|err| {
            prefix_error(err, &format!("sheetsData[{n_idx_sheet}].tables[{n_idx_table}]"))
        })?;

        if let Some(c_letters) = derive_column_letters_from_anchor(&table.start_cell)
            && c_letters != "A"
        {
            report.warn(format!(
                "tables[{n_idx_table}] anchor {:?}: column {c_letters} ignored, table starts at column A.",
                table.start_cell
            ));
        }

        if config.auto_filter {
            match calculate_autofilter_range(&extent) {
                Some(range) => rendered.auto_filters.push(range),
                None => report.warn(format!(
                    "tables[{n_idx_table}] has no header or data rows; auto-filter skipped."
                )),
            }
        }

        rendered.tables.push(extent);
    }

    for (n_idx_lhs, n_idx_rhs) in derive_overlapping_tables(&rendered.tables) {
        let lhs = &rendered.tables[n_idx_lhs];
        let rhs = &rendered.tables[n_idx_rhs];
        report.warn(format!(
            "tables[{n_idx_lhs}] (rows {}..{}) overlaps tables[{n_idx_rhs}] (rows {}..{}); later cells overwrite earlier ones.",
            lhs.row_start,
            lhs.row_end_exclusive - 1,
            rhs.row_start,
            rhs.row_end_exclusive - 1
        ));
    }

    if rendered.auto_filters.len() > 1 {
        report.warn(format!(
            "{} auto-filter ranges; the XLSX sheet keeps only the last one ({}).",
            rendered.auto_filters.len(),
            rendered.auto_filters[rendered.auto_filters.len() - 1]
        ));
    }

    if config.auto_fit_column_width {
        rendered.column_widths = calculate_autofit_widths(&rendered, policy_autofit);
    }

    Ok((rendered, report))
}

fn prefix_error(err: GenerateError, c_path: &str) -> GenerateError {
    match err {
        GenerateError::Validation(msg) => GenerateError::Validation(format!("{c_path}: {msg}")),
        GenerateError::Layout(msg) => GenerateError::Layout(format!("{c_path}: {msg}")),
        GenerateError::Encoding(msg) => GenerateError::Encoding(msg),
    }
}

/// Map a rendered workbook onto a `rust_xlsxwriter` workbook.
pub fn encode_workbook(rendered: &SpecRenderedWorkbook) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let style_sheet_default = derive_default_sheet_style();

    for sheet in &rendered.sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        encode_sheet(worksheet, sheet, &style_sheet_default)?;
    }

    Ok(workbook)
}

fn encode_sheet(
    worksheet: &mut Worksheet,
    sheet: &SpecRenderedSheet,
    style_sheet_default: &SpecCellStyle,
) -> Result<()> {
    for cell in &sheet.cells {
        let format = derive_rust_xlsx_format(&style_sheet_default.merge(&cell.style));
        let n_row = cast_row_num(cell.row)?;
        let n_col = cast_col_num(cell.col)?;
        write_cell_with_format(worksheet, n_row, n_col, &cell.content, &format)?;
    }

    if let Some((range, l_superseded)) = sheet.auto_filters.split_last() {
        for range_superseded in l_superseded {
            log::warn!(
                "[{}] auto-filter {range_superseded} superseded by {range}",
                sheet.name
            );
        }
        worksheet.autofilter(
            cast_row_num(range.row_start)?,
            cast_col_num(range.col_start)?,
            cast_row_num(range.row_end)?,
            cast_col_num(range.col_end)?,
        )?;
    }

    for (col, n_width) in &sheet.column_widths {
        worksheet.set_column_width(cast_col_num(*col)?, *n_width as f64)?;
    }

    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    n_row: u32,
    n_col: u16,
    content: &EnumRenderedContent,
    format: &Format,
) -> Result<()> {
    match content {
        EnumRenderedContent::Formula(expr) => {
            worksheet.write_formula_with_format(n_row, n_col, expr.as_str(), format)?;
        }
        EnumRenderedContent::Value(EnumCellValue::None) => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumRenderedContent::Value(EnumCellValue::String(val)) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumRenderedContent::Value(EnumCellValue::Number(val)) if val.is_finite() => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
        EnumRenderedContent::Value(EnumCellValue::Number(val)) => {
            worksheet.write_string_with_format(n_row, n_col, val.to_string(), format)?;
        }
        EnumRenderedContent::Value(EnumCellValue::Boolean(val)) => {
            worksheet.write_boolean_with_format(n_row, n_col, *val, format)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellStyle) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    format
}

/// Commit `v_bytes` as `generated-file-<uuid>.xlsx` inside `path_dir_out`.
///
/// Bytes go to a temporary file in the same directory first and are renamed
/// into place, so a failed write never leaves a visible partial artifact.
pub fn persist_workbook(v_bytes: &[u8], path_dir_out: &Path) -> Result<SpecArtifact> {
    fs::create_dir_all(path_dir_out)?;

    let id = Uuid::new_v4();
    let file_name = format!("{C_ARTIFACT_FILE_PREFIX}{id}.{C_ARTIFACT_FILE_EXT}");
    let path = path_dir_out.join(&file_name);

    let mut file_tmp = NamedTempFile::new_in(path_dir_out)?;
    file_tmp.write_all(v_bytes)?;
    file_tmp.as_file().sync_all()?;
    file_tmp
        .persist_noclobber(&path)
        .map_err(|err| GenerateError::from(err.error))?;

    log::info!("Persisted artifact {} ({} bytes)", path.display(), v_bytes.len());
    Ok(SpecArtifact {
        id,
        file_name,
        path,
    })
}

/// Build, encode and persist `request` in one call.
pub fn generate_xlsx(
    request: &SpecWorkbookRequest,
    config: &SpecStyleConfig,
    path_dir_out: &Path,
) -> Result<(SpecArtifact, SpecRenderedWorkbook)> {
    let rendered = build_workbook(request, config)?;
    let v_bytes = encode_workbook(&rendered)?.save_to_buffer()?;
    let artifact = persist_workbook(&v_bytes, path_dir_out)?;
    Ok((artifact, rendered))
}

fn cast_row_num(value: u32) -> Result<u32> {
    value
        .checked_sub(1)
        .ok_or_else(|| GenerateError::encoding(format!("row index must be 1-based: {value}")))
}

fn cast_col_num(value: u16) -> Result<u16> {
    value
        .checked_sub(1)
        .ok_or_else(|| GenerateError::encoding(format!("column index must be 1-based: {value}")))
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::spec::{
        EnumCellSpec, EnumStyleKind, SpecCellRange, SpecColumn, SpecRenderedCell, SpecTable,
    };

    fn make_request(tables: Vec<SpecTable>) -> SpecWorkbookRequest {
        SpecWorkbookRequest {
            sheets: vec![SpecSheet {
                name: Some("S1".to_string()),
                tables,
            }],
        }
    }

    fn make_report_table() -> SpecTable {
        SpecTable {
            start_cell: "A1".to_string(),
            title: Some("Report".to_string()),
            skip_header: false,
            columns: vec![SpecColumn::new("Name"), SpecColumn::new("Score")],
            rows: vec![
                vec![EnumCellSpec::text("Alice"), EnumCellSpec::number(90.0)],
                vec![EnumCellSpec::text("Bob"), EnumCellSpec::formula("=B2*2")],
            ],
        }
    }

    fn content_at(sheet: &SpecRenderedSheet, row: u32, col: u16) -> EnumRenderedContent {
        sheet.cell_at(row, col).unwrap().content.clone()
    }

    fn text(val: &str) -> EnumRenderedContent {
        EnumRenderedContent::Value(EnumCellValue::String(val.to_string()))
    }

    #[test]
    fn test_build_workbook_report_scenario() {
        let rendered =
            build_workbook(&make_request(vec![make_report_table()]), &SpecStyleConfig::default())
                .unwrap();
        let sheet = &rendered.sheets[0];

        assert_eq!(sheet.name, "S1");
        assert_eq!(content_at(sheet, 1, 1), text("Report"));
        assert_eq!(sheet.cell_at(1, 1).unwrap().kind, EnumStyleKind::Title);
        assert_eq!(sheet.cell_at(1, 1).unwrap().style.font_size, Some(13.0));

        assert_eq!(content_at(sheet, 2, 1), text("Name"));
        assert_eq!(content_at(sheet, 2, 2), text("Score"));
        assert_eq!(sheet.cell_at(2, 2).unwrap().style.bold, Some(true));

        assert_eq!(content_at(sheet, 3, 1), text("Alice"));
        assert_eq!(
            content_at(sheet, 3, 2),
            EnumRenderedContent::Value(EnumCellValue::Number(90.0))
        );
        assert_eq!(content_at(sheet, 4, 1), text("Bob"));
        assert_eq!(
            content_at(sheet, 4, 2),
            EnumRenderedContent::Formula("=B2*2".to_string())
        );
        assert_eq!(sheet.cells.len(), 7);
        assert!(sheet.auto_filters.is_empty());
        assert!(sheet.column_widths.is_empty());
        assert!(rendered.warnings().is_empty());
    }

    #[test]
    fn test_build_workbook_autofilter_per_table() {
        let mut table_second = make_report_table();
        table_second.start_cell = "A4".to_string();
        table_second.title = None;
        table_second.rows.push(vec![
            EnumCellSpec::text("Carol"),
            EnumCellSpec::number(70.0),
        ]);
        let mut table_first = make_report_table();
        table_first.title = None;
        table_first.start_cell = "A20".to_string();

        let config = SpecStyleConfig {
            auto_filter: true,
            ..Default::default()
        };
        let rendered =
            build_workbook(&make_request(vec![table_second, table_first]), &config).unwrap();
        let sheet = &rendered.sheets[0];

        assert_eq!(
            sheet.auto_filters,
            vec![
                SpecCellRange {
                    row_start: 4,
                    col_start: 1,
                    row_end: 7,
                    col_end: 2,
                },
                SpecCellRange {
                    row_start: 20,
                    col_start: 1,
                    row_end: 22,
                    col_end: 2,
                },
            ]
        );
        assert_eq!(rendered.reports[0].warnings.len(), 1);
        assert!(rendered.reports[0].warnings[0].contains("keeps only the last"));
    }

    #[test]
    fn test_build_workbook_autofit_spans_tables() {
        let mut table_wide = make_report_table();
        table_wide.start_cell = "A10".to_string();
        table_wide.title = Some("A considerably longer title text".to_string());

        let config = SpecStyleConfig {
            auto_fit_column_width: true,
            ..Default::default()
        };
        let rendered = build_workbook(
            &make_request(vec![make_report_table(), table_wide]),
            &config,
        )
        .unwrap();
        let sheet = &rendered.sheets[0];

        assert_eq!(sheet.column_widths[&1], 32 + 2);
        assert_eq!(sheet.column_widths[&2], 12);
        assert_eq!(
            calculate_autofit_widths(sheet, &SpecAutofitPolicy::default()),
            sheet.column_widths
        );
    }

    #[test]
    fn test_build_workbook_with_custom_autofit_policy() {
        let config = SpecStyleConfig {
            auto_fit_column_width: true,
            ..Default::default()
        };
        let policy = SpecAutofitPolicy {
            width_cell_min: 4,
            width_cell_max: 60,
            width_cell_padding: 1,
        };
        let rendered =
            build_workbook_with_policy(&make_request(vec![make_report_table()]), &config, &policy)
                .unwrap();

        assert_eq!(rendered.sheets[0].column_widths[&1], 7);
        assert_eq!(rendered.sheets[0].column_widths[&2], 6);
    }

    #[test]
    fn test_build_workbook_warns_on_overlap_and_column_anchor() {
        let mut table_overlap = make_report_table();
        table_overlap.start_cell = "C3".to_string();

        let rendered = build_workbook(
            &make_request(vec![make_report_table(), table_overlap]),
            &SpecStyleConfig::default(),
        )
        .unwrap();
        let l_warnings = rendered.warnings();

        assert_eq!(l_warnings.len(), 2);
        assert!(l_warnings[0].contains("column C ignored"));
        assert!(l_warnings[1].contains("overlaps"));
        assert_eq!(
            content_at(&rendered.sheets[0], 3, 1),
            text("Report")
        );
    }

    #[test]
    fn test_build_workbook_normalizes_sheet_names() {
        let request = SpecWorkbookRequest {
            sheets: vec![
                SpecSheet {
                    name: None,
                    tables: vec![],
                },
                SpecSheet {
                    name: Some("Q1/Q2".to_string()),
                    tables: vec![],
                },
                SpecSheet {
                    name: Some("Q1_Q2".to_string()),
                    tables: vec![],
                },
            ],
        };
        let rendered = build_workbook(&request, &SpecStyleConfig::default()).unwrap();
        let l_names: Vec<&str> = rendered
            .sheets
            .iter()
            .map(|sheet| sheet.name.as_str())
            .collect();

        assert_eq!(l_names, vec!["Sheet1", "Q1_Q2", "Q1_Q2__2"]);
        assert_eq!(rendered.reports[1].warnings.len(), 1);
        assert_eq!(rendered.reports[2].warnings.len(), 1);
    }

    #[test]
    fn test_build_workbook_normalizes_case_duplicates_and_apostrophes() {
        let l_names_requested = ["Data", "data", "'quoted'", "History"];
        let request = SpecWorkbookRequest {
            sheets: l_names_requested
                .iter()
                .map(|c_name| SpecSheet {
                    name: Some(c_name.to_string()),
                    tables: vec![make_report_table()],
                })
                .collect(),
        };
        let rendered = build_workbook(&request, &SpecStyleConfig::default()).unwrap();
        let l_names: Vec<&str> = rendered
            .sheets
            .iter()
            .map(|sheet| sheet.name.as_str())
            .collect();

        assert_eq!(l_names, vec!["Data", "data__2", "quoted", "History_"]);
        assert!(rendered.reports[0].warnings.is_empty());
        for report in &rendered.reports[1..] {
            assert_eq!(report.warnings.len(), 1);
            assert!(report.warnings[0].contains("normalized"));
        }

        let v_bytes = encode_workbook(&rendered).unwrap().save_to_buffer().unwrap();
        assert_eq!(&v_bytes[..2], b"PK");
    }

    #[test]
    fn test_build_workbook_aborts_on_invalid_table() {
        let mut table_bad = make_report_table();
        table_bad.rows[0].push(EnumCellSpec::blank());
        let request = SpecWorkbookRequest {
            sheets: vec![
                SpecSheet {
                    name: None,
                    tables: vec![make_report_table()],
                },
                SpecSheet {
                    name: None,
                    tables: vec![table_bad],
                },
            ],
        };

        let err = build_workbook(&request, &SpecStyleConfig::default()).unwrap_err();
        assert!(matches!(err, GenerateError::Validation(_)));
        assert!(err.to_string().contains("sheetsData[1].tables[0]"));
    }

    #[test]
    fn test_build_workbook_rejects_empty_request() {
        let err = build_workbook(&SpecWorkbookRequest::default(), &SpecStyleConfig::default())
            .unwrap_err();
        assert!(matches!(err, GenerateError::Validation(_)));
    }

    fn read_xlsx_part(v_bytes: &[u8], c_part: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(v_bytes)).unwrap();
        let mut c_xml = String::new();
        archive
            .by_name(c_part)
            .unwrap()
            .read_to_string(&mut c_xml)
            .unwrap();
        c_xml
    }

    #[test]
    fn test_encode_workbook_maps_cell_types_filter_and_widths() {
        let config = SpecStyleConfig {
            auto_filter: true,
            auto_fit_column_width: true,
            ..Default::default()
        };
        let mut table = make_report_table();
        table.title = Some("Quarterly report".to_string());
        table.rows.push(vec![
            EnumCellSpec::boolean(true),
            EnumCellSpec::blank(),
        ]);
        let rendered = build_workbook(&make_request(vec![table]), &config).unwrap();
        let v_bytes = encode_workbook(&rendered).unwrap().save_to_buffer().unwrap();

        let c_sheet_xml = read_xlsx_part(&v_bytes, "xl/worksheets/sheet1.xml");
        assert!(c_sheet_xml.contains("<f>B2*2</f>"), "{c_sheet_xml}");
        assert!(c_sheet_xml.contains("<v>90</v>"), "{c_sheet_xml}");
        assert!(c_sheet_xml.contains(r#"t="b"><v>1</v>"#), "{c_sheet_xml}");
        assert!(c_sheet_xml.contains(r#"<c r="B5" s="#), "{c_sheet_xml}");
        assert!(c_sheet_xml.contains(r#"<autoFilter ref="A2:B5"/>"#), "{c_sheet_xml}");
        assert!(c_sheet_xml.contains(r#"<col min="1" max="1" width="18."#), "{c_sheet_xml}");
        assert!(c_sheet_xml.contains(r#"<col min="2" max="2" width="12."#), "{c_sheet_xml}");

        let c_shared_xml = read_xlsx_part(&v_bytes, "xl/sharedStrings.xml");
        for c_text in ["Quarterly report", "Name", "Score", "Alice", "Bob"] {
            assert!(c_shared_xml.contains(&format!("<t>{c_text}</t>")), "{c_shared_xml}");
        }
        assert!(!c_shared_xml.contains("B2*2"), "{c_shared_xml}");

        let c_styles_xml = read_xlsx_part(&v_bytes, "xl/styles.xml");
        assert!(c_styles_xml.contains("<b/>"), "{c_styles_xml}");
        assert!(c_styles_xml.contains(r#"<sz val="13"/>"#), "{c_styles_xml}");
    }

    #[test]
    fn test_encode_workbook_rejects_zero_based_cells() {
        let rendered = SpecRenderedWorkbook {
            sheets: vec![SpecRenderedSheet {
                name: "S1".to_string(),
                cells: vec![SpecRenderedCell {
                    row: 0,
                    col: 1,
                    kind: EnumStyleKind::Body,
                    content: EnumRenderedContent::Value(EnumCellValue::Number(1.0)),
                    style: SpecCellStyle::default(),
                }],
                ..Default::default()
            }],
            reports: vec![],
        };
        assert!(matches!(
            encode_workbook(&rendered),
            Err(GenerateError::Encoding(_))
        ));
    }

    #[test]
    fn test_persist_workbook_uses_unique_names() {
        let dir = tempfile::tempdir().unwrap();

        let artifact_a = persist_workbook(b"PK-a", dir.path()).unwrap();
        let artifact_b = persist_workbook(b"PK-b", dir.path()).unwrap();

        assert_ne!(artifact_a.id, artifact_b.id);
        assert_ne!(artifact_a.file_name, artifact_b.file_name);
        assert!(artifact_a.file_name.starts_with("generated-file-"));
        assert!(artifact_a.file_name.ends_with(".xlsx"));
        assert_eq!(fs::read(&artifact_a.path).unwrap(), b"PK-a");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_xlsx_writer_writes_request_and_collects_reports() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = XlsxWriter::new(dir.path().join("out"));

        let request = SpecWorkbookRequest {
            sheets: vec![SpecSheet {
                name: Some("bad:name".to_string()),
                tables: vec![make_report_table()],
            }],
        };
        let artifact = writer
            .write_request(&request, &SpecStyleConfig::default())
            .unwrap();

        assert!(artifact.path.exists());
        assert_eq!(writer.report().len(), 1);
        assert_eq!(writer.report()[0].sheet_name, "bad_name");
    }

    #[test]
    fn test_xlsx_writer_commits_nothing_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = XlsxWriter::new(dir.path().to_path_buf());

        let mut table_bad = make_report_table();
        table_bad.start_cell = "A0".to_string();
        let result = writer.write_request(
            &make_request(vec![table_bad]),
            &SpecStyleConfig::default(),
        );

        assert!(matches!(result, Err(GenerateError::Layout(_))));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(writer.report().is_empty());
    }

    #[test]
    fn test_generate_xlsx_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let (artifact, rendered) = generate_xlsx(
            &make_request(vec![make_report_table()]),
            &SpecStyleConfig::default(),
            dir.path(),
        )
        .unwrap();

        assert_eq!(rendered.sheets.len(), 1);
        let v_bytes = fs::read(&artifact.path).unwrap();
        assert_eq!(&v_bytes[..2], b"PK");
    }
}
