//! Batch orchestration: one independent engine invocation per request file.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::Serialize;
use sheetkit_io_xlsx::{
    EnumCellValue, EnumRenderedContent, SpecArtifact, SpecRenderedWorkbook, XlsxWriter,
    build_workbook, parse_generate_request,
};

/// Options shared by every request of one `generate` run.
#[derive(Debug, Clone)]
pub struct SpecGenerateOptions {
    /// Directory receiving committed artifacts.
    pub path_dir_out: PathBuf,
    /// Public base URL for download links.
    pub base_url: String,
    /// Maximum worker threads; defaults to available parallelism (capped at 8).
    pub num_workers_max: Option<usize>,
}

/// One JSON output line per request.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpecGenerateOutcome {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Render every input, print one JSON line each, and return the failure count.
pub fn generate_batch(inputs: &[PathBuf], options: &SpecGenerateOptions) -> Result<usize> {
    let n_workers = calculate_worker_limit(options.num_workers_max);
    let l_outcomes = match ThreadPoolBuilder::new().num_threads(n_workers).build() {
        Ok(thread_pool) => thread_pool.install(|| {
            inputs
                .par_iter()
                .map(|path_input| generate_one(path_input, options))
                .collect::<Vec<_>>()
        }),
        Err(err) => {
            log::warn!(
                "Failed to initialize thread pool (workers={n_workers}): {err}; fallback to serial generation."
            );
            inputs
                .iter()
                .map(|path_input| generate_one(path_input, options))
                .collect::<Vec<_>>()
        }
    };

    let mut n_failed = 0;
    for outcome in &l_outcomes {
        if outcome.error.is_some() {
            n_failed += 1;
        }
        println!(
            "{}",
            serde_json::to_string(outcome).context("Failed to serialize outcome")?
        );
    }
    Ok(n_failed)
}

/// Render one request file; failures are captured in the outcome.
pub fn generate_one(path_input: &Path, options: &SpecGenerateOptions) -> SpecGenerateOutcome {
    let c_input = path_input.display().to_string();
    match render_request(path_input, &options.path_dir_out) {
        Ok((artifact, warnings)) => SpecGenerateOutcome {
            input: c_input,
            download_url: Some(artifact.download_url(&options.base_url)),
            warnings,
            error: None,
        },
        Err(err) => {
            log::error!("Error generating Excel file for {c_input}: {err:#}");
            SpecGenerateOutcome {
                input: c_input,
                download_url: None,
                warnings: vec![],
                error: Some(format!("{err:#}")),
            }
        }
    }
}

fn render_request(path_input: &Path, path_dir_out: &Path) -> Result<(SpecArtifact, Vec<String>)> {
    let body = fs::read_to_string(path_input)
        .with_context(|| format!("Failed to read request {}", path_input.display()))?;
    let (request, config) = parse_generate_request(&body)?;

    let mut writer = XlsxWriter::new(path_dir_out.to_path_buf());
    let artifact = writer
        .write_request(&request, &config)
        .with_context(|| format!("Failed to generate workbook into {}", writer.dir_out()))?;

    let warnings = writer
        .report()
        .into_iter()
        .flat_map(|report| {
            let c_sheet_name = report.sheet_name;
            report
                .warnings
                .into_iter()
                .map(move |msg| format!("{c_sheet_name}: {msg}"))
        })
        .collect();
    Ok((artifact, warnings))
}

/// Print the laid-out grid of one request without encoding it.
pub fn inspect_request(path_input: &Path) -> Result<()> {
    let body = fs::read_to_string(path_input)
        .with_context(|| format!("Failed to read request {}", path_input.display()))?;
    let (request, config) = parse_generate_request(&body)?;
    let rendered = build_workbook(&request, &config)?;
    print!("{}", format_rendered_workbook(&rendered));
    Ok(())
}

/// Human-readable dump: one line per cell, then derived ranges and warnings.
pub fn format_rendered_workbook(rendered: &SpecRenderedWorkbook) -> String {
    let mut c_out = String::new();
    for (sheet, report) in rendered.sheets.iter().zip(&rendered.reports) {
        let _ = writeln!(c_out, "# {}", sheet.name);
        for cell in &sheet.cells {
            let c_value = match &cell.content {
                EnumRenderedContent::Formula(expr) => format!("formula {expr}"),
                EnumRenderedContent::Value(EnumCellValue::None) => "blank".to_string(),
                EnumRenderedContent::Value(EnumCellValue::String(val)) => format!("{val:?}"),
                EnumRenderedContent::Value(value) => value.to_display_string(),
            };
            let _ = writeln!(
                c_out,
                "R{}C{}\t{}\t{c_value}",
                cell.row, cell.col, cell.kind
            );
        }
        for range in &sheet.auto_filters {
            let _ = writeln!(c_out, "autofilter\t{range}");
        }
        for (col, n_width) in &sheet.column_widths {
            let _ = writeln!(c_out, "width\tC{col}\t{n_width}");
        }
        for msg in &report.warnings {
            let _ = writeln!(c_out, "warning\t{msg}");
        }
    }
    c_out
}

fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}
