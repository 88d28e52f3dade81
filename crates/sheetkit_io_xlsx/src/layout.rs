//! Row cursor state machine that lays one table out into a sheet.
//!
//! A table is walked in a fixed order:
//! `Start -> TitleRow? -> HeaderRow? -> DataRows -> Done`.
//! The cursor always points at the next unwritten row and only moves forward.

use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::spec::{
    EnumCellSpec, EnumCellValue, EnumRenderedContent, EnumStyleKind, GenerateError, Result,
    SpecCellStyle, SpecRenderedCell, SpecStyleConfig, SpecTable, SpecTableExtent,
};
use crate::util::{derive_row_from_anchor, resolve_cell_style};

/// Layout walk states, in the only order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumLayoutState {
    Start,
    TitleRow,
    HeaderRow,
    DataRows,
    Done,
}

/// Per-table cursor. Fresh for every table; never shared.
#[derive(Debug)]
pub struct TableLayoutCursor<'a> {
    table: &'a SpecTable,
    n_cols: u16,
    state: EnumLayoutState,
    n_row_cursor: u32,
    n_row_start: u32,
    n_row_data_start: u32,
    style_title: SpecCellStyle,
    style_header: SpecCellStyle,
    style_body: SpecCellStyle,
}

impl<'a> TableLayoutCursor<'a> {
    /// Validate `table` and seed the cursor from its anchor.
    pub fn new(table: &'a SpecTable, config: &SpecStyleConfig) -> Result<Self> {
        let n_cols = validate_table_shape(table)?;
        let n_row_start = derive_row_from_anchor(&table.start_cell)?;

        let n_rows_needed = u64::from(table.title.is_some())
            + u64::from(!table.skip_header)
            + table.rows.len() as u64;
        if u64::from(n_row_start) + n_rows_needed > u64::from(N_NROWS_EXCEL_MAX) + 1 {
            return Err(GenerateError::layout(format!(
                "Table anchored at {:?} needs {n_rows_needed} rows and exceeds Excel row limit of {N_NROWS_EXCEL_MAX}.",
                table.start_cell
            )));
        }

        Ok(Self {
            table,
            n_cols,
            state: EnumLayoutState::Start,
            n_row_cursor: n_row_start,
            n_row_start,
            n_row_data_start: n_row_start,
            style_title: resolve_cell_style(EnumStyleKind::Title, config),
            style_header: resolve_cell_style(EnumStyleKind::Header, config),
            style_body: resolve_cell_style(EnumStyleKind::Body, config),
        })
    }

    /// Current state.
    pub fn state(&self) -> EnumLayoutState {
        self.state
    }

    /// Next unwritten row.
    pub fn cursor(&self) -> u32 {
        self.n_row_cursor
    }

    /// Advance one state, appending the cells it writes to `cells`.
    ///
    /// Returns the state entered. Stepping from `Done` is a no-op.
    pub fn step(&mut self, cells: &mut Vec<SpecRenderedCell>) -> EnumLayoutState {
        self.state = match self.state {
            EnumLayoutState::Start => {
                if self.table.title.is_some() {
                    EnumLayoutState::TitleRow
                } else if !self.table.skip_header {
                    EnumLayoutState::HeaderRow
                } else {
                    EnumLayoutState::DataRows
                }
            }
            EnumLayoutState::TitleRow => {
                if !self.table.skip_header {
                    EnumLayoutState::HeaderRow
                } else {
                    EnumLayoutState::DataRows
                }
            }
            EnumLayoutState::HeaderRow => EnumLayoutState::DataRows,
            EnumLayoutState::DataRows | EnumLayoutState::Done => EnumLayoutState::Done,
        };

        match self.state {
            EnumLayoutState::TitleRow => self.write_title_row(cells),
            EnumLayoutState::HeaderRow => self.write_header_row(cells),
            EnumLayoutState::DataRows => self.write_data_rows(cells),
            EnumLayoutState::Start | EnumLayoutState::Done => {}
        }
        self.state
    }

    /// Walk to `Done` and summarize the written extent.
    pub fn run(mut self, cells: &mut Vec<SpecRenderedCell>) -> SpecTableExtent {
        while self.step(cells) != EnumLayoutState::Done {}

        SpecTableExtent {
            row_start: self.n_row_start,
            row_data_start: self.n_row_data_start,
            row_end_exclusive: self.n_row_cursor,
            n_cols: self.n_cols,
            n_rows_data: self.table.rows.len() as u32,
            if_has_header: !self.table.skip_header,
        }
    }

    fn write_title_row(&mut self, cells: &mut Vec<SpecRenderedCell>) {
        let Some(title) = &self.table.title else {
            return;
        };
        cells.push(SpecRenderedCell {
            row: self.n_row_cursor,
            col: 1,
            kind: EnumStyleKind::Title,
            content: EnumRenderedContent::Value(EnumCellValue::String(title.clone())),
            style: self.style_title.clone(),
        });
        self.n_row_cursor += 1;
    }

    fn write_header_row(&mut self, cells: &mut Vec<SpecRenderedCell>) {
        for (n_idx_col, column) in self.table.columns.iter().enumerate() {
            cells.push(SpecRenderedCell {
                row: self.n_row_cursor,
                col: n_idx_col as u16 + 1,
                kind: EnumStyleKind::Header,
                content: EnumRenderedContent::Value(EnumCellValue::String(column.name.clone())),
                style: self.style_header.clone(),
            });
        }
        self.n_row_cursor += 1;
    }

    fn write_data_rows(&mut self, cells: &mut Vec<SpecRenderedCell>) {
        self.n_row_data_start = self.n_row_cursor;
        for row in &self.table.rows {
            for (n_idx_col, cell) in row.iter().enumerate() {
                let content = match cell {
                    EnumCellSpec::Formula(expr) => EnumRenderedContent::Formula(expr.clone()),
                    EnumCellSpec::Literal(value) => EnumRenderedContent::Value(value.clone()),
                };
                cells.push(SpecRenderedCell {
                    row: self.n_row_cursor,
                    col: n_idx_col as u16 + 1,
                    kind: EnumStyleKind::Body,
                    content,
                    style: self.style_body.clone(),
                });
            }
            self.n_row_cursor += 1;
        }
    }
}

/// Lay `table` out, appending its cells to `cells`, and return its extent.
pub fn layout_table(
    table: &SpecTable,
    config: &SpecStyleConfig,
    cells: &mut Vec<SpecRenderedCell>,
) -> Result<SpecTableExtent> {
    let cursor = TableLayoutCursor::new(table, config)?;
    let extent = cursor.run(cells);
    log::debug!(
        "Laid out table at {:?}: rows {}..{} cols={} data_rows={}",
        table.start_cell,
        extent.row_start,
        extent.row_end_exclusive,
        extent.n_cols,
        extent.n_rows_data
    );
    Ok(extent)
}

/// Check column/row shape; return the column count.
fn validate_table_shape(table: &SpecTable) -> Result<u16> {
    let n_cols = table.columns.len();
    if n_cols == 0 && !table.rows.is_empty() {
        return Err(GenerateError::layout(format!(
            "Table anchored at {:?} has {} data rows but no columns.",
            table.start_cell,
            table.rows.len()
        )));
    }
    if n_cols > N_NCOLS_EXCEL_MAX {
        return Err(GenerateError::layout(format!(
            "Table anchored at {:?} has {n_cols} columns; Excel limit is {N_NCOLS_EXCEL_MAX}.",
            table.start_cell
        )));
    }

    for (n_idx_row, row) in table.rows.iter().enumerate() {
        if row.len() != n_cols {
            return Err(GenerateError::validation(format!(
                "rows[{n_idx_row}] has {} cells but the table has {n_cols} columns.",
                row.len()
            )));
        }
    }

    Ok(n_cols as u16)
}
