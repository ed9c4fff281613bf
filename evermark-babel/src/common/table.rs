//! Table transcoding from HTML span semantics to pipe tables.
//!
//! HTML tables describe cells with `rowspan`/`colspan`; pipe tables need a rectangular grid.
//! [`layout`] places every cell on an occupancy grid: each row fills the first column not
//! already covered by a cell from an earlier row, spans mark the slots they cover, and every
//! row is padded to the widest row. Covered slots keep the MultiMarkdown conventions:
//!
//! | Slot         | Rendered as |
//! |--------------|-------------|
//! | `Cell`       | cell content, newlines as `<br>` |
//! | `ColSpanned` | nothing (adjacent pipes) |
//! | `RowSpanned` | `^`          |
//! | `Empty`      | blank        |
//!
//! Row spans reaching past the last row are clipped.

use crate::ir::nodes::{Alignment, Block, Table, TableCell};

/// A position of the rectangular grid.
#[derive(Debug, Clone, PartialEq)]
pub enum GridSlot {
    Cell(Vec<Block>),
    /// Covered by a cell to the left
    ColSpanned,
    /// Covered by a cell above
    RowSpanned,
    /// Not covered by any cell
    Empty,
}

/// A table laid out on a rectangular grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub columns: usize,
    pub rows: Vec<Vec<GridSlot>>,
    pub alignments: Vec<Alignment>,
}

impl Grid {
    pub fn is_rectangular(&self) -> bool {
        self.rows.iter().all(|row| row.len() == self.columns)
            && self.alignments.len() == self.columns
    }
}

/// The only cell of a one-cell table, which is rendered as its content instead of a table.
pub fn single_cell(table: &Table) -> Option<&TableCell> {
    match table.rows.as_slice() {
        [row] => match row.cells.as_slice() {
            [cell] => Some(cell),
            _ => None,
        },
        _ => None,
    }
}

/// Place the cells of a table on an occupancy grid.
pub fn layout(table: &Table) -> Grid {
    let row_count = table.rows.len();
    let mut occupancy: Vec<Vec<Option<GridSlot>>> = vec![Vec::new(); row_count];
    let mut alignments: Vec<Alignment> = Vec::new();

    for (r, row) in table.rows.iter().enumerate() {
        let mut col = 0;
        for cell in &row.cells {
            while matches!(occupancy[r].get(col), Some(Some(_))) {
                col += 1;
            }
            let col_span = cell.col_span.max(1);
            let row_span = cell.row_span.max(1).min(row_count - r);

            place(&mut occupancy[r], col, GridSlot::Cell(cell.content.clone()));
            for dc in 1..col_span {
                place(&mut occupancy[r], col + dc, GridSlot::ColSpanned);
            }
            for dr in 1..row_span {
                place(&mut occupancy[r + dr], col, GridSlot::RowSpanned);
                for dc in 1..col_span {
                    place(&mut occupancy[r + dr], col + dc, GridSlot::ColSpanned);
                }
            }

            if alignments.len() <= col {
                alignments.resize(col + 1, Alignment::Default);
            }
            if alignments[col] == Alignment::Default {
                alignments[col] = cell.align;
            }
            col += col_span;
        }
    }

    let columns = occupancy.iter().map(Vec::len).max().unwrap_or(0);
    alignments.resize(columns, Alignment::Default);
    let rows = occupancy
        .into_iter()
        .map(|row| {
            let mut row: Vec<GridSlot> = row
                .into_iter()
                .map(|slot| slot.unwrap_or(GridSlot::Empty))
                .collect();
            row.resize(columns, GridSlot::Empty);
            row
        })
        .collect();

    Grid {
        columns,
        rows,
        alignments,
    }
}

fn place(row: &mut Vec<Option<GridSlot>>, col: usize, slot: GridSlot) {
    if row.len() <= col {
        row.resize(col + 1, None);
    }
    // First writer wins when spans overlap
    if row[col].is_none() {
        row[col] = Some(slot);
    }
}

/// Render a grid as a pipe table. The first row becomes the header.
///
/// `render_cell` turns a cell's blocks into Markdown; its newlines become `<br>`.
pub fn render_pipe_table<F>(grid: &Grid, mut render_cell: F) -> String
where
    F: FnMut(&[Block]) -> String,
{
    if grid.rows.is_empty() || grid.columns == 0 {
        return String::new();
    }

    let mut lines = Vec::with_capacity(grid.rows.len() + 1);
    for (i, row) in grid.rows.iter().enumerate() {
        let mut line = String::from("|");
        for slot in row {
            match slot {
                GridSlot::Cell(blocks) => {
                    let text = cell_text(&render_cell(blocks));
                    if text.is_empty() {
                        line.push_str(" |");
                    } else {
                        line.push(' ');
                        line.push_str(&text);
                        line.push_str(" |");
                    }
                }
                GridSlot::ColSpanned => line.push('|'),
                GridSlot::RowSpanned => line.push_str(" ^ |"),
                GridSlot::Empty => line.push_str(" |"),
            }
        }
        lines.push(line);

        if i == 0 {
            let separator: Vec<&str> = grid
                .alignments
                .iter()
                .map(|align| match align {
                    Alignment::Left => ":---",
                    Alignment::Center => ":---:",
                    Alignment::Right => "---:",
                    Alignment::Default => "---",
                })
                .collect();
            lines.push(format!("| {} |", separator.join(" | ")));
        }
    }
    lines.join("\n")
}

fn cell_text(rendered: &str) -> String {
    rendered
        .trim()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("<br>")
        .replace('|', "\\|")
}
