//! Renderer — the deterministic rasterizer.
//!
//! Takes the live entities of one tick (in viewport pixel space) and places
//! a marker glyph on a fixed-size character canvas. Successive canvases are
//! diffed so the player only redraws what changed.
//!
//! The renderer is pure and stateless. It knows nothing about time,
//! schedules, or terminals.

use crate::types::{LiveEntity, Viewport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    pub columns: u16,
    pub rows: u16,
    /// Row-major; `true` where a marker is drawn.
    cells: Vec<Vec<bool>>,
}

impl Canvas {
    pub fn blank(columns: u16, rows: u16) -> Self {
        Canvas {
            columns,
            rows,
            cells: vec![vec![false; columns as usize]; rows as usize],
        }
    }

    pub fn is_marked(&self, column: u16, row: u16) -> bool {
        self.cells
            .get(row as usize)
            .and_then(|r| r.get(column as usize))
            .copied()
            .unwrap_or(false)
    }

    #[cfg(test)]
    pub(crate) fn marked_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&c| c).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellChange {
    pub column: u16,
    pub row: u16,
    pub marked: bool,
}

pub struct Renderer;

impl Renderer {
    /// Scale each entity's screen position onto the canvas.
    ///
    /// Entities in the out-of-view margin are live but not drawn.
    pub fn rasterize(
        entities: &[LiveEntity],
        viewport: &Viewport,
        columns: u16,
        rows: u16,
    ) -> Canvas {
        let mut canvas = Canvas::blank(columns, rows);
        if columns == 0 || rows == 0 {
            return canvas;
        }

        for entity in entities {
            if !viewport.contains(entity.screen_x, entity.screen_y) {
                continue;
            }
            let col = scale(entity.screen_x, viewport.width, columns);
            let row = scale(entity.screen_y, viewport.height, rows);
            canvas.cells[row][col] = true;
        }

        canvas
    }

    /// Compute a cell-level diff between two canvases of the same size.
    pub fn diff(prev: &Canvas, next: &Canvas) -> Vec<CellChange> {
        let mut changes = Vec::new();
        for (y, (prev_row, next_row)) in prev.cells.iter().zip(next.cells.iter()).enumerate() {
            for (x, (prev_cell, next_cell)) in prev_row.iter().zip(next_row.iter()).enumerate() {
                if prev_cell != next_cell {
                    changes.push(CellChange {
                        column: x as u16,
                        row: y as u16,
                        marked: *next_cell,
                    });
                }
            }
        }
        changes
    }
}

/// Map `0..=extent` onto `0..cells`; the far edge lands in the last cell.
fn scale(value: f64, extent: f64, cells: u16) -> usize {
    if extent <= 0.0 {
        return 0;
    }
    let index = (value / extent * cells as f64).floor() as usize;
    index.min(cells as usize - 1)
}
