//! Dense grid of stones. The client never simulates captures, so the grid is
//! only ever written one stone at a time (optimistic moves) or replaced as a
//! whole (authoritative boards from the engine).

use std::convert::TryFrom;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::types::{Color, Point};

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    #[error("The point {0} is outside of the board.")]
    OutOfBounds(Point),
    #[error("A board needs between 1 and 255 lines, got {0}.")]
    BadSize(usize),
    #[error("Row {row} has {len} cells, expected {expected}.")]
    RaggedRow {
        row: usize,
        len: usize,
        expected: usize,
    },
}

/// Rows as they travel over the wire: `rows[y][x]`.
pub type WireRows = Vec<Vec<Option<Color>>>;

/// An NxN board. Indexing is by `Point`, cells outside of the board can not be
/// addressed through the checked accessors.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WireRows", into = "WireRows")]
pub struct BoardGrid {
    size: u8,
    cells: Vec<Option<Color>>,
}

impl BoardGrid {
    /// An empty board with `size` lines.
    pub fn new(size: u8) -> Self {
        BoardGrid {
            size,
            cells: vec![None; size as usize * size as usize],
        }
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x < self.size && point.y < self.size
    }

    fn offset(&self, point: Point) -> Result<usize, GridError> {
        if self.contains(point) {
            Ok(point.y as usize * self.size as usize + point.x as usize)
        } else {
            Err(GridError::OutOfBounds(point))
        }
    }

    pub fn get(&self, point: Point) -> Result<Option<Color>, GridError> {
        Ok(self.cells[self.offset(point)?])
    }

    pub fn set(&mut self, point: Point, stone: Option<Color>) -> Result<(), GridError> {
        let offset = self.offset(point)?;
        self.cells[offset] = stone;
        Ok(())
    }

    /// Number of stones on the board, of either color.
    pub fn stone_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// All stones on the board, row by row.
    pub fn stones(&self) -> impl Iterator<Item = (Point, Color)> + '_ {
        let size = self.size as usize;
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.map(|color| (Point::new((i % size) as u8, (i / size) as u8), color))
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Option<Color>]> {
        self.cells.chunks(self.size.max(1) as usize)
    }

    pub fn to_rows(&self) -> WireRows {
        self.rows().map(|row| row.to_vec()).collect()
    }
}

impl Index<Point> for BoardGrid {
    type Output = Option<Color>;

    /// Panics on points outside of the board, use `get` for untrusted input.
    fn index(&self, point: Point) -> &Self::Output {
        let size = self.size as usize;
        assert!(self.contains(point), "{point} is outside of the board");
        &self.cells[point.y as usize * size + point.x as usize]
    }
}

impl TryFrom<WireRows> for BoardGrid {
    type Error = GridError;

    fn try_from(rows: WireRows) -> Result<Self, Self::Error> {
        let size = rows.len();
        if size == 0 || size > u8::MAX as usize {
            return Err(GridError::BadSize(size));
        }
        let mut cells = Vec::with_capacity(size * size);
        for (row, cells_in_row) in rows.into_iter().enumerate() {
            if cells_in_row.len() != size {
                return Err(GridError::RaggedRow {
                    row,
                    len: cells_in_row.len(),
                    expected: size,
                });
            }
            cells.extend(cells_in_row);
        }
        Ok(BoardGrid {
            size: size as u8,
            cells,
        })
    }
}

impl From<BoardGrid> for WireRows {
    fn from(grid: BoardGrid) -> Self {
        grid.to_rows()
    }
}
