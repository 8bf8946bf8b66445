//! The bingo card: a 5×5 grid of numbers plus a matching grid of marks.
//!
//! Columns draw from fixed bands (B I N G O). The center cell is the free
//! space: it holds the [`FREE_SPACE`] sentinel, starts marked, and is never
//! drawn or matched.
//!
//! ```text
//!   B     I     N     G     O
//!  1-15 16-30 31-45 46-60 61-75
//! ```

use std::collections::HashSet;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Width and height of a card.
pub const GRID_SIZE: usize = 5;

/// Sentinel stored in the free center cell.
pub const FREE_SPACE: u8 = 0;

/// Every number a session can call.
pub const CALL_RANGE: RangeInclusive<u8> = 1..=75;

/// The numeric band each column draws from.
pub const COLUMN_BANDS: [RangeInclusive<u8>; GRID_SIZE] =
    [1..=15, 16..=30, 31..=45, 46..=60, 61..=75];

const CENTER: usize = GRID_SIZE / 2;

/// A bingo card and its marks.
///
/// `grid[row][col]` — rows first, so `grid[0]` is the top row and
/// `grid[r][0]` is always in the B band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    grid: [[u8; GRID_SIZE]; GRID_SIZE],
    marks: [[bool; GRID_SIZE]; GRID_SIZE],
}

impl Card {
    /// Builds an unmarked card (free space pre-marked) from a grid.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidCard`] if the center isn't the
    /// sentinel, a number falls outside its column band, or a number
    /// appears twice.
    pub fn from_grid(
        grid: [[u8; GRID_SIZE]; GRID_SIZE],
    ) -> Result<Self, ProtocolError> {
        let mut seen = HashSet::with_capacity(GRID_SIZE * GRID_SIZE);
        for (row, cells) in grid.iter().enumerate() {
            for (col, &n) in cells.iter().enumerate() {
                if row == CENTER && col == CENTER {
                    if n != FREE_SPACE {
                        return Err(ProtocolError::InvalidCard(format!(
                            "center must be the free space, got {n}"
                        )));
                    }
                    continue;
                }
                if !COLUMN_BANDS[col].contains(&n) {
                    return Err(ProtocolError::InvalidCard(format!(
                        "{n} is outside the band of column {col}"
                    )));
                }
                if !seen.insert(n) {
                    return Err(ProtocolError::InvalidCard(format!(
                        "{n} appears more than once"
                    )));
                }
            }
        }

        let mut marks = [[false; GRID_SIZE]; GRID_SIZE];
        marks[CENTER][CENTER] = true;
        Ok(Self { grid, marks })
    }

    /// The numbers on the card, row-major.
    pub fn grid(&self) -> &[[u8; GRID_SIZE]; GRID_SIZE] {
        &self.grid
    }

    /// The number at `(row, col)`.
    pub fn number_at(&self, row: usize, col: usize) -> u8 {
        self.grid[row][col]
    }

    /// Whether the cell at `(row, col)` is marked.
    pub fn is_marked(&self, row: usize, col: usize) -> bool {
        self.marks[row][col]
    }

    /// Returns `true` if both cards carry the same numbers in the same
    /// cells. Marks are ignored.
    pub fn same_grid(&self, other: &Card) -> bool {
        self.grid == other.grid
    }

    /// Marks the cell holding `number`.
    ///
    /// Returns `true` if the number is on the card. The free-space
    /// sentinel never matches.
    pub fn mark(&mut self, number: u8) -> bool {
        if number == FREE_SPACE {
            return false;
        }
        for (row, cells) in self.grid.iter().enumerate() {
            for (col, &n) in cells.iter().enumerate() {
                if n == number {
                    self.marks[row][col] = true;
                    return true;
                }
            }
        }
        false
    }

    /// Numbers of every marked cell, excluding the free space.
    pub fn marked_numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.grid.iter().zip(self.marks.iter()).flat_map(|(nums, marks)| {
            nums.iter()
                .zip(marks.iter())
                .filter(|&(&n, &m)| m && n != FREE_SPACE)
                .map(|(&n, _)| n)
        })
    }

    /// Returns `true` if the marks complete a row, a column, or either
    /// main diagonal.
    pub fn has_line(&self) -> bool {
        let m = &self.marks;
        let row = (0..GRID_SIZE).any(|r| m[r].iter().all(|&x| x));
        let col = (0..GRID_SIZE).any(|c| (0..GRID_SIZE).all(|r| m[r][c]));
        let diag = (0..GRID_SIZE).all(|i| m[i][i]);
        let anti = (0..GRID_SIZE).all(|i| m[i][GRID_SIZE - 1 - i]);
        row || col || diag || anti
    }

    /// A claim is valid when every marked number has been drawn and the
    /// marks form a line.
    pub fn is_winning(&self, drawn: &HashSet<u8>) -> bool {
        self.marked_numbers().all(|n| drawn.contains(&n)) && self.has_line()
    }
}
