use std::fmt::{Debug, Display};
use std::ops::{Add, Sub};
use std::str::FromStr;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: u8 = 8;

/// Signed difference between two tiles, rows first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    pub rows: i8,
    pub columns: i8,
}

impl Offset {
    /** One step diagonally, in absolute form. Pawn captures and en passant. */
    pub const UNIT_DIAGONAL: Offset = Offset::new(1, 1);
    /** Two rows straight, in absolute form. Pawn double step. */
    pub const DOUBLE_STEP: Offset = Offset::new(2, 0);

    pub const fn new(rows: i8, columns: i8) -> Offset {
        Offset { rows, columns }
    }

    pub fn abs(self) -> Offset {
        Offset::new(self.rows.abs(), self.columns.abs())
    }

    pub fn column_only(self) -> Offset {
        Offset::new(0, self.columns)
    }

    pub fn row_only(self) -> Offset {
        Offset::new(self.rows, 0)
    }

    /// Unit step pointing the same way, e.g. `(3, -3)` becomes `(1, -1)`.
    pub fn signum(self) -> Offset {
        Offset::new(self.rows.signum(), self.columns.signum())
    }
}

/// A coordinate on the 8x8 board. Row 0 is rank 1, column 0 is file 'a'.
///
/// A `Tile` is always on the board: constructors either reject or clamp
/// off-board coordinates, so any `Tile` can be used to index a board.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(u8, u8)", into = "(u8, u8)")]
pub struct Tile {
    row: u8,
    column: u8,
}

impl Tile {
    /** Panics if the coordinate is outside the board. */
    pub const fn new(row: u8, column: u8) -> Tile {
        assert!(
            row < BOARD_SIZE && column < BOARD_SIZE,
            "Tile is outside of the board!"
        );
        Tile { row, column }
    }

    pub fn try_new(row: i8, column: i8) -> Option<Tile> {
        if (0..BOARD_SIZE as i8).contains(&row) && (0..BOARD_SIZE as i8).contains(&column) {
            Some(Tile {
                row: row as u8,
                column: column as u8,
            })
        } else {
            None
        }
    }

    /// Forces both components into the board, used for pointer
    /// coordinates that may fall outside the board image.
    pub fn clamped(row: i32, column: i32) -> Tile {
        let max = BOARD_SIZE as i32 - 1;
        Tile {
            row: row.clamp(0, max) as u8,
            column: column.clamp(0, max) as u8,
        }
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn column(self) -> u8 {
        self.column
    }

    /** Row-major index in `0..64`. */
    pub fn index(self) -> usize {
        self.row as usize * BOARD_SIZE as usize + self.column as usize
    }

    pub fn from_index(index: usize) -> Tile {
        assert!(index < 64, "Tile index is outside of the board!");
        Tile::new(
            (index / BOARD_SIZE as usize) as u8,
            (index % BOARD_SIZE as usize) as u8,
        )
    }

    /// Moves the tile by `by`, `None` when the result leaves the board.
    pub fn shift(self, by: Offset) -> Option<Tile> {
        Tile::try_new(self.row as i8 + by.rows, self.column as i8 + by.columns)
    }

    pub fn file_char(self) -> char {
        (b'a' + self.column) as char
    }

    pub fn rank_char(self) -> char {
        (b'1' + self.row) as char
    }

    pub fn to_algebraic(self) -> String {
        format!("{}{}", self.file_char(), self.rank_char())
    }

    pub fn from_algebraic(text: &str) -> anyhow::Result<Tile> {
        let bytes = text.trim().as_bytes();
        if bytes.len() != 2 {
            bail!("Tile notation must be a file and a rank, got {text:?}");
        }
        let (file, rank) = (bytes[0].to_ascii_lowercase(), bytes[1]);
        if !(b'a'..=b'h').contains(&file) {
            bail!("Unknown file {:?} in {text:?}", file as char);
        }
        if !(b'1'..=b'8').contains(&rank) {
            bail!("Unknown rank {:?} in {text:?}", rank as char);
        }
        Ok(Tile::new(rank - b'1', file - b'a'))
    }

    /// Every tile in row-major order, a1 first and h8 last.
    pub fn all() -> impl Iterator<Item = Tile> {
        (0..64).map(Tile::from_index)
    }
}

impl Sub for Tile {
    type Output = Offset;

    fn sub(self, rhs: Tile) -> Offset {
        Offset::new(
            self.row as i8 - rhs.row as i8,
            self.column as i8 - rhs.column as i8,
        )
    }
}

impl Add<Offset> for Tile {
    type Output = Tile;

    fn add(self, rhs: Offset) -> Tile {
        self.shift(rhs)
            .unwrap_or_else(|| panic!("Offset {rhs:?} moves {self} outside of the board!"))
    }
}

impl TryFrom<(u8, u8)> for Tile {
    type Error = anyhow::Error;

    fn try_from((row, column): (u8, u8)) -> Result<Self, Self::Error> {
        Tile::try_new(row as i8, column as i8)
            .with_context(|| format!("({row}, {column}) is outside of the board"))
    }
}

impl From<Tile> for (u8, u8) {
    fn from(value: Tile) -> Self {
        (value.row, value.column)
    }
}

impl FromStr for Tile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tile::from_algebraic(s)
    }
}

impl Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.to_algebraic())
    }
}

impl Debug for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tile({})", self.to_algebraic())
    }
}
