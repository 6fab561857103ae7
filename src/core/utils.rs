use crate::core::tile::{Offset, Tile};

#[derive(Debug)]
pub struct BetweenIterator {
    current: Tile,
    target: Tile,
    step: Offset,
}

impl Iterator for BetweenIterator {
    type Item = Tile;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let next = self.current.shift(self.step)?;
        if next == self.target {
            None
        } else {
            self.current = next;
            Some(next)
        }
    }
}

/// Tiles strictly between `from` and `to`, which must share a row, a
/// column or a diagonal.
pub fn between(from: Tile, to: Tile) -> BetweenIterator {
    #[cfg(debug_assertions)]
    if !is_in_diagonal_line(from, to) && !is_in_straight_line(from, to) {
        panic!("Points can't form line to search between them!")
    }
    BetweenIterator {
        current: from,
        target: to,
        step: (to - from).signum(),
    }
}

pub struct DirectionIterator {
    position: Tile,
    direction: Offset,
}

impl Iterator for DirectionIterator {
    type Item = Tile;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.position = self.position.shift(self.direction)?;
        Some(self.position)
    }
}

/** Walks from `position` (exclusive) towards the edge of the board. */
pub fn in_direction(position: Tile, direction: Offset) -> DirectionIterator {
    DirectionIterator {
        position,
        direction,
    }
}

pub fn is_in_straight_line(a: Tile, b: Tile) -> bool {
    a != b && (a.row() == b.row() || a.column() == b.column())
}

pub fn is_in_diagonal_line(a: Tile, b: Tile) -> bool {
    let diff = (a - b).abs();
    a != b && diff.rows == diff.columns
}
