//! Domain model for warehouse pick routing.
//!
//! # Overview
//!
//! - [`Coordinate`]: a `(row, col)` grid cell, used as the key type everywhere
//! - [`CellKind`]: whether a cell can be walked through
//! - [`Direction`]: the four cardinal moves on the grid
//! - [`Stop`]: a resolved pick location (or the depot)
//! - [`PathSegment`]: the walked cells between two stops
//!
//! String forms (`"row,col"`, arrow tokens) are produced only by the DTO layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used for the depot stop.
pub const DEPOT_LABEL: &str = "depot";

/// A grid cell addressed by row and column.
///
/// Ordering is row-major, which is what the pathfinder's tie-break relies on.
///
/// # Examples
///
/// ```
/// use warehouse_picking::domain::Coordinate;
///
/// let a = Coordinate::new(0, 0);
/// let b = Coordinate::new(2, 3);
/// assert_eq!(a.manhattan(b), 5);
/// assert!(a < b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Coordinate {
    pub row: i32,
    pub col: i32,
}

impl Coordinate {
    /// Creates a new coordinate.
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Manhattan distance to `other`.
    #[inline]
    pub fn manhattan(self, other: Coordinate) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Straight-line distance to `other`, ignoring obstacles.
    #[inline]
    pub fn euclidean(self, other: Coordinate) -> f64 {
        let dr = f64::from(self.row - other.row);
        let dc = f64::from(self.col - other.col);
        (dr * dr + dc * dc).sqrt()
    }

    /// The neighbouring cell one step in `direction`.
    #[inline]
    pub fn step(self, direction: Direction) -> Coordinate {
        let (dr, dc) = direction.delta();
        Coordinate::new(self.row + dr, self.col + dc)
    }
}

impl From<[i32; 2]> for Coordinate {
    fn from([row, col]: [i32; 2]) -> Self {
        Self { row, col }
    }
}

impl From<Coordinate> for [i32; 2] {
    fn from(c: Coordinate) -> Self {
        [c.row, c.col]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// Kind of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Walkable,
    Blocked,
}

impl CellKind {
    /// `0` for walkable, `1` for blocked; the layout endpoint's wire form.
    pub fn as_flag(self) -> u8 {
        match self {
            CellKind::Walkable => 0,
            CellKind::Blocked => 1,
        }
    }
}

/// A cardinal movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions in neighbour-expansion order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// `(row, col)` delta of one step.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    /// Direction of a single step from `from` to `to`.
    ///
    /// Returns `None` unless the two cells are 4-adjacent.
    ///
    /// ```
    /// use warehouse_picking::domain::{Coordinate, Direction};
    ///
    /// let a = Coordinate::new(3, 3);
    /// assert_eq!(Direction::between(a, Coordinate::new(2, 3)), Some(Direction::Up));
    /// assert_eq!(Direction::between(a, Coordinate::new(3, 4)), Some(Direction::Right));
    /// assert_eq!(Direction::between(a, Coordinate::new(4, 4)), None);
    /// ```
    pub fn between(from: Coordinate, to: Coordinate) -> Option<Direction> {
        match (to.row - from.row, to.col - from.col) {
            (-1, 0) => Some(Direction::Up),
            (1, 0) => Some(Direction::Down),
            (0, -1) => Some(Direction::Left),
            (0, 1) => Some(Direction::Right),
            _ => None,
        }
    }

    /// Arrow symbol used on the wire.
    pub fn symbol(self) -> &'static str {
        match self {
            Direction::Up => "↑",
            Direction::Down => "↓",
            Direction::Left => "←",
            Direction::Right => "→",
        }
    }
}

/// A resolved stop: a SKU (or the depot) and the cell it sits on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    /// SKU code, or [`DEPOT_LABEL`].
    pub label: String,
    pub position: Coordinate,
}

impl Stop {
    /// Creates a pick stop.
    pub fn new(label: impl Into<String>, position: Coordinate) -> Self {
        Self {
            label: label.into(),
            position,
        }
    }

    /// Creates the depot stop.
    pub fn depot(position: Coordinate) -> Self {
        Self::new(DEPOT_LABEL, position)
    }

    pub fn is_depot(&self) -> bool {
        self.label == DEPOT_LABEL
    }
}

/// Cells walked from one stop to another, both endpoints included.
///
/// # Examples
///
/// ```
/// use warehouse_picking::domain::{Coordinate, PathSegment};
///
/// let seg = PathSegment::new(vec![
///     Coordinate::new(0, 0),
///     Coordinate::new(0, 1),
///     Coordinate::new(1, 1),
/// ]);
/// assert_eq!(seg.cost(), 2);
/// assert_eq!(seg.reversed().start(), Some(Coordinate::new(1, 1)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathSegment {
    cells: Vec<Coordinate>,
}

impl PathSegment {
    pub fn new(cells: Vec<Coordinate>) -> Self {
        Self { cells }
    }

    /// Number of steps (edges) walked.
    #[inline]
    pub fn cost(&self) -> u32 {
        self.cells.len().saturating_sub(1) as u32
    }

    pub fn cells(&self) -> &[Coordinate] {
        &self.cells
    }

    pub fn start(&self) -> Option<Coordinate> {
        self.cells.first().copied()
    }

    pub fn end(&self) -> Option<Coordinate> {
        self.cells.last().copied()
    }

    /// The same walk traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        let mut cells = self.cells.clone();
        cells.reverse();
        Self { cells }
    }

    pub fn into_cells(self) -> Vec<Coordinate> {
        self.cells
    }
}
