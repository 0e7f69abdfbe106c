//! Warehouse layout: the walkable grid, the shelf registry and the depot.
//!
//! A [`Warehouse`] is built once at startup (from the built-in demo layout or
//! a TOML layout file) and shared read-only behind an `Arc` afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::{CellKind, Coordinate, Direction};
use crate::error::ConfigError;

/// Rectangular grid of walkable and blocked cells.
///
/// # Examples
///
/// ```
/// use warehouse_picking::domain::Coordinate;
/// use warehouse_picking::layout::WarehouseLayout;
///
/// let layout = WarehouseLayout::parse(&["..#", "...", "#.."]).unwrap();
/// assert_eq!(layout.rows(), 3);
/// assert!(!layout.is_walkable(Coordinate::new(0, 2)));
///
/// // Corner cell: only right and down exist, and right is open
/// let n = layout.neighbors(Coordinate::new(0, 0));
/// assert_eq!(n, vec![Coordinate::new(1, 0), Coordinate::new(0, 1)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseLayout {
    rows: usize,
    cols: usize,
    cells: Vec<CellKind>,
}

impl WarehouseLayout {
    /// Creates an all-walkable layout.
    pub fn open(rows: usize, cols: usize) -> Result<Self, ConfigError> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![CellKind::Walkable; rows * cols],
        })
    }

    /// Builds a layout from explicit rows; every row must have the same length.
    pub fn from_rows(grid: Vec<Vec<CellKind>>) -> Result<Self, ConfigError> {
        let expected = grid.first().map(Vec::len).unwrap_or(0);
        if expected == 0 {
            return Err(ConfigError::EmptyGrid);
        }

        let mut cells = Vec::with_capacity(grid.len() * expected);
        for (row, line) in grid.iter().enumerate() {
            if line.len() != expected {
                return Err(ConfigError::NotRectangular {
                    row,
                    expected,
                    found: line.len(),
                });
            }
            cells.extend_from_slice(line);
        }

        Ok(Self {
            rows: grid.len(),
            cols: expected,
            cells,
        })
    }

    /// Parses text rows: `.` or `0` is walkable, `#` or `1` is blocked.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self, ConfigError> {
        let grid = lines
            .iter()
            .enumerate()
            .map(|(row, line)| {
                line.as_ref()
                    .chars()
                    .enumerate()
                    .map(|(col, ch)| match ch {
                        '.' | '0' => Ok(CellKind::Walkable),
                        '#' | '1' => Ok(CellKind::Blocked),
                        other => Err(ConfigError::InvalidCell {
                            row,
                            col,
                            cell: other,
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rows(grid)
    }

    /// Marks a cell as blocked.
    pub fn block(&mut self, c: Coordinate) -> Result<(), ConfigError> {
        let idx = self.index(c).ok_or_else(|| ConfigError::OutOfBounds {
            what: "Blocked cell".to_string(),
            coord: c,
            rows: self.rows,
            cols: self.cols,
        })?;
        self.cells[idx] = CellKind::Blocked;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn index(&self, c: Coordinate) -> Option<usize> {
        if self.in_bounds(c) {
            Some(c.row as usize * self.cols + c.col as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn in_bounds(&self, c: Coordinate) -> bool {
        c.row >= 0 && c.col >= 0 && (c.row as usize) < self.rows && (c.col as usize) < self.cols
    }

    /// Kind of the cell, or `None` when out of bounds.
    #[inline]
    pub fn cell(&self, c: Coordinate) -> Option<CellKind> {
        self.index(c).map(|idx| self.cells[idx])
    }

    /// True when `c` is in bounds and not blocked.
    #[inline]
    pub fn is_walkable(&self, c: Coordinate) -> bool {
        self.cell(c) == Some(CellKind::Walkable)
    }

    /// In-bounds, walkable, 4-adjacent cells in up/down/left/right order.
    pub fn neighbors(&self, c: Coordinate) -> Vec<Coordinate> {
        Direction::ALL
            .iter()
            .map(|&d| c.step(d))
            .filter(|&n| self.is_walkable(n))
            .collect()
    }

    /// Rows of `0` (walkable) / `1` (blocked) flags.
    pub fn to_flags(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|k| k.as_flag()).collect())
            .collect()
    }
}

/// SKU → shelf coordinate, iterated in SKU order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShelfRegistry {
    shelves: BTreeMap<String, Coordinate>,
}

impl ShelfRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shelf, replacing any previous coordinate for the SKU.
    pub fn insert(&mut self, sku: impl Into<String>, position: Coordinate) {
        self.shelves.insert(sku.into(), position);
    }

    pub fn get(&self, sku: &str) -> Option<Coordinate> {
        self.shelves.get(sku).copied()
    }

    pub fn len(&self) -> usize {
        self.shelves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shelves.is_empty()
    }

    pub fn skus(&self) -> impl Iterator<Item = &str> {
        self.shelves.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Coordinate)> {
        self.shelves.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, Coordinate)> for ShelfRegistry {
    fn from_iter<T: IntoIterator<Item = (String, Coordinate)>>(iter: T) -> Self {
        Self {
            shelves: iter.into_iter().collect(),
        }
    }
}

/// Validated layout, shelf registry and depot.
#[derive(Debug, Clone)]
pub struct Warehouse {
    layout: WarehouseLayout,
    shelves: ShelfRegistry,
    depot: Coordinate,
}

impl Warehouse {
    /// Validates that the depot and every shelf lie inside the layout.
    ///
    /// ```
    /// use warehouse_picking::domain::Coordinate;
    /// use warehouse_picking::layout::{ShelfRegistry, Warehouse, WarehouseLayout};
    ///
    /// let layout = WarehouseLayout::open(3, 3).unwrap();
    /// let mut shelves = ShelfRegistry::new();
    /// shelves.insert("X", Coordinate::new(5, 0));
    ///
    /// assert!(Warehouse::new(layout, shelves, Coordinate::new(0, 0)).is_err());
    /// ```
    pub fn new(
        layout: WarehouseLayout,
        shelves: ShelfRegistry,
        depot: Coordinate,
    ) -> Result<Self, ConfigError> {
        let check = |what: String, coord: Coordinate| {
            if layout.in_bounds(coord) {
                Ok(())
            } else {
                Err(ConfigError::OutOfBounds {
                    what,
                    coord,
                    rows: layout.rows(),
                    cols: layout.cols(),
                })
            }
        };

        check("Depot".to_string(), depot)?;
        for (sku, pos) in shelves.iter() {
            check(format!("Shelf {}", sku), pos)?;
        }

        Ok(Self {
            layout,
            shelves,
            depot,
        })
    }

    /// Builds a warehouse from a parsed layout file.
    pub fn from_config(config: &LayoutConfig) -> Result<Self, ConfigError> {
        let mut layout = match &config.grid {
            Some(lines) => WarehouseLayout::parse(lines)?,
            None => WarehouseLayout::open(config.rows, config.cols)?,
        };
        for &cell in &config.blocked {
            layout.block(Coordinate::from(cell))?;
        }

        let shelves = config
            .shelves
            .iter()
            .map(|(sku, &pos)| (sku.clone(), Coordinate::from(pos)))
            .collect();

        Self::new(layout, shelves, Coordinate::from(config.depot))
    }

    /// Reads and validates a TOML layout file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: LayoutConfig = toml::from_str(&text)?;
        Self::from_config(&config)
    }

    pub fn layout(&self) -> &WarehouseLayout {
        &self.layout
    }

    pub fn shelves(&self) -> &ShelfRegistry {
        &self.shelves
    }

    pub fn depot(&self) -> Coordinate {
        self.depot
    }
}

impl Default for Warehouse {
    fn default() -> Self {
        demo_warehouse()
    }
}

/// On-disk layout description.
///
/// Either `grid` (text rows) or `rows`/`cols` must be given; `blocked` cells
/// are applied on top of either.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub grid: Option<Vec<String>>,
    pub rows: usize,
    pub cols: usize,
    pub blocked: Vec<[i32; 2]>,
    pub depot: [i32; 2],
    pub shelves: BTreeMap<String, [i32; 2]>,
}

/// Demo warehouse: 10x20 grid with four horizontal aisle walls.
///
/// Walls run along rows 1, 3, 5 and 7 between columns 2 and 17, the outer
/// columns are blocked, and rows 3 and 7 have an opening at column 10.
/// Shelves sit along the left corridor (A), the top row (B), below the second
/// wall (C), the bottom row (D) and the right corridor (E).
pub fn demo_warehouse() -> Warehouse {
    let rows = 10;
    let cols = 20;
    let mut grid = vec![vec![CellKind::Walkable; cols]; rows];

    for &row in &[1, 3, 5, 7] {
        for cell in grid[row].iter_mut().take(18).skip(2) {
            *cell = CellKind::Blocked;
        }
    }
    for line in grid.iter_mut() {
        line[0] = CellKind::Blocked;
        line[cols - 1] = CellKind::Blocked;
    }
    grid[7][10] = CellKind::Walkable;
    grid[3][10] = CellKind::Walkable;

    let mut shelves = ShelfRegistry::new();
    for i in 0..10 {
        shelves.insert(format!("A{}", i + 1), Coordinate::new(i, 1));
        shelves.insert(format!("B{}", i + 1), Coordinate::new(0, i + 3));
        shelves.insert(format!("E{}", i + 1), Coordinate::new(i, 18));
    }
    for i in 0..6 {
        shelves.insert(format!("C{}", i + 1), Coordinate::new(4, i + 11));
    }
    for i in 0..4 {
        shelves.insert(format!("D{}", i + 1), Coordinate::new(8, i + 3));
    }

    Warehouse {
        layout: WarehouseLayout {
            rows,
            cols,
            cells: grid.concat(),
        },
        shelves,
        depot: Coordinate::new(9, 10),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_warehouse_shape() {
        let wh = demo_warehouse();
        assert_eq!(wh.layout().rows(), 10);
        assert_eq!(wh.layout().cols(), 20);
        assert_eq!(wh.shelves().len(), 40);
        assert_eq!(wh.depot(), Coordinate::new(9, 10));
        assert_eq!(wh.shelves().get("C3"), Some(Coordinate::new(4, 13)));
        assert_eq!(wh.shelves().get("B10"), Some(Coordinate::new(0, 12)));
    }

    #[test]
    fn test_demo_walls_and_openings() {
        let layout = demo_warehouse().layout().clone();
        assert!(!layout.is_walkable(Coordinate::new(1, 2)));
        assert!(!layout.is_walkable(Coordinate::new(5, 17)));
        assert!(layout.is_walkable(Coordinate::new(1, 18)));
        assert!(layout.is_walkable(Coordinate::new(3, 10)));
        assert!(layout.is_walkable(Coordinate::new(7, 10)));
        assert!(!layout.is_walkable(Coordinate::new(4, 0)));
        assert!(!layout.is_walkable(Coordinate::new(4, 19)));
    }

    #[test]
    fn test_non_rectangular_grid_rejected() {
        let err = WarehouseLayout::parse(&["...", "..", "..."]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotRectangular {
                row: 1,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_empty_grid_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            WarehouseLayout::parse(&empty),
            Err(ConfigError::EmptyGrid)
        ));
        assert!(WarehouseLayout::open(0, 4).is_err());
    }

    #[test]
    fn test_invalid_cell_rejected() {
        let err = WarehouseLayout::parse(&["..x"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCell { col: 2, .. }));
    }

    #[test]
    fn test_out_of_bounds_checks() {
        let layout = WarehouseLayout::open(2, 2).unwrap();
        assert!(!layout.in_bounds(Coordinate::new(-1, 0)));
        assert!(!layout.in_bounds(Coordinate::new(0, 2)));
        assert_eq!(layout.cell(Coordinate::new(2, 0)), None);
        assert!(!layout.is_walkable(Coordinate::new(2, 0)));

        let err = Warehouse::new(layout, ShelfRegistry::new(), Coordinate::new(3, 3)).unwrap_err();
        assert!(err.to_string().starts_with("Depot"));
    }

    #[test]
    fn test_neighbors_skip_blocked() {
        let layout = WarehouseLayout::parse(&[".#.", "...", ".#."]).unwrap();
        let n = layout.neighbors(Coordinate::new(1, 1));
        assert_eq!(n, vec![Coordinate::new(1, 0), Coordinate::new(1, 2)]);
    }

    #[test]
    fn test_flags() {
        let layout = WarehouseLayout::parse(&[".#", ".."]).unwrap();
        assert_eq!(layout.to_flags(), vec![vec![0, 1], vec![0, 0]]);
    }

    #[test]
    fn test_load_from_toml_grid() {
        let text = r##"
grid = [
    ".....",
    ".###.",
    ".....",
]
depot = [2, 0]

[shelves]
S1 = [0, 4]
S2 = [1, 2]
"##;
        let config: LayoutConfig = toml::from_str(text).unwrap();
        let wh = Warehouse::from_config(&config).unwrap();
        assert_eq!(wh.layout().rows(), 3);
        assert_eq!(wh.shelves().get("S2"), Some(Coordinate::new(1, 2)));
        assert!(!wh.layout().is_walkable(Coordinate::new(1, 2)));
    }

    #[test]
    fn test_load_from_toml_dimensions() {
        let text = r#"
rows = 4
cols = 4
blocked = [[1, 1], [2, 2]]
depot = [0, 0]

[shelves]
X = [3, 3]
"#;
        let config: LayoutConfig = toml::from_str(text).unwrap();
        let wh = Warehouse::from_config(&config).unwrap();
        assert!(!wh.layout().is_walkable(Coordinate::new(2, 2)));
        assert!(wh.layout().is_walkable(Coordinate::new(3, 3)));
    }

    #[test]
    fn test_load_rejects_out_of_bounds_shelf() {
        let text = r#"
rows = 2
cols = 2
depot = [0, 0]

[shelves]
FAR = [5, 5]
"#;
        let config: LayoutConfig = toml::from_str(text).unwrap();
        let err = Warehouse::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("Shelf FAR"));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.toml");
        std::fs::write(&path, "grid = [\"..\", \"..\"]\ndepot = [1, 1]\n").unwrap();
        let wh = Warehouse::load(&path).unwrap();
        assert_eq!(wh.depot(), Coordinate::new(1, 1));
        assert!(wh.shelves().is_empty());

        assert!(matches!(
            Warehouse::load(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
