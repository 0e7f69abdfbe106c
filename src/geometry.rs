//! Route geometry for visualization.
//!
//! Stitches the per-leg paths of an ordered route into one walk and derives
//! the direction annotations drawn on top of the grid.

use std::collections::HashMap;

use crate::domain::{Coordinate, Direction};
use crate::matrix::DistanceMatrix;

/// Directions walked out of each cell, in first-seen order.
///
/// A cell crossed by several legs keeps every distinct direction, so
/// self-intersecting routes accumulate rather than overwrite.
///
/// # Examples
///
/// ```
/// use warehouse_picking::domain::{Coordinate, Direction};
/// use warehouse_picking::geometry::DirectionMap;
///
/// let mut map = DirectionMap::new();
/// let cell = Coordinate::new(2, 3);
/// map.record(cell, Direction::Right);
/// map.record(cell, Direction::Up);
/// map.record(cell, Direction::Right);
/// assert_eq!(map.get(cell), Some(&[Direction::Right, Direction::Up][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionMap {
    entries: Vec<(Coordinate, Vec<Direction>)>,
    index: HashMap<Coordinate, usize>,
}

impl DirectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `direction` under `cell` unless it is already recorded there.
    pub fn record(&mut self, cell: Coordinate, direction: Direction) {
        match self.index.get(&cell) {
            Some(&slot) => {
                let directions = &mut self.entries[slot].1;
                if !directions.contains(&direction) {
                    directions.push(direction);
                }
            }
            None => {
                self.index.insert(cell, self.entries.len());
                self.entries.push((cell, vec![direction]));
            }
        }
    }

    pub fn get(&self, cell: Coordinate) -> Option<&[Direction]> {
        self.index
            .get(&cell)
            .map(|&slot| self.entries[slot].1.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cells in first-recorded order.
    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, &[Direction])> {
        self.entries
            .iter()
            .map(|(cell, directions)| (*cell, directions.as_slice()))
    }
}

/// Where and in which position a stop is visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePoint {
    pub label: String,
    pub position: Coordinate,
    /// 0 for the depot, 1 for the first pick, and so on.
    pub order: usize,
}

/// The walk of an ordered route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteGeometry {
    /// Every cell walked, depot first; leg endpoints appear once.
    pub path: Vec<Coordinate>,
    pub direction_map: DirectionMap,
    pub route_points: Vec<RoutePoint>,
}

impl RouteGeometry {
    /// Builds the walk for `order` (stop indices into `matrix`).
    ///
    /// # Examples
    ///
    /// ```
    /// use warehouse_picking::domain::{Coordinate, Direction, Stop};
    /// use warehouse_picking::geometry::RouteGeometry;
    /// use warehouse_picking::layout::WarehouseLayout;
    /// use warehouse_picking::matrix::DistanceMatrix;
    ///
    /// let layout = WarehouseLayout::open(1, 3).unwrap();
    /// let stops = vec![
    ///     Stop::depot(Coordinate::new(0, 0)),
    ///     Stop::new("A", Coordinate::new(0, 1)),
    ///     Stop::new("B", Coordinate::new(0, 2)),
    /// ];
    /// let matrix = DistanceMatrix::build(&layout, stops).unwrap();
    /// let geometry = RouteGeometry::build(&matrix, &[0, 1, 2]);
    ///
    /// assert_eq!(geometry.path.len(), 3);
    /// assert_eq!(geometry.steps(), 2);
    /// assert_eq!(
    ///     geometry.direction_map.get(Coordinate::new(0, 1)),
    ///     Some(&[Direction::Right][..])
    /// );
    /// ```
    pub fn build(matrix: &DistanceMatrix, order: &[usize]) -> Self {
        let stops = matrix.stops();
        let mut path = Vec::new();
        let mut direction_map = DirectionMap::new();

        if let Some(&first) = order.first() {
            path.push(stops[first].position);
        }

        for leg in order.windows(2) {
            let cells = matrix.segment(leg[0], leg[1]).cells();
            for step in cells.windows(2) {
                if let Some(direction) = Direction::between(step[0], step[1]) {
                    direction_map.record(step[0], direction);
                }
            }
            path.extend(cells.iter().skip(1).copied());
        }

        let route_points = order
            .iter()
            .enumerate()
            .map(|(position, &stop)| RoutePoint {
                label: stops[stop].label.clone(),
                position: stops[stop].position,
                order: position,
            })
            .collect();

        Self {
            path,
            direction_map,
            route_points,
        }
    }

    /// Steps walked along the whole path.
    pub fn steps(&self) -> u64 {
        self.path.len().saturating_sub(1) as u64
    }
}
