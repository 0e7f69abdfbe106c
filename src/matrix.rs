//! All-pairs walking distances between the stops of a request.
//!
//! [`DistanceMatrix::build`] runs one A* search per unordered stop pair and
//! stores the reversed path for the mirrored entry, so the matrix is
//! symmetric by construction. Searches run in parallel on the rayon pool.
//!
//! [`straight_line_table`] is the obstacle-blind table used only for the
//! comparison report.

use rayon::prelude::*;
use tracing::debug;

use crate::domain::{PathSegment, Stop};
use crate::error::PickError;
use crate::layout::WarehouseLayout;
use crate::pathfinding::Pathfinder;

/// Fixed-point scale of straight-line costs (hundredths of a cell).
pub const STRAIGHT_LINE_SCALE: f64 = 100.0;

/// Square cost table consumed by the route optimizer.
///
/// # Examples
///
/// ```
/// use warehouse_picking::matrix::DistanceTable;
///
/// let table = DistanceTable::from_rows(vec![
///     vec![0, 2, 5],
///     vec![2, 0, 4],
///     vec![5, 4, 0],
/// ]);
/// assert_eq!(table.get(0, 2), 5);
/// assert_eq!(table.route_cost(&[0, 1, 2]), 6);
/// assert!(table.is_symmetric());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceTable {
    size: usize,
    costs: Vec<u64>,
}

impl DistanceTable {
    /// Creates an all-zero table.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            costs: vec![0; size * size],
        }
    }

    /// Builds a table from square rows.
    ///
    /// # Panics
    ///
    /// Panics if any row length differs from the number of rows.
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Self {
        let size = rows.len();
        let mut costs = Vec::with_capacity(size * size);
        for row in rows {
            assert_eq!(row.len(), size, "distance table must be square");
            costs.extend(row);
        }
        Self { size, costs }
    }

    /// Number of stops.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn get(&self, from: usize, to: usize) -> u64 {
        self.costs[from * self.size + to]
    }

    #[inline]
    pub fn set(&mut self, from: usize, to: usize, cost: u64) {
        self.costs[from * self.size + to] = cost;
    }

    /// Sum of consecutive leg costs along `order`.
    pub fn route_cost(&self, order: &[usize]) -> u64 {
        order.windows(2).map(|w| self.get(w[0], w[1])).sum()
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| (i + 1..self.size).all(|j| self.get(i, j) == self.get(j, i)))
    }

    /// Table as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<u64>> {
        self.costs.chunks(self.size.max(1)).map(<[u64]>::to_vec).collect()
    }
}

/// Walking distances and paths between every pair of stops.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    stops: Vec<Stop>,
    table: DistanceTable,
    /// Row-major `n * n` legs; `[i][j]` walks from stop `i` to stop `j`.
    segments: Vec<PathSegment>,
}

impl DistanceMatrix {
    /// Runs A* for every unordered pair of `stops`.
    ///
    /// Fails with [`PickError::UnreachableStop`] for the first pair (in
    /// ascending `(i, j)` order) that cannot be connected.
    ///
    /// # Examples
    ///
    /// ```
    /// use warehouse_picking::domain::{Coordinate, Stop};
    /// use warehouse_picking::layout::WarehouseLayout;
    /// use warehouse_picking::matrix::DistanceMatrix;
    ///
    /// let layout = WarehouseLayout::open(3, 3).unwrap();
    /// let stops = vec![
    ///     Stop::depot(Coordinate::new(0, 0)),
    ///     Stop::new("A", Coordinate::new(0, 2)),
    ///     Stop::new("B", Coordinate::new(2, 0)),
    /// ];
    /// let matrix = DistanceMatrix::build(&layout, stops).unwrap();
    /// assert_eq!(matrix.cost(1, 2), 4);
    /// assert_eq!(matrix.cost(2, 1), 4);
    /// assert_eq!(matrix.segment(2, 1).start(), Some(Coordinate::new(2, 0)));
    /// ```
    pub fn build(layout: &WarehouseLayout, stops: Vec<Stop>) -> Result<Self, PickError> {
        let n = stops.len();
        let finder = Pathfinder::new(layout);

        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect();

        let results: Vec<Result<PathSegment, PickError>> = pairs
            .par_iter()
            .map(|&(i, j)| finder.find_path(stops[i].position, stops[j].position))
            .collect();

        let mut table = DistanceTable::new(n);
        let mut segments: Vec<PathSegment> = stops
            .iter()
            .flat_map(|from| {
                stops
                    .iter()
                    .map(move |_| PathSegment::new(vec![from.position]))
            })
            .collect();

        for (&(i, j), result) in pairs.iter().zip(results) {
            let forward = result.map_err(|_| PickError::UnreachableStop {
                from: stops[i].label.clone(),
                to: stops[j].label.clone(),
            })?;
            let cost = u64::from(forward.cost());
            table.set(i, j, cost);
            table.set(j, i, cost);
            segments[j * n + i] = forward.reversed();
            segments[i * n + j] = forward;
        }

        debug!(stops = n, searches = pairs.len(), "Built walking distance matrix");

        Ok(Self {
            stops,
            table,
            segments,
        })
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn table(&self) -> &DistanceTable {
        &self.table
    }

    #[inline]
    pub fn cost(&self, from: usize, to: usize) -> u64 {
        self.table.get(from, to)
    }

    /// Walk from stop `from` to stop `to`.
    #[inline]
    pub fn segment(&self, from: usize, to: usize) -> &PathSegment {
        &self.segments[from * self.stops.len() + to]
    }
}

/// Obstacle-blind Euclidean table, in hundredths of a cell.
///
/// ```
/// use warehouse_picking::domain::{Coordinate, Stop};
/// use warehouse_picking::matrix::straight_line_table;
///
/// let stops = vec![
///     Stop::depot(Coordinate::new(0, 0)),
///     Stop::new("A", Coordinate::new(3, 4)),
/// ];
/// assert_eq!(straight_line_table(&stops).get(0, 1), 500);
/// ```
pub fn straight_line_table(stops: &[Stop]) -> DistanceTable {
    let n = stops.len();
    let mut table = DistanceTable::new(n);
    for i in 0..n {
        for j in i + 1..n {
            let d = stops[i].position.euclidean(stops[j].position);
            let cost = (d * STRAIGHT_LINE_SCALE).round() as u64;
            table.set(i, j, cost);
            table.set(j, i, cost);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinate;
    use crate::layout::demo_warehouse;

    fn demo_stops(skus: &[&str]) -> Vec<Stop> {
        let wh = demo_warehouse();
        std::iter::once(Stop::depot(wh.depot()))
            .chain(
                skus.iter()
                    .map(|&sku| Stop::new(sku, wh.shelves().get(sku).unwrap())),
            )
            .collect()
    }

    #[test]
    fn test_symmetric_with_zero_diagonal() {
        let wh = demo_warehouse();
        let matrix = DistanceMatrix::build(wh.layout(), demo_stops(&["A1", "B5", "C3", "D2", "E9"])).unwrap();
        assert!(matrix.table().is_symmetric());
        for i in 0..matrix.len() {
            assert_eq!(matrix.cost(i, i), 0);
            assert_eq!(matrix.segment(i, i).cells().len(), 1);
        }
    }

    #[test]
    fn test_mirrored_segment_is_reversed() {
        let wh = demo_warehouse();
        let matrix = DistanceMatrix::build(wh.layout(), demo_stops(&["A3", "C6"])).unwrap();
        let forward = matrix.segment(1, 2);
        let backward = matrix.segment(2, 1);
        assert_eq!(&forward.reversed(), backward);
        assert_eq!(u64::from(forward.cost()), matrix.cost(1, 2));
    }

    #[test]
    fn test_costs_match_segments() {
        let wh = demo_warehouse();
        let matrix = DistanceMatrix::build(wh.layout(), demo_stops(&["B1", "B10", "E1"])).unwrap();
        for i in 0..matrix.len() {
            for j in 0..matrix.len() {
                let seg = matrix.segment(i, j);
                assert_eq!(u64::from(seg.cost()), matrix.cost(i, j));
                assert_eq!(seg.start(), Some(matrix.stops()[i].position));
                assert_eq!(seg.end(), Some(matrix.stops()[j].position));
            }
        }
    }

    #[test]
    fn test_unreachable_pair_is_named() {
        let layout = WarehouseLayout::parse(&["...", "###", "..."]).unwrap();
        let stops = vec![
            Stop::depot(Coordinate::new(0, 0)),
            Stop::new("NEAR", Coordinate::new(0, 2)),
            Stop::new("FAR", Coordinate::new(2, 1)),
        ];
        let err = DistanceMatrix::build(&layout, stops).unwrap_err();
        assert_eq!(
            err,
            PickError::UnreachableStop {
                from: "depot".into(),
                to: "FAR".into()
            }
        );
    }

    #[test]
    fn test_depot_only() {
        let layout = WarehouseLayout::open(2, 2).unwrap();
        let matrix = DistanceMatrix::build(&layout, vec![Stop::depot(Coordinate::new(0, 0))]).unwrap();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.cost(0, 0), 0);
    }

    #[test]
    fn test_straight_line_ignores_walls() {
        let stops = demo_stops(&["B7"]);
        let wh = demo_warehouse();
        let walking = DistanceMatrix::build(wh.layout(), stops.clone()).unwrap();
        let straight = straight_line_table(&stops);
        // depot (9,10) to B7 (0,9): walls force a detour, straight line does not
        assert_eq!(straight.get(0, 1), 906);
        assert!(walking.cost(0, 1) * 100 > straight.get(0, 1));
        assert!(straight.is_symmetric());
    }

    #[test]
    fn test_table_rows_round_trip() {
        let rows = vec![vec![0, 3], vec![3, 0]];
        assert_eq!(DistanceTable::from_rows(rows.clone()).to_rows(), rows);
        assert!(DistanceTable::new(0).is_empty());
    }
}
