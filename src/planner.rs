//! Pick planning service.
//!
//! [`PickPlanner`] owns the shared [`Warehouse`] and runs the full pipeline
//! for one request: resolve SKUs, build the walking matrix, order the stops,
//! then stitch the legs into a walk. Nothing is cached between requests.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use warehouse_picking::layout::demo_warehouse;
//! use warehouse_picking::planner::PickPlanner;
//! use warehouse_picking::solver::SolverConfig;
//!
//! let planner = PickPlanner::new(Arc::new(demo_warehouse()), SolverConfig::default());
//! let route = planner.solve(&["C2", "A4", "E7"]).unwrap();
//!
//! assert_eq!(route.order.len(), 3);
//! assert_eq!(route.path.first(), Some(&planner.warehouse().depot()));
//! assert_eq!(route.path.len() as u64, route.distance + 1);
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::console;
use crate::domain::{Coordinate, Stop};
use crate::error::PickError;
use crate::geometry::{DirectionMap, RouteGeometry, RoutePoint};
use crate::layout::Warehouse;
use crate::matrix::{straight_line_table, DistanceMatrix};
use crate::solver::{RouteOptimizer, SolveMethod, Solution, SolverConfig};

/// Result of [`PickPlanner::solve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickRoute {
    /// SKUs in visiting order; the depot start is implicit.
    pub order: Vec<String>,
    /// Every cell walked, starting at the depot.
    pub path: Vec<Coordinate>,
    /// Steps walked.
    pub distance: u64,
    pub method: SolveMethod,
    pub budget_exhausted: bool,
}

/// Result of [`PickPlanner::visualize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteVisualization {
    pub order: Vec<String>,
    pub path: Vec<Coordinate>,
    pub distance: u64,
    pub direction_map: DirectionMap,
    pub route_points: Vec<RoutePoint>,
    /// Whether the order is proven optimal.
    pub exact: bool,
}

/// One side of an [`OptimizationComparison`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparedRoute {
    pub order: Vec<String>,
    /// Steps walked when following `order` through the aisles.
    pub walking_distance: u64,
    /// Cost the optimizer minimised, in the units of its own table.
    pub planned_cost: u64,
    pub method: SolveMethod,
}

/// Obstacle-aware ordering against an ordering planned on straight lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationComparison {
    pub pathfinding: ComparedRoute,
    pub straight_line: ComparedRoute,
    /// `straight_line.walking_distance - pathfinding.walking_distance`.
    pub distance_delta: i64,
}

/// A solved request before it is shaped for a caller.
struct PlannedRoute {
    matrix: DistanceMatrix,
    solution: Solution,
}

impl PlannedRoute {
    fn labels(&self, order: &[usize]) -> Vec<String> {
        let stops = self.matrix.stops();
        order.iter().skip(1).map(|&i| stops[i].label.clone()).collect()
    }
}

/// Routes pick lists through a shared warehouse.
#[derive(Debug, Clone)]
pub struct PickPlanner {
    warehouse: Arc<Warehouse>,
    optimizer: RouteOptimizer,
    console: bool,
}

impl PickPlanner {
    pub fn new(warehouse: Arc<Warehouse>, config: SolverConfig) -> Self {
        Self {
            warehouse,
            optimizer: RouteOptimizer::new(config),
            console: false,
        }
    }

    /// Prints a coloured summary of every solve to stdout.
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    pub fn warehouse(&self) -> &Arc<Warehouse> {
        &self.warehouse
    }

    pub fn optimizer(&self) -> &RouteOptimizer {
        &self.optimizer
    }

    /// Resolves a pick list to stops, depot first.
    ///
    /// Repeated SKUs collapse onto their first occurrence. The first SKU
    /// missing from the registry fails the whole request.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use warehouse_picking::error::PickError;
    /// use warehouse_picking::layout::demo_warehouse;
    /// use warehouse_picking::planner::PickPlanner;
    /// use warehouse_picking::solver::SolverConfig;
    ///
    /// let planner = PickPlanner::new(Arc::new(demo_warehouse()), SolverConfig::default());
    ///
    /// let stops = planner.resolve(&["B2", "A1", "B2"]).unwrap();
    /// let labels: Vec<&str> = stops.iter().map(|s| s.label.as_str()).collect();
    /// assert_eq!(labels, ["depot", "B2", "A1"]);
    ///
    /// assert_eq!(
    ///     planner.resolve(&["A1", "Q7", "Q8"]).unwrap_err(),
    ///     PickError::UnknownSku("Q7".into())
    /// );
    /// ```
    pub fn resolve<S: AsRef<str>>(&self, pick_list: &[S]) -> Result<Vec<Stop>, PickError> {
        let shelves = self.warehouse.shelves();
        let mut seen = HashSet::new();
        let mut stops = vec![Stop::depot(self.warehouse.depot())];

        for sku in pick_list.iter().map(AsRef::as_ref) {
            let position = shelves
                .get(sku)
                .ok_or_else(|| PickError::UnknownSku(sku.to_string()))?;
            if seen.insert(sku) {
                stops.push(Stop::new(sku, position));
            }
        }

        Ok(stops)
    }

    /// Shortest walking route through every SKU of `pick_list`.
    pub fn solve<S: AsRef<str>>(&self, pick_list: &[S]) -> Result<PickRoute, PickError> {
        let planned = self.plan(pick_list)?;
        let geometry = RouteGeometry::build(&planned.matrix, &planned.solution.order);

        Ok(PickRoute {
            order: planned.labels(&planned.solution.order),
            path: geometry.path,
            distance: planned.solution.distance,
            method: planned.solution.method,
            budget_exhausted: planned.solution.budget_exhausted,
        })
    }

    /// Like [`solve`](Self::solve), plus direction annotations and stop markers.
    pub fn visualize<S: AsRef<str>>(&self, pick_list: &[S]) -> Result<RouteVisualization, PickError> {
        let planned = self.plan(pick_list)?;
        let geometry = RouteGeometry::build(&planned.matrix, &planned.solution.order);

        Ok(RouteVisualization {
            order: planned.labels(&planned.solution.order),
            path: geometry.path,
            distance: planned.solution.distance,
            direction_map: geometry.direction_map,
            route_points: geometry.route_points,
            exact: planned.solution.is_exact(),
        })
    }

    /// Orders the request twice, once on walking distances and once on
    /// straight lines, and measures both orders on foot.
    pub fn compare<S: AsRef<str>>(
        &self,
        pick_list: &[S],
    ) -> Result<OptimizationComparison, PickError> {
        let planned = self.plan(pick_list)?;
        let walking = planned.matrix.table();

        let straight_table = straight_line_table(planned.matrix.stops());
        let straight = self.optimizer.solve(&straight_table);

        // A heuristic walk may lose to the straight-line order; polishing that
        // order on the walking table yields a route at least as short.
        let mut best = &planned.solution;
        let polished;
        if !planned.solution.is_exact() {
            polished = self.optimizer.improve(walking, straight.order.clone());
            if polished.distance < best.distance {
                debug!(
                    heuristic = best.distance,
                    polished = polished.distance,
                    "Straight-line order polished into a shorter walk"
                );
                best = &polished;
            }
        }

        let pathfinding = ComparedRoute {
            order: planned.labels(&best.order),
            walking_distance: best.distance,
            planned_cost: best.distance,
            method: best.method,
        };
        let straight_line = ComparedRoute {
            order: planned.labels(&straight.order),
            walking_distance: walking.route_cost(&straight.order),
            planned_cost: straight.distance,
            method: straight.method,
        };
        let distance_delta =
            straight_line.walking_distance as i64 - pathfinding.walking_distance as i64;

        info!(
            pathfinding = pathfinding.walking_distance,
            straight_line = straight_line.walking_distance,
            delta = distance_delta,
            "Compared pick orders"
        );

        Ok(OptimizationComparison {
            pathfinding,
            straight_line,
            distance_delta,
        })
    }

    fn plan<S: AsRef<str>>(&self, pick_list: &[S]) -> Result<PlannedRoute, PickError> {
        let started = Instant::now();
        let result = self.resolve(pick_list).and_then(|stops| {
            let stop_count = stops.len();
            info!(stops = stop_count, "Solving pick route");
            if self.console {
                let method = self.optimizer.method_for(stop_count);
                console::print_solving_started(stop_count, method.as_str());
            }

            let matrix = DistanceMatrix::build(self.warehouse.layout(), stops)?;
            let solution = self.optimizer.solve(matrix.table());
            Ok(PlannedRoute { matrix, solution })
        });

        match &result {
            Ok(planned) => {
                let elapsed = started.elapsed();
                info!(
                    stops = planned.matrix.len(),
                    distance = planned.solution.distance,
                    method = %planned.solution.method,
                    duration_ms = elapsed.as_millis() as u64,
                    "Pick route solved"
                );
                if self.console {
                    console::print_solving_ended(elapsed, planned.matrix.len(), &planned.solution);
                }
            }
            Err(err) => warn!(kind = err.kind(), error = %err, "Pick request rejected"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;
    use crate::layout::{demo_warehouse, ShelfRegistry, WarehouseLayout};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rstest::{fixture, rstest};

    #[fixture]
    fn demo() -> PickPlanner {
        PickPlanner::new(Arc::new(demo_warehouse()), SolverConfig::default())
    }

    /// 3x3 open floor, depot in the top-left corner.
    #[fixture]
    fn open_floor() -> PickPlanner {
        let layout = WarehouseLayout::open(3, 3).unwrap();
        let shelves: ShelfRegistry = [
            ("P1".to_string(), Coordinate::new(0, 2)),
            ("P2".to_string(), Coordinate::new(2, 0)),
        ]
        .into_iter()
        .collect();
        let warehouse = Warehouse::new(layout, shelves, Coordinate::new(0, 0)).unwrap();
        PickPlanner::new(Arc::new(warehouse), SolverConfig::default())
    }

    fn assert_connected(path: &[Coordinate]) {
        for pair in path.windows(2) {
            assert!(
                Direction::between(pair[0], pair[1]).is_some(),
                "jump from {} to {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[rstest]
    fn test_open_floor_two_corners(open_floor: PickPlanner) {
        let route = open_floor.solve(&["P1", "P2"]).unwrap();
        assert_eq!(route.distance, 6);
        assert_eq!(route.path.len(), 7);
        assert_eq!(route.path.first(), Some(&Coordinate::new(0, 0)));
        assert_eq!(route.method, SolveMethod::Exact);
        assert_connected(&route.path);
    }

    #[rstest]
    fn test_unknown_sku_fails_whole_request(demo: PickPlanner) {
        let err = demo.solve(&["A1", "XYZ", "B2"]).unwrap_err();
        assert_eq!(err, PickError::UnknownSku("XYZ".into()));
        assert!(demo.visualize(&["nope"]).is_err());
        assert!(demo.compare(&["nope"]).is_err());
    }

    #[rstest]
    fn test_empty_pick_list(demo: PickPlanner) {
        let empty: [&str; 0] = [];
        let route = demo.solve(&empty).unwrap();
        assert_eq!(route.distance, 0);
        assert!(route.order.is_empty());
        assert_eq!(route.path, vec![demo.warehouse().depot()]);

        let vis = demo.visualize(&empty).unwrap();
        assert!(vis.direction_map.is_empty());
        assert_eq!(vis.route_points.len(), 1);
        assert!(vis.exact);
    }

    #[rstest]
    #[case(&["A1", "A1"], &["A1"])]
    #[case(&["C1", "B4", "C1", "B4", "C1"], &["C1", "B4"])]
    #[case(&["E5", "E5", "E5"], &["E5"])]
    fn test_duplicates_collapse(demo: PickPlanner, #[case] picks: &[&str], #[case] unique: &[&str]) {
        let route = demo.solve(picks).unwrap();
        let mut got = route.order.clone();
        got.sort();
        let mut want: Vec<String> = unique.iter().map(|s| s.to_string()).collect();
        want.sort();
        assert_eq!(got, want);

        let deduped = demo.solve(unique).unwrap();
        assert_eq!(route.distance, deduped.distance);
    }

    #[rstest]
    fn test_route_visits_every_shelf(demo: PickPlanner) {
        let picks = ["B1", "D4", "E9", "A6", "C5"];
        let route = demo.solve(&picks).unwrap();
        assert_connected(&route.path);

        for sku in picks {
            let shelf = demo.warehouse().shelves().get(sku).unwrap();
            assert!(route.path.contains(&shelf), "{} not visited", sku);
        }
        let last = route.order.last().unwrap();
        assert_eq!(
            route.path.last().copied(),
            demo.warehouse().shelves().get(last)
        );
        // Interior cells are never walls
        let layout = demo.warehouse().layout();
        let shelf_cells: HashSet<Coordinate> = picks
            .iter()
            .filter_map(|s| demo.warehouse().shelves().get(s))
            .collect();
        for cell in &route.path {
            assert!(layout.is_walkable(*cell) || shelf_cells.contains(cell));
        }
    }

    #[rstest]
    fn test_large_request_uses_heuristic(demo: PickPlanner) {
        let picks: Vec<String> = (1..=10)
            .flat_map(|i| [format!("A{}", i), format!("E{}", i)])
            .collect();
        let route = demo.solve(&picks).unwrap();
        assert_eq!(route.method, SolveMethod::Heuristic);
        assert_eq!(route.order.len(), 20);
        assert_eq!(route.path.len() as u64, route.distance + 1);
        assert_connected(&route.path);
    }

    #[rstest]
    fn test_visualize_matches_solve(demo: PickPlanner) {
        let picks = ["C3", "B8", "D1"];
        let route = demo.solve(&picks).unwrap();
        let vis = demo.visualize(&picks).unwrap();

        assert_eq!(vis.order, route.order);
        assert_eq!(vis.path, route.path);
        assert_eq!(vis.distance, route.distance);
        assert!(vis.exact);

        let orders: Vec<usize> = vis.route_points.iter().map(|p| p.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
        assert_eq!(vis.route_points[0].position, demo.warehouse().depot());

        // Every step of the path leaves a cell annotated with its direction
        for pair in vis.path.windows(2) {
            let dir = Direction::between(pair[0], pair[1]).unwrap();
            assert!(vis.direction_map.get(pair[0]).unwrap().contains(&dir));
        }
    }

    #[rstest]
    #[case(&["B5", "C2", "D3", "E1"])]
    #[case(&["A2", "B9", "C6", "D2", "E4", "B3"])]
    #[case(&["B7", "D4", "C1", "A9", "E2", "B1", "C5"])]
    fn test_pathfinding_never_walks_further(demo: PickPlanner, #[case] picks: &[&str]) {
        let cmp = demo.compare(picks).unwrap();
        assert!(cmp.pathfinding.walking_distance <= cmp.straight_line.walking_distance);
        assert!(cmp.distance_delta >= 0);
        assert_eq!(
            cmp.distance_delta,
            cmp.straight_line.walking_distance as i64 - cmp.pathfinding.walking_distance as i64
        );
        assert_eq!(cmp.pathfinding.order.len(), picks.len());
        assert_eq!(cmp.straight_line.order.len(), picks.len());
    }

    #[rstest]
    fn test_large_requests_never_lose_to_straight_lines(demo: PickPlanner) {
        let skus: Vec<String> = demo.warehouse().shelves().skus().map(str::to_string).collect();
        for seed in 0..40u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut picks = skus.clone();
            picks.shuffle(&mut rng);
            picks.truncate(14 + (seed as usize % 17));

            let cmp = demo.compare(&picks).unwrap();
            assert_eq!(cmp.pathfinding.method, SolveMethod::Heuristic);
            assert!(
                cmp.distance_delta >= 0,
                "seed {}: walking {} vs straight {}",
                seed,
                cmp.pathfinding.walking_distance,
                cmp.straight_line.walking_distance
            );
            assert_eq!(cmp.pathfinding.order.len(), picks.len());
        }
    }

    #[test]
    fn test_isolated_shelf_is_unreachable() {
        let layout = WarehouseLayout::parse(&["....", "####", "...."]).unwrap();
        let shelves: ShelfRegistry = [
            ("NEAR".to_string(), Coordinate::new(0, 3)),
            ("CUT".to_string(), Coordinate::new(2, 2)),
        ]
        .into_iter()
        .collect();
        let warehouse = Warehouse::new(layout, shelves, Coordinate::new(0, 0)).unwrap();
        let planner = PickPlanner::new(Arc::new(warehouse), SolverConfig::default());

        let err = planner.solve(&["NEAR", "CUT"]).unwrap_err();
        assert_eq!(
            err,
            PickError::UnreachableStop {
                from: "depot".into(),
                to: "CUT".into()
            }
        );
        assert!(planner.solve(&["NEAR"]).is_ok());
    }
}
