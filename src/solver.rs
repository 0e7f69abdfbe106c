//! Route optimizer for open-path pick sequencing.
//!
//! The depot is stop 0 and always stays first; the route ends at the last
//! pick. Small requests are solved exactly with a Held-Karp bitmask DP.
//! Larger ones use nearest-neighbour construction followed by first-improvement
//! 2-opt, bounded by an iteration cap and an optional time limit.
//!
//! Every scan runs in ascending index order with strict comparisons, so equal
//! inputs always produce the same order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::console::{PhaseStats, PhaseTimer};
use crate::matrix::DistanceTable;

/// Largest stop count (depot included) the exact solver accepts.
pub const MAX_EXACT_STOPS: usize = 16;

const DEFAULT_EXACT_THRESHOLD: usize = 13;

const DEFAULT_MAX_ITERATIONS: u64 = 10_000;

/// Optimizer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Requests with at most this many stops (depot included) are solved
    /// exactly. Clamped to [`MAX_EXACT_STOPS`].
    pub exact_threshold: usize,
    /// Cap on applied 2-opt improvements.
    pub max_iterations: u64,
    /// Wall-clock budget for the 2-opt phase.
    pub time_limit_ms: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            exact_threshold: DEFAULT_EXACT_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            time_limit_ms: None,
        }
    }
}

impl SolverConfig {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Threshold actually applied.
    ///
    /// ```
    /// use warehouse_picking::solver::{SolverConfig, MAX_EXACT_STOPS};
    ///
    /// let config = SolverConfig { exact_threshold: 40, ..Default::default() };
    /// assert_eq!(config.effective_threshold(), MAX_EXACT_STOPS);
    /// ```
    pub fn effective_threshold(&self) -> usize {
        self.exact_threshold.min(MAX_EXACT_STOPS)
    }
}

/// How a [`Solution`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveMethod {
    /// At most one pick; nothing to order.
    Trivial,
    /// Held-Karp bitmask DP.
    Exact,
    /// Nearest neighbour plus 2-opt.
    Heuristic,
}

impl SolveMethod {
    /// ```
    /// use warehouse_picking::solver::SolveMethod;
    ///
    /// assert_eq!(SolveMethod::Heuristic.as_str(), "HEURISTIC");
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            SolveMethod::Trivial => "TRIVIAL",
            SolveMethod::Exact => "EXACT",
            SolveMethod::Heuristic => "HEURISTIC",
        }
    }
}

impl fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A depot-first visiting order and its cost on the solved table.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Stop indices; `order[0] == 0` whenever there is at least one stop.
    pub order: Vec<usize>,
    pub distance: u64,
    pub method: SolveMethod,
    /// The heuristic stopped on its iteration cap or time limit while an
    /// improving move was still available.
    pub budget_exhausted: bool,
    /// Applied 2-opt reversals.
    pub improvements: u64,
    pub phases: Vec<PhaseStats>,
}

impl Solution {
    /// Whether `order` is guaranteed optimal.
    pub fn is_exact(&self) -> bool {
        matches!(self.method, SolveMethod::Trivial | SolveMethod::Exact)
    }
}

/// Finds minimum-distance open paths over a [`DistanceTable`].
///
/// # Examples
///
/// ```
/// use warehouse_picking::matrix::DistanceTable;
/// use warehouse_picking::solver::{RouteOptimizer, SolveMethod, SolverConfig};
///
/// // Depot, then two picks on opposite corners of a 3x3 grid
/// let table = DistanceTable::from_rows(vec![
///     vec![0, 2, 2],
///     vec![2, 0, 4],
///     vec![2, 4, 0],
/// ]);
/// let solution = RouteOptimizer::new(SolverConfig::default()).solve(&table);
/// assert_eq!(solution.order[0], 0);
/// assert_eq!(solution.distance, 6);
/// assert_eq!(solution.method, SolveMethod::Exact);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteOptimizer {
    config: SolverConfig,
}

impl RouteOptimizer {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Method that [`solve`](Self::solve) will use for `stops` stops.
    pub fn method_for(&self, stops: usize) -> SolveMethod {
        if stops <= 2 {
            SolveMethod::Trivial
        } else if stops <= self.config.effective_threshold() {
            SolveMethod::Exact
        } else {
            SolveMethod::Heuristic
        }
    }

    /// Orders all stops of `table`, starting at stop 0.
    pub fn solve(&self, table: &DistanceTable) -> Solution {
        let n = table.len();
        let method = self.method_for(n);
        debug!(stops = n, %method, "Optimizing pick order");

        let solution = match method {
            SolveMethod::Trivial => {
                let order: Vec<usize> = (0..n).collect();
                Solution {
                    distance: table.route_cost(&order),
                    order,
                    method,
                    budget_exhausted: false,
                    improvements: 0,
                    phases: Vec::new(),
                }
            }
            SolveMethod::Exact => {
                let mut timer = PhaseTimer::start("HeldKarp");
                let order = held_karp(table, &mut timer);
                Solution {
                    distance: table.route_cost(&order),
                    order,
                    method,
                    budget_exhausted: false,
                    improvements: 0,
                    phases: vec![timer.finish()],
                }
            }
            SolveMethod::Heuristic => self.solve_heuristic(table),
        };

        debug!(
            stops = n,
            distance = solution.distance,
            improvements = solution.improvements,
            budget_exhausted = solution.budget_exhausted,
            "Pick order optimized"
        );
        solution
    }

    /// Runs 2-opt on `table` starting from `order`, which must begin at stop 0.
    ///
    /// The result is never longer than `order` on `table`.
    ///
    /// ```
    /// use warehouse_picking::matrix::DistanceTable;
    /// use warehouse_picking::solver::RouteOptimizer;
    ///
    /// // Four stops on a line; visiting them out of order doubles back
    /// let table = DistanceTable::from_rows(vec![
    ///     vec![0, 1, 2, 3],
    ///     vec![1, 0, 1, 2],
    ///     vec![2, 1, 0, 1],
    ///     vec![3, 2, 1, 0],
    /// ]);
    /// let solution = RouteOptimizer::default().improve(&table, vec![0, 3, 1, 2]);
    /// assert_eq!(solution.order, vec![0, 1, 2, 3]);
    /// assert_eq!(solution.distance, 3);
    /// ```
    pub fn improve(&self, table: &DistanceTable, order: Vec<usize>) -> Solution {
        self.local_search(table, order, Vec::new())
    }

    fn solve_heuristic(&self, table: &DistanceTable) -> Solution {
        let mut ch_timer = PhaseTimer::start("NearestNeighbour");
        let order = nearest_neighbour(table, &mut ch_timer);
        self.local_search(table, order, vec![ch_timer.finish()])
    }

    fn local_search(
        &self,
        table: &DistanceTable,
        mut order: Vec<usize>,
        mut phases: Vec<PhaseStats>,
    ) -> Solution {
        let deadline = self.config.time_limit().map(|limit| Instant::now() + limit);

        let mut ls_timer = PhaseTimer::start("TwoOpt");
        let (improvements, budget_exhausted) =
            two_opt(table, &mut order, self.config.max_iterations, deadline, &mut ls_timer);
        phases.push(ls_timer.finish());

        Solution {
            distance: table.route_cost(&order),
            order,
            method: SolveMethod::Heuristic,
            budget_exhausted,
            improvements,
            phases,
        }
    }
}

const UNSET: u64 = u64::MAX;
const NO_PARENT: u8 = u8::MAX;

/// Exact open path from stop 0 through every other stop.
///
/// `dp[mask][j]` is the cheapest walk from the depot through the picks in
/// `mask` ending at pick `j` (pick `j` is stop `j + 1`).
fn held_karp(table: &DistanceTable, timer: &mut PhaseTimer) -> Vec<usize> {
    let m = table.len() - 1;
    let states = 1usize << m;
    let mut dp = vec![UNSET; states * m];
    let mut parent = vec![NO_PARENT; states * m];

    for j in 0..m {
        dp[(1 << j) * m + j] = table.get(0, j + 1);
    }

    for mask in 1..states {
        for j in 0..m {
            let here = dp[mask * m + j];
            if mask & (1 << j) == 0 || here == UNSET {
                continue;
            }
            for k in 0..m {
                if mask & (1 << k) != 0 {
                    continue;
                }
                timer.record_move();
                let next = mask | (1 << k);
                let cost = here + table.get(j + 1, k + 1);
                if cost < dp[next * m + k] {
                    dp[next * m + k] = cost;
                    parent[next * m + k] = j as u8;
                    timer.record_accepted();
                }
            }
        }
    }

    let full = states - 1;
    let mut last = 0;
    for j in 1..m {
        if dp[full * m + j] < dp[full * m + last] {
            last = j;
        }
    }

    let mut picks = Vec::with_capacity(m);
    let mut mask = full;
    let mut current = last;
    loop {
        picks.push(current + 1);
        let prev = parent[mask * m + current];
        mask &= !(1 << current);
        if prev == NO_PARENT {
            break;
        }
        current = usize::from(prev);
    }

    std::iter::once(0).chain(picks.into_iter().rev()).collect()
}

/// Greedy construction: always walk to the closest unvisited stop.
fn nearest_neighbour(table: &DistanceTable, timer: &mut PhaseTimer) -> Vec<usize> {
    let n = table.len();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut current = 0;
    visited[0] = true;
    order.push(0);

    while order.len() < n {
        let mut best: Option<(usize, u64)> = None;
        for (candidate, &seen) in visited.iter().enumerate() {
            if seen {
                continue;
            }
            timer.record_move();
            let cost = table.get(current, candidate);
            if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                best = Some((candidate, cost));
            }
        }
        let Some((next, _)) = best else { break };
        visited[next] = true;
        order.push(next);
        timer.record_accepted();
        current = next;
    }

    order
}

/// First-improvement 2-opt over an open path with a fixed first stop.
///
/// Reversing `order[i..=k]` swaps the edge into position `i` and, unless the
/// segment reaches the end of the path, the edge out of position `k`. The
/// table is assumed symmetric so interior edges keep their cost.
///
/// Returns the number of applied reversals and whether the budget ran out.
fn two_opt(
    table: &DistanceTable,
    order: &mut [usize],
    max_iterations: u64,
    deadline: Option<Instant>,
    timer: &mut PhaseTimer,
) -> (u64, bool) {
    let mut improvements = 0;
    loop {
        let Some((i, k)) = first_improving_move(table, order, timer) else {
            return (improvements, false);
        };
        let out_of_time = deadline.is_some_and(|d| Instant::now() >= d);
        if improvements >= max_iterations || out_of_time {
            return (improvements, true);
        }
        order[i..=k].reverse();
        improvements += 1;
        timer.record_accepted();
    }
}

fn first_improving_move(
    table: &DistanceTable,
    order: &[usize],
    timer: &mut PhaseTimer,
) -> Option<(usize, usize)> {
    let n = order.len();
    for i in 1..n.saturating_sub(1) {
        for k in i + 1..n {
            timer.record_move();
            let mut before = table.get(order[i - 1], order[i]);
            let mut after = table.get(order[i - 1], order[k]);
            if k + 1 < n {
                before += table.get(order[k], order[k + 1]);
                after += table.get(order[i], order[k + 1]);
            }
            if after < before {
                return Some((i, k));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Table of Manhattan distances between integer points.
    fn manhattan_table(points: &[(i64, i64)]) -> DistanceTable {
        let rows = points
            .iter()
            .map(|a| {
                points
                    .iter()
                    .map(|b| ((a.0 - b.0).abs() + (a.1 - b.1).abs()) as u64)
                    .collect()
            })
            .collect();
        DistanceTable::from_rows(rows)
    }

    fn line_table(n: usize) -> DistanceTable {
        let points: Vec<(i64, i64)> = (0..n as i64).map(|x| (0, x)).collect();
        manhattan_table(&points)
    }

    fn brute_force(table: &DistanceTable) -> u64 {
        fn permute(table: &DistanceTable, order: &mut Vec<usize>, rest: &mut Vec<usize>, best: &mut u64) {
            if rest.is_empty() {
                *best = (*best).min(table.route_cost(order));
                return;
            }
            for idx in 0..rest.len() {
                let stop = rest.remove(idx);
                order.push(stop);
                permute(table, order, rest, best);
                order.pop();
                rest.insert(idx, stop);
            }
        }
        let mut best = u64::MAX;
        permute(table, &mut vec![0], &mut (1..table.len()).collect(), &mut best);
        best
    }

    fn assert_feasible(solution: &Solution, n: usize) {
        assert_eq!(solution.order.len(), n);
        assert_eq!(solution.order.first(), Some(&0));
        let mut sorted = solution.order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..n).collect::<Vec<_>>());
    }

    fn heuristic_only() -> RouteOptimizer {
        RouteOptimizer::new(SolverConfig {
            exact_threshold: 0,
            ..Default::default()
        })
    }

    #[test]
    fn test_degenerate_tables() {
        let optimizer = RouteOptimizer::default();

        let depot_only = optimizer.solve(&DistanceTable::new(1));
        assert_eq!(depot_only.order, vec![0]);
        assert_eq!(depot_only.distance, 0);
        assert_eq!(depot_only.method, SolveMethod::Trivial);

        let single = optimizer.solve(&DistanceTable::from_rows(vec![vec![0, 7], vec![7, 0]]));
        assert_eq!(single.order, vec![0, 1]);
        assert_eq!(single.distance, 7);
        assert!(single.is_exact());
    }

    #[test]
    fn test_method_selection() {
        let optimizer = RouteOptimizer::new(SolverConfig::default());
        assert_eq!(optimizer.method_for(2), SolveMethod::Trivial);
        assert_eq!(optimizer.method_for(3), SolveMethod::Exact);
        assert_eq!(optimizer.method_for(13), SolveMethod::Exact);
        assert_eq!(optimizer.method_for(14), SolveMethod::Heuristic);

        let clamped = RouteOptimizer::new(SolverConfig {
            exact_threshold: 100,
            ..Default::default()
        });
        assert_eq!(clamped.method_for(16), SolveMethod::Exact);
        assert_eq!(clamped.method_for(17), SolveMethod::Heuristic);
    }

    #[test]
    fn test_exact_open_path_does_not_return() {
        // Depot in the middle: optimal open path goes to one end first
        let table = manhattan_table(&[(0, 2), (0, 0), (0, 5)]);
        let solution = RouteOptimizer::default().solve(&table);
        assert_eq!(solution.order, vec![0, 1, 2]);
        assert_eq!(solution.distance, 2 + 5);
    }

    #[test]
    fn test_exact_tie_prefers_lower_last_stop() {
        // Both orders cost 4; the lowest-index final stop wins
        let table = DistanceTable::from_rows(vec![
            vec![0, 3, 3],
            vec![3, 0, 1],
            vec![3, 1, 0],
        ]);
        let solution = RouteOptimizer::default().solve(&table);
        assert_eq!(solution.order, vec![0, 2, 1]);
        assert_eq!(solution.distance, 4);
    }

    #[test]
    fn test_nearest_neighbour_tie_prefers_lower_index() {
        let table = DistanceTable::from_rows(vec![
            vec![0, 2, 2, 2],
            vec![2, 0, 5, 5],
            vec![2, 5, 0, 5],
            vec![2, 5, 5, 0],
        ]);
        let mut timer = PhaseTimer::start("NearestNeighbour");
        assert_eq!(nearest_neighbour(&table, &mut timer), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_tail_reversal_replaces_single_edge() {
        let table = line_table(3);
        let mut order = vec![0, 2, 1];
        let mut timer = PhaseTimer::start("TwoOpt");
        let (improvements, exhausted) = two_opt(&table, &mut order, 10, None, &mut timer);
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(improvements, 1);
        assert!(!exhausted);
        assert_eq!(table.route_cost(&order), 2);
    }

    #[test]
    fn test_iteration_cap_reports_exhaustion() {
        let table = line_table(6);
        let start = vec![0, 5, 4, 3, 2, 1];
        let mut timer = PhaseTimer::start("TwoOpt");

        let mut capped = start.clone();
        let (improvements, exhausted) = two_opt(&table, &mut capped, 0, None, &mut timer);
        assert_eq!(improvements, 0);
        assert!(exhausted);
        assert_eq!(capped, start);

        let mut free = start;
        let (improvements, exhausted) = two_opt(&table, &mut free, 10_000, None, &mut timer);
        assert!(improvements >= 1);
        assert!(!exhausted);
        assert_eq!(table.route_cost(&free), 5);
    }

    #[test]
    fn test_elapsed_deadline_reports_exhaustion() {
        let table = line_table(6);
        let mut order = vec![0, 5, 4, 3, 2, 1];
        let mut timer = PhaseTimer::start("TwoOpt");
        let (improvements, exhausted) =
            two_opt(&table, &mut order, 10_000, Some(Instant::now()), &mut timer);
        assert_eq!(improvements, 0);
        assert!(exhausted);
    }

    #[test]
    fn test_heuristic_on_grid_instance() {
        let points: Vec<(i64, i64)> = (0..20).map(|i| ((i * 7) % 10, (i * 13) % 20)).collect();
        let table = manhattan_table(&points);
        let solution = RouteOptimizer::default().solve(&table);

        assert_eq!(solution.method, SolveMethod::Heuristic);
        assert!(!solution.is_exact());
        assert_feasible(&solution, points.len());
        assert_eq!(solution.distance, table.route_cost(&solution.order));
        assert_eq!(solution.phases.len(), 2);

        let mut timer = PhaseTimer::start("NearestNeighbour");
        let greedy = nearest_neighbour(&table, &mut timer);
        assert!(solution.distance <= table.route_cost(&greedy));
    }

    #[test]
    fn test_improve_keeps_a_local_optimum() {
        let table = line_table(6);
        let solution = RouteOptimizer::default().improve(&table, (0..6).collect());
        assert_eq!(solution.order, (0..6).collect::<Vec<_>>());
        assert_eq!(solution.improvements, 0);
        assert!(!solution.budget_exhausted);
        assert_eq!(solution.phases.len(), 1);
    }

    #[test]
    fn test_solve_is_deterministic() {
        let points: Vec<(i64, i64)> = (0..18).map(|i| ((i * 5) % 9, (i * 11) % 17)).collect();
        let table = manhattan_table(&points);
        let optimizer = RouteOptimizer::default();
        let first = optimizer.solve(&table);
        for _ in 0..5 {
            assert_eq!(optimizer.solve(&table).order, first.order);
        }
    }

    fn points_strategy() -> impl Strategy<Value = Vec<(i64, i64)>> {
        prop::collection::vec((0i64..10, 0i64..20), 1..=10)
    }

    proptest! {
        #[test]
        fn prop_exact_matches_brute_force(points in points_strategy()) {
            let table = manhattan_table(&points);
            let solution = RouteOptimizer::default().solve(&table);
            assert_feasible(&solution, points.len());
            prop_assert_eq!(solution.distance, brute_force(&table));
            prop_assert!(solution.is_exact());
        }

        #[test]
        fn prop_heuristic_is_feasible_and_bounded(points in points_strategy()) {
            let table = manhattan_table(&points);
            let exact = RouteOptimizer::default().solve(&table);
            let heuristic = heuristic_only().solve(&table);
            assert_feasible(&heuristic, points.len());
            prop_assert!(heuristic.distance >= exact.distance);
            prop_assert_eq!(heuristic.distance, table.route_cost(&heuristic.order));
        }

        #[test]
        fn prop_improve_never_lengthens_start(points in points_strategy(), rotate in 0usize..10) {
            let table = manhattan_table(&points);
            let mut start: Vec<usize> = (0..points.len()).collect();
            let rest = &mut start[1..];
            if !rest.is_empty() {
                let by = rotate % rest.len();
                rest.rotate_left(by);
                rest.reverse();
            }
            let improved = RouteOptimizer::default().improve(&table, start.clone());
            assert_feasible(&improved, points.len());
            prop_assert!(improved.distance <= table.route_cost(&start));
            prop_assert_eq!(improved.method, SolveMethod::Heuristic);
        }
    }
}
