//! Grid A* pathfinding.
//!
//! Finds the shortest 4-directional walk between two cells of a
//! [`WarehouseLayout`], using the Manhattan distance as heuristic. The
//! heuristic is consistent for unit-cost moves, so the first time the goal is
//! popped its path is optimal.
//!
//! Frontier ties are broken deterministically: lowest `f = g + h`, then lowest
//! `h`, then lowest row, then lowest column. Identical inputs therefore always
//! produce the identical cell sequence.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::trace;

use crate::domain::{Coordinate, Direction, PathSegment};
use crate::error::PickError;
use crate::layout::WarehouseLayout;

/// Frontier entry. Field order is the priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Frontier {
    f: u32,
    h: u32,
    cell: Coordinate,
}

/// Shortest-path search over a borrowed layout.
///
/// # Examples
///
/// ```
/// use warehouse_picking::domain::Coordinate;
/// use warehouse_picking::layout::WarehouseLayout;
/// use warehouse_picking::pathfinding::Pathfinder;
///
/// let layout = WarehouseLayout::parse(&[
///     "...",
///     "##.",
///     "...",
/// ]).unwrap();
/// let finder = Pathfinder::new(&layout);
///
/// // The wall forces a detour through the right column
/// let path = finder.find_path(Coordinate::new(0, 0), Coordinate::new(2, 0)).unwrap();
/// assert_eq!(path.cost(), 6);
/// assert!(path.cells().contains(&Coordinate::new(1, 2)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Pathfinder<'a> {
    layout: &'a WarehouseLayout,
}

impl<'a> Pathfinder<'a> {
    pub fn new(layout: &'a WarehouseLayout) -> Self {
        Self { layout }
    }

    /// Computes the shortest path from `start` to `goal`, both included.
    ///
    /// `start` and `goal` are passable even when their cells are blocked, so
    /// shelves drawn as obstacles can still be path endpoints. Every interior
    /// cell must be walkable.
    pub fn find_path(&self, start: Coordinate, goal: Coordinate) -> Result<PathSegment, PickError> {
        if !self.layout.in_bounds(start) || !self.layout.in_bounds(goal) {
            return Err(PickError::NoPathFound { start, goal });
        }
        if start == goal {
            return Ok(PathSegment::new(vec![start]));
        }

        let mut open = BinaryHeap::new();
        let mut best_g: HashMap<Coordinate, u32> = HashMap::new();
        let mut came_from: HashMap<Coordinate, Coordinate> = HashMap::new();
        let mut closed: HashSet<Coordinate> = HashSet::new();

        let h0 = start.manhattan(goal);
        open.push(Reverse(Frontier {
            f: h0,
            h: h0,
            cell: start,
        }));
        best_g.insert(start, 0);

        while let Some(Reverse(Frontier { cell, .. })) = open.pop() {
            if !closed.insert(cell) {
                continue;
            }
            if cell == goal {
                trace!(%start, %goal, expanded = closed.len(), "A* reached goal");
                return Ok(reconstruct(&came_from, start, goal));
            }

            let g = best_g[&cell];
            for dir in Direction::ALL {
                let next = cell.step(dir);
                if next != goal && !self.layout.is_walkable(next) {
                    continue;
                }
                if closed.contains(&next) {
                    continue;
                }

                let tentative = g + 1;
                if tentative < best_g.get(&next).copied().unwrap_or(u32::MAX) {
                    best_g.insert(next, tentative);
                    came_from.insert(next, cell);
                    let h = next.manhattan(goal);
                    open.push(Reverse(Frontier {
                        f: tentative + h,
                        h,
                        cell: next,
                    }));
                }
            }
        }

        Err(PickError::NoPathFound { start, goal })
    }

    /// Number of steps on the shortest path.
    pub fn path_length(&self, start: Coordinate, goal: Coordinate) -> Result<u32, PickError> {
        self.find_path(start, goal).map(|p| p.cost())
    }
}

/// Walks parent links back from the goal.
fn reconstruct(
    came_from: &HashMap<Coordinate, Coordinate>,
    start: Coordinate,
    goal: Coordinate,
) -> PathSegment {
    let mut cells = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                cells.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    cells.reverse();
    PathSegment::new(cells)
}
