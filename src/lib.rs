//! Warehouse pick-route optimizer.
//!
//! Computes the shortest walking route for an order picker through a grid
//! warehouse whose aisles are separated by impassable racks.
//!
//! # Pipeline
//!
//! 1. [`planner`] resolves the pick list's SKUs to shelf cells
//! 2. [`matrix`] runs [`pathfinding`] (grid A*) between every pair of stops
//! 3. [`solver`] orders the stops as an open path starting at the depot:
//!    Held-Karp for small requests, nearest neighbour plus 2-opt otherwise
//! 4. [`geometry`] stitches the legs into one walk with direction annotations
//!
//! # Domain Model
//!
//! - [`Coordinate`](domain::Coordinate): `(row, col)` grid cell
//! - [`Warehouse`](layout::Warehouse): grid, shelf registry and depot
//! - [`Stop`](domain::Stop): a resolved shelf or the depot
//! - [`PathSegment`](domain::PathSegment): walked cells between two stops

pub mod api;
pub mod config;
pub mod console;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod matrix;
pub mod pathfinding;
pub mod planner;
pub mod solver;
