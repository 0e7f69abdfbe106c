//! Benchmark for end-to-end pick routing throughput.
//!
//! Run with: cargo run --release --bin bench [orders] [seed]

use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

use warehouse_picking::demo_data::{statistics, OrderGenerator};
use warehouse_picking::layout::demo_warehouse;
use warehouse_picking::planner::PickPlanner;
use warehouse_picking::solver::{SolveMethod, SolverConfig};

fn main() {
    let mut args = std::env::args().skip(1);
    let n_orders: usize = args.next().and_then(|a| a.parse().ok()).unwrap_or(1_000);
    let seed: u64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(42);

    let warehouse = Arc::new(demo_warehouse());
    let orders = OrderGenerator::new(warehouse.shelves(), seed).generate_batch(n_orders);
    let planner = PickPlanner::new(warehouse, SolverConfig::default());

    println!("Benchmark: Pick Routing (demo warehouse)");
    println!("  Orders: {}", n_orders);
    println!("  Seed: {}", seed);
    if let Some(stats) = statistics(&orders) {
        println!(
            "  Items/order: {:.2} avg, {}..={}",
            stats.mean_items, stats.min_items, stats.max_items
        );
    }
    println!();

    // Sequential pass
    let seq_start = Instant::now();
    let mut seq_distance = 0u64;
    for order in &orders {
        match planner.solve(&order.pick_list) {
            Ok(route) => seq_distance += route.distance,
            Err(e) => eprintln!("  {} failed: {}", order.id, e),
        }
    }
    let seq_elapsed = seq_start.elapsed();

    // Parallel pass over the shared planner
    let par_start = Instant::now();
    let results: Vec<_> = orders
        .par_iter()
        .filter_map(|order| planner.solve(&order.pick_list).ok())
        .collect();
    let par_elapsed = par_start.elapsed();

    let par_distance: u64 = results.iter().map(|r| r.distance).sum();
    let exact = results.iter().filter(|r| r.method != SolveMethod::Heuristic).count();

    println!("Results:");
    println!("  Sequential: {:.2?} ({:.0} orders/sec)", seq_elapsed, n_orders as f64 / seq_elapsed.as_secs_f64());
    println!("  Parallel:   {:.2?} ({:.0} orders/sec)", par_elapsed, n_orders as f64 / par_elapsed.as_secs_f64());
    println!("  Total distance: {} steps", par_distance);
    println!("  Exact solves: {}/{}", exact, results.len());

    // Solving is deterministic, so both passes must agree
    assert_eq!(seq_distance, par_distance, "Distance mismatch between passes!");
    println!("  Distances verified");
}
