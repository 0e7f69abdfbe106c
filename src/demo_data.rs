//! Demo pick-list generator.
//!
//! Produces random orders against a shelf registry:
//! - shelf popularity is exponentially distributed, so a few shelves dominate
//! - order size is normally distributed around 3 items, clamped to 1..=8
//! - shelves within an order are drawn without replacement, by popularity
//!
//! Time-of-day generation scales the hourly order rate by
//! [`hour_multiplier`]. Everything is driven by one seeded [`StdRng`], so a
//! seed always reproduces the same orders.

use chrono::{Duration, NaiveDateTime, Timelike};
use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};
use std::collections::HashMap;

use crate::layout::ShelfRegistry;

/// Mean of the exponential popularity distribution.
const POPULARITY_SCALE: f64 = 2.0;

/// How many shelves [`OrderStatistics::most_popular`] lists.
const TOP_SHELVES: usize = 5;

/// Order-size distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderProfile {
    pub mean_items: f64,
    pub std_items: f64,
    pub min_items: usize,
    pub max_items: usize,
}

impl Default for OrderProfile {
    fn default() -> Self {
        Self {
            mean_items: 3.0,
            std_items: 1.5,
            min_items: 1,
            max_items: 8,
        }
    }
}

/// A generated order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// `ORD-<uuid>`.
    pub id: String,
    pub pick_list: Vec<String>,
    /// Set by time-of-day generation only.
    pub created_at: Option<NaiveDateTime>,
}

/// Seeded order generator.
///
/// # Examples
///
/// ```
/// use warehouse_picking::demo_data::OrderGenerator;
/// use warehouse_picking::layout::demo_warehouse;
///
/// let warehouse = demo_warehouse();
/// let mut a = OrderGenerator::new(warehouse.shelves(), 7);
/// let mut b = OrderGenerator::new(warehouse.shelves(), 7);
///
/// let first = a.generate_batch(5);
/// assert_eq!(first, b.generate_batch(5));
/// assert!(first.iter().all(|o| (1..=8).contains(&o.pick_list.len())));
/// ```
#[derive(Debug, Clone)]
pub struct OrderGenerator {
    rng: StdRng,
    skus: Vec<String>,
    popularity: Vec<f64>,
    profile: OrderProfile,
}

impl OrderGenerator {
    pub fn new(shelves: &ShelfRegistry, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let skus: Vec<String> = shelves.skus().map(str::to_string).collect();

        let raw: Vec<f64> = match Exp::new(1.0 / POPULARITY_SCALE) {
            Ok(exp) => skus.iter().map(|_| exp.sample(&mut rng)).collect(),
            Err(_) => vec![1.0; skus.len()],
        };
        let total: f64 = raw.iter().sum();
        let popularity = if total > 0.0 {
            raw.iter().map(|w| w / total).collect()
        } else {
            vec![1.0 / skus.len().max(1) as f64; skus.len()]
        };

        Self {
            rng,
            skus,
            popularity,
            profile: OrderProfile::default(),
        }
    }

    pub fn with_profile(mut self, profile: OrderProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Normalised pick probability per SKU.
    pub fn popularity(&self) -> impl Iterator<Item = (&str, f64)> {
        self.skus
            .iter()
            .map(String::as_str)
            .zip(self.popularity.iter().copied())
    }

    /// One order with a normally distributed number of distinct shelves.
    pub fn generate_order(&mut self) -> Order {
        let drawn = self.normal(self.profile.mean_items, self.profile.std_items) as i64;
        let lo = self.profile.min_items as i64;
        let hi = self.profile.max_items.max(self.profile.min_items) as i64;
        let count = (drawn.clamp(lo, hi) as usize).min(self.skus.len());

        let pick_list = self.draw_shelves(count);
        let id = uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid();

        Order {
            id: format!("ORD-{}", id),
            pick_list,
            created_at: None,
        }
    }

    pub fn generate_batch(&mut self, count: usize) -> Vec<Order> {
        (0..count).map(|_| self.generate_order()).collect()
    }

    /// Orders spread over `hours` hours from `start`, sorted by creation time.
    ///
    /// Each hour's order count is drawn from a normal distribution whose mean
    /// is `orders_per_hour` scaled by the hour-of-day multiplier. Generation
    /// stops once `max_orders` orders exist, so only the earliest hours of a
    /// long window are filled.
    pub fn generate_time_based(
        &mut self,
        start: NaiveDateTime,
        hours: u32,
        orders_per_hour: f64,
        orders_per_hour_std: f64,
        max_orders: usize,
    ) -> Vec<Order> {
        let mut orders = Vec::new();

        for offset in 0..hours {
            if orders.len() >= max_orders {
                break;
            }
            let slot = start + Duration::hours(i64::from(offset));
            let mean = orders_per_hour * hour_multiplier(slot.hour());
            let count = (self.normal(mean, orders_per_hour_std).max(0.0) as usize)
                .min(max_orders - orders.len());

            for _ in 0..count {
                let minutes = self.rng.gen_range(0..60);
                let mut order = self.generate_order();
                order.created_at = Some(slot + Duration::minutes(minutes));
                orders.push(order);
            }
        }

        orders.sort_by_key(|o| o.created_at);
        orders
    }

    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        match Normal::new(mean, std_dev.max(0.0)) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => mean,
        }
    }

    /// Popularity-weighted draw without replacement.
    fn draw_shelves(&mut self, count: usize) -> Vec<String> {
        let mut candidates: Vec<usize> = (0..self.skus.len()).collect();
        let mut picked = Vec::with_capacity(count);

        while picked.len() < count && !candidates.is_empty() {
            let weights = candidates.iter().map(|&i| self.popularity[i]);
            let slot = match WeightedIndex::new(weights) {
                Ok(dist) => dist.sample(&mut self.rng),
                Err(_) => self.rng.gen_range(0..candidates.len()),
            };
            let index = candidates.swap_remove(slot);
            picked.push(self.skus[index].clone());
        }

        picked
    }
}

/// Relative order intensity for an hour of the day (0-23).
///
/// ```
/// use warehouse_picking::demo_data::hour_multiplier;
///
/// assert_eq!(hour_multiplier(12), 1.5);
/// assert_eq!(hour_multiplier(7), 0.8);
/// assert_eq!(hour_multiplier(2), 0.3);
/// ```
pub fn hour_multiplier(hour: u32) -> f64 {
    match hour {
        9..=17 => 1.5,
        6..=8 | 18..=20 => 0.8,
        _ => 0.3,
    }
}

/// Summary of a set of orders.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatistics {
    pub total_orders: usize,
    pub total_picks: usize,
    pub mean_items: f64,
    pub std_items: f64,
    pub min_items: usize,
    pub max_items: usize,
    /// Most picked shelves with their pick counts, busiest first.
    pub most_popular: Vec<(String, usize)>,
}

/// Statistics over `orders`; `None` when there are none.
pub fn statistics(orders: &[Order]) -> Option<OrderStatistics> {
    if orders.is_empty() {
        return None;
    }

    let sizes: Vec<usize> = orders.iter().map(|o| o.pick_list.len()).collect();
    let total_picks: usize = sizes.iter().sum();
    let mean = total_picks as f64 / sizes.len() as f64;
    let variance = sizes
        .iter()
        .map(|&s| (s as f64 - mean).powi(2))
        .sum::<f64>()
        / sizes.len() as f64;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for sku in orders.iter().flat_map(|o| &o.pick_list) {
        *counts.entry(sku.as_str()).or_default() += 1;
    }
    let mut most_popular: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(sku, n)| (sku.to_string(), n))
        .collect();
    most_popular.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    most_popular.truncate(TOP_SHELVES);

    Some(OrderStatistics {
        total_orders: orders.len(),
        total_picks,
        mean_items: mean,
        std_items: variance.sqrt(),
        min_items: sizes.iter().copied().min().unwrap_or(0),
        max_items: sizes.iter().copied().max().unwrap_or(0),
        most_popular,
    })
}
