//! DTOs for REST API requests/responses.
//!
//! Coordinates travel as `[row, col]` pairs, direction-map keys as
//! `"row,col"` strings and directions as arrow symbols.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

use crate::demo_data::{Order, OrderStatistics};
use crate::domain::Coordinate;
use crate::geometry::{DirectionMap, RoutePoint};
use crate::layout::Warehouse;
use crate::planner::{ComparedRoute, OptimizationComparison, PickRoute, RouteVisualization};

fn cells(path: &[Coordinate]) -> Vec<[i32; 2]> {
    path.iter().map(|&c| c.into()).collect()
}

/// Body of the solve, visualize and compare endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PickListRequest {
    /// SKU codes to pick; order and repeats do not matter.
    #[serde(default, alias = "pickList")]
    pub pick_list: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SolveResponse {
    /// SKUs in visiting order, depot start implied.
    pub order: Vec<String>,
    /// Cells walked from the depot.
    pub path: Vec<[i32; 2]>,
    /// Steps walked.
    pub distance: u64,
    pub method: String,
    pub budget_exhausted: bool,
}

impl From<PickRoute> for SolveResponse {
    fn from(route: PickRoute) -> Self {
        Self {
            order: route.order,
            path: cells(&route.path),
            distance: route.distance,
            method: route.method.as_str().to_string(),
            budget_exhausted: route.budget_exhausted,
        }
    }
}

/// `"row,col"` → arrow symbols, serialized in first-walked order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionMapDto(Vec<(String, Vec<&'static str>)>);

impl DirectionMapDto {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&DirectionMap> for DirectionMapDto {
    fn from(map: &DirectionMap) -> Self {
        Self(
            map.iter()
                .map(|(cell, dirs)| (cell.to_string(), dirs.iter().map(|d| d.symbol()).collect()))
                .collect(),
        )
    }
}

impl Serialize for DirectionMapDto {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, symbols) in &self.0 {
            map.serialize_entry(key, symbols)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutePointDto {
    pub label: String,
    pub position: [i32; 2],
    /// 0 for the depot, then 1, 2, ... in visiting order.
    pub order: usize,
}

impl From<&RoutePoint> for RoutePointDto {
    fn from(point: &RoutePoint) -> Self {
        Self {
            label: point.label.clone(),
            position: point.position.into(),
            order: point.order,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisualizeResponse {
    pub order: Vec<String>,
    pub path: Vec<[i32; 2]>,
    pub distance: u64,
    /// Directions walked out of each cell.
    #[schema(value_type = Object)]
    pub direction_map: DirectionMapDto,
    pub route_points: Vec<RoutePointDto>,
    /// Whether the order is proven optimal.
    pub exact: bool,
}

impl From<RouteVisualization> for VisualizeResponse {
    fn from(vis: RouteVisualization) -> Self {
        Self {
            direction_map: DirectionMapDto::from(&vis.direction_map),
            route_points: vis.route_points.iter().map(RoutePointDto::from).collect(),
            order: vis.order,
            path: cells(&vis.path),
            distance: vis.distance,
            exact: vis.exact,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparedRouteDto {
    pub order: Vec<String>,
    /// Steps walked following `order` through the aisles.
    pub walking_distance: u64,
    /// Cost the optimizer minimised on its own table.
    pub planned_cost: u64,
    pub method: String,
}

impl From<ComparedRoute> for ComparedRouteDto {
    fn from(route: ComparedRoute) -> Self {
        Self {
            order: route.order,
            walking_distance: route.walking_distance,
            planned_cost: route.planned_cost,
            method: route.method.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub pathfinding_result: ComparedRouteDto,
    /// Ordering planned on straight-line distances (hundredths of a cell).
    pub euclidean_result: ComparedRouteDto,
    /// Extra steps walked by the straight-line ordering.
    pub distance_delta: i64,
}

impl From<OptimizationComparison> for CompareResponse {
    fn from(cmp: OptimizationComparison) -> Self {
        Self {
            pathfinding_result: cmp.pathfinding.into(),
            euclidean_result: cmp.straight_line.into(),
            distance_delta: cmp.distance_delta,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LayoutResponse {
    pub rows: usize,
    pub cols: usize,
    /// Row-major cells, `0` walkable and `1` blocked.
    pub layout: Vec<Vec<u8>>,
    pub shelves: BTreeMap<String, [i32; 2]>,
    pub depot: [i32; 2],
}

impl From<&Warehouse> for LayoutResponse {
    fn from(warehouse: &Warehouse) -> Self {
        let layout = warehouse.layout();
        Self {
            rows: layout.rows(),
            cols: layout.cols(),
            layout: layout.to_flags(),
            shelves: warehouse
                .shelves()
                .iter()
                .map(|(sku, pos)| (sku.to_string(), <[i32; 2]>::from(pos)))
                .collect(),
            depot: warehouse.depot().into(),
        }
    }
}

/// Error body: a stable kind plus a human-readable message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DemoOrderDto {
    pub order_id: String,
    pub pick_list: Vec<String>,
    pub item_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub created_at: Option<NaiveDateTime>,
}

impl From<Order> for DemoOrderDto {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.id,
            item_count: order.pick_list.len(),
            pick_list: order.pick_list,
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShelfCountDto {
    pub sku: String,
    pub picks: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatisticsDto {
    pub total_orders: usize,
    pub total_picks: usize,
    pub avg_items_per_order: f64,
    pub std_items_per_order: f64,
    pub min_items_per_order: usize,
    pub max_items_per_order: usize,
    pub most_popular_shelves: Vec<ShelfCountDto>,
}

impl From<OrderStatistics> for OrderStatisticsDto {
    fn from(stats: OrderStatistics) -> Self {
        Self {
            total_orders: stats.total_orders,
            total_picks: stats.total_picks,
            avg_items_per_order: stats.mean_items,
            std_items_per_order: stats.std_items,
            min_items_per_order: stats.min_items,
            max_items_per_order: stats.max_items,
            most_popular_shelves: stats
                .most_popular
                .into_iter()
                .map(|(sku, picks)| ShelfCountDto { sku, picks })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DemoOrdersResponse {
    pub seed: u64,
    pub orders: Vec<DemoOrderDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<OrderStatisticsDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;
    use serde_json::json;

    #[test]
    fn test_request_accepts_both_spellings() {
        let snake: PickListRequest = serde_json::from_str(r#"{"pick_list":["A1","B2"]}"#).unwrap();
        let camel: PickListRequest = serde_json::from_str(r#"{"pickList":["A1"]}"#).unwrap();
        let empty: PickListRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(snake.pick_list, vec!["A1", "B2"]);
        assert_eq!(camel.pick_list, vec!["A1"]);
        assert!(empty.pick_list.is_empty());
    }

    #[test]
    fn test_direction_map_keeps_walk_order() {
        let mut map = DirectionMap::new();
        map.record(Coordinate::new(9, 10), Direction::Up);
        map.record(Coordinate::new(2, 3), Direction::Left);
        map.record(Coordinate::new(9, 10), Direction::Right);

        let text = serde_json::to_string(&DirectionMapDto::from(&map)).unwrap();
        assert_eq!(text, r#"{"9,10":["↑","→"],"2,3":["←"]}"#);
    }

    #[test]
    fn test_layout_response_shape() {
        let warehouse = crate::layout::demo_warehouse();
        let value = serde_json::to_value(LayoutResponse::from(&warehouse)).unwrap();
        assert_eq!(value["rows"], 10);
        assert_eq!(value["cols"], 20);
        assert_eq!(value["depot"], json!([9, 10]));
        assert_eq!(value["shelves"]["A1"], json!([0, 1]));
        assert_eq!(value["layout"][1][2], 1);
        assert_eq!(value["layout"][0][2], 0);
    }
}
